pub mod apply;
pub mod change;
pub mod config;
pub mod init;
pub mod instructions;
pub mod next;
pub mod schema;
pub mod status;

use anyhow::Context;
use artiflow_core::{config::Config, instructions::ChangeContext, SchemaResolver};
use std::path::Path;

/// Resolve the schema for `change`, load it and scan the change directory.
pub(crate) fn load_change(
    root: &Path,
    change: &str,
    schema: Option<&str>,
) -> anyhow::Result<ChangeContext> {
    let resolver = SchemaResolver::from_env();
    let config = Config::load(root).context("failed to load config")?;
    ChangeContext::load(root, &resolver, &config, change, schema)
        .with_context(|| format!("failed to load change '{change}'"))
}
