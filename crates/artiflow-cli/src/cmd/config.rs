use crate::output::print_json;
use anyhow::Context;
use artiflow_core::{
    config::{Config, WarnLevel},
    paths, SchemaResolver,
};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective config (defaults filled in)
    Show,

    /// Validate the config against the available schemas
    Validate,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
    }
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    if json {
        return print_json(&config);
    }

    let path = paths::config_path(root);
    let origin = if path.exists() {
        path.display().to_string()
    } else {
        "defaults (no config file)".to_string()
    };
    println!("Config:         {origin}");
    println!("version:        {}", config.version);
    println!("default_schema: {}", config.default_schema);
    Ok(())
}

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate(&SchemaResolver::from_env());

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
