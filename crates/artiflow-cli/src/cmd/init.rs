use anyhow::Context;
use artiflow_core::{config::Config, io, paths};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct InitReport {
    root: String,
    created: Vec<String>,
    existing: Vec<String>,
}

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let mut report = InitReport {
        root: root.display().to_string(),
        created: Vec::new(),
        existing: Vec::new(),
    };

    let changes = paths::changes_dir(root);
    if changes.is_dir() {
        report.existing.push(rel(root, &changes));
    } else {
        io::ensure_dir(&changes)
            .with_context(|| format!("failed to create {}", changes.display()))?;
        report.created.push(rel(root, &changes));
    }

    let config_path = paths::config_path(root);
    if Config::write_default(root).context("failed to write config.yaml")? {
        report.created.push(rel(root, &config_path));
    } else {
        report.existing.push(rel(root, &config_path));
    }

    if json {
        return crate::output::print_json(&report);
    }

    println!("Initializing artiflow in: {}", report.root);
    for path in &report.created {
        println!("  created: {path}");
    }
    for path in &report.existing {
        println!("  exists:  {path}");
    }
    println!("\nNext: artiflow new <change-name>");
    Ok(())
}

fn rel(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
