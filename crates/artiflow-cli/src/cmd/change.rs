use crate::output::{print_json, print_table};
use anyhow::Context;
use artiflow_core::{
    change::{create_change, list_changes},
    config::Config,
    metadata::ChangeMetadata,
    paths, SchemaResolver,
};
use std::path::Path;

// ---------------------------------------------------------------------------
// new
// ---------------------------------------------------------------------------

pub fn new(root: &Path, name: &str, schema: Option<&str>, json: bool) -> anyhow::Result<()> {
    let resolver = SchemaResolver::from_env();
    let config = Config::load(root).context("failed to load config")?;
    let dir = create_change(root, &resolver, name, schema, &config.default_schema)
        .with_context(|| format!("failed to create change '{name}'"))?;
    let meta = ChangeMetadata::load(&dir, &resolver)
        .context("failed to read back change metadata")?;
    let schema_name = meta.map(|m| m.schema).unwrap_or_default();

    if json {
        print_json(&serde_json::json!({
            "name": name,
            "path": dir.display().to_string(),
            "schema": schema_name,
        }))?;
    } else {
        println!("Created change '{name}' ({schema_name})");
        println!("  {}", dir.display());
        println!("\nNext: artiflow status --change {name}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[derive(serde::Serialize)]
struct ChangeRow {
    name: String,
    schema: Option<String>,
    created: Option<String>,
}

pub fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let resolver = SchemaResolver::from_env();
    let names = list_changes(root).context("failed to list changes")?;

    let rows: Vec<ChangeRow> = names
        .into_iter()
        .map(|name| {
            let meta = match ChangeMetadata::load(&paths::change_dir(root, &name), &resolver) {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::warn!(change = %name, error = %e, "unreadable change metadata");
                    None
                }
            };
            ChangeRow {
                schema: meta.as_ref().map(|m| m.schema.clone()),
                created: meta.as_ref().map(|m| m.created.to_string()),
                name,
            }
        })
        .collect();

    if json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("No changes. Run: artiflow new <change-name>");
        return Ok(());
    }

    let table = rows
        .into_iter()
        .map(|r| {
            vec![
                r.name,
                r.schema.unwrap_or_else(|| "-".to_string()),
                r.created.unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&["CHANGE", "SCHEMA", "CREATED"], table);
    Ok(())
}
