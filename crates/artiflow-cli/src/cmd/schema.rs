use crate::output::{print_json, print_table};
use anyhow::Context;
use artiflow_core::{resolver::load_schema_file, ArtifactGraph, SchemaResolver};
use clap::Subcommand;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum SchemaSubcommand {
    /// List schemas visible from the user and built-in directories
    List,

    /// Show a schema's artifacts in build order
    Show {
        /// Schema name
        name: String,
    },

    /// Validate a schema file without installing it
    Validate {
        /// Path to a schema.yaml
        path: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(subcmd: SchemaSubcommand, json: bool) -> anyhow::Result<()> {
    let resolver = SchemaResolver::from_env();
    match subcmd {
        SchemaSubcommand::List => list(&resolver, json),
        SchemaSubcommand::Show { name } => show(&resolver, &name, json),
        SchemaSubcommand::Validate { path } => validate(&path, json),
    }
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

fn list(resolver: &SchemaResolver, json: bool) -> anyhow::Result<()> {
    let catalog = resolver.catalog();
    if json {
        return print_json(&catalog);
    }
    if catalog.is_empty() {
        println!("No schemas found.");
        return Ok(());
    }

    let rows = catalog
        .into_iter()
        .map(|info| {
            vec![
                info.name,
                info.source.to_string(),
                info.artifacts.join(", "),
                info.description,
            ]
        })
        .collect();
    print_table(&["SCHEMA", "SOURCE", "ARTIFACTS", "DESCRIPTION"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(resolver: &SchemaResolver, name: &str, json: bool) -> anyhow::Result<()> {
    let resolved = resolver
        .resolve(name)
        .with_context(|| format!("failed to load schema '{name}'"))?;
    let graph = ArtifactGraph::new(resolved.schema);
    let order = graph.build_order();

    if json {
        let schema = graph.schema();
        return print_json(&serde_json::json!({
            "name": schema.name,
            "version": schema.version,
            "description": schema.description,
            "source": resolved.source,
            "dir": resolved.dir.display().to_string(),
            "artifacts": schema.artifacts,
            "buildOrder": order,
            "applyRequires": schema.apply_requires(),
            "apply": schema.apply,
        }));
    }

    println!("Schema:  {} v{} ({})", graph.name(), graph.version(), resolved.source);
    println!("Path:    {}", resolved.dir.display());
    if let Some(ref desc) = graph.schema().description {
        println!("About:   {desc}");
    }
    println!();

    let rows = order
        .iter()
        .filter_map(|id| graph.artifact(id))
        .map(|a| {
            vec![
                a.id.clone(),
                a.generates.clone(),
                a.requires.join(", "),
            ]
        })
        .collect();
    print_table(&["ARTIFACT", "GENERATES", "REQUIRES"], rows);
    println!("\nApply requires: {}", graph.schema().apply_requires().join(", "));
    if let Some(tracks) = graph.schema().apply.as_ref().and_then(|a| a.tracks.as_deref()) {
        println!("Apply tracks:   {tracks}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(path: &Path, json: bool) -> anyhow::Result<()> {
    match load_schema_file(path) {
        Ok(schema) => {
            let graph = ArtifactGraph::new(schema);
            if json {
                print_json(&serde_json::json!({
                    "valid": true,
                    "name": graph.name(),
                    "buildOrder": graph.build_order(),
                }))?;
            } else {
                println!(
                    "Schema '{}' is valid ({} artifacts).",
                    graph.name(),
                    graph.artifacts().len()
                );
                println!("Build order: {}", graph.build_order().join(" → "));
            }
            Ok(())
        }
        Err(e) => {
            if json {
                print_json(&serde_json::json!({
                    "valid": false,
                    "error": e.to_string(),
                }))?;
            }
            Err(anyhow::Error::new(e).context("schema validation failed"))
        }
    }
}
