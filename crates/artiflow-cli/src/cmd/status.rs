use crate::output::{print_json, print_table};
use artiflow_core::instructions::{format_change_status, ArtifactState};
use std::path::Path;

pub fn run(root: &Path, change: &str, schema: Option<&str>, json: bool) -> anyhow::Result<()> {
    let ctx = super::load_change(root, change, schema)?;
    let status = format_change_status(&ctx);

    if json {
        return print_json(&status);
    }

    let done = status
        .artifacts
        .iter()
        .filter(|a| a.status == ArtifactState::Done)
        .count();
    println!("Change:   {}", status.change_name);
    println!("Schema:   {} ({})", status.schema_name, ctx.schema_source);
    println!("Progress: {done}/{} artifacts", status.artifacts.len());
    println!();

    let rows = status
        .artifacts
        .iter()
        .map(|a| {
            let waiting = if a.missing_deps.is_empty() {
                String::new()
            } else {
                format!("needs {}", a.missing_deps.join(", "))
            };
            vec![a.id.clone(), a.status.to_string(), a.output_path.clone(), waiting]
        })
        .collect();
    print_table(&["ARTIFACT", "STATUS", "OUTPUT", ""], rows);

    println!();
    if status.is_complete {
        println!("All artifacts complete.");
    } else if status.ready_for_apply() {
        println!("Ready for implementation.");
    }
    Ok(())
}
