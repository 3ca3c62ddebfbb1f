use crate::output::print_json;
use anyhow::Context;
use artiflow_core::instructions::apply_instructions;
use std::path::Path;

pub fn run(root: &Path, change: &str, schema: Option<&str>, json: bool) -> anyhow::Result<()> {
    let ctx = super::load_change(root, change, schema)?;
    let apply = apply_instructions(&ctx)
        .with_context(|| format!("failed to build apply instructions for '{change}'"))?;

    if json {
        return print_json(&apply);
    }

    println!("Change:   {} ({})", apply.change_name, apply.schema_name);
    println!("State:    {}", apply.state);
    if let Some(ref path) = apply.tracks_path {
        println!(
            "Tasks:    {}/{} complete ({path})",
            apply.progress.complete, apply.progress.total
        );
    }

    if !apply.context_files.is_empty() {
        println!("\nContext:");
        for (id, path) in &apply.context_files {
            println!("  {id:<16} {path}");
        }
    }

    let pending: Vec<_> = apply.tasks.iter().filter(|t| !t.done).collect();
    if !pending.is_empty() {
        println!("\nPending:");
        for task in pending {
            println!("  {:>3}. {}", task.id, task.description);
        }
    }

    println!("\n{}", apply.instruction);
    Ok(())
}
