use crate::output::print_json;
use anyhow::Context;
use artiflow_core::instructions::generate_instructions;
use std::path::Path;

pub fn run(
    root: &Path,
    artifact: &str,
    change: &str,
    schema: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let ctx = super::load_change(root, change, schema)?;
    let instr = generate_instructions(&ctx, artifact)
        .with_context(|| format!("failed to build instructions for '{artifact}'"))?;

    if json {
        return print_json(&instr);
    }

    println!("Artifact: {}", instr.artifact_id);
    println!("Change:   {} ({})", instr.change_name, instr.schema_name);
    println!("Output:   {}/{}", instr.change_dir, instr.output_path);
    println!("About:    {}", instr.description);
    if let Some(ref text) = instr.instruction {
        println!("\n{}", text.trim_end());
    }

    if !instr.dependencies.is_empty() {
        println!("\nDepends on:");
        for dep in &instr.dependencies {
            let mark = if dep.done { "x" } else { " " };
            println!("  [{mark}] {} ({})", dep.id, dep.path);
        }
    }
    if !instr.unlocks.is_empty() {
        println!("\nUnlocks: {}", instr.unlocks.join(", "));
    }

    println!("\n--- template: {} ---", instr.template_path);
    print!("{}", instr.template_content);
    if !instr.template_content.ends_with('\n') {
        println!();
    }
    Ok(())
}
