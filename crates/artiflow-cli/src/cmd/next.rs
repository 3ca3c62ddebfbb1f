use crate::output::print_json;
use std::path::Path;

pub fn run(root: &Path, change: &str, schema: Option<&str>, json: bool) -> anyhow::Result<()> {
    let ctx = super::load_change(root, change, schema)?;
    let ready = ctx.graph.next_artifacts(&ctx.completed);
    let complete = ctx.graph.is_complete(&ctx.completed);

    if json {
        return print_json(&serde_json::json!({
            "change": ctx.change_name,
            "ready": ready,
            "isComplete": complete,
        }));
    }

    if complete {
        println!("All artifacts for '{}' are complete.", ctx.change_name);
        return Ok(());
    }
    for id in &ready {
        let generates = ctx
            .graph
            .artifact(id)
            .map(|a| a.generates.as_str())
            .unwrap_or_default();
        println!("{id:<16} -> {generates}");
    }
    if let Some(first) = ready.first() {
        println!("\nNext: artiflow instructions {first} --change {}", ctx.change_name);
    }
    Ok(())
}
