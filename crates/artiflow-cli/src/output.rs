use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Left-aligned columns separated by two spaces, with a dashed rule under
/// the header. Trailing padding is trimmed from every line.
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    println!("{}", render_row(headers.iter(), &widths));
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", rule.join("  ").trim_end());
    for row in &rows {
        println!("{}", render_row(row.iter(), &widths));
    }
}

fn render_row<S: AsRef<str>>(cells: impl Iterator<Item = S>, widths: &[usize]) -> String {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &w)| format!("{:w$}", cell.as_ref()))
        .collect();
    line.join("  ").trim_end().to_string()
}
