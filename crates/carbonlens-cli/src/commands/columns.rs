//! Columns command - list the dataset schema.

use std::path::PathBuf;

use colored::Colorize;

use carbonlens::{DatasetStore, StoreConfig};

pub fn run(data: PathBuf, json_output: bool, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !data.exists() {
        return Err(format!("Dataset not found: {}", data.display()).into());
    }

    let store = DatasetStore::load(&data, &StoreConfig::default())?;
    let source = store.metadata();

    if json_output {
        let listing = serde_json::json!({
            "source": source,
            "entity_column": store.entity_column(),
            "year_column": store.year_column(),
            "columns": store.columns(),
        });
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!(
        "{} {} ({} rows, {} entities, {})",
        "Columns of".cyan().bold(),
        source.file.white(),
        source.row_count,
        source.entity_count,
        source.year_span
    );
    println!();

    for column in store.columns() {
        let role = if column.name == store.entity_column() {
            "entity".blue().to_string()
        } else if column.name == store.year_column() {
            "year".blue().to_string()
        } else if column.is_metric() {
            "metric".green().to_string()
        } else {
            "text".dimmed().to_string()
        };
        println!(
            "  {:32} {:8} {}",
            column.name,
            role,
            column.unit_or_empty().dimmed()
        );
        if verbose {
            println!("  {:32} {} values present", "", column.present_count);
        }
    }

    println!();
    println!("{} metric columns", store.metric_columns().count().to_string().white().bold());
    Ok(())
}
