//! Serve command - run the query API.

use std::net::SocketAddr;
use std::path::PathBuf;

use colored::Colorize;

use crate::cli::ExtractionArgs;
use crate::server::{app, state::AppState};

pub fn run(
    data: PathBuf,
    host: String,
    port: u16,
    extraction: ExtractionArgs,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| format!("Invalid address {}:{}: {}", host, port, e))?;

    // A dataset that fails to load is fatal: no traffic is served.
    let pipeline = super::build_pipeline(&data, &extraction)?;
    let store = pipeline.store().snapshot();
    let source = store.metadata();

    let mut state = AppState::new(pipeline);
    if extraction.strategy() == carbonlens::ExtractionStrategy::Delegated {
        state = state.with_llm_name(extraction.llm.to_string());
    }

    println!();
    println!(
        "{} {}",
        "Serving CarbonLens at".cyan().bold(),
        format!("http://{}", addr).white().bold()
    );
    println!();
    println!("  Dataset:   {}", data.display());
    println!(
        "  Rows:      {} ({} entities, {} columns, {})",
        source.row_count, source.entity_count, source.column_count, source.year_span
    );
    if source.skipped_rows > 0 {
        println!(
            "  {} {} rows skipped while loading",
            "Note:".yellow(),
            source.skipped_rows
        );
    }
    println!("  Extractor: {}", extraction.strategy());
    if verbose {
        println!("  Hash:      {}", source.hash);
    }
    println!();
    println!("Press {} to stop the server", "Ctrl+C".yellow().bold());
    println!();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(app::run_server(state, addr))?;

    println!("{}", "Server stopped.".yellow());
    Ok(())
}
