//! Ask command - answer one question from the terminal.

use std::fmt;
use std::path::PathBuf;

use colored::Colorize;

use carbonlens::{QueryAnswer, QueryError, ResultValue};

use crate::cli::ExtractionArgs;
use crate::server::handlers::QueryResponse;

/// A query failure that has already been printed.
///
/// `main` exits non-zero on it without printing it again.
#[derive(Debug)]
pub struct Reported;

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("query could not be answered")
    }
}

impl std::error::Error for Reported {}

pub fn run(
    data: PathBuf,
    question: String,
    json_output: bool,
    extraction: ExtractionArgs,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = super::build_pipeline(&data, &extraction)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let outcome = runtime.block_on(pipeline.answer(&question));

    report(outcome, json_output, verbose)
}

fn report(
    outcome: Result<QueryAnswer, QueryError>,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match outcome {
        Ok(answer) if json_output => {
            let response = QueryResponse::from(answer);
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Ok(answer) => {
            print_answer(&answer, verbose);
            Ok(())
        }
        Err(e) => {
            if json_output {
                let body = serde_json::json!({
                    "success": false,
                    "error_kind": e.kind(),
                    "detail": e.rejection().map(|r| r.detail.clone()).unwrap_or_else(|| e.to_string()),
                    "suggestions": e.rejection().map(|r| r.suggestions.clone()).unwrap_or_default(),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                print_rejection(&e);
            }
            Err(Box::new(Reported))
        }
    }
}

fn print_answer(answer: &QueryAnswer, verbose: bool) {
    println!("{}", answer.summary.white().bold());
    println!();
    println!("  {} {}", "Query:".cyan(), answer.query_used);

    match &answer.result.value {
        ResultValue::Comparison(entries) => {
            for entry in entries {
                let value = entry
                    .value
                    .map(|v| format!("{:.2}", v))
                    .unwrap_or_else(|| "no data".dimmed().to_string());
                println!("  {:30} {}", entry.entity, value);
            }
        }
        ResultValue::Series(points) if verbose => {
            for point in points {
                println!("  {:6} {:.2}", point.year, point.value);
            }
        }
        _ => {}
    }

    let stats = &answer.statistics;
    if let (Some(min), Some(max), Some(mean)) = (stats.min, stats.max, stats.mean) {
        println!(
            "  {} {} values, min {:.2}, max {:.2}, mean {:.2}",
            "Data:".cyan(),
            stats.count,
            min,
            max,
            mean
        );
    }

    for note in &answer.notes {
        println!("  {} {}", "Note:".yellow(), note);
    }
    if answer.origin.is_fallback() {
        println!("  {} LLM extraction failed; used rule-based extraction", "Note:".yellow());
    }
}

fn print_rejection(error: &QueryError) {
    println!("{} {}", "Cannot answer:".red().bold(), error.kind());
    if let Some(rejection) = error.rejection() {
        println!("  {}", rejection.detail);
        if !rejection.suggestions.is_empty() {
            println!(
                "  {} {}",
                "Did you mean:".yellow(),
                rejection.suggestions.join(", ")
            );
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_is_reported_once() {
        for json_output in [false, true] {
            let err = report(Err(QueryError::EmptyQuestion), json_output, false).unwrap_err();
            assert!(err.is::<Reported>());
        }
    }
}
