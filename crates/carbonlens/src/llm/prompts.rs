//! Prompt templates for intent extraction.

use crate::store::DatasetStore;

/// Metric columns listed in a prompt before truncating.
const MAX_PROMPT_COLUMNS: usize = 80;

/// System prompt shared by every provider.
pub fn system_prompt() -> &'static str {
    r#"You are an intent extraction system for an emissions dataset.
Your only job is to turn a question into a JSON object describing what to compute.

Rules:
1. Output only valid JSON matching the requested shape.
2. Never compute numbers, never write code or SQL.
3. Only use metric names from the provided list.
4. If a field is ambiguous or absent, set it to null."#
}

/// Build the user prompt asking for a structured query intent.
pub fn intent_extraction_prompt(question: &str, store: &DatasetStore) -> String {
    let metrics: Vec<String> = store
        .metric_columns()
        .take(MAX_PROMPT_COLUMNS)
        .map(|c| match &c.unit {
            Some(unit) => format!("  - {} ({})", c.name, unit),
            None => format!("  - {}", c.name),
        })
        .collect();

    let span = store.year_span();

    format!(
        r#"## Available metrics
{}

## Years with data
{} to {}

## Question
"{}"

## Task
Extract the query intent. Respond in JSON format:
{{
    "metric": "one metric name from the list above",
    "entities": ["country or region names exactly as the user wrote them"],
    "start_year": 2000 or null,
    "end_year": 2020 or null,
    "aggregation": "average" | "sum" | "min" | "max" | "count" | "latest" | "trend",
    "comparison": true if the user compares two or more entities, otherwise false
}}

Use an empty list for "entities" when the question is about all countries.
Use "latest" when no aggregation is stated."#,
        metrics.join("\n"),
        span.start,
        span.end,
        question.replace('"', "'"),
    )
}
