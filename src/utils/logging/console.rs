//! Console output utilities
//!
//! Formatted summaries printed by the command-line front end.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::schema::SymptomSchema;

/// Print row counts per category with a total line
pub fn print_category_counts(title: &str, counts: &BTreeMap<String, usize>) {
    let width = counts.keys().map(String::len).max().unwrap_or(0).max(5);
    println!("{title}:");
    for (category, count) in counts {
        println!("  {category:<width$}  {count:>6}");
    }
    println!("  {:<width$}  {:>6}", "Total", counts.values().sum::<usize>());
}

/// Print the schema size and its first `sample` symptoms
pub fn print_schema_summary(schema: &SymptomSchema, sample: usize) {
    println!("Symptom schema: {} symptoms", schema.len());
    let shown: Vec<&str> = schema.iter().take(sample).collect();
    if !shown.is_empty() {
        let more = schema.len().saturating_sub(shown.len());
        if more > 0 {
            println!("  {} ... (+{more} more)", shown.join(", "));
        } else {
            println!("  {}", shown.join(", "));
        }
    }
}

/// Print how long a command took
pub fn print_elapsed(what: &str, elapsed: Duration) {
    println!("{what} in {:.2}s", elapsed.as_secs_f64());
}
