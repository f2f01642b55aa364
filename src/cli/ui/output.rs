use console::style;

use crate::search::{Context, SearchStats};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Accepted fragments in stage order
    pub fn fragments(&self, context: &Context) {
        for (name, fragment) in context.iter() {
            self.section(name);
            println!("{}", fragment);
        }
    }

    pub fn stats(&self, stats: &SearchStats) {
        println!(
            "\n{}",
            style(format!(
                "{} generator calls, {} evaluator calls, {} pruned, {} backtracks, {} budget cutoffs",
                stats.generator_calls,
                stats.evaluator_calls,
                stats.candidates_pruned,
                stats.backtracks,
                stats.budget_cutoffs
            ))
            .dim()
        );
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
