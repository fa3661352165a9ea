use crate::run::score::ScoreTier;
use crate::run::store::{display_cell, Column, SortState};
use crate::run::types::{ProgressSnapshot, RunState, TestResult};

/// Rendering collaborator for the ordered results collection. The core
/// never depends on a concrete display surface; it hands ordered slices
/// to whatever implements this.
pub trait ResultView {
    /// Render the full ordered table.
    fn render_results(&mut self, results: &[TestResult], sort: &SortState);

    /// Render one newly arrived result.
    fn render_result(&mut self, result: &TestResult);

    /// Render a progress update for the run in flight.
    fn render_progress(&mut self, progress: &ProgressSnapshot);

    /// Render a run state change.
    fn render_state(&mut self, state: RunState, message: Option<&str>);

    /// Render a per-model failure that did not stop the run.
    fn render_soft_error(&mut self, model_name: &str, message: &str);
}

/// Rendering collaborator for a single result's full response text. The
/// web frontend rendered markdown and math here; the console keeps the
/// text as-is.
pub trait ResponseRenderer {
    fn render_response(&self, raw: &str) -> String;
}

const TABLE_COLUMNS: [Column; 6] = [
    Column::ModelName,
    Column::Correct,
    Column::ResponseTime,
    Column::Tokens,
    Column::Answer,
    Column::Score,
];

const COLUMN_WIDTHS: [usize; 6] = [42, 8, 10, 8, 14, 6];

/// Plain-stdout implementation of both rendering collaborators.
#[derive(Debug, Default)]
pub struct ConsoleView;

impl ConsoleView {
    pub fn new() -> ConsoleView {
        ConsoleView
    }

    fn row(result: &TestResult) -> String {
        let mut cells = Vec::with_capacity(TABLE_COLUMNS.len() + 1);
        for (column, width) in TABLE_COLUMNS.iter().zip(COLUMN_WIDTHS) {
            cells.push(format!("{:<width$}", display_cell(result, *column)));
        }
        cells.push(ScoreTier::of(result.score).to_string());
        cells.join("  ")
    }

    fn header() -> String {
        let titles = ["model", "correct", "time", "tokens", "answer", "score"];
        let mut cells = Vec::with_capacity(titles.len() + 1);
        for (title, width) in titles.iter().zip(COLUMN_WIDTHS) {
            cells.push(format!("{title:<width$}"));
        }
        cells.push("tier".to_string());
        cells.join("  ")
    }
}

impl ResultView for ConsoleView {
    fn render_results(&mut self, results: &[TestResult], sort: &SortState) {
        if results.is_empty() {
            println!("No results yet.");
            return;
        }
        println!("{}", Self::header());
        for result in results {
            println!("{}", Self::row(result));
        }
        println!(
            "{} results, sorted by {} ({})",
            results.len(),
            sort.column.as_str(),
            sort.direction.as_str()
        );
    }

    fn render_result(&mut self, result: &TestResult) {
        println!("{}", Self::row(result));
    }

    fn render_progress(&mut self, progress: &ProgressSnapshot) {
        println!(
            "[{:>5.1}%] {}/{} done | elapsed {:.1}s | remaining {:.1}s | last: {}",
            progress.percent_complete(),
            progress.completed,
            progress.total,
            progress.elapsed_seconds,
            progress.estimated_remaining_seconds,
            progress.current_model_name.as_deref().unwrap_or("none"),
        );
    }

    fn render_state(&mut self, state: RunState, message: Option<&str>) {
        match message {
            Some(message) => println!("== run {state}: {message}"),
            None => println!("== run {state}"),
        }
    }

    fn render_soft_error(&mut self, model_name: &str, message: &str) {
        println!("!! {model_name} failed: {message}");
    }
}

impl ResponseRenderer for ConsoleView {
    fn render_response(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            "No response text available.".to_string()
        } else {
            trimmed.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::types::TokenUsage;

    #[test]
    fn test_render_response_defaults_when_empty() {
        let view = ConsoleView::new();
        assert_eq!(view.render_response("   "), "No response text available.");
        assert_eq!(view.render_response("hello\n"), "hello");
    }

    #[test]
    fn test_row_contains_all_cells() {
        let result = TestResult {
            model_name: "Model One".into(),
            correct: true,
            response_time: 1.234,
            token_usage: TokenUsage { prompt: 100, completion: 50 },
            answer: Some("42".into()),
            score: 87,
            response_text: "ok".into(),
            timestamp: None,
        };
        let row = ConsoleView::row(&result);
        assert!(row.contains("Model One"));
        assert!(row.contains("Yes"));
        assert!(row.contains("1.23s"));
        assert!(row.contains("150"));
        assert!(row.contains("42"));
        assert!(row.contains("87"));
        assert!(row.ends_with("high"));
    }
}
