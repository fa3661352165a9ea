use std::cmp::Ordering;

use serde::Serialize;

use super::types::TestResult;

// =============================================================================
// Columns & sort state
// =============================================================================

/// Sortable table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    ModelName,
    Correct,
    ResponseTime,
    Tokens,
    Answer,
    Score,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::ModelName => "model_name",
            Column::Correct => "correct",
            Column::ResponseTime => "response_time",
            Column::Tokens => "tokens",
            Column::Answer => "answer",
            Column::Score => "score",
        }
    }

    /// Natural comparator type for the column's cell text.
    pub fn data_type(&self) -> DataType {
        match self {
            Column::ModelName | Column::Correct | Column::Answer => DataType::Text,
            Column::ResponseTime | Column::Tokens | Column::Score => DataType::Number,
        }
    }
}

/// How a column's cell text is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Number,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> SortDirection {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Column + direction currently applied to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: Column,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        SortState {
            column: Column::Score,
            direction: SortDirection::Desc,
        }
    }
}

// =============================================================================
// Cell text
// =============================================================================

/// Displayed text for one cell, matching the rendered table. The sort
/// comparator works on this text, so display and ordering cannot drift
/// apart.
pub fn display_cell(result: &TestResult, column: Column) -> String {
    match column {
        Column::ModelName => {
            if result.model_name.is_empty() {
                "N/A".to_string()
            } else {
                result.model_name.clone()
            }
        }
        Column::Correct => if result.correct { "Yes" } else { "No" }.to_string(),
        Column::ResponseTime => format!("{:.2}s", result.response_time),
        Column::Tokens => result.token_usage.total().to_string(),
        Column::Answer => {
            if result.correct {
                result.answer.clone().unwrap_or_else(|| "N/A".to_string())
            } else {
                "N/A".to_string()
            }
        }
        Column::Score => result.score.to_string(),
    }
}

/// Leading numeric token of a cell, tolerating unit suffixes
/// ("1.23s" -> 1.23). NaN when the cell has no leading number; under
/// `f64::total_cmp` NaN orders after every number, so non-numeric cells
/// land together at the end of an ascending sort.
fn leading_number(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let mut end = 0;
    for (i, c) in trimmed.char_indices() {
        let numeric = c.is_ascii_digit() || c == '.' || ((c == '-' || c == '+') && i == 0);
        if !numeric {
            break;
        }
        end = i + c.len_utf8();
    }
    trimmed[..end].parse::<f64>().unwrap_or(f64::NAN)
}

// =============================================================================
// ResultStore
// =============================================================================

/// Ordered collection of canonical results.
///
/// `insert` appends in arrival order; `sort_by` reorders stably, so
/// repeated toggling on tie-heavy columns stays deterministic. The store
/// owns its results and the sort state exclusively.
#[derive(Debug, Default)]
pub struct ResultStore {
    results: Vec<TestResult>,
    sort: SortState,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result in arrival order.
    pub fn insert(&mut self, result: TestResult) {
        self.results.push(result);
    }

    /// Empty the collection and reset the sort state to its default.
    pub fn clear(&mut self) {
        self.results.clear();
        self.sort = SortState::default();
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    /// Sort the collection by `column`.
    ///
    /// Direction: `force` wins when given; otherwise a repeat sort on the
    /// current column flips direction, and a new column defaults to
    /// descending for score, ascending for everything else. The sort is
    /// stable: equal keys keep their relative order from before the call.
    pub fn sort_by(&mut self, column: Column, data_type: DataType, force: Option<SortDirection>) {
        let direction = match force {
            Some(direction) => direction,
            None if self.sort.column == column => self.sort.direction.flip(),
            None if column == Column::Score => SortDirection::Desc,
            None => SortDirection::Asc,
        };
        self.sort = SortState { column, direction };

        self.results.sort_by(|a, b| {
            let cell_a = display_cell(a, column);
            let cell_b = display_cell(b, column);
            let ordering = match data_type {
                DataType::Number => leading_number(&cell_a).total_cmp(&leading_number(&cell_b)),
                DataType::Text => compare_text(&cell_a, &cell_b),
            };
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    /// Re-apply the current sort state without toggling. Used for the
    /// final sort on completion and after bulk loads.
    pub fn resort(&mut self) {
        let SortState { column, direction } = self.sort;
        self.sort_by(column, column.data_type(), Some(direction));
    }
}

/// Case-insensitive text comparison on Unicode-lowercased strings.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::types::TokenUsage;

    fn result(model: &str, score: i32) -> TestResult {
        TestResult {
            model_name: model.into(),
            correct: true,
            response_time: 1.0,
            token_usage: TokenUsage { prompt: 10, completion: 5 },
            answer: Some("42".into()),
            score,
            response_text: String::new(),
            timestamp: None,
        }
    }

    fn names(store: &ResultStore) -> Vec<String> {
        store.results().iter().map(|r| r.model_name.clone()).collect()
    }

    #[test]
    fn test_insert_preserves_arrival_order() {
        let mut store = ResultStore::new();
        store.insert(result("A", 10));
        store.insert(result("B", 30));
        store.insert(result("C", 20));
        assert_eq!(names(&store), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_stable_sort_on_equal_keys() {
        let mut store = ResultStore::new();
        store.insert(result("A", 70));
        store.insert(result("B", 70));
        store.insert(result("C", 70));
        store.sort_by(Column::Score, DataType::Number, Some(SortDirection::Desc));
        assert_eq!(names(&store), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_reversal_on_distinct_keys() {
        let mut store = ResultStore::new();
        store.insert(result("A", 30));
        store.insert(result("B", 10));
        store.insert(result("C", 20));

        store.sort_by(Column::Score, DataType::Number, Some(SortDirection::Asc));
        let ascending = names(&store);
        assert_eq!(ascending, vec!["B", "C", "A"]);

        store.sort_by(Column::Score, DataType::Number, Some(SortDirection::Desc));
        let descending = names(&store);
        let mut reversed = ascending.clone();
        reversed.reverse();
        assert_eq!(descending, reversed);
    }

    #[test]
    fn test_first_sort_on_new_text_column_is_ascending() {
        let mut store = ResultStore::new();
        store.insert(result("beta", 10));
        store.insert(result("Alpha", 20));
        store.sort_by(Column::ModelName, DataType::Text, None);
        assert_eq!(store.sort_state().direction, SortDirection::Asc);
        // Case-insensitive: "Alpha" before "beta".
        assert_eq!(names(&store), vec!["Alpha", "beta"]);
    }

    #[test]
    fn test_first_sort_on_score_defaults_descending() {
        let mut store = ResultStore::new();
        store.insert(result("A", 10));
        store.insert(result("B", 30));
        // Move off the score column first, then sort score with no prior
        // state on that column.
        store.sort_by(Column::ModelName, DataType::Text, None);
        store.sort_by(Column::Score, DataType::Number, None);
        assert_eq!(store.sort_state().direction, SortDirection::Desc);
        assert_eq!(names(&store), vec!["B", "A"]);
    }

    #[test]
    fn test_repeat_sort_flips_direction() {
        let mut store = ResultStore::new();
        store.insert(result("A", 10));
        store.insert(result("B", 30));
        store.sort_by(Column::ModelName, DataType::Text, None);
        assert_eq!(store.sort_state().direction, SortDirection::Asc);
        store.sort_by(Column::ModelName, DataType::Text, None);
        assert_eq!(store.sort_state().direction, SortDirection::Desc);
        assert_eq!(names(&store), vec!["B", "A"]);
    }

    #[test]
    fn test_force_direction_wins_and_does_not_toggle() {
        let mut store = ResultStore::new();
        store.insert(result("A", 10));
        store.insert(result("B", 30));
        store.sort_by(Column::Score, DataType::Number, Some(SortDirection::Desc));
        store.sort_by(Column::Score, DataType::Number, Some(SortDirection::Desc));
        assert_eq!(store.sort_state().direction, SortDirection::Desc);
        assert_eq!(names(&store), vec!["B", "A"]);
    }

    #[test]
    fn test_numeric_sort_parses_unit_suffix() {
        let mut store = ResultStore::new();
        let mut slow = result("slow", 10);
        slow.response_time = 12.5;
        let mut fast = result("fast", 10);
        fast.response_time = 0.8;
        store.insert(slow);
        store.insert(fast);
        // "12.50s" vs "0.80s": numeric compare, not lexicographic.
        store.sort_by(Column::ResponseTime, DataType::Number, Some(SortDirection::Asc));
        assert_eq!(names(&store), vec!["fast", "slow"]);
    }

    #[test]
    fn test_non_numeric_cells_sort_after_numbers() {
        let mut store = ResultStore::new();
        let mut wrong = result("wrong", 10);
        wrong.correct = false; // answer cell renders "N/A"
        let mut right = result("right", 10);
        right.answer = Some("7".into());
        store.insert(wrong);
        store.insert(right);
        store.sort_by(Column::Answer, DataType::Number, Some(SortDirection::Asc));
        assert_eq!(names(&store), vec!["right", "wrong"]);
    }

    #[test]
    fn test_clear_resets_sort_state() {
        let mut store = ResultStore::new();
        store.insert(result("A", 10));
        store.sort_by(Column::ModelName, DataType::Text, None);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.sort_state(), SortState::default());
    }

    #[test]
    fn test_resort_keeps_direction() {
        let mut store = ResultStore::new();
        store.insert(result("A", 10));
        store.insert(result("B", 30));
        store.sort_by(Column::Score, DataType::Number, Some(SortDirection::Desc));
        store.insert(result("C", 20));
        store.resort();
        assert_eq!(store.sort_state().direction, SortDirection::Desc);
        assert_eq!(names(&store), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_display_cell_rendering() {
        let mut r = result("Model One", 87);
        r.response_time = 1.234;
        assert_eq!(display_cell(&r, Column::ModelName), "Model One");
        assert_eq!(display_cell(&r, Column::Correct), "Yes");
        assert_eq!(display_cell(&r, Column::ResponseTime), "1.23s");
        assert_eq!(display_cell(&r, Column::Tokens), "15");
        assert_eq!(display_cell(&r, Column::Answer), "42");
        assert_eq!(display_cell(&r, Column::Score), "87");
    }

    #[test]
    fn test_display_cell_incorrect_hides_answer() {
        let mut r = result("M", 0);
        r.correct = false;
        assert_eq!(display_cell(&r, Column::Correct), "No");
        assert_eq!(display_cell(&r, Column::Answer), "N/A");
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("1.23s"), 1.23);
        assert_eq!(leading_number("150"), 150.0);
        assert_eq!(leading_number("-5"), -5.0);
        assert_eq!(leading_number("  42 tokens"), 42.0);
        assert!(leading_number("N/A").is_nan());
        assert!(leading_number("").is_nan());
    }
}
