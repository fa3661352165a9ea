use serde::Serialize;

/// Display classification of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTier {
    High,
    Medium,
    Low,
}

impl ScoreTier {
    /// Classify a score: >=80 high, 50..80 medium, below 50 low.
    ///
    /// Scores are trusted to be within [0, 100] but out-of-range input
    /// never panics; anything below 50 (including negatives) is low and
    /// anything at or above 80 is high.
    pub fn of(score: i32) -> ScoreTier {
        if score >= 80 {
            ScoreTier::High
        } else if score >= 50 {
            ScoreTier::Medium
        } else {
            ScoreTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreTier::High => "high",
            ScoreTier::Medium => "medium",
            ScoreTier::Low => "low",
        }
    }
}

impl std::fmt::Display for ScoreTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_boundary() {
        assert_eq!(ScoreTier::of(80), ScoreTier::High);
        assert_eq!(ScoreTier::of(100), ScoreTier::High);
        assert_eq!(ScoreTier::of(79), ScoreTier::Medium);
    }

    #[test]
    fn test_medium_boundary() {
        assert_eq!(ScoreTier::of(50), ScoreTier::Medium);
        assert_eq!(ScoreTier::of(49), ScoreTier::Low);
    }

    #[test]
    fn test_low() {
        assert_eq!(ScoreTier::of(0), ScoreTier::Low);
    }

    #[test]
    fn test_out_of_range_does_not_panic() {
        assert_eq!(ScoreTier::of(-20), ScoreTier::Low);
        assert_eq!(ScoreTier::of(1000), ScoreTier::High);
    }

    #[test]
    fn test_display() {
        assert_eq!(ScoreTier::of(92).to_string(), "high");
        assert_eq!(ScoreTier::of(60).to_string(), "medium");
        assert_eq!(ScoreTier::of(10).to_string(), "low");
    }
}
