use std::fmt;
use std::time::Duration;

/// Default number of candidates kept per test image.
pub const TOP_K: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub category: String,
    pub filename: String,
    pub score: f32,
}

/// Ranked candidates for one test image, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    pub category: String,
    pub filename: String,
    pub candidates: Vec<ScoredCandidate>,
}

impl RecognitionResult {

    pub fn best(&self) -> Option<&ScoredCandidate> {
        self.candidates.first()
    }

    /// Whether the best candidate carries the test image's own label.
    pub fn is_top1_hit(&self) -> bool {
        self.best().map_or(false, |best| best.category == self.category)
    }
}

impl fmt::Display for RecognitionResult {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test Image: {}/{}", self.category, self.filename)?;
        for candidate in &self.candidates {
            writeln!(f, "  Recognized as: {}/{} (Score: {})", candidate.category, candidate.filename, candidate.score)?;
        }
        writeln!(f)
    }
}

/// Sort by score, highest first, and keep `top_k`.
///
/// The sort is stable so equal scores stay in the order they were produced in.
pub fn rank(mut scores: Vec<ScoredCandidate>, top_k: usize) -> Vec<ScoredCandidate> {
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    scores.truncate(top_k);
    scores
}

/// Totals over a whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub recognized: usize,
    pub failed: usize,
    pub skipped: usize,
    pub top1_hits: usize,
    pub elapsed: Duration,
}

impl Summary {

    pub fn record(&mut self, result: &RecognitionResult, elapsed: Duration) {
        self.total += 1;
        self.recognized += 1;
        if result.is_top1_hit() {
            self.top1_hits += 1;
        }
        self.elapsed += elapsed;
    }

    pub fn record_failure(&mut self, elapsed: Duration) {
        self.total += 1;
        self.failed += 1;
        self.elapsed += elapsed;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    pub fn top1_accuracy(&self) -> f64 {
        if self.recognized == 0 {
            0.0
        } else {
            self.top1_hits as f64 / self.recognized as f64
        }
    }

    pub fn average_millis(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.elapsed.as_secs_f64() * 1000.0 / self.total as f64
        }
    }
}

impl fmt::Display for Summary {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "total: {}, recognized: {}, failed: {}, skipped: {}, top1_hits: {}, top1_accuracy: {:.4}, average_ms: {:.2}",
            self.total, self.recognized, self.failed, self.skipped, self.top1_hits,
            self.top1_accuracy(), self.average_millis())
    }
}


#[cfg(test)]
mod test {

    use std::time::Duration;

    use super::{rank, RecognitionResult, ScoredCandidate, Summary, TOP_K};

    fn candidate(category: &str, filename: &str, score: f32) -> ScoredCandidate {
        ScoredCandidate { category: category.to_string(), filename: filename.to_string(), score }
    }

    #[test]
    fn ranks_descending_and_keeps_top_k() {
        let scores = vec![
            candidate("A", "a.png", 0.2),
            candidate("B", "b.png", 0.9),
            candidate("C", "c.png", -0.3),
            candidate("D", "d.png", 0.5),
            candidate("E", "e.png", 0.7),
            candidate("F", "f.png", 0.1),
            candidate("G", "g.png", 0.8),
        ];
        let ranked = rank(scores, TOP_K);
        let order: Vec<&str> = ranked.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(order, vec!["B", "G", "E", "D", "A"]);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn short_and_empty_lists() {
        let ranked = rank(vec![candidate("A", "a.png", 0.4), candidate("B", "b.png", 0.6)], TOP_K);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].category, "B");
        assert!(rank(Vec::new(), TOP_K).is_empty());
    }

    #[test]
    fn ties_keep_insertion_order() {
        let scores = vec![
            candidate("A", "1.png", 0.5),
            candidate("B", "2.png", 0.5),
            candidate("C", "3.png", 0.9),
            candidate("D", "4.png", 0.5),
        ];
        for _ in 0..3 {
            let ranked = rank(scores.clone(), TOP_K);
            let order: Vec<&str> = ranked.iter().map(|c| c.category.as_str()).collect();
            assert_eq!(order, vec!["C", "A", "B", "D"]);
        }
    }

    #[test]
    fn report_block_format() {
        let result = RecognitionResult {
            category: "A".to_string(),
            filename: "plate_word2.png".to_string(),
            candidates: vec![candidate("A", "a.png", 0.75), candidate("R", "r.png", 0.5)],
        };
        assert_eq!(result.to_string(),
            "Test Image: A/plate_word2.png\n  Recognized as: A/a.png (Score: 0.75)\n  Recognized as: R/r.png (Score: 0.5)\n\n");
        assert!(result.is_top1_hit());
    }

    #[test]
    fn summary_counts() {
        let hit = RecognitionResult {
            category: "A".to_string(),
            filename: "x_word2.png".to_string(),
            candidates: vec![candidate("A", "a.png", 0.9)],
        };
        let miss = RecognitionResult { category: "B".to_string(), ..hit.clone() };
        let empty = RecognitionResult { candidates: Vec::new(), ..hit.clone() };

        let mut summary = Summary::default();
        summary.record(&hit, Duration::from_millis(4));
        summary.record(&miss, Duration::from_millis(2));
        summary.record(&empty, Duration::from_millis(3));
        summary.record_failure(Duration::from_millis(3));
        summary.record_skip();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.recognized, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.top1_hits, 1);
        assert!((summary.top1_accuracy() - 1.0 / 3.0).abs() < 1e-9);
        assert!((summary.average_millis() - 3.0).abs() < 1e-9);
    }
}
