//! Per-tile classification results.

use std::collections::HashSet;

use super::TileError;

/// Class probabilities for one tile.
///
/// Classes keep the order they were declared in and names are unique. The
/// top class is the first class holding the maximum probability; NaN
/// probabilities never win.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    probabilities: Vec<(String, f64)>,
    top: Option<usize>,
}

impl ClassificationResult {
    /// Creates a result from `(class, probability)` pairs in declared order.
    pub fn new<I, S>(probabilities: I) -> Result<Self, TileError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let probabilities: Vec<(String, f64)> = probabilities
            .into_iter()
            .map(|(name, p)| (name.into(), p))
            .collect();

        let mut seen = HashSet::with_capacity(probabilities.len());
        for (name, _) in &probabilities {
            if !seen.insert(name.as_str()) {
                return Err(TileError::DuplicateClass(name.clone()));
            }
        }

        let mut top: Option<usize> = None;
        for (index, (_, p)) in probabilities.iter().enumerate() {
            if p.is_nan() {
                continue;
            }
            match top {
                Some(best) if *p <= probabilities[best].1 => {}
                _ => top = Some(index),
            }
        }

        Ok(Self { probabilities, top })
    }

    /// Creates a result from raw model scores.
    ///
    /// When `apply_softmax` is set the scores are treated as logits and
    /// normalised; otherwise they are used as probabilities directly.
    pub fn from_scores(
        class_names: &[String],
        scores: &[f32],
        apply_softmax: bool,
    ) -> Result<Self, TileError> {
        if class_names.len() != scores.len() {
            return Err(TileError::ScoreCountMismatch {
                expected: class_names.len(),
                actual: scores.len(),
            });
        }

        let values: Vec<f64> = if apply_softmax {
            softmax(scores)
        } else {
            scores.iter().map(|&s| s as f64).collect()
        };

        Self::new(class_names.iter().cloned().zip(values))
    }

    /// Returns the probability for a class, if present.
    pub fn probability(&self, class: &str) -> Option<f64> {
        self.probabilities
            .iter()
            .find(|(name, _)| name == class)
            .map(|(_, p)| *p)
    }

    /// Returns the most probable class name.
    pub fn top_class(&self) -> Option<&str> {
        self.top.map(|i| self.probabilities[i].0.as_str())
    }

    /// Returns the probability of the top class.
    pub fn top_probability(&self) -> Option<f64> {
        self.top.map(|i| self.probabilities[i].1)
    }

    /// Iterates `(class, probability)` pairs in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.probabilities.iter().map(|(n, p)| (n.as_str(), *p))
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    /// Returns true if there are no classes.
    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

fn softmax(scores: &[f32]) -> Vec<f64> {
    let max = scores
        .iter()
        .map(|&s| s as f64)
        .fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|&s| (s as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_keeps_declared_order() {
        let result =
            ClassificationResult::new([("tumor", 0.2), ("stroma", 0.7), ("other", 0.1)]).unwrap();
        let order: Vec<&str> = result.iter().map(|(n, _)| n).collect();
        assert_eq!(order, vec!["tumor", "stroma", "other"]);
        assert_eq!(result.top_class(), Some("stroma"));
        assert_eq!(result.top_probability(), Some(0.7));
        assert_eq!(result.probability("other"), Some(0.1));
        assert_eq!(result.probability("missing"), None);
    }

    #[test]
    fn test_tie_goes_to_first_declared() {
        let result = ClassificationResult::new([("a", 0.5), ("b", 0.5)]).unwrap();
        assert_eq!(result.top_class(), Some("a"));
    }

    #[test]
    fn test_nan_never_wins() {
        let result = ClassificationResult::new([("a", f64::NAN), ("b", 0.1)]).unwrap();
        assert_eq!(result.top_class(), Some("b"));

        let all_nan = ClassificationResult::new([("a", f64::NAN)]).unwrap();
        assert_eq!(all_nan.top_class(), None);
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let result = ClassificationResult::new([("a", 0.5), ("a", 0.5)]);
        assert_eq!(result, Err(TileError::DuplicateClass("a".to_string())));
    }

    #[test]
    fn test_empty_result() {
        let result = ClassificationResult::new(Vec::<(String, f64)>::new()).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.top_class(), None);
    }

    #[test]
    fn test_from_scores_softmax() {
        let result =
            ClassificationResult::from_scores(&names(&["a", "b"]), &[0.0, 0.0], true).unwrap();
        assert!((result.probability("a").unwrap() - 0.5).abs() < 1e-12);

        let result =
            ClassificationResult::from_scores(&names(&["a", "b", "c"]), &[1.0, 3.0, 2.0], true)
                .unwrap();
        let total: f64 = result.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(result.top_class(), Some("b"));
    }

    #[test]
    fn test_from_scores_softmax_large_logits_stable() {
        let result =
            ClassificationResult::from_scores(&names(&["a", "b"]), &[1000.0, 999.0], true)
                .unwrap();
        assert!(result.probability("a").unwrap().is_finite());
        assert_eq!(result.top_class(), Some("a"));
    }

    #[test]
    fn test_from_scores_without_softmax() {
        let result =
            ClassificationResult::from_scores(&names(&["a", "b"]), &[0.25, 0.75], false).unwrap();
        assert_eq!(result.probability("b"), Some(0.75));
    }

    #[test]
    fn test_from_scores_count_mismatch() {
        let result = ClassificationResult::from_scores(&names(&["a", "b"]), &[1.0], true);
        assert_eq!(
            result,
            Err(TileError::ScoreCountMismatch {
                expected: 2,
                actual: 1
            })
        );
    }
}
