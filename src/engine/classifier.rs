//! Classifier capability and the linear pipeline implementation.
//!
//! The serving path only ever sees `dyn Classifier`; the registry client is
//! the one place that knows how a concrete model gets built.

use super::error::InferenceError;

/// A loaded model: maps a fixed-width feature vector to a class label.
pub trait Classifier: Send + Sync {
    /// Number of features each input vector must carry.
    fn input_width(&self) -> usize;

    /// Predict the class label for a single feature vector.
    ///
    /// Callers validate the width first; implementations may assume
    /// `features.len() == self.input_width()`.
    fn predict(&self, features: &[f64]) -> Result<i64, InferenceError>;
}

/// Per-feature standardization: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Standardizer {
    fn apply(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| {
                // Constant features are exported with scale 0.
                let s = if *s == 0.0 { 1.0 } else { *s };
                (x - m) / s
            })
            .collect()
    }
}

/// Standardizer followed by a (multinomial or binary) linear decision function.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearClassifier {
    n_features: usize,
    classes: Vec<i64>,
    scaler: Option<Standardizer>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
}

impl LinearClassifier {
    /// Build from already-validated parts. See `models::ModelArtifact`.
    pub(crate) fn from_parts(
        n_features: usize,
        classes: Vec<i64>,
        scaler: Option<Standardizer>,
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
    ) -> Self {
        Self { n_features, classes, scaler, coef, intercept }
    }

    /// Labels this model can emit.
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn decision_scores(&self, features: &[f64]) -> Vec<f64> {
        let scaled;
        let x = match &self.scaler {
            Some(scaler) => {
                scaled = scaler.apply(features);
                scaled.as_slice()
            }
            None => features,
        };

        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + b)
            .collect()
    }
}

impl Classifier for LinearClassifier {
    fn input_width(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<i64, InferenceError> {
        let scores = self.decision_scores(features);
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(InferenceError::ModelError(
                "decision function produced a non-finite score".into(),
            ));
        }

        // Binary models export a single row: positive score selects classes[1].
        let idx = if scores.len() == 1 {
            usize::from(scores[0] > 0.0)
        } else {
            scores
                .iter()
                .enumerate()
                .fold((0usize, f64::NEG_INFINITY), |best, (i, s)| {
                    if *s > best.1 {
                        (i, *s)
                    } else {
                        best
                    }
                })
                .0
        };

        self.classes.get(idx).copied().ok_or_else(|| {
            InferenceError::ModelError(format!("class index {} out of range", idx))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_class() -> LinearClassifier {
        LinearClassifier::from_parts(
            2,
            vec![0, 1, 2],
            None,
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, -1.0]],
            vec![0.0, 0.0, 0.0],
        )
    }

    #[test]
    fn test_argmax_selects_highest_score() {
        let model = three_class();
        assert_eq!(model.predict(&[5.0, 1.0]).unwrap(), 0);
        assert_eq!(model.predict(&[1.0, 5.0]).unwrap(), 1);
        assert_eq!(model.predict(&[-5.0, -5.0]).unwrap(), 2);
    }

    #[test]
    fn test_binary_uses_sign_of_single_row() {
        let model = LinearClassifier::from_parts(1, vec![7, 9], None, vec![vec![2.0]], vec![-1.0]);
        assert_eq!(model.predict(&[1.0]).unwrap(), 9);
        assert_eq!(model.predict(&[0.0]).unwrap(), 7);
    }

    #[test]
    fn test_standardizer_applied_before_linear_step() {
        let scaler = Standardizer { mean: vec![10.0], scale: vec![2.0] };
        let model =
            LinearClassifier::from_parts(1, vec![0, 1], Some(scaler), vec![vec![1.0]], vec![0.0]);
        // (11 - 10) / 2 = 0.5 > 0
        assert_eq!(model.predict(&[11.0]).unwrap(), 1);
        // (9 - 10) / 2 = -0.5
        assert_eq!(model.predict(&[9.0]).unwrap(), 0);
    }

    #[test]
    fn test_zero_scale_treated_as_unit() {
        let scaler = Standardizer { mean: vec![1.0], scale: vec![0.0] };
        let model =
            LinearClassifier::from_parts(1, vec![0, 1], Some(scaler), vec![vec![1.0]], vec![0.0]);
        assert_eq!(model.predict(&[3.0]).unwrap(), 1);
    }

    #[test]
    fn test_nan_input_is_an_error_not_a_label() {
        let model = three_class();
        let err = model.predict(&[f64::NAN, 1.0]).unwrap_err();
        assert!(matches!(err, InferenceError::ModelError(_)));
    }
}
