use anyhow::ensure;
use serde::Serialize;
use tract_onnx::prelude::*;

use crate::labels::ClassTable;

/// Exponentiate and normalize. The max is subtracted first so large logits do not overflow.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, new)]
pub struct Prediction {
    pub id: usize,
    pub label: String,
    pub probability: f32,
}

impl Prediction {
    pub fn percent(&self) -> f32 {
        self.probability * 100.0
    }
}

/// Every class with its probability, most likely first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predictions(Vec<Prediction>);

impl Predictions {
    pub fn new(logits: &[f32], labels: &ClassTable) -> TractResult<Predictions> {
        ensure!(
            logits.len() == labels.len(),
            "Network scores {} classes, label table has {}",
            logits.len(),
            labels.len()
        );
        ensure!(logits.iter().all(|l| l.is_finite()), "Non-finite value in network output");
        let mut predictions: Vec<Prediction> = softmax(logits)
            .into_iter()
            .zip(labels.iter())
            .map(|(probability, (id, label))| Prediction::new(id, label.to_string(), probability))
            .collect();
        // stable: equal probabilities stay in class id order
        predictions.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        Ok(Predictions(predictions))
    }

    pub fn top(&self, k: usize) -> &[Prediction] {
        &self.0[..k.min(self.0.len())]
    }

    pub fn best(&self) -> Option<&Prediction> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prediction> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::collection::vec;
    use proptest::prelude::*;

    fn labels(n: usize) -> ClassTable {
        ClassTable::from_labels((0..n).map(|i| format!("class {i}")))
    }

    #[test]
    fn softmax_known_values() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        assert_abs_diff_eq!(p[0], 0.09003057, epsilon = 1e-6);
        assert_abs_diff_eq!(p[1], 0.24472848, epsilon = 1e-6);
        assert_abs_diff_eq!(p[2], 0.66524094, epsilon = 1e-6);
        assert!(softmax(&[]).is_empty());
    }

    #[test]
    fn softmax_survives_huge_logits() {
        let p = softmax(&[1000.0, 1000.0, -1000.0]);
        assert_abs_diff_eq!(p[0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(p[1], 0.5, epsilon = 1e-6);
        assert_eq!(p[2], 0.0);
    }

    #[test]
    fn ranking_joins_labels() -> TractResult<()> {
        let table = ClassTable::from_labels(["cat", "dog", "fox"]);
        let predictions = Predictions::new(&[0.5, 3.0, -1.0], &table)?;
        let order: Vec<&str> = predictions.iter().map(|p| &*p.label).collect();
        assert_eq!(order, ["dog", "cat", "fox"]);
        assert_eq!(predictions.best().map(|p| p.id), Some(1));
        Ok(())
    }

    #[test]
    fn ties_keep_class_order() -> TractResult<()> {
        let predictions = Predictions::new(&[0.0, 2.0, 0.0, 2.0, 0.0], &labels(5))?;
        let ids: Vec<usize> = predictions.iter().map(|p| p.id).collect();
        assert_eq!(ids, [1, 3, 0, 2, 4]);
        Ok(())
    }

    #[test]
    fn top_is_clamped() -> TractResult<()> {
        let predictions = Predictions::new(&[0.1, 0.2, 0.3], &labels(3))?;
        assert_eq!(predictions.top(10).len(), 3);
        assert_eq!(predictions.top(2).len(), 2);
        assert!(predictions.top(0).is_empty());
        Ok(())
    }

    #[test]
    fn mismatched_label_count() {
        assert!(Predictions::new(&[0.1; 1000], &labels(999)).is_err());
    }

    #[test]
    fn non_finite_logits_are_rejected() {
        assert!(Predictions::new(&[0.1, f32::NAN], &labels(2)).is_err());
        assert!(Predictions::new(&[f32::INFINITY, 0.0, 1.0], &labels(3)).is_err());
        assert!(Predictions::new(&[0.0, f32::NEG_INFINITY, 1.0], &labels(3)).is_err());
    }

    #[test]
    fn serializes_top_k() -> TractResult<()> {
        let predictions = Predictions::new(&[0.0, 0.0], &ClassTable::from_labels(["a", "b"]))?;
        let json = serde_json::to_string(predictions.top(1))?;
        assert_eq!(json, r#"[{"id":0,"label":"a","probability":0.5}]"#);
        Ok(())
    }

    proptest! {
        #[test]
        fn softmax_is_a_distribution(logits in vec(-50f32..50f32, 1..1000)) {
            let p = softmax(&logits);
            prop_assert_eq!(p.len(), logits.len());
            prop_assert!(p.iter().all(|&x| (0.0..=1.0).contains(&x)));
            let sum: f32 = p.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-4, "sum is {}", sum);
        }

        #[test]
        fn ranking_is_sorted(logits in vec(-20f32..20f32, 1..1000)) {
            let predictions = Predictions::new(&logits, &labels(logits.len())).unwrap();
            let top = predictions.top(10);
            prop_assert!(top.windows(2).all(|w| w[0].probability >= w[1].probability));
            let stable =
                top.windows(2).all(|w| w[0].probability > w[1].probability || w[0].id < w[1].id);
            prop_assert!(stable, "ties out of id order");
            let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            prop_assert!(max - logits[top[0].id] < 1e-4);
        }
    }
}
