use ndarray::Array1;
use std::cmp::Ordering;

use super::Prediction;

/// Numerically stable softmax: shifts by the max score before exponentiating.
pub fn softmax(scores: &Array1<f32>) -> Array1<f32> {
    if scores.is_empty() {
        return Array1::zeros(0);
    }
    let max = scores.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
    let exp = scores.mapv(|x| (x - max).exp());
    let sum = exp.sum();
    exp / sum
}

/// Pairs each probability with its label and sorts by descending confidence.
///
/// The sort is stable, so tied classes keep model-output order.
pub fn rank_predictions(labels: &[String], probabilities: &Array1<f32>) -> Vec<Prediction> {
    let mut ranked: Vec<Prediction> = labels
        .iter()
        .zip(probabilities.iter())
        .map(|(label, &confidence)| Prediction {
            label: label.clone(),
            confidence,
        })
        .collect();
    ranked.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(Ordering::Equal));
    ranked
}
