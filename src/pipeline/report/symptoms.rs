use super::types::Prediction;
use crate::models::ScanMode;

/// Labels of the `top_k` most probable predictions, most probable first.
///
/// The sort is stable, so equal probabilities keep their input order.
pub fn extract_top_symptoms(predictions: &[Prediction], top_k: usize) -> Vec<String> {
    let mut ranked: Vec<&Prediction> = predictions.iter().collect();
    ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    ranked
        .into_iter()
        .take(top_k)
        .map(|p| p.label.clone())
        .collect()
}

/// Volumetric classifiers report a single finding; only its top label is used.
pub fn symptoms_for(predictions: &[Prediction], scan_mode: ScanMode, top_k: usize) -> Vec<String> {
    match scan_mode {
        ScanMode::Planar => extract_top_symptoms(predictions, top_k),
        ScanMode::Volumetric => extract_top_symptoms(predictions, 1),
    }
}
