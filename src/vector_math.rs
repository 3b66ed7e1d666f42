use std::cmp::Ordering;

/// Cosine similarity: dot product over the product of magnitudes.
///
/// A zero-magnitude side scores 0.0. Callers check dimensions first; a length
/// mismatch here also scores 0.0.
pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> f32 {
    if query.len() != candidate.len() || query.is_empty() {
        return 0.0;
    }

    let dot: f64 = query
        .iter()
        .zip(candidate.iter())
        .map(|(a, b)| (*a as f64) * (*b as f64))
        .sum();
    let query_norm = l2_norm(query);
    let candidate_norm = l2_norm(candidate);
    let denom = query_norm * candidate_norm;
    if denom <= f64::EPSILON {
        return 0.0;
    }

    (dot / denom).clamp(-1.0, 1.0) as f32
}

/// Score every candidate and order by descending similarity.
///
/// The sort is stable, so candidates with equal scores keep their input order.
pub fn rank_descending_by_cosine(query: &[f32], candidates: &[&[f32]]) -> Vec<(usize, f32)> {
    let mut scores: Vec<(usize, f32)> = candidates
        .iter()
        .enumerate()
        .map(|(idx, candidate)| (idx, cosine_similarity(query, candidate)))
        .collect();

    scores.sort_by(|left, right| right.1.partial_cmp(&left.1).unwrap_or(Ordering::Equal));
    scores
}

pub fn l2_norm(vector: &[f32]) -> f64 {
    vector
        .iter()
        .map(|x| (*x as f64) * (*x as f64))
        .sum::<f64>()
        .sqrt()
}
