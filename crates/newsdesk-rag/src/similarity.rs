/// Cosine similarity of two vectors, in `[-1, 1]`.
///
/// Returns 0.0 when the lengths differ or either vector has zero magnitude.
#[must_use]
pub fn cosine_similarity(u: &[f32], v: &[f32]) -> f64 {
    if u.len() != v.len() || u.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_u = 0.0_f64;
    let mut norm_v = 0.0_f64;
    for (a, b) in u.iter().zip(v) {
        let (a, b) = (f64::from(*a), f64::from(*b));
        dot += a * b;
        norm_u += a * a;
        norm_v += b * b;
    }

    if norm_u == 0.0 || norm_v == 0.0 {
        return 0.0;
    }
    (dot / (norm_u.sqrt() * norm_v.sqrt())).clamp(-1.0, 1.0)
}
