//! Chroma normalization

use super::ChromaVector;

/// Scale `values` to unit L1 norm in place; returns the original sum
///
/// Vectors whose sum is not positive are left untouched.
pub fn l1_normalize(values: &mut [f64]) -> f64 {
    let sum: f64 = values.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        for v in values.iter_mut() {
            *v /= sum;
        }
    }
    sum
}

/// Clamp negative bins to zero and L1-normalize
///
/// The result sums to 1, or is all zeros when the input carries no energy.
pub fn normalize_chroma(chroma: &ChromaVector) -> ChromaVector {
    let mut out = *chroma;
    for v in out.iter_mut() {
        if !v.is_finite() || *v < 0.0 {
            *v = 0.0;
        }
    }
    let sum = l1_normalize(&mut out);
    if sum <= 0.0 || !sum.is_finite() {
        return [0.0; 12];
    }
    out
}
