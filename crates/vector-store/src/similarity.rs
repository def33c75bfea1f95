use crate::error::{Result, VectorStoreError};

/// `dot(a, b) / (|a| * |b|)`. Vectors of different length are rejected; a zero-magnitude
/// operand yields 0 instead of NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(VectorStoreError::InvalidDimension {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = magnitude(a);
    let norm_b = magnitude(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (norm_a * norm_b))
}

#[must_use]
pub fn magnitude(vector: &[f32]) -> f32 {
    vector.iter().map(|v| v * v).sum::<f32>().sqrt()
}

pub(crate) fn normalize(vec: &mut [f32]) {
    let norm = magnitude(vec);
    if norm == 0.0 {
        return;
    }
    for value in vec {
        *value /= norm;
    }
}
