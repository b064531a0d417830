//! Text form of embedding vectors.
//!
//! Vectors leave the store as `[0.12, -0.5, ...]`. Other tools write the same
//! vector space-separated (`[0.12 -0.5 ...]`), so parsing accepts commas,
//! whitespace, or both between components.

use crate::error::{DecodeFault, DecodeFaultKind};

/// Render a vector as `[v1, v2, ...]`.
pub fn format_vector(values: &[f64]) -> String {
    let mut out = String::with_capacity(values.len() * 12 + 2);
    out.push('[');
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&v.to_string());
    }
    out.push(']');
    out
}

/// Parse a vector of exactly `dimension` components.
///
/// The returned fault has position 0; callers attach the row position with
/// [`DecodeFault::at`].
pub fn parse_vector(text: &str, dimension: usize) -> Result<Vec<f64>, DecodeFault> {
    let inner = text
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']');

    let values = inner
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            // NaN and infinities parse as f64 but are not coordinates.
            token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| DecodeFault {
                    position: 0,
                    id: None,
                    kind: DecodeFaultKind::InvalidNumber {
                        value: token.to_string(),
                    },
                })
        })
        .collect::<Result<Vec<f64>, _>>()?;

    if values.len() != dimension {
        return Err(DecodeFault {
            position: 0,
            id: None,
            kind: DecodeFaultKind::VectorLength {
                expected: dimension,
                actual: values.len(),
            },
        });
    }

    Ok(values)
}
