/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `part / total * 100`, or 0.0 when `total` is zero.
pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Rounds to one decimal place. Exact binary ties go to the even digit (`6.25` → `6.2`).
pub fn round1(value: f64) -> f64 {
    round_to(value, 1)
}

/// Rounds to two decimal places, ties to even (`80.125` → `80.12`).
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

// Decimal formatting works on the exact binary value; `2.675` is stored just
// below the tie and rounds down.
fn round_to(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}
