pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// `part / whole` as a whole percentage, rounded half away from zero; 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> u32 {
    match whole {
        0 => 0,
        _ => (part as f64 * 100.0 / whole as f64).round() as u32,
    }
}
