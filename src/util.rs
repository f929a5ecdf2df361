pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Split a sentence into words, dropping sentence-final marks (`.`, `?`,
/// `!`). Commas stay attached to their word.
pub fn words_of(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| w.replace(['.', '?', '!'], ""))
        .filter(|w| !w.is_empty())
        .collect()
}
