//! Bank wording normalization
//!
//! Produces the grouping key for transactions. Bank descriptors differ in
//! case, separators and punctuation from one statement line to the next; the
//! normalized form erases those differences and nothing else.

/// Canonicalize a raw transaction descriptor
///
/// Lower-cases, turns `-` and `_` into spaces, strips `.`, collapses runs of
/// whitespace and trims. Total and deterministic.
pub fn normalize(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let mut cleaned = String::with_capacity(lowered.len());

    for c in lowered.chars() {
        match c {
            '-' | '_' => cleaned.push(' '),
            '.' => {}
            other => cleaned.push(other),
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("SPOTIFY PARIS"), "spotify paris");
        assert_eq!(normalize("  Netflix.com  "), "netflixcom");
    }

    #[test]
    fn test_normalize_separators() {
        assert_eq!(normalize("PRLV-SEPA_FREE"), "prlv sepa free");
        assert_eq!(normalize("DISNEY--PLUS"), "disney plus");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("CB \t AMAZON\n\nPRIME"), "cb amazon prime");
    }

    #[test]
    fn test_normalize_degenerate_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" . - _ "), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize("Apple.com/Bill - ITUNES_STORE");
        assert_eq!(normalize(&once), once);
    }
}
