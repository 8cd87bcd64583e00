//! Symptom string normalization

/// Canonicalize a raw symptom string for comparison.
///
/// Lower-cases, drops every character that is neither a word character
/// (alphanumeric or `_`) nor whitespace, then collapses whitespace runs and
/// trims. Symbols are dropped before collapsing so `"a - b"` becomes `"a b"`
/// and the function stays idempotent.
pub fn normalize(raw: &str) -> String {
    let kept: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_trims() {
        assert_eq!(normalize("  HEADACHE  "), "headache");
        assert_eq!(normalize("Fever"), "fever");
    }

    #[test]
    fn test_collapses_internal_whitespace() {
        assert_eq!(normalize("high \t  fever\n"), "high fever");
    }

    #[test]
    fn test_strips_symbols() {
        assert_eq!(normalize("fever!!!"), "fever");
        assert_eq!(normalize("muscle-pain"), "musclepain");
        assert_eq!(normalize("chest - pain"), "chest pain");
    }

    #[test]
    fn test_keeps_underscores() {
        assert_eq!(normalize("Skin_Rash"), "skin_rash");
        assert_eq!(normalize("unknown_symptom_xyz"), "unknown_symptom_xyz");
    }

    #[test]
    fn test_empty_and_symbol_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("?!-+"), "");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "  HEADACHE  ",
            "a - b",
            "Pain (behind) the   EYES",
            "é-Ñ  ü",
            "__x__",
            "\u{00a0}fever\u{2003}chills",
            "",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }
}
