//! Heuristic detection of misapplied names from free-text annotations.

use once_cell::sync::Lazy;
use regex::Regex;

static MISAPPLIED_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:sensu\s+auct|sensu\s+lato\s+non\b|auct(?:\.|orum\b|\b)|non\b|nec\b)")
        .expect("valid misapplied prefix regex")
});
static MISAPPLIED_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bmisapplied\b").expect("valid misapplied word regex"));

/// Returns whether the according-to annotation or the authorship marks the
/// usage as a misapplication, e.g. `auct. non L.` or `sensu auct.`.
pub fn is_misapplied(according_to: Option<&str>, authorship: Option<&str>) -> bool {
    [according_to, authorship]
        .into_iter()
        .flatten()
        .any(|value| MISAPPLIED_PREFIX_RE.is_match(value) || MISAPPLIED_WORD_RE.is_match(value))
}

#[cfg(test)]
mod tests {
    use super::is_misapplied;

    #[test]
    fn detects_common_misapplication_markers() {
        for value in [
            "auct. non L.",
            "auctorum",
            "sensu auct. brit.",
            "sensu lato non Miller",
            "non Hook.f.",
            "nec Bentham",
            "Flora of Turkey, misapplied",
        ] {
            assert!(is_misapplied(Some(value), None), "{value}");
        }
    }

    #[test]
    fn ignores_plain_authorities() {
        assert!(!is_misapplied(Some("Smith 1999"), Some("L.")));
        assert!(!is_misapplied(Some("Nonnenmacher"), None));
        assert!(!is_misapplied(None, None));
        assert!(is_misapplied(None, Some("auct.")));
    }
}
