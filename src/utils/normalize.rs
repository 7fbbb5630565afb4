use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

const SEPARATOR: char = '_';

/// Maps a raw character name to its canonical merge key.
///
/// The name is lowercased, decomposed and stripped of diacritics; every run of
/// non-alphanumeric characters becomes a single `_` and the ends are trimmed.
/// `normalize("  José Álvarez ")` gives `"jose_alvarez"`.
pub fn normalize(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut pending_separator = false;

    for ch in raw.to_lowercase().nfd().filter(|c| !is_combining_mark(*c)) {
        if ch.is_alphanumeric() {
            if pending_separator && !key.is_empty() {
                key.push(SEPARATOR);
            }
            pending_separator = false;
            key.push(ch);
        } else {
            pending_separator = true;
        }
    }

    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_and_diacritics_collapse() {
        let key = normalize("José");
        assert_eq!(key, "jose");
        assert_eq!(normalize("JOSE"), key);
        assert_eq!(normalize("  jose "), key);
    }

    #[test]
    fn test_separator_runs() {
        assert_eq!(normalize("Ava Cole"), "ava_cole");
        assert_eq!(normalize("ava   cole"), "ava_cole");
        assert_eq!(normalize("--Ava -- Cole!!"), "ava_cole");
        assert_eq!(normalize("Dr. O'Brien"), "dr_o_brien");
    }

    #[test]
    fn test_idempotent() {
        for raw in ["Zoë  Saldaña", "MARY-JANE", "  ", "Ñandú 2", "李 小龍"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_punctuation_only_is_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" -- ... "), "");
    }

    #[test]
    fn test_non_latin_kept() {
        assert_eq!(normalize("李 小龍"), "李_小龍");
    }
}
