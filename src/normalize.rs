//! Canonical city-name normalization.
//!
//! The normalized form is the join key between trips, contact files and the
//! geocode cache, so every comparison in the crate must go through
//! [`normalize_city`].

/// Normalize a city name into its canonical key.
///
/// Lowercases, turns every non-alphanumeric non-whitespace character into a
/// space, then collapses whitespace runs and trims. Total and idempotent.
pub fn normalize_city(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("San Francisco, CA"; "punctuated")]
    #[test_case("san   francisco ca"; "extra whitespace")]
    #[test_case("SAN-FRANCISCO, CA!"; "uppercase with dashes")]
    fn variants_share_one_key(input: &str) {
        assert_eq!(normalize_city(input), "san francisco ca");
    }

    #[test]
    fn idempotent() {
        let inputs = ["Paris, France", "  NYC  ", "st. john's", "", "---"];
        for input in inputs {
            let once = normalize_city(input);
            assert_eq!(normalize_city(&once), once);
        }
    }

    #[test]
    fn punctuation_only_becomes_empty() {
        assert_eq!(normalize_city("!!!"), "");
        assert_eq!(normalize_city(""), "");
    }

    #[test]
    fn keeps_unicode_letters() {
        assert_eq!(normalize_city("Zürich"), "zürich");
        assert_eq!(normalize_city("SÃO PAULO"), "são paulo");
    }
}
