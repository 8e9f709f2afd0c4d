//! Heuristic English singular/plural splitting.
//!
//! Wiki pages are normally named in the singular, so a reference such as
//! `WikiWords` should find the page `WikiWord`. The rules below mirror common
//! plural endings; they are not linguistically exhaustive.

use std::borrow::Cow;

/// A word split into its singular stem and the plural tail that was removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralSplit<'a> {
    pub stem: Cow<'a, str>,
    pub suffix: &'a str,
}

impl PluralSplit<'_> {
    pub fn is_plural(&self) -> bool {
        !self.suffix.is_empty()
    }

    /// Rebuild the original word. For an `ies` plural the stem's restored
    /// trailing `y` is replaced by the suffix.
    pub fn rejoin(&self) -> String {
        let stem: &str = &self.stem;
        let base = if self.suffix.eq_ignore_ascii_case("ies") {
            &stem[..stem.len() - 1]
        } else {
            stem
        };
        format!("{}{}", base, self.suffix)
    }
}

/// Split `word` into stem and plural suffix; first matching rule wins.
///
/// 1. `(s|z|ch|sh|x)es` drops `es`
/// 2. `os` drops `s`
/// 3. `oes` drops `es`
/// 4. `ies` becomes `y`
/// 5. `s` drops `s`
///
/// Each tail must be preceded by at least one word character. Detection is
/// case-insensitive; the returned stem keeps the original casing.
pub fn split_plural(word: &str) -> PluralSplit<'_> {
    let lower = word.to_ascii_lowercase();
    let ends_after_word_char = |tail: &str| {
        lower.ends_with(tail) && word_char_before(word, word.len() - tail.len())
    };

    let strip = if ["ses", "zes", "ches", "shes", "xes"].iter().any(|t| ends_after_word_char(t)) {
        2
    } else if ends_after_word_char("os") {
        1
    } else if ends_after_word_char("oes") {
        2
    } else if ends_after_word_char("ies") {
        let cut = word.len() - 3;
        let y = if word.as_bytes()[cut] == b'I' { 'Y' } else { 'y' };
        let mut stem = String::with_capacity(cut + 1);
        stem.push_str(&word[..cut]);
        stem.push(y);
        return PluralSplit { stem: Cow::Owned(stem), suffix: &word[cut..] };
    } else if ends_after_word_char("s") {
        1
    } else {
        0
    };

    let cut = word.len() - strip;
    PluralSplit { stem: Cow::Borrowed(&word[..cut]), suffix: &word[cut..] }
}

/// The singular form of `word`, or `word` itself when it is not a plural
pub fn depluralize(word: &str) -> Cow<'_, str> {
    split_plural(word).stem
}

fn word_char_before(word: &str, idx: usize) -> bool {
    word[..idx]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stem_of(word: &str) -> String {
        split_plural(word).stem.into_owned()
    }

    #[test]
    fn strips_common_plural_endings() {
        assert_eq!(stem_of("Boxes"), "Box");
        assert_eq!(stem_of("Churches"), "Church");
        assert_eq!(stem_of("Wishes"), "Wish");
        assert_eq!(stem_of("Buzzes"), "Buzz");
        assert_eq!(stem_of("Buses"), "Bus");
        assert_eq!(stem_of("Pianos"), "Piano");
        assert_eq!(stem_of("Heroes"), "Hero");
        assert_eq!(stem_of("Cherries"), "Cherry");
        assert_eq!(stem_of("WikiWords"), "WikiWord");
    }

    #[test]
    fn detection_ignores_case_but_keeps_it() {
        let split = split_plural("BOXES");
        assert_eq!(split.stem, "BOX");
        assert_eq!(split.suffix, "ES");

        let split = split_plural("CHERRIES");
        assert_eq!(split.stem, "CHERRY");
        assert_eq!(split.suffix, "IES");
        assert_eq!(split.rejoin(), "CHERRIES");
    }

    #[test]
    fn non_plurals_pass_through() {
        for word in ["Box", "WikiWord", "Cherry", "s", "", "Ä"] {
            let split = split_plural(word);
            assert!(!split.is_plural(), "{word:?}");
            assert_eq!(split.stem, word);
            assert_eq!(split.suffix, "");
        }
    }

    #[test]
    fn tail_needs_a_preceding_word_char() {
        // "ies" alone has nothing before it, so only the bare `s` rule fires
        assert_eq!(stem_of("ies"), "ie");
        assert_eq!(stem_of("-s"), "-s");
    }

    #[test]
    fn depluralize_borrows_when_it_can() {
        assert!(matches!(depluralize("Pages"), Cow::Borrowed("Page")));
        assert!(matches!(depluralize("Stories"), Cow::Owned(ref s) if s == "Story"));
    }

    #[test]
    fn rejoin_reconstructs_every_rule() {
        for word in ["Boxes", "Pianos", "Heroes", "Cherries", "Pages", "Page"] {
            assert_eq!(split_plural(word).rejoin(), word);
        }
    }

    proptest! {
        #[test]
        fn words_without_trailing_s_are_fixed_points(word in "[A-Za-z][A-Za-z0-9]{0,12}[A-RT-Za-rt-z0-9]") {
            let split = split_plural(&word);
            prop_assert_eq!(split.stem.as_ref(), word.as_str());
            prop_assert_eq!(split.suffix, "");
        }

        #[test]
        fn rejoin_is_lossless(word in "[A-Za-z]{1,12}") {
            prop_assert_eq!(split_plural(&word).rejoin(), word);
        }
    }
}
