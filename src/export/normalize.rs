//! Tag key and value normalization.
//!
//! Three small components clean tags on their way into the relational
//! model:
//!
//! - [`KeyNormalizer`] rewrites tag keys and may drop a tag outright
//! - [`ValueNormalizer`] rewrites tag values for a configured set of keys
//! - [`MultiValueExpander`] fans a `;`-joined value out into several rows
//!
//! All rule tables live in [`NormalizerRules`] and are handed to the
//! components at construction, so a deployment can swap in its own
//! mappings and the rules stay testable in isolation. Substitution order
//! within a table is its declaration order.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

/// Keys whose tag is dropped entirely: `not*`, `todo*`, anything
/// containing `fixme`.
static IGNORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^not)|(^todo)|(fixme)").unwrap());

/// Trailing `_<digits>` noise on keys, e.g. `name_2`.
static SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_\d*$").unwrap());

/// Punctuation and escape artifacts removed from cleanable values.
static UNWANTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\[\]().']|(amp;)").unwrap());

/// Postcode-shaped values (letters+digits, optional space, digits+letters)
/// pass through untouched.
static POSTCODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+\d+\s*\d+\w+").unwrap());

/// The complete rule set driving key/value normalization.
///
/// [`NormalizerRules::default`] carries the stock tables; everything is
/// plain immutable data, so tests and deployments can construct variants
/// field by field.
#[derive(Debug, Clone)]
pub struct NormalizerRules {
    /// Keys matching this pattern are dropped, taking priority over every
    /// other key rule.
    pub ignore_keys: Regex,

    /// Stripped from the end of keys before any further rewriting.
    pub key_suffix: Regex,

    /// Two-letter code -> full language name, for `name:<code>` keys.
    pub languages: HashMap<String, String>,

    /// Characters and artifacts stripped from cleanable values.
    pub unwanted: Regex,

    /// Values matching this pattern are never cleaned.
    pub postcode: Regex,

    /// All-caps values accepted as-is (directions and the like).
    pub acceptable: HashSet<String>,

    /// Word-bounded abbreviation expansions, applied in declaration order.
    pub abbreviations: Vec<(String, String)>,

    /// Welsh hyphenation rewrites, applied in declaration order. The
    /// interior forms must precede the leading forms: a leading-form
    /// rewrite would consume the `Y` of an interior occurrence first and
    /// block the interior rewrite.
    pub welsh: Vec<(String, String)>,

    /// Keys whose values are cleaned at all. Tested against the full
    /// normalized key, before the namespace split.
    pub cleanable_keys: HashSet<String>,

    /// Keys whose values may hold several `;`-separated entries.
    pub multi_value_keys: HashSet<String>,
}

impl Default for NormalizerRules {
    fn default() -> Self {
        let languages = [
            ("ar", "Arabic"),
            ("ca", "Catalan, Valencian"),
            ("cy", "Welsh"),
            ("de", "German"),
            ("en", "English"),
            ("eo", "Esperanto"),
            ("es", "Spanish, Castilian"),
            ("et", "Estonian"),
            ("fa", "Persian"),
            ("fi", "Finnish"),
            ("fr", "French"),
            ("gd", "Gaelic, Scottish Gaelic"),
            ("gl", "Galician"),
            ("he", "Hebrew (modern)"),
            ("hu", "Hungarian"),
            ("it", "Italian"),
            ("la", "Latin"),
            ("lt", "Lithuanian"),
            ("ru", "Russian"),
            ("sr", "Serbian"),
            ("uk", "Ukrainian"),
        ];

        let abbreviations = [
            ("Blvd", "Boulevard"),
            ("By-Pass", "Bypass"),
            ("Ave", "Avenue"),
            ("Rd", "Road"),
            ("Sq", "Square"),
            ("Ph", "Public House"),
            ("Cofe", "Church Of England"),
        ];

        let welsh = [
            (" Y ", "-Y-"),
            (" Yn ", "-Yn-"),
            (" Yr ", "-Yr-"),
            ("Y ", "Y-"),
            ("Yn ", "Yn-"),
            ("Yr ", "Yr-"),
        ];

        let acceptable = ["UK", "N", "NE", "E", "SE", "S", "SW", "W", "NW"];
        let cleanable_keys = ["addr:street", "name", "amenity", "cuisine"];
        let multi_value_keys = ["amenity", "cuisine"];

        NormalizerRules {
            ignore_keys: IGNORE_RE.clone(),
            key_suffix: SUFFIX_RE.clone(),
            languages: languages
                .iter()
                .map(|(code, name)| (code.to_string(), name.to_string()))
                .collect(),
            unwanted: UNWANTED_RE.clone(),
            postcode: POSTCODE_RE.clone(),
            acceptable: acceptable.iter().map(|s| s.to_string()).collect(),
            abbreviations: abbreviations
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            welsh: welsh
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            cleanable_keys: cleanable_keys.iter().map(|s| s.to_string()).collect(),
            multi_value_keys: multi_value_keys.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Cleans and rewrites tag keys. Pure and total: the only outcome besides
/// a normalized key is the drop sentinel (`None`).
#[derive(Debug, Clone)]
pub struct KeyNormalizer {
    ignore: Regex,
    suffix: Regex,
    languages: HashMap<String, String>,
}

impl KeyNormalizer {
    pub fn new(rules: &NormalizerRules) -> Self {
        KeyNormalizer {
            ignore: rules.ignore_keys.clone(),
            suffix: rules.key_suffix.clone(),
            languages: rules.languages.clone(),
        }
    }

    /// Normalize a raw key, or return `None` to drop the tag entirely.
    ///
    /// The ignore test runs first and wins over everything else; then the
    /// trailing `_<digits>` suffix is stripped; then `name:<code>` keys
    /// with a known language code are inverted to `<Language>:name`.
    /// Unknown codes are left alone. Idempotent on its own output.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        if self.ignore.is_match(raw) {
            return None;
        }

        let stripped = self.suffix.replace(raw, "");

        if let Some(code) = stripped.strip_prefix("name:") {
            if let Some(language) = self.languages.get(code) {
                return Some(format!("{}:name", language));
            }
        }

        Some(stripped.into_owned())
    }
}

/// Cleans and rewrites tag values. Never drops a value; worst case the
/// input passes through unmodified.
#[derive(Debug, Clone)]
pub struct ValueNormalizer {
    unwanted: Regex,
    postcode: Regex,
    acceptable: HashSet<String>,
    abbreviations: Vec<(Regex, String)>,
    welsh: Vec<(Regex, String)>,
    cleanable: HashSet<String>,
}

impl ValueNormalizer {
    pub fn new(rules: &NormalizerRules) -> Self {
        ValueNormalizer {
            unwanted: rules.unwanted.clone(),
            postcode: rules.postcode.clone(),
            acceptable: rules.acceptable.clone(),
            abbreviations: compile_word_bounded(&rules.abbreviations),
            welsh: compile_word_bounded(&rules.welsh),
            cleanable: rules.cleanable_keys.clone(),
        }
    }

    /// Normalize the value of the given (normalized, unsplit) key.
    ///
    /// Values of keys outside the cleanable set pass through unchanged,
    /// as do postcodes, URLs and the acceptable all-caps abbreviations.
    /// Everything else is stripped of unwanted punctuation, title-cased,
    /// abbreviation-expanded and Welsh-hyphenated, in that order.
    pub fn normalize(&self, key: &str, raw: &str) -> String {
        if !self.cleanable.contains(key) || self.passes_through(raw) {
            return raw.to_string();
        }

        let mut value = self.unwanted.replace_all(raw, "").into_owned();
        value = title_case(&value);

        for (pattern, replacement) in &self.abbreviations {
            if pattern.is_match(&value) {
                value = pattern.replace_all(&value, replacement.as_str()).into_owned();
            }
        }

        for (pattern, replacement) in &self.welsh {
            if pattern.is_match(&value) {
                value = pattern.replace_all(&value, replacement.as_str()).into_owned();
            }
        }

        value
    }

    fn passes_through(&self, value: &str) -> bool {
        self.postcode.is_match(value)
            || value.starts_with("www")
            || value.starts_with("http")
            || self.acceptable.contains(value)
    }
}

/// Splits compound values into independent shares.
#[derive(Debug, Clone)]
pub struct MultiValueExpander {
    multi_value_keys: HashSet<String>,
}

impl MultiValueExpander {
    pub fn new(rules: &NormalizerRules) -> Self {
        MultiValueExpander {
            multi_value_keys: rules.multi_value_keys.clone(),
        }
    }

    /// Split `value` on `;` when `key` is a multi-value key, otherwise
    /// yield it whole. Shares are kept verbatim, empties included; each
    /// share is expected to be value-normalized independently downstream.
    pub fn expand<'a>(&self, key: &str, value: &'a str) -> Vec<&'a str> {
        if self.multi_value_keys.contains(key) {
            value.split(';').collect()
        } else {
            vec![value]
        }
    }
}

/// Pre-compile word-bounded patterns for a substitution table, preserving
/// declaration order.
fn compile_word_bounded(table: &[(String, String)]) -> Vec<(Regex, String)> {
    table
        .iter()
        .map(|(from, to)| {
            let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(from)))
                .expect("escaped literal is a valid pattern");
            (pattern, to.clone())
        })
        .collect()
}

/// Begin each word with a capital letter, lowercasing the rest. A word
/// boundary is any non-alphabetic character.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut boundary = true;
    for c in value.chars() {
        if c.is_alphabetic() {
            if boundary {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            boundary = false;
        } else {
            out.push(c);
            boundary = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> KeyNormalizer {
        KeyNormalizer::new(&NormalizerRules::default())
    }

    fn values() -> ValueNormalizer {
        ValueNormalizer::new(&NormalizerRules::default())
    }

    #[test]
    fn test_ignored_keys_are_dropped() {
        let normalizer = keys();
        assert_eq!(normalizer.normalize("note"), None);
        assert_eq!(normalizer.normalize("NOTE"), None);
        assert_eq!(normalizer.normalize("todo"), None);
        assert_eq!(normalizer.normalize("TODO:later"), None);
        assert_eq!(normalizer.normalize("fixme"), None);
        assert_eq!(normalizer.normalize("addr:FIXME"), None);
        assert_eq!(normalizer.normalize("fixme:todo"), None);
    }

    #[test]
    fn test_ignore_wins_over_other_rules() {
        // Would otherwise be suffix-stripped, but the ignore test runs first.
        assert_eq!(keys().normalize("note_2"), None);
    }

    #[test]
    fn test_suffix_strip() {
        let normalizer = keys();
        assert_eq!(normalizer.normalize("name_2").unwrap(), "name");
        assert_eq!(normalizer.normalize("name_").unwrap(), "name");
        assert_eq!(normalizer.normalize("name_12").unwrap(), "name");
        // Interior underscores survive.
        assert_eq!(normalizer.normalize("name_2_x").unwrap(), "name_2_x");
    }

    #[test]
    fn test_key_normalization_is_idempotent() {
        let normalizer = keys();
        for raw in ["name_2", "name:en", "name:xx", "addr:street", "highway"] {
            let once = normalizer.normalize(raw).unwrap();
            let twice = normalizer.normalize(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_language_remap() {
        let normalizer = keys();
        assert_eq!(normalizer.normalize("name:cy").unwrap(), "Welsh:name");
        assert_eq!(normalizer.normalize("name:en").unwrap(), "English:name");
        // Unknown codes are left as-is.
        assert_eq!(normalizer.normalize("name:xx").unwrap(), "name:xx");
        // Suffix strip happens before the remap.
        assert_eq!(normalizer.normalize("name:en_2").unwrap(), "English:name");
    }

    #[test]
    fn test_values_outside_cleanable_set_pass_through() {
        let normalizer = values();
        assert_eq!(normalizer.normalize("highway", "primary"), "primary");
        assert_eq!(normalizer.normalize("ref", "a(b)"), "a(b)");
    }

    #[test]
    fn test_skip_rule_passes_values_through_verbatim() {
        let normalizer = values();
        // Postcode shape.
        assert_eq!(normalizer.normalize("name", "CF10 1EP"), "CF10 1EP");
        assert_eq!(normalizer.normalize("name", "cf101ep"), "cf101ep");
        // URLs.
        assert_eq!(
            normalizer.normalize("name", "www.example.com"),
            "www.example.com"
        );
        assert_eq!(
            normalizer.normalize("name", "http://example.com"),
            "http://example.com"
        );
        // Acceptable all-caps abbreviations.
        assert_eq!(normalizer.normalize("name", "NW"), "NW");
        assert_eq!(normalizer.normalize("name", "UK"), "UK");
    }

    #[test]
    fn test_unwanted_characters_stripped() {
        let normalizer = values();
        assert_eq!(
            normalizer.normalize("name", "the (old) king's head."),
            "The Old Kings Head"
        );
        assert_eq!(normalizer.normalize("name", "fish &amp; chips"), "Fish & Chips");
    }

    #[test]
    fn test_title_casing() {
        let normalizer = values();
        assert_eq!(normalizer.normalize("name", "high street"), "High Street");
        assert_eq!(normalizer.normalize("name", "HIGH STREET"), "High Street");
    }

    #[test]
    fn test_abbreviations_expand_on_word_boundaries_only() {
        let normalizer = values();
        assert_eq!(
            normalizer.normalize("addr:street", "station rd"),
            "Station Road"
        );
        assert_eq!(normalizer.normalize("name", "the ph"), "The Public House");
        // "Rd" inside a longer word is not a standalone token.
        assert_eq!(normalizer.normalize("name", "broad street"), "Broad Street");
    }

    #[test]
    fn test_welsh_hyphenation() {
        let normalizer = values();
        assert_eq!(normalizer.normalize("name", "ael y bryn"), "Ael-Y-Bryn");
        assert_eq!(normalizer.normalize("name", "pen yr heol"), "Pen-Yr-Heol");
        assert_eq!(normalizer.normalize("name", "tan yn bach"), "Tan-Yn-Bach");
        // Leading forms hyphenate the trailing side only.
        assert_eq!(normalizer.normalize("name", "y bwthyn"), "Y-Bwthyn");
        // No bare Y token, no rewrite.
        assert_eq!(normalizer.normalize("name", "ynys wen"), "Ynys Wen");
    }

    #[test]
    fn test_value_normalization_is_idempotent() {
        let normalizer = values();
        for raw in [
            "ael y bryn",
            "station rd",
            "the (old) king's head.",
            "fish &amp; chips",
            "high street",
        ] {
            let once = normalizer.normalize("name", raw);
            let twice = normalizer.normalize("name", &once);
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_multi_value_expansion() {
        let expander = MultiValueExpander::new(&NormalizerRules::default());
        assert_eq!(expander.expand("cuisine", "fish;chips"), vec!["fish", "chips"]);
        assert_eq!(
            expander.expand("amenity", "pub;;cafe"),
            vec!["pub", "", "cafe"]
        );
        // Non-multi-value keys keep the delimiter.
        assert_eq!(expander.expand("name", "a;b"), vec!["a;b"]);
    }
}
