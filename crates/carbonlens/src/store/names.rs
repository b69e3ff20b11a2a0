//! Name normalization, edit distance and the built-in alias tables.
//!
//! Every comparison between user text and dataset names goes through
//! [`normalize_name`], so matching is case-, accent- and punctuation-insensitive.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Known phrasings for metric columns, as `(alias, column)`.
///
/// Aliases are written in normalized form. An alias only applies when its
/// target column exists in the loaded dataset.
pub const COLUMN_ALIASES: &[(&str, &str)] = &[
    ("co2 emissions", "co2"),
    ("carbon dioxide", "co2"),
    ("carbon dioxide emissions", "co2"),
    ("carbon emissions", "co2"),
    ("carbon", "co2"),
    ("emissions", "co2"),
    ("co2 level", "co2"),
    ("co2 levels", "co2"),
    ("per capita", "co2_per_capita"),
    ("per capita co2", "co2_per_capita"),
    ("per capita emissions", "co2_per_capita"),
    ("co2 per person", "co2_per_capita"),
    ("emissions per capita", "co2_per_capita"),
    ("emissions per person", "co2_per_capita"),
    ("cumulative", "cumulative_co2"),
    ("cumulative emissions", "cumulative_co2"),
    ("cumulative co2 emissions", "cumulative_co2"),
    ("historical emissions", "cumulative_co2"),
    ("methane", "methane"),
    ("methane emissions", "methane"),
    ("ch4", "methane"),
    ("nitrous oxide", "nitrous_oxide"),
    ("nitrous oxide emissions", "nitrous_oxide"),
    ("n2o", "nitrous_oxide"),
    ("cement", "cement_co2"),
    ("cement emissions", "cement_co2"),
    ("coal", "coal_co2"),
    ("coal emissions", "coal_co2"),
    ("oil", "oil_co2"),
    ("oil emissions", "oil_co2"),
    ("gas emissions", "gas_co2"),
    ("natural gas", "gas_co2"),
    ("flaring", "flaring_co2"),
    ("land use", "land_use_change_co2"),
    ("land use change", "land_use_change_co2"),
    ("greenhouse gas", "total_ghg"),
    ("greenhouse gases", "total_ghg"),
    ("greenhouse gas emissions", "total_ghg"),
    ("ghg", "total_ghg"),
    ("total ghg", "total_ghg"),
    ("population", "population"),
    ("gdp", "gdp"),
    ("energy per capita", "energy_per_capita"),
    ("primary energy", "primary_energy_consumption"),
    ("energy consumption", "primary_energy_consumption"),
    ("temperature change", "temperature_change_from_ghg"),
    ("warming", "temperature_change_from_ghg"),
];

/// Known alternative names for entities, as `(alias, entity)`.
pub const ENTITY_ALIASES: &[(&str, &str)] = &[
    ("usa", "United States"),
    ("united states of america", "United States"),
    ("america", "United States"),
    ("the us", "United States"),
    ("us", "United States"),
    ("uk", "United Kingdom"),
    ("britain", "United Kingdom"),
    ("great britain", "United Kingdom"),
    ("uae", "United Arab Emirates"),
    ("drc", "Democratic Republic of Congo"),
    ("dr congo", "Democratic Republic of Congo"),
    ("korea", "South Korea"),
    ("republic of korea", "South Korea"),
    ("russian federation", "Russia"),
    ("eu", "European Union (27)"),
    ("european union", "European Union (27)"),
    ("ivory coast", "Cote d'Ivoire"),
    ("czech republic", "Czechia"),
    ("holland", "Netherlands"),
    ("the world", "World"),
    ("globally", "World"),
    ("global", "World"),
];

/// Words that carry no meaning when naming a metric.
pub const METRIC_FILLER_WORDS: &[&str] = &[
    "the", "of", "total", "level", "levels", "amount", "annual", "yearly", "emission",
    "emissions", "value", "values", "data",
];

/// Normalize a name for comparison.
///
/// Applies compatibility decomposition, strips accents, lowercases, drops
/// apostrophes and dots, turns every other separator into a single space and
/// spells out `&`. `"Côte d'Ivoire"` and `"cote divoire"` normalize equally,
/// as do `"co2_per_capita"` and `"CO₂ per capita"`.
pub fn normalize_name(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_space = false;

    for ch in value.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        match ch {
            '\'' | '\u{2019}' | '.' => {}
            '&' => {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str("and");
                pending_space = true;
            }
            c if c.is_alphanumeric() => {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.extend(c.to_lowercase());
            }
            _ => pending_space = true,
        }
    }

    out
}

/// Drop filler words ("total", "emissions", ...) from a normalized metric phrase.
pub fn strip_filler_words(normalized: &str) -> String {
    normalized
        .split(' ')
        .filter(|word| !word.is_empty() && !METRIC_FILLER_WORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Levenshtein (edit) distance between two strings, counted in chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0usize; b_chars.len() + 1];

    for (i, a_ch) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_ch) in b_chars.iter().enumerate() {
            let cost = usize::from(a_ch != b_ch);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

/// Similarity in `[0, 1]`: `1 - distance / longest length`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Check whether `phrase` occurs in `text` on word boundaries.
///
/// Both arguments must already be normalized (space separated words).
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    find_phrase(text, phrase, 0).is_some()
}

/// Byte offset of the first word-boundary occurrence of `phrase` in `text`
/// at or after `from`.
pub fn find_phrase(text: &str, phrase: &str, from: usize) -> Option<usize> {
    if phrase.is_empty() {
        return None;
    }
    let mut start = from;
    while let Some(offset) = text.get(start..).and_then(|rest| rest.find(phrase)) {
        let at = start + offset;
        let end = at + phrase.len();
        let left_ok = at == 0 || text.as_bytes()[at - 1] == b' ';
        let right_ok = end == text.len() || text.as_bytes()[end] == b' ';
        if left_ok && right_ok {
            return Some(at);
        }
        start = at + 1;
        while start < text.len() && !text.is_char_boundary(start) {
            start += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("China"), "china");
        assert_eq!(normalize_name("  United   States "), "united states");
        assert_eq!(normalize_name("Côte d'Ivoire"), "cote divoire");
        assert_eq!(normalize_name("cote d’ivoire"), "cote divoire");
        assert_eq!(normalize_name("co2_per_capita"), "co2 per capita");
        assert_eq!(normalize_name("CO₂ per capita"), "co2 per capita");
        assert_eq!(normalize_name("Bosnia & Herzegovina"), "bosnia and herzegovina");
        assert_eq!(normalize_name("U.S.A."), "usa");
        assert_eq!(normalize_name("European Union (27)"), "european union 27");
    }

    #[test]
    fn test_strip_filler_words() {
        assert_eq!(strip_filler_words("total co2 emissions"), "co2");
        assert_eq!(strip_filler_words("the level of methane"), "methane");
        assert_eq!(strip_filler_words("emissions"), "");
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("china", "china"), 0);
        assert_eq!(levenshtein("chna", "china"), 1);
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("china", "china"), 1.0);
        assert!((similarity("chna", "china") - 0.8).abs() < 1e-9);
        assert!(similarity("narnia", "china") < 0.8);
    }

    #[test]
    fn test_find_phrase_respects_word_boundaries() {
        assert_eq!(find_phrase("emissions of niger", "niger", 0), Some(13));
        assert_eq!(find_phrase("emissions of nigeria", "niger", 0), None);
        assert!(contains_phrase("compare china and india", "china"));
        assert!(!contains_phrase("indian emissions", "india"));
        assert!(contains_phrase("co2 per capita in china", "co2 per capita"));
    }
}
