//! Keyword and pattern based intent extraction.

use async_trait::async_trait;
use regex::Regex;

use super::types::{Aggregation, IntentOrigin, QueryIntent, TimeRange};
use super::IntentExtractor;
use crate::config::ExtractionStrategy;
use crate::error::Result;
use crate::store::names::{contains_phrase, find_phrase, normalize_name, METRIC_FILLER_WORDS};
use crate::store::{DatasetStore, YearSpan};

/// Aggregation keywords in normalized form.
const AGGREGATION_KEYWORDS: &[(&str, Aggregation)] = &[
    ("average", Aggregation::Average),
    ("avg", Aggregation::Average),
    ("mean", Aggregation::Average),
    ("sum", Aggregation::Sum),
    ("total", Aggregation::Sum),
    ("in total", Aggregation::Sum),
    ("maximum", Aggregation::Max),
    ("max", Aggregation::Max),
    ("highest", Aggregation::Max),
    ("peak", Aggregation::Max),
    ("largest", Aggregation::Max),
    ("minimum", Aggregation::Min),
    ("min", Aggregation::Min),
    ("lowest", Aggregation::Min),
    ("smallest", Aggregation::Min),
    ("count", Aggregation::Count),
    ("how many", Aggregation::Count),
    ("number of", Aggregation::Count),
    ("latest", Aggregation::Latest),
    ("current", Aggregation::Latest),
    ("currently", Aggregation::Latest),
    ("most recent", Aggregation::Latest),
    ("recent", Aggregation::Latest),
    ("trend", Aggregation::Trend),
    ("trends", Aggregation::Trend),
    ("over time", Aggregation::Trend),
    ("evolution", Aggregation::Trend),
    ("evolved", Aggregation::Trend),
    ("history", Aggregation::Trend),
    ("timeline", Aggregation::Trend),
    ("year by year", Aggregation::Trend),
];

const COMPARISON_KEYWORDS: &[&str] = &[
    "compare",
    "compared",
    "comparing",
    "comparison",
    "versus",
    "vs",
    "difference between",
];

/// Words after which a capitalized phrase is read as an entity mention.
const MENTION_TRIGGERS: &[&str] = &[
    "of", "in", "for", "from", "between", "and", "vs", "versus", "with", "compare",
];

/// Entity aliases that are also everyday words; only honoured when capitalized.
const AMBIGUOUS_ENTITY_WORDS: &[&str] = &["us"];

/// Lowercase words after a trigger that never name a place.
const NON_ENTITY_WORDS: &[&str] = &[
    "a", "an", "all", "any", "each", "every", "both", "this", "that", "these", "those", "it",
    "its", "them", "us", "me", "my", "our", "their", "country", "countries", "nation",
    "nations", "region", "regions", "time", "year", "years", "period", "past", "previous",
    "tonnes", "tons", "percent", "fossil", "fuel", "fuels", "energy", "coal", "oil", "gas",
    "cement", "flaring", "production", "consumption", "terms", "general",
];

/// Question words dropped when guessing an unknown metric phrase.
const QUESTION_WORDS: &[&str] = &[
    "what", "whats", "which", "how", "much", "is", "are", "was", "were", "did", "does", "show",
    "me", "give", "tell",
];

/// A matched phrase and its byte span in the normalized question.
#[derive(Debug, Clone)]
struct Span {
    start: usize,
    end: usize,
    text: String,
}

impl Span {
    fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Compiled year patterns.
struct YearPatterns {
    from_to: Regex,
    between: Regex,
    dashed: Regex,
    last_n: Regex,
    last_year: Regex,
    since: Regex,
    until: Regex,
    in_year: Regex,
    bare: Regex,
}

impl YearPatterns {
    fn new() -> Result<Self> {
        Ok(Self {
            from_to: Regex::new(r"\bfrom\s+(\d{4})\s+(?:to|until|till|through|-)\s+(\d{4})\b")?,
            between: Regex::new(r"\bbetween\s+(\d{4})\s+and\s+(\d{4})\b")?,
            dashed: Regex::new(r"\b(\d{4})\s*(?:-|–|to)\s*(\d{4})\b")?,
            last_n: Regex::new(r"\b(?:last|past|previous)\s+(\d{1,3})\s+years?\b")?,
            last_year: Regex::new(r"\blast\s+year\b")?,
            since: Regex::new(r"\b(?:since|after|from)\s+(\d{4})\b")?,
            until: Regex::new(r"\b(?:until|till|before|through|up\s+to)\s+(\d{4})\b")?,
            in_year: Regex::new(r"\b(?:in|for|during|of)\s+(\d{4})\b")?,
            bare: Regex::new(r"\b(1[5-9]\d{2}|2\d{3})\b")?,
        })
    }

    /// Read a time range from a lowercased question.
    fn find(&self, text: &str, data_span: YearSpan) -> Option<TimeRange> {
        let pair = |re: &Regex| -> Option<(i32, i32)> {
            let caps = re.captures(text)?;
            let a = caps.get(1)?.as_str().parse().ok()?;
            let b = caps.get(2)?.as_str().parse().ok()?;
            Some((a, b))
        };
        let single = |re: &Regex| -> Option<i32> {
            re.captures(text)?.get(1)?.as_str().parse().ok()
        };

        if let Some((a, b)) = pair(&self.from_to)
            .or_else(|| pair(&self.between))
            .or_else(|| pair(&self.dashed))
        {
            return Some(TimeRange::between(a, b));
        }

        if let Some(n) = single(&self.last_n).filter(|n| *n > 0) {
            return Some(TimeRange::between(data_span.end - n + 1, data_span.end));
        }
        if self.last_year.is_match(text) {
            return Some(TimeRange::year(data_span.end));
        }

        let mut years: Vec<i32> = Vec::new();
        for caps in self.bare.captures_iter(text) {
            if let Some(year) = caps.get(1).and_then(|m| m.as_str().parse().ok()) {
                if !years.contains(&year) {
                    years.push(year);
                }
            }
        }
        if let [a, b, ..] = years.as_slice() {
            return Some(TimeRange::between(*a, *b));
        }

        if let Some(start) = single(&self.since) {
            return Some(TimeRange::since(start));
        }
        if let Some(end) = single(&self.until) {
            return Some(TimeRange::until(end));
        }
        if let Some(year) = single(&self.in_year) {
            return Some(TimeRange::year(year));
        }

        years.first().map(|year| TimeRange::year(*year))
    }
}

/// Deterministic extractor built from keyword tables and year patterns.
///
/// Metric phrases, entity names and aliases come from the store, so only
/// names that exist in the loaded dataset are recognized. Unknown names
/// after "of", "in", "between" and similar words are still
/// reported so the validator can reject them.
pub struct RuleBasedExtractor {
    years: YearPatterns,
    unknown_metric: Regex,
    possessive: Regex,
}

impl RuleBasedExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            years: YearPatterns::new()?,
            unknown_metric: Regex::new(
                r"\b(?:is|are|was|were|the|average|mean|total|sum|max|maximum|min|minimum|highest|lowest|latest)\s+([a-z0-9 ]+?)\s+(?:of|in|for|from|between|across|by|over|since|during)\b",
            )?,
            possessive: Regex::new(r"(\w)['\x{2019}][sS]\b")?,
        })
    }

    /// Extract an intent. Never fails; unrecognized parts are left empty.
    pub fn extract_intent(&self, question: &str, store: &DatasetStore) -> QueryIntent {
        // "China's" names China
        let cleaned = self.possessive.replace_all(question, "$1");
        let question: &str = &cleaned;
        let text = normalize_name(question);

        let metric_span = find_metric(&text, store);
        let metric = match &metric_span {
            Some(span) => store
                .resolve_column(&span.text)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| span.text.clone()),
            None => self.guess_unknown_metric(&text),
        };

        let mut entities = find_entities(&text, store, metric_span.as_ref());
        let unresolved = find_unresolved_mentions(question, &text, store, &entities, &metric);
        entities.extend(unresolved);
        entities.sort_by_key(|span| span.start);

        let time_range = self.years.find(&question.to_lowercase(), store.year_span());

        QueryIntent {
            metric,
            entities: entities.into_iter().map(|span| span.text).collect(),
            time_range,
            aggregation: find_aggregation(&text).as_str().to_string(),
            comparison: COMPARISON_KEYWORDS.iter().any(|k| contains_phrase(&text, k)),
            origin: IntentOrigin::Rules,
        }
    }

    /// Best-effort metric phrase when nothing in the store matched, so the
    /// rejection can name what the user asked for.
    fn guess_unknown_metric(&self, text: &str) -> String {
        let Some(caps) = self.unknown_metric.captures(text) else {
            return String::new();
        };
        let Some(group) = caps.get(1) else {
            return String::new();
        };
        group
            .as_str()
            .split(' ')
            .filter(|word| {
                !word.is_empty()
                    && !METRIC_FILLER_WORDS.contains(word)
                    && !QUESTION_WORDS.contains(word)
                    && Aggregation::parse(word).is_none()
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl IntentExtractor for RuleBasedExtractor {
    async fn extract(&self, question: &str, store: &DatasetStore) -> QueryIntent {
        self.extract_intent(question, store)
    }

    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Rules
    }
}

/// Longest metric phrase in the question; earliest wins a length tie.
fn find_metric(text: &str, store: &DatasetStore) -> Option<Span> {
    let mut best: Option<Span> = None;
    for phrase in store.metric_phrases() {
        let Some(start) = find_phrase(text, &phrase, 0) else {
            continue;
        };
        let better = match &best {
            None => true,
            Some(current) => {
                phrase.len() > current.text.len()
                    || (phrase.len() == current.text.len() && start < current.start)
            }
        };
        if better {
            best = Some(Span {
                start,
                end: start + phrase.len(),
                text: phrase,
            });
        }
    }
    best
}

/// Known entity names and aliases, longest first, without overlaps.
fn find_entities(text: &str, store: &DatasetStore, metric: Option<&Span>) -> Vec<Span> {
    let mut found = Vec::new();
    for phrase in store.entity_phrases() {
        if AMBIGUOUS_ENTITY_WORDS.contains(&phrase) {
            continue;
        }
        let mut from = 0;
        while let Some(start) = find_phrase(text, phrase, from) {
            found.push(Span {
                start,
                end: start + phrase.len(),
                text: phrase.to_string(),
            });
            from = start + phrase.len();
        }
    }

    found.sort_by(|a, b| {
        (b.end - b.start)
            .cmp(&(a.end - a.start))
            .then(a.start.cmp(&b.start))
    });

    let mut chosen: Vec<Span> = Vec::new();
    for candidate in found {
        let inside_metric = metric.is_some_and(|m| m.overlaps(&candidate));
        if !inside_metric && chosen.iter().all(|c| !c.overlaps(&candidate)) {
            chosen.push(candidate);
        }
    }
    chosen
}

/// Phrases following a trigger word that are not known entities.
///
/// A capitalized run is read as one name. A single lowercase word is kept
/// too unless it is a metric, a keyword or a common non-place word, so
/// "of narnia" is rejected rather than widened to every entity.
fn find_unresolved_mentions(
    question: &str,
    text: &str,
    store: &DatasetStore,
    known: &[Span],
    metric: &str,
) -> Vec<Span> {
    let tokens: Vec<&str> = question.split_whitespace().collect();
    let metric = normalize_name(metric);
    let mut mentions: Vec<Span> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let previous = i
            .checked_sub(1)
            .map(|p| normalize_name(tokens[p]))
            .unwrap_or_default();
        if !MENTION_TRIGGERS.contains(&previous.as_str()) {
            i += 1;
            continue;
        }

        let mut words = Vec::new();
        if starts_upper(tokens[i]) {
            let mut j = i;
            while j < tokens.len() && starts_upper(tokens[j]) {
                let token = tokens[j];
                words.push(trim_token(token));
                j += 1;
                if token.ends_with([',', '?', '.', '!', ';', ':']) {
                    break;
                }
            }
            i = j;
            if words.first().is_some_and(|w| w.eq_ignore_ascii_case("the")) {
                words.remove(0);
            }
        } else {
            let word = trim_token(tokens[i]);
            i += 1;
            let norm = normalize_name(word);
            if NON_ENTITY_WORDS.contains(&norm.as_str())
                || MENTION_TRIGGERS.contains(&norm.as_str())
                || QUESTION_WORDS.contains(&norm.as_str())
                || norm == metric
                || contains_phrase(&metric, &norm)
            {
                continue;
            }
            words.push(word);
        }

        let phrase = words.join(" ");
        let norm = normalize_name(&phrase);
        if norm.is_empty() || !norm.chars().any(char::is_alphabetic) {
            continue;
        }
        if is_metric_or_keyword(&norm, store) {
            continue;
        }

        let start = find_phrase(text, &norm, 0).unwrap_or(text.len());
        let span = Span {
            start,
            end: start + norm.len(),
            text: phrase,
        };
        let covered = known.iter().any(|k| {
            k.overlaps(&span) || contains_phrase(&norm, &k.text) || contains_phrase(&k.text, &norm)
        });
        let repeated = mentions.iter().any(|m| normalize_name(&m.text) == norm);
        if !covered && !repeated {
            mentions.push(span);
        }
    }

    mentions
}

fn trim_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
}

fn starts_upper(token: &str) -> bool {
    token
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .chars()
        .next()
        .is_some_and(char::is_uppercase)
}

fn is_metric_or_keyword(norm: &str, store: &DatasetStore) -> bool {
    let stripped: Vec<&str> = norm
        .split(' ')
        .filter(|w| !METRIC_FILLER_WORDS.contains(w))
        .collect();
    stripped.is_empty()
        || store.metric_phrases().any(|p| p == norm)
        || Aggregation::parse(norm).is_some()
        || AGGREGATION_KEYWORDS.iter().any(|(keyword, _)| *keyword == norm)
        || COMPARISON_KEYWORDS.contains(&norm)
}

/// Aggregation keyword appearing first; a longer keyword wins at the same spot.
fn find_aggregation(text: &str) -> Aggregation {
    AGGREGATION_KEYWORDS
        .iter()
        .filter_map(|(keyword, agg)| find_phrase(text, keyword, 0).map(|pos| (pos, keyword.len(), *agg)))
        .min_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
        .map(|(_, _, agg)| agg)
        .unwrap_or(Aggregation::Latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;

    fn store() -> DatasetStore {
        let csv = "\
country,year,co2,co2_per_capita,methane,cumulative_co2
China,2010,100,1,10,1000
China,2023,200,2,20,2000
United States,2010,300,3,30,3000
United States,2023,400,4,40,4000
India,2023,50,0.5,5,500
Niger,2023,1,0.1,0.1,10
South Korea,2023,60,6,6,600
";
        DatasetStore::from_reader(csv.as_bytes(), &StoreConfig::default()).unwrap()
    }

    fn extract(question: &str) -> QueryIntent {
        RuleBasedExtractor::new().unwrap().extract_intent(question, &store())
    }

    #[test]
    fn test_average_co2_of_china() {
        let intent = extract("What is the average CO2 level of China?");
        assert_eq!(intent.metric, "co2");
        assert_eq!(intent.entities, vec!["china"]);
        assert_eq!(intent.aggregation, "average");
        assert_eq!(intent.time_range, None);
        assert!(!intent.comparison);
    }

    #[test]
    fn test_comparison_with_alias() {
        let intent = extract("Compare CO2 emissions between China and USA");
        assert_eq!(intent.metric, "co2");
        assert_eq!(intent.entities, vec!["china", "usa"]);
        assert!(intent.comparison);
        assert_eq!(intent.aggregation, "latest");
    }

    #[test]
    fn test_unknown_entity_is_kept() {
        let intent = extract("What is the average CO2 level of Narnia?");
        assert_eq!(intent.entities, vec!["Narnia"]);
    }

    #[test]
    fn test_possessive_names_an_entity() {
        let intent = extract("What is China's average CO2?");
        assert_eq!(intent.entities, vec!["china"]);
        assert_eq!(intent.metric, "co2");
        assert_eq!(intent.aggregation, "average");

        let intent = extract("Compare India\u{2019}s co2 with South Korea's");
        assert_eq!(intent.entities, vec!["india", "south korea"]);
    }

    #[test]
    fn test_lowercase_unknown_entity_is_kept() {
        let intent = extract("what is the average co2 of narnia");
        assert_eq!(intent.entities, vec!["narnia"]);

        // Ordinary words after a trigger are not places
        assert!(extract("co2 for all countries in the past").entities.is_empty());
        assert!(extract("average co2 in total").entities.is_empty());
        assert_eq!(extract("co2 of china over time").entities, vec!["china"]);
    }

    #[test]
    fn test_word_boundaries_for_entities() {
        let intent = extract("Methane in Niger");
        assert_eq!(intent.entities, vec!["niger"]);
        assert_eq!(intent.metric, "methane");

        let intent = extract("Indian methane emissions");
        assert!(intent.entities.is_empty());
    }

    #[test]
    fn test_longest_entity_wins() {
        let intent = extract("co2 per capita in South Korea");
        assert_eq!(intent.entities, vec!["south korea"]);
        assert_eq!(intent.metric, "co2_per_capita");
    }

    #[test]
    fn test_capitalized_us_is_a_mention() {
        let intent = extract("Show us the co2 trend in US");
        assert_eq!(intent.entities, vec!["US"]);
        assert_eq!(intent.aggregation, "trend");
    }

    #[test]
    fn test_year_patterns() {
        let range = |q: &str| extract(q).time_range;
        assert_eq!(range("co2 of China from 2015 to 2020"), Some(TimeRange::between(2015, 2020)));
        assert_eq!(range("co2 between 2012 and 2018"), Some(TimeRange::between(2012, 2018)));
        assert_eq!(range("co2 2015-2030"), Some(TimeRange::between(2015, 2030)));
        assert_eq!(range("co2 since 2015"), Some(TimeRange::since(2015)));
        assert_eq!(range("co2 before 2015"), Some(TimeRange::until(2015)));
        assert_eq!(range("co2 in 2150"), Some(TimeRange::year(2150)));
        assert_eq!(range("co2 over the last 5 years"), Some(TimeRange::between(2019, 2023)));
        assert_eq!(range("co2 last year"), Some(TimeRange::year(2023)));
        assert_eq!(range("co2 2012 vs 2020"), Some(TimeRange::between(2012, 2020)));
        assert_eq!(
            range("co2 of China in 2020 and 2021"),
            Some(TimeRange::between(2020, 2021))
        );
        assert_eq!(range("co2 in 2020, not 2020"), Some(TimeRange::year(2020)));
        assert_eq!(range("co2 of China"), None);
    }

    #[test]
    fn test_aggregation_keywords() {
        assert_eq!(extract("total methane of India").aggregation, "sum");
        assert_eq!(extract("highest co2 of China").aggregation, "max");
        assert_eq!(extract("lowest co2 of China").aggregation, "min");
        assert_eq!(extract("how many co2 values for China").aggregation, "count");
        assert_eq!(extract("co2 of China over time").aggregation, "trend");
        assert_eq!(extract("co2 of China").aggregation, "latest");
    }

    #[test]
    fn test_unknown_metric_phrase() {
        let intent = extract("What is the average rainfall in China?");
        assert_eq!(intent.metric, "rainfall");
        assert_eq!(intent.entities, vec!["china"]);

        assert_eq!(extract("Tell me something").metric, "");
    }

    #[test]
    fn test_metric_aliases() {
        assert_eq!(extract("per capita emissions of India").metric, "co2_per_capita");
        assert_eq!(extract("cumulative emissions of India").metric, "cumulative_co2");
        assert_eq!(extract("carbon dioxide of India").metric, "co2");
    }
}
