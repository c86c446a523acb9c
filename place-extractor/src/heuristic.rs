use crate::{normalize_name, PlaceExtractor};
use regex::Regex;
use std::collections::HashSet;
use travelmate_core::{AppConfig, CoreError, CoreResult};

/// Lowercase words allowed between capitalized words of one name.
const CONNECTORS: &[&str] = &["of", "de", "del", "la", "el", "the", "and", "&", "di", "da"];

/// Words that usually precede a place name.
const CUE_WORDS: &[&str] = &["at", "in", "visit", "called", "to", "try"];

const ARTICLES: &[&str] = &["the", "a", "an"];

const PLACE_KEYWORDS: &[&str] = &[
    "cafe", "café", "restaurant", "bar", "hotel", "museum", "park", "temple", "shrine", "market",
    "mall", "garden", "tower", "castle", "palace", "church", "cathedral", "gallery", "bridge",
    "square", "beach", "station", "pizza", "coffee", "ferry",
];

const WORD_PATTERN: &str = r"[\p{L}\p{N}][\p{L}\p{N}'’&\-]*|&";
const QUOTED_PATTERN: &str = r#"["“]([^"“”\n]{3,60})["”]"#;

#[derive(Debug)]
struct Token<'t> {
    text: &'t str,
    start: usize,
    end: usize,
}

/// Capitalized spans and quoted phrases, filtered by a few cheap rules.
#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    word_pattern: Regex,
    quoted_pattern: Regex,
    stopwords: HashSet<String>,
    blocked: HashSet<String>,
    min_length: usize,
}

impl HeuristicExtractor {
    pub fn new() -> CoreResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| CoreError::Internal {
                message: format!("invalid extraction pattern: {}", e),
            })
        };
        let defaults = AppConfig::default();

        Ok(Self {
            word_pattern: compile(WORD_PATTERN)?,
            quoted_pattern: compile(QUOTED_PATTERN)?,
            stopwords: lowercase_set(&defaults.excluded_words),
            blocked: HashSet::new(),
            min_length: defaults.min_place_name_length,
        })
    }

    pub fn from_config(config: &AppConfig) -> CoreResult<Self> {
        Ok(Self::new()?
            .with_excluded(&config.excluded_words)
            .with_min_length(config.min_place_name_length))
    }

    /// Replace the leading words that are stripped from spans.
    pub fn with_excluded(mut self, words: &[String]) -> Self {
        self.stopwords = lowercase_set(words);
        self
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Never report `term` itself, e.g. the city being searched.
    pub fn exclude(mut self, term: &str) -> Self {
        let key = normalize_name(term);
        if !key.is_empty() {
            self.blocked.insert(key);
        }
        self
    }

    fn accept(&self, name: &str) -> bool {
        let key = normalize_name(name);
        name.chars().count() >= self.min_length
            && !self.blocked.contains(&key)
            && !self.stopwords.contains(&key)
    }

    fn quoted_phrases(&self, text: &str) -> Vec<(usize, String)> {
        self.quoted_pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let inner = caps.get(1)?.as_str().trim();
                self.accept(inner).then(|| (whole.start(), inner.to_string()))
            })
            .collect()
    }

    fn capitalized_spans(&self, text: &str) -> Vec<(usize, String)> {
        let tokens: Vec<Token> = self
            .word_pattern
            .find_iter(text)
            .map(|m| Token {
                text: m.as_str(),
                start: m.start(),
                end: m.end(),
            })
            .collect();
        // Adjacent tokens belong to one phrase only if nothing but spaces separates them.
        let joined = |a: usize, b: usize| text[tokens[a].end..tokens[b].start].trim().is_empty();

        let mut spans = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if !is_capitalized(tokens[i].text) {
                i += 1;
                continue;
            }

            let start = i;
            let mut end = i;
            loop {
                let next = end + 1;
                if next >= tokens.len() || !joined(end, next) {
                    break;
                }
                if is_capitalized(tokens[next].text) {
                    end = next;
                } else if is_connector(tokens[next].text)
                    && next + 1 < tokens.len()
                    && joined(next, next + 1)
                    && is_capitalized(tokens[next + 1].text)
                {
                    end = next + 1;
                } else {
                    break;
                }
            }

            let cue = follows_cue(&tokens, start, &joined);
            let words: Vec<&str> = tokens[start..=end].iter().map(|t| t.text).collect();
            if let Some(name) = self.finish_span(&words, cue) {
                if self.accept(&name) {
                    spans.push((tokens[start].start, name));
                }
            }
            i = end + 1;
        }
        spans
    }

    /// Strip leading filler and decide whether what remains looks like a place.
    fn finish_span(&self, words: &[&str], mut cue: bool) -> Option<String> {
        let mut article = false;
        let mut rest = words;

        while let Some((first, tail)) = rest.split_first() {
            let lower = first.to_lowercase();
            if ARTICLES.contains(&lower.as_str()) {
                article = true;
            } else if CUE_WORDS.contains(&lower.as_str()) {
                cue = true;
            } else if !self.stopwords.contains(&lower) && !is_connector(&lower) {
                break;
            }
            rest = tail;
        }
        while let Some((last, init)) = rest.split_last() {
            if !is_connector(&last.to_lowercase()) {
                break;
            }
            rest = init;
        }

        if rest.is_empty() {
            return None;
        }

        let has_keyword = rest
            .iter()
            .any(|w| PLACE_KEYWORDS.contains(&w.to_lowercase().as_str()));

        (rest.len() >= 2 || has_keyword || cue || article).then(|| rest.join(" "))
    }
}

impl PlaceExtractor for HeuristicExtractor {
    fn extract(&self, text: &str) -> Vec<String> {
        let mut found = self.quoted_phrases(text);
        found.extend(self.capitalized_spans(text));
        found.sort_by_key(|(offset, _)| *offset);

        let mut seen = HashSet::new();
        found
            .into_iter()
            .filter(|(_, name)| seen.insert(normalize_name(name)))
            .map(|(_, name)| name)
            .collect()
    }
}

fn lowercase_set(words: &[String]) -> HashSet<String> {
    words.iter().map(|w| w.trim().to_lowercase()).collect()
}

fn is_capitalized(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

fn is_connector(word: &str) -> bool {
    CONNECTORS.contains(&word)
}

/// The token before `start` (skipping one lowercase article) is a cue word.
fn follows_cue(tokens: &[Token], start: usize, joined: &impl Fn(usize, usize) -> bool) -> bool {
    let Some(mut prev) = start.checked_sub(1) else {
        return false;
    };
    if !joined(prev, start) {
        return false;
    }
    if ARTICLES.contains(&tokens[prev].text) {
        match prev.checked_sub(1) {
            Some(before) if joined(before, prev) => prev = before,
            _ => return false,
        }
    }
    CUE_WORDS.contains(&tokens[prev].text.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> HeuristicExtractor {
        HeuristicExtractor::new().unwrap()
    }

    #[test]
    fn test_empty_text() {
        assert!(extractor().extract("").is_empty());
        assert!(extractor().extract("   \n ").is_empty());
    }

    #[test]
    fn test_temple_after_cue_and_article() {
        let names = extractor().extract("You must visit the Senso-ji Temple before 8am.");
        assert_eq!(names, vec!["Senso-ji Temple"]);
    }

    #[test]
    fn test_leading_article_is_stripped() {
        let names = extractor().extract("The Meiji Shrine is also amazing! The Highline too.");
        assert_eq!(names, vec!["Meiji Shrine", "Highline"]);
    }

    #[test]
    fn test_connectors_join_words() {
        let names = extractor().extract(
            "Try the Labyrinth Park of Horta, then the Hospital de Sant Pau. Brunch & Cake is fun.",
        );
        assert!(names.contains(&"Labyrinth Park of Horta".to_string()));
        assert!(names.contains(&"Hospital de Sant Pau".to_string()));
        assert!(names.contains(&"Brunch & Cake".to_string()));
    }

    #[test]
    fn test_single_capitalized_word_needs_support() {
        // Sentence-initial words alone are not places
        assert!(extractor().extract("Definitely worth it.").is_empty());
        // A cue word is enough
        assert_eq!(extractor().extract("we stayed in Shibuya"), vec!["Shibuya"]);
        // So is a place keyword
        assert_eq!(extractor().extract("Museum was closed"), vec!["Museum"]);
    }

    #[test]
    fn test_punctuation_breaks_spans() {
        let names = extractor().extract("Golden Gai, Albatross Bar; Coins Bar.");
        assert_eq!(names, vec!["Golden Gai", "Albatross Bar", "Coins Bar"]);
    }

    #[test]
    fn test_quoted_phrases() {
        let names = extractor().extract(r#"locals call it "little harbour" and love it"#);
        assert_eq!(names, vec!["little harbour"]);
        // Too short
        assert!(extractor().extract(r#"a "xy" place"#).is_empty());
    }

    #[test]
    fn test_excluded_city_and_min_length() {
        let extractor = extractor().exclude("Tokyo");
        assert!(extractor.extract("Back in Tokyo again").is_empty());
        assert_eq!(extractor.extract("game at Tokyo Dome"), vec!["Tokyo Dome"]);
        assert!(extractor.extract("lunch at Xu").is_empty());
    }

    #[test]
    fn test_duplicates_within_text_collapse() {
        let names = extractor().extract("Nomad Coffee is great. Go to nomad coffee. Nomad  Coffee!");
        assert_eq!(names, vec!["Nomad Coffee"]);
    }

    #[test]
    fn test_from_config_uses_configured_words() {
        let config = AppConfig {
            excluded_words: vec!["Check".to_string()],
            min_place_name_length: 5,
            ..AppConfig::default()
        };
        let extractor = HeuristicExtractor::from_config(&config).unwrap();
        assert_eq!(
            extractor.extract("Check Prospect Park today, and eat at Lou"),
            vec!["Prospect Park"]
        );
    }
}
