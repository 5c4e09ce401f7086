//! Offline extractor built on regex tokenization and word lists.
//!
//! Rules, applied per sentence:
//! - runs of capitalized words are entities (label `PROPN`); a lone
//!   capitalized word only counts when it does not open the sentence
//! - known verb forms and `-ing` forms become verbs, normalized to a base form
//! - remaining content words longer than three characters become concepts
//! - two or more consecutive content words form a noun phrase
//!
//! Output is lowercased except for entities, and deduplicated in order of
//! first appearance.

use crate::{ElementExtractor, ExtractError};
use regex::Regex;
use seedgraph_graph::{Element, ElementSet, ElementType};
use std::collections::HashSet;

pub const PROPER_NOUN_LABEL: &str = "PROPN";

const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be",
    "been", "before", "being", "between", "both", "but", "by", "can", "could", "did", "do",
    "does", "each", "for", "from", "had", "has", "have", "he", "her", "here", "him", "his", "how",
    "i", "if", "in", "into", "is", "it", "its", "just", "may", "me", "might", "more", "most", "much",
    "must", "my", "near", "no", "not", "of", "on", "or", "other", "our", "over", "she", "should",
    "so", "some", "such", "than", "that", "the", "their", "them", "then", "there", "these", "they",
    "this", "those", "through", "to", "too", "under", "up", "very", "was", "we", "were", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would", "you",
    "your",
];

const BASE_VERBS: &[&str] = &[
    "affect", "analyze", "book", "build", "buy", "change", "choose", "compare", "cook", "create",
    "describe", "design", "develop", "eat", "explain", "explore", "find", "get", "go", "grow",
    "help", "hire", "implement", "improve", "increase", "invest", "learn", "live", "make",
    "manage", "measure", "move", "need", "offer", "plan", "prepare", "prevent", "reduce", "rent",
    "see", "sell", "serve", "shop", "start", "stay", "study", "support", "teach", "train",
    "travel", "treat", "try", "understand", "use", "visit", "walk", "want", "watch", "work",
    "write",
];

const IRREGULAR_VERBS: &[(&str, &str)] = &[
    ("ate", "eat"),
    ("bought", "buy"),
    ("built", "build"),
    ("chose", "choose"),
    ("found", "find"),
    ("gone", "go"),
    ("grew", "grow"),
    ("made", "make"),
    ("saw", "see"),
    ("seen", "see"),
    ("sold", "sell"),
    ("taught", "teach"),
    ("went", "go"),
    ("wrote", "write"),
];

// Common nouns ending in -ing.
const ING_NOUNS: &[&str] = &[
    "anything", "building", "ceiling", "clothing", "during", "evening", "everything", "housing",
    "king", "meeting", "morning", "nothing", "ring", "something", "spring", "string", "thing",
    "wedding",
];

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Word {
        text: &'a str,
        sentence_start: bool,
    },
    Break,
}

#[derive(Debug)]
pub struct HeuristicExtractor {
    token_re: Regex,
    stop_words: HashSet<&'static str>,
    base_verbs: HashSet<&'static str>,
}

impl HeuristicExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            token_re: Regex::new(r"[\p{L}\p{N}][\p{L}\p{N}'&\-]*|[.?!,;:()]")?,
            stop_words: STOP_WORDS.iter().copied().collect(),
            base_verbs: BASE_VERBS.iter().copied().collect(),
        })
    }

    fn tokenize<'a>(&self, text: &'a str) -> Vec<Token<'a>> {
        let mut out = Vec::new();
        let mut sentence_start = true;
        for m in self.token_re.find_iter(text) {
            let s = m.as_str();
            if s.chars().next().is_some_and(char::is_alphanumeric) {
                out.push(Token::Word {
                    text: s,
                    sentence_start,
                });
                sentence_start = false;
            } else {
                out.push(Token::Break);
                sentence_start = matches!(s, "." | "?" | "!");
            }
        }
        out
    }

    fn is_stop(&self, lower: &str) -> bool {
        self.stop_words.contains(lower)
    }

    /// Base form of a verb-looking word, if it looks like a verb.
    fn verb_lemma(&self, lower: &str) -> Option<String> {
        if self.base_verbs.contains(lower) {
            return Some(lower.to_string());
        }
        if let Some((_, base)) = IRREGULAR_VERBS.iter().find(|(form, _)| *form == lower) {
            return Some((*base).to_string());
        }
        if let Some(stem) = lower.strip_suffix("ies") {
            let base = format!("{stem}y");
            if self.base_verbs.contains(base.as_str()) {
                return Some(base);
            }
        }
        for stem in [lower.strip_suffix("es"), lower.strip_suffix('s')]
            .into_iter()
            .flatten()
        {
            if self.base_verbs.contains(stem) {
                return Some(stem.to_string());
            }
        }
        if let Some(stem) = lower.strip_suffix("ed") {
            if let Some(base) = self.known_stem(stem) {
                return Some(base);
            }
        }
        if let Some(stem) = lower.strip_suffix("ing") {
            if let Some(base) = self.known_stem(stem) {
                return Some(base);
            }
            if lower.chars().count() > 5 && !ING_NOUNS.contains(&lower) {
                return Some(undouble(stem).to_string());
            }
        }
        None
    }

    /// Map a suffix-stripped stem back to a known base verb.
    fn known_stem(&self, stem: &str) -> Option<String> {
        if stem.is_empty() {
            return None;
        }
        let with_e = format!("{stem}e");
        let with_y = stem.strip_suffix('i').map(|s| format!("{s}y"));
        [stem.to_string(), with_e, undouble(stem).to_string()]
            .into_iter()
            .chain(with_y)
            .find(|candidate| self.base_verbs.contains(candidate.as_str()))
    }
}

fn undouble(stem: &str) -> &str {
    let bytes = stem.as_bytes();
    let n = bytes.len();
    if n >= 3 && bytes[n - 1] == bytes[n - 2] && bytes[n - 1].is_ascii_alphabetic() {
        &stem[..n - 1]
    } else {
        stem
    }
}

fn is_capitalized(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

fn push_unique(
    set: &mut ElementSet,
    seen: &mut HashSet<(ElementType, String)>,
    ty: ElementType,
    element: Element,
) {
    if seen.insert((ty.clone(), element.text().to_string())) {
        set.push(ty, element);
    }
}

impl ElementExtractor for HeuristicExtractor {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn extract(&self, text: &str) -> Result<ElementSet, ExtractError> {
        let tokens = self.tokenize(text);
        let mut in_entity = vec![false; tokens.len()];
        let mut out = ElementSet::with_builtin_types();
        let mut seen = HashSet::new();

        // Entities: runs of capitalized, non-stop words.
        let mut i = 0;
        while i < tokens.len() {
            let mut j = i;
            while let Some(Token::Word { text: w, .. }) = tokens.get(j) {
                if !is_capitalized(w) || self.is_stop(&w.to_lowercase()) {
                    break;
                }
                j += 1;
            }
            if j == i {
                i += 1;
                continue;
            }

            let mut start = i;
            if let Token::Word {
                text: first,
                sentence_start: true,
            } = &tokens[i]
            {
                // A sentence-opening verb ("Compare ...") is not part of the name.
                if self.verb_lemma(&first.to_lowercase()).is_some() || j - i == 1 {
                    start = i + 1;
                }
            }
            if start < j {
                let words: Vec<&str> = tokens[start..j]
                    .iter()
                    .filter_map(|t| match t {
                        Token::Word { text, .. } => Some(*text),
                        Token::Break => None,
                    })
                    .collect();
                push_unique(
                    &mut out,
                    &mut seen,
                    ElementType::Entities,
                    Element::labeled(words.join(" "), PROPER_NOUN_LABEL),
                );
                in_entity[start..j].fill(true);
            }
            i = j;
        }

        // Verbs, concepts and noun phrases over the remaining words.
        let mut run: Vec<String> = Vec::new();
        let flush = |run: &mut Vec<String>, out: &mut ElementSet, seen: &mut HashSet<_>| {
            if run.len() >= 2 {
                push_unique(out, seen, ElementType::NounPhrases, Element::plain(run.join(" ")));
            }
            run.clear();
        };

        for (idx, token) in tokens.iter().enumerate() {
            let Token::Word { text: word, .. } = token else {
                flush(&mut run, &mut out, &mut seen);
                continue;
            };
            if in_entity[idx] {
                flush(&mut run, &mut out, &mut seen);
                continue;
            }
            let lower = word.to_lowercase();
            if self.is_stop(&lower) {
                flush(&mut run, &mut out, &mut seen);
                continue;
            }
            if let Some(lemma) = self.verb_lemma(&lower) {
                flush(&mut run, &mut out, &mut seen);
                push_unique(&mut out, &mut seen, ElementType::Verbs, Element::plain(lemma));
                continue;
            }
            if lower.chars().count() > 3 {
                push_unique(
                    &mut out,
                    &mut seen,
                    ElementType::Concepts,
                    Element::plain(lower.clone()),
                );
            }
            run.push(lower);
        }
        flush(&mut run, &mut out, &mut seen);

        tracing::debug!(elements = out.len(), "heuristic extraction");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(set: &ElementSet, ty: ElementType) -> Vec<String> {
        set.get(&ty).iter().map(|e| e.text().to_string()).collect()
    }

    #[test]
    fn attractions_query() {
        let ex = HeuristicExtractor::new().unwrap();
        let set = ex.extract("What are popular attractions in Seattle?").unwrap();

        assert_eq!(
            set.get(&ElementType::Entities),
            &[Element::labeled("Seattle", PROPER_NOUN_LABEL)]
        );
        assert_eq!(texts(&set, ElementType::NounPhrases), vec!["popular attractions"]);
        assert_eq!(texts(&set, ElementType::Concepts), vec!["popular", "attractions"]);
        assert!(set.get(&ElementType::Verbs).is_empty());
    }

    #[test]
    fn multi_word_entities_and_verbs() {
        let ex = HeuristicExtractor::new().unwrap();
        let set = ex
            .extract("How does Google Cloud Platform compare to AWS?")
            .unwrap();

        assert_eq!(
            texts(&set, ElementType::Entities),
            vec!["Google Cloud Platform", "AWS"]
        );
        assert_eq!(texts(&set, ElementType::Verbs), vec!["compare"]);
        assert!(set.get(&ElementType::Concepts).is_empty());
    }

    #[test]
    fn restaurant_query() {
        let ex = HeuristicExtractor::new().unwrap();
        let set = ex
            .extract("Where can I find the best vegan restaurants in Austin?")
            .unwrap();

        assert_eq!(texts(&set, ElementType::Entities), vec!["Austin"]);
        assert_eq!(texts(&set, ElementType::Verbs), vec!["find"]);
        assert_eq!(
            texts(&set, ElementType::NounPhrases),
            vec!["best vegan restaurants"]
        );
        assert_eq!(
            texts(&set, ElementType::Concepts),
            vec!["best", "vegan", "restaurants"]
        );
    }

    #[test]
    fn sentence_opening_verb_is_not_an_entity() {
        let ex = HeuristicExtractor::new().unwrap();
        let set = ex.extract("Compare Tesla Motors with Ford.").unwrap();
        assert_eq!(texts(&set, ElementType::Entities), vec!["Tesla Motors", "Ford"]);
        assert_eq!(texts(&set, ElementType::Verbs), vec!["compare"]);
    }

    #[test]
    fn verb_forms_normalize() {
        let ex = HeuristicExtractor::new().unwrap();
        for (form, lemma) in [
            ("visiting", "visit"),
            ("visited", "visit"),
            ("studies", "study"),
            ("cooking", "cook"),
            ("shopping", "shop"),
            ("managed", "manage"),
            ("bought", "buy"),
            ("swimming", "swim"),
        ] {
            assert_eq!(ex.verb_lemma(form).as_deref(), Some(lemma), "{form}");
        }
        assert_eq!(ex.verb_lemma("morning"), None);
        assert_eq!(ex.verb_lemma("attractions"), None);
    }

    #[test]
    fn empty_and_duplicate_input() {
        let ex = HeuristicExtractor::new().unwrap();
        let empty = ex.extract("   ").unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.types().count(), 4);

        let dup = ex.extract("coffee coffee. Coffee beans, coffee.").unwrap();
        assert_eq!(texts(&dup, ElementType::Concepts), vec!["coffee", "beans"]);
    }
}
