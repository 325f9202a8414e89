// Rule-based fact extraction.
//
// No tagger, no parser: phrases are cut at stop words, punctuation and known
// verbs, names are found through capitalization, and (when a vocabulary is
// supplied) knowledge-base terms are spotted verbatim. This is deliberately
// shallow; the mapping stage is tolerant of sloppy phrase edges.

use std::collections::HashSet;

use anyhow::Result;
use regex_lite::Regex;
use stop_words::{get, LANGUAGE};
use tracing::debug;

use super::facts::{ExtractedFacts, Fact, FactKind, Source};
use super::lexicon::{verb_lemma, BUSINESS_VERBS, GENERIC_VERBS};
use super::traits::FactExtractor;
use crate::knowledge::base::{normalize_key, KnowledgeBase};

/// Function words that always end a phrase, even if a knowledge-base term
/// contains them.
const CORE_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "did",
    "do", "does", "for", "from", "had", "has", "have", "how", "if", "in",
    "into", "is", "it", "its", "of", "on", "or", "so", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "those", "to",
    "was", "we", "were", "what", "when", "where", "which", "while", "who",
    "why", "will", "with", "would",
];

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "its", "their", "his", "her", "our", "my", "your",
    "this", "that", "these", "those", "each", "every", "some", "any", "no",
];

/// Words after which a bare business verb is read as a verb, not a noun.
const VERB_TRIGGERS: &[&str] = &[
    "to", "will", "would", "can", "could", "should", "must", "may", "might",
    "we", "they", "i", "you", "he", "she", "it", "did", "does", "do",
];

const ABBREVIATIONS: &[&str] = &[
    "inc", "corp", "co", "ltd", "llc", "mr", "mrs", "ms", "dr", "st", "vs",
    "e.g", "i.e", "u.s", "no",
];

#[derive(Debug)]
struct Token<'a> {
    text: &'a str,
    lower: String,
    sentence_start: bool,
    /// Punctuation separates this token from the previous one
    boundary_before: bool,
}

enum Verb {
    Business,
    Generic,
}

/// Shallow extractor driven by word lists and capitalization.
pub struct RuleExtractor {
    stop_words: HashSet<String>,
    /// Lowercased knowledge-base keys to spot verbatim, longest first
    vocabulary: Vec<String>,
    /// Longest noun phrase kept; longer runs keep their trailing words
    pub max_phrase_words: usize,
    sentence_re: Regex,
    token_re: Regex,
}

impl Default for RuleExtractor {
    fn default() -> Self {
        Self::build(Vec::new())
    }
}

impl RuleExtractor {
    /// Extractor that also spots knowledge-base names and synonyms, and never
    /// treats a word from those terms as a stop word.
    pub fn with_vocabulary(kb: &KnowledgeBase) -> Self {
        let mut vocabulary: Vec<String> = kb
            .concepts()
            .iter()
            .flat_map(|c| std::iter::once(&c.name).chain(c.synonyms.iter()))
            .map(|term| normalize_key(term))
            .filter(|term| !term.is_empty())
            .collect();
        vocabulary.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        vocabulary.dedup();
        Self::build(vocabulary)
    }

    fn build(vocabulary: Vec<String>) -> Self {
        let protected: HashSet<&str> = vocabulary
            .iter()
            .flat_map(|term| term.split(' '))
            .filter(|w| !CORE_STOP_WORDS.contains(w))
            .collect();

        let mut stop_words: HashSet<String> = get(LANGUAGE::English)
            .into_iter()
            .map(|w| w.to_lowercase())
            .filter(|w| !protected.contains(w.as_str()))
            .collect();
        stop_words.extend(CORE_STOP_WORDS.iter().map(|w| w.to_string()));

        Self {
            stop_words,
            vocabulary,
            max_phrase_words: 4,
            sentence_re: Regex::new(r#"[.!?]+["')\]”’]*\s+|\n+"#).expect("valid sentence regex"),
            token_re: Regex::new(r#"[^\s,;:!?()\[\]{}"“”—–/]+"#).expect("valid token regex"),
        }
    }

    fn is_stop(&self, lower: &str) -> bool {
        self.stop_words.contains(lower)
    }

    /// Split text into sentences, not breaking after common abbreviations.
    fn sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for m in self.sentence_re.find_iter(text) {
            let before = &text[start..m.start()];
            let last_word = before
                .rsplit(char::is_whitespace)
                .next()
                .unwrap_or("")
                .trim_matches(|c: char| !c.is_alphanumeric() && c != '.')
                .to_lowercase();
            if m.as_str().starts_with('.') && ABBREVIATIONS.contains(&last_word.as_str()) {
                continue;
            }
            let end = m.start() + m.as_str().find(char::is_whitespace).unwrap_or(m.len());
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = m.end();
        }
        let tail = text[start..].trim();
        if !tail.is_empty() {
            sentences.push(tail);
        }
        sentences
    }

    fn tokenize<'a>(&self, sentence: &'a str) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        let mut prev_end = 0;
        let mut pending_boundary = false;

        for m in self.token_re.find_iter(sentence) {
            let gap = &sentence[prev_end..m.start()];
            let boundary = pending_boundary || gap.chars().any(|c| !c.is_whitespace());
            prev_end = m.end();

            let raw = m.as_str();
            let text = raw.trim_matches(|c: char| matches!(c, '\'' | '’' | '.' | '-' | '*' | '#' | '_' | '`'));
            // Trailing sentence-internal periods ("etc.") still end a phrase
            pending_boundary = raw.ends_with('.');
            if text.is_empty() {
                pending_boundary = true;
                continue;
            }

            tokens.push(Token {
                text,
                lower: text.to_lowercase(),
                sentence_start: tokens.is_empty(),
                boundary_before: boundary,
            });
        }
        tokens
    }

    fn classify_verb(&self, tokens: &[Token<'_>], i: usize) -> Option<Verb> {
        let lower = tokens[i].lower.as_str();
        let prev = if i > 0 && !tokens[i].boundary_before {
            Some(tokens[i - 1].lower.as_str())
        } else {
            None
        };

        if verb_lemma(lower, GENERIC_VERBS).is_some() {
            return Some(Verb::Generic);
        }

        let lemma = verb_lemma(lower, BUSINESS_VERBS)?;
        let after_determiner = prev.is_some_and(|p| DETERMINERS.contains(&p));

        let is_verb = if lower == lemma {
            prev.is_some_and(|p| VERB_TRIGGERS.contains(&p))
        } else if lower.ends_with("ing") || lower.ends_with("ed") {
            !after_determiner
        } else {
            // -s form: a verb after a subject, a plural noun after a determiner
            match prev {
                None => true,
                Some(p) => {
                    !after_determiner && (!self.is_stop(p) || VERB_TRIGGERS.contains(&p))
                }
            }
        };

        is_verb.then_some(Verb::Business)
    }

    fn is_capitalized(token: &Token<'_>) -> bool {
        token.text.chars().next().is_some_and(char::is_uppercase)
    }

    fn is_acronym(token: &Token<'_>) -> bool {
        token.text.chars().count() >= 2
            && token.text.chars().any(char::is_alphabetic)
            && token
                .text
                .chars()
                .all(|c| c.is_uppercase() || c.is_ascii_digit() || c == '&')
    }

    fn flush_phrase(&self, phrase: &mut Vec<&Token<'_>>, facts: &mut ExtractedFacts, source: Source) {
        if phrase.is_empty() {
            return;
        }
        let keep = phrase.len().min(self.max_phrase_words.max(1));
        let text = phrase[phrase.len() - keep..]
            .iter()
            .map(|t| t.text)
            .collect::<Vec<_>>()
            .join(" ");
        facts.push_unique(Fact { text, kind: FactKind::NounPhrase, source });
        phrase.clear();
    }

    fn flush_entity(entity: &mut Vec<&Token<'_>>, facts: &mut ExtractedFacts, source: Source) {
        if entity.is_empty() {
            return;
        }
        let text = entity.iter().map(|t| t.text).collect::<Vec<_>>().join(" ");
        facts.push_unique(Fact { text, kind: FactKind::NamedEntity, source });
        entity.clear();
    }

    fn spot_vocabulary(&self, sentence_tokens: &[Vec<Token<'_>>], facts: &mut ExtractedFacts, source: Source) {
        if self.vocabulary.is_empty() {
            return;
        }
        for tokens in sentence_tokens {
            let joined = format!(
                " {} ",
                tokens.iter().map(|t| t.lower.as_str()).collect::<Vec<_>>().join(" ")
            );
            for term in &self.vocabulary {
                if joined.contains(&format!(" {term} ")) {
                    facts.push_unique(Fact {
                        text: term.clone(),
                        kind: FactKind::NounPhrase,
                        source,
                    });
                }
            }
        }
    }
}

impl FactExtractor for RuleExtractor {
    fn extract(&self, text: &str, source: Source) -> Result<ExtractedFacts> {
        let mut facts = ExtractedFacts::default();
        if text.trim().is_empty() {
            return Ok(facts);
        }

        let sentence_tokens: Vec<Vec<Token<'_>>> = self
            .sentences(text)
            .into_iter()
            .map(|s| self.tokenize(s))
            .collect();

        // Words seen capitalized away from a sentence start, so a sentence
        // opening with the same word can be trusted as a name too.
        let mid_caps: HashSet<&str> = sentence_tokens
            .iter()
            .flatten()
            .filter(|t| !t.sentence_start && Self::is_capitalized(t))
            .map(|t| t.lower.as_str())
            .collect();

        for tokens in &sentence_tokens {
            let mut phrase: Vec<&Token<'_>> = Vec::new();
            let mut entity: Vec<&Token<'_>> = Vec::new();

            for (i, token) in tokens.iter().enumerate() {
                if token.boundary_before {
                    self.flush_phrase(&mut phrase, &mut facts, source);
                    Self::flush_entity(&mut entity, &mut facts, source);
                }

                let verb = self.classify_verb(tokens, i);
                let stop = self.is_stop(&token.lower);
                let numeric = !token.text.chars().any(char::is_alphabetic);

                if let Some(Verb::Business) = verb {
                    if let Some(lemma) = verb_lemma(&token.lower, BUSINESS_VERBS) {
                        facts.push_unique(Fact {
                            text: lemma.to_string(),
                            kind: FactKind::BusinessVerb,
                            source,
                        });
                    }
                }

                // Named entities
                let entity_candidate = Self::is_capitalized(token)
                    && verb.is_none()
                    && (!stop
                        || (Self::is_acronym(token) && !CORE_STOP_WORDS.contains(&token.lower.as_str()))
                        || (!entity.is_empty() && ABBREVIATIONS.contains(&token.lower.as_str())))
                    && (!token.sentence_start
                        || Self::is_acronym(token)
                        || mid_caps.contains(token.lower.as_str())
                        || tokens
                            .get(i + 1)
                            .is_some_and(|next| !next.boundary_before && Self::is_capitalized(next)));
                if entity_candidate {
                    entity.push(token);
                } else {
                    Self::flush_entity(&mut entity, &mut facts, source);
                }

                // Noun phrases
                if verb.is_some() || stop || numeric {
                    self.flush_phrase(&mut phrase, &mut facts, source);
                } else {
                    phrase.push(token);
                }
            }
            self.flush_phrase(&mut phrase, &mut facts, source);
            Self::flush_entity(&mut entity, &mut facts, source);
        }

        self.spot_vocabulary(&sentence_tokens, &mut facts, source);

        debug!(
            source = %source,
            noun_phrases = facts.noun_phrases.len(),
            business_verbs = facts.business_verbs.len(),
            named_entities = facts.named_entities.len(),
            "Extracted facts"
        );

        Ok(facts)
    }
}
