// Extracted facts and where they came from.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What kind of fact a phrase is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    NounPhrase,
    BusinessVerb,
    NamedEntity,
}

/// Which input text a fact was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Case,
    Question,
    Instructions,
    UserInputs,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Source::Case => "case",
            Source::Question => "question",
            Source::Instructions => "instructions",
            Source::UserInputs => "user inputs",
        };
        f.write_str(s)
    }
}

/// A single extracted phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub text: String,
    pub kind: FactKind,
    pub source: Source,
}

/// Everything one extraction pass found in a text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedFacts {
    pub noun_phrases: Vec<Fact>,
    pub business_verbs: Vec<Fact>,
    pub named_entities: Vec<Fact>,
}

impl ExtractedFacts {
    /// All facts in mapping order: entities, then noun phrases, then verbs.
    pub fn terms(&self) -> Vec<&Fact> {
        self.named_entities
            .iter()
            .chain(self.noun_phrases.iter())
            .chain(self.business_verbs.iter())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.noun_phrases.is_empty()
            && self.business_verbs.is_empty()
            && self.named_entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.noun_phrases.len() + self.business_verbs.len() + self.named_entities.len()
    }

    /// Add a fact unless an equal (case-insensitive) one of the same kind exists.
    pub fn push_unique(&mut self, fact: Fact) {
        let bucket = match fact.kind {
            FactKind::NounPhrase => &mut self.noun_phrases,
            FactKind::BusinessVerb => &mut self.business_verbs,
            FactKind::NamedEntity => &mut self.named_entities,
        };
        let key = fact.text.to_lowercase();
        if !bucket.iter().any(|f| f.text.to_lowercase() == key) {
            bucket.push(fact);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(text: &str, kind: FactKind) -> Fact {
        Fact {
            text: text.to_string(),
            kind,
            source: Source::Case,
        }
    }

    #[test]
    fn test_terms_order() {
        let mut facts = ExtractedFacts::default();
        facts.push_unique(fact("expand", FactKind::BusinessVerb));
        facts.push_unique(fact("market share", FactKind::NounPhrase));
        facts.push_unique(fact("Apple", FactKind::NamedEntity));

        let order: Vec<&str> = facts.terms().iter().map(|f| f.text.as_str()).collect();
        assert_eq!(order, vec!["Apple", "market share", "expand"]);
    }

    #[test]
    fn test_push_unique_ignores_case() {
        let mut facts = ExtractedFacts::default();
        facts.push_unique(fact("Network Effects", FactKind::NounPhrase));
        facts.push_unique(fact("network effects", FactKind::NounPhrase));
        facts.push_unique(fact("ÜBER PLATFORM", FactKind::NounPhrase));
        facts.push_unique(fact("über platform", FactKind::NounPhrase));
        assert_eq!(facts.noun_phrases.len(), 2);
    }
}
