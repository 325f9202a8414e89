// Concept mapper — the exact → synonym → fuzzy → semantic cascade.
//
// Every extracted term produces exactly one MappedConcept. Terms that clear
// no threshold are kept as "Unmapped" with confidence 0.0 so the caller can
// still report what was seen.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::fuzzy;
use super::semantic::{semantic_match_term, SemanticMatcher};
use crate::extract::facts::{ExtractedFacts, Source};
use crate::knowledge::base::{Concept, KeyKind, KnowledgeBase};
use crate::knowledge::theory::Theory;

pub const UNMAPPED: &str = "Unmapped";

/// Default minimum token-sort score (0–100) for a fuzzy match.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 70.0;
/// Default minimum similarity (0–1) for a semantic match.
pub const DEFAULT_SEMANTIC_THRESHOLD: f64 = 0.65;

/// Which stage of the cascade produced a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Exact,
    Synonym,
    Fuzzy,
    Semantic,
    Unmapped,
}

/// One extracted term and the concept it mapped to, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappedConcept {
    /// The phrase as extracted
    pub term: String,
    /// Canonical concept name; `None` when unmapped
    pub concept: Option<String>,
    pub definition: Option<String>,
    pub category: String,
    pub theory: Option<Theory>,
    /// 0.0–1.0
    pub confidence: f64,
    pub method: MatchMethod,
    pub source: Option<Source>,
}

impl MappedConcept {
    fn mapped(term: &str, concept: &Concept, confidence: f64, method: MatchMethod) -> Self {
        Self {
            term: term.to_string(),
            concept: Some(concept.name.clone()),
            definition: Some(concept.definition.clone()),
            category: concept.category.clone(),
            theory: concept.theory,
            confidence: confidence.clamp(0.0, 1.0),
            method,
            source: None,
        }
    }

    fn unmapped(term: &str) -> Self {
        Self {
            term: term.to_string(),
            concept: None,
            definition: None,
            category: UNMAPPED.to_string(),
            theory: None,
            confidence: 0.0,
            method: MatchMethod::Unmapped,
            source: None,
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.concept.is_some()
    }

    /// Concept name for display, falling back to the raw term.
    pub fn label(&self) -> &str {
        self.concept.as_deref().unwrap_or(&self.term)
    }
}

/// Maps terms onto a knowledge base.
pub struct ConceptMapper {
    kb: Arc<KnowledgeBase>,
    /// Minimum token-sort score (0–100)
    pub fuzzy_threshold: f64,
    /// Minimum semantic similarity (0–1)
    pub semantic_threshold: f64,
    semantic: Option<Box<dyn SemanticMatcher>>,
}

impl ConceptMapper {
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self {
            kb,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            semantic_threshold: DEFAULT_SEMANTIC_THRESHOLD,
            semantic: None,
        }
    }

    pub fn with_thresholds(mut self, fuzzy: f64, semantic: f64) -> Self {
        self.fuzzy_threshold = fuzzy;
        self.semantic_threshold = semantic;
        self
    }

    pub fn with_semantic(mut self, matcher: Box<dyn SemanticMatcher>) -> Self {
        self.semantic = Some(matcher);
        self
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn semantic_backend(&self) -> Option<&'static str> {
        self.semantic.as_ref().map(|m| m.name())
    }

    /// Map a single term through the cascade.
    pub fn map_term(&self, term: &str) -> Result<MappedConcept> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(MappedConcept::unmapped(term));
        }

        if let Some((concept, kind)) = self.kb.lookup(term) {
            let method = match kind {
                KeyKind::Name => MatchMethod::Exact,
                KeyKind::Synonym => MatchMethod::Synonym,
            };
            return Ok(MappedConcept::mapped(term, concept, 1.0, method));
        }

        let names = self.kb.names();

        if let Some((name, score)) = fuzzy::best_match(term, &names) {
            if score >= self.fuzzy_threshold {
                if let Some(concept) = self.kb.by_name(name) {
                    debug!(term, concept = %concept.name, score, "Fuzzy match");
                    return Ok(MappedConcept::mapped(term, concept, score / 100.0, MatchMethod::Fuzzy));
                }
            }
        }

        if let Some(matcher) = &self.semantic {
            if let Some((name, score)) = semantic_match_term(term, &names, matcher.as_ref())? {
                if score >= self.semantic_threshold {
                    if let Some(concept) = self.kb.by_name(&name) {
                        debug!(term, concept = %concept.name, score, backend = matcher.name(), "Semantic match");
                        return Ok(MappedConcept::mapped(term, concept, score, MatchMethod::Semantic));
                    }
                }
            }
        }

        Ok(MappedConcept::unmapped(term))
    }

    /// Map a list of bare terms, in order.
    pub fn map_terms<S: AsRef<str>>(&self, terms: &[S]) -> Result<Vec<MappedConcept>> {
        terms.iter().map(|t| self.map_term(t.as_ref())).collect()
    }

    /// Map every fact of every pass, keeping each fact's source.
    ///
    /// Repeated phrases from the same source are mapped once.
    pub fn map_facts(&self, passes: &[&ExtractedFacts]) -> Result<Vec<MappedConcept>> {
        let mut seen: HashSet<(String, Source)> = HashSet::new();
        let mut mapped = Vec::new();

        for facts in passes {
            for fact in facts.terms() {
                if !seen.insert((fact.text.to_lowercase(), fact.source)) {
                    continue;
                }
                let mut m = self.map_term(&fact.text)?;
                m.source = Some(fact.source);
                mapped.push(m);
            }
        }

        info!(
            terms = mapped.len(),
            mapped = mapped.iter().filter(|m| m.is_mapped()).count(),
            "Mapped extracted terms"
        );
        Ok(mapped)
    }
}

/// Group mapped concepts by category, categories in first-seen order.
pub fn group_by_category(mapped: &[MappedConcept]) -> Vec<(String, Vec<MappedConcept>)> {
    let mut groups: Vec<(String, Vec<MappedConcept>)> = Vec::new();
    for m in mapped {
        match groups.iter_mut().find(|(category, _)| *category == m.category) {
            Some((_, members)) => members.push(m.clone()),
            None => groups.push((m.category.clone(), vec![m.clone()])),
        }
    }
    groups
}

/// The theories touched by the mapped concepts, sorted by code.
pub fn identify_relevant_theories(mapped: &[MappedConcept]) -> Vec<Theory> {
    let mut theories: Vec<Theory> = mapped.iter().filter_map(|m| m.theory).collect();
    theories.sort_by_key(|t| t.code());
    theories.dedup();
    theories
}

/// Mapped-only view: one entry per concept (highest confidence, earliest on
/// ties), ordered by confidence descending.
pub fn top_matches(mapped: &[MappedConcept]) -> Vec<MappedConcept> {
    let mut best: Vec<MappedConcept> = Vec::new();
    for m in mapped.iter().filter(|m| m.is_mapped()) {
        match best.iter_mut().find(|b| b.concept == m.concept) {
            Some(existing) if m.confidence > existing.confidence => *existing = m.clone(),
            Some(_) => {}
            None => best.push(m.clone()),
        }
    }
    best.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    best
}
