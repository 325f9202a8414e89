// The concept table and its lookup index.
//
// The built-in knowledge base is compiled into the binary from
// data/knowledge_base.json. A replacement file with the same shape can be
// supplied through CASEWRITER_KNOWLEDGE_BASE.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::theory::Theory;

const BUILTIN_JSON: &str = include_str!("../../data/knowledge_base.json");

/// A named business concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    pub name: String,
    pub definition: String,
    /// Grouping used in the answer ("Strategic Theory", "Cost Structure", ...)
    pub category: String,
    /// The framework this concept belongs to, if any
    #[serde(default)]
    pub theory: Option<Theory>,
    /// Accepted paraphrases that map to this concept verbatim
    #[serde(default)]
    pub synonyms: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct KnowledgeBaseFile {
    concepts: Vec<Concept>,
}

/// How a lookup key resolved against the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Name,
    Synonym,
}

/// Ordered concept list plus a lowercase index over names and synonyms.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    concepts: Vec<Concept>,
    index: HashMap<String, (usize, KeyKind)>,
}

impl KnowledgeBase {
    /// The knowledge base shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_JSON).context("Built-in knowledge base is malformed")
    }

    /// Load a knowledge base from a JSON file on disk.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read knowledge base {}", path.display()))?;
        Self::from_json(&json)
            .with_context(|| format!("Invalid knowledge base {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: KnowledgeBaseFile = serde_json::from_str(json)?;
        Self::from_concepts(file.concepts)
    }

    /// Build the index. Names must be unique; a synonym that collides with a
    /// name or an earlier synonym is dropped so names always win.
    pub fn from_concepts(concepts: Vec<Concept>) -> Result<Self> {
        if concepts.is_empty() {
            anyhow::bail!("Knowledge base has no concepts");
        }

        let mut index = HashMap::new();
        for (i, concept) in concepts.iter().enumerate() {
            let key = normalize_key(&concept.name);
            if key.is_empty() {
                anyhow::bail!("Concept #{} has an empty name", i + 1);
            }
            if index.insert(key, (i, KeyKind::Name)).is_some() {
                anyhow::bail!("Duplicate concept name: {}", concept.name);
            }
        }

        for (i, concept) in concepts.iter().enumerate() {
            for synonym in &concept.synonyms {
                let key = normalize_key(synonym);
                if key.is_empty() {
                    continue;
                }
                if index.contains_key(&key) {
                    debug!(synonym = %synonym, concept = %concept.name, "Skipping shadowed synonym");
                    continue;
                }
                index.insert(key, (i, KeyKind::Synonym));
            }
        }

        Ok(Self { concepts, index })
    }

    /// Exact case-insensitive lookup by concept name or synonym.
    pub fn get(&self, term: &str) -> Option<&Concept> {
        self.lookup(term).map(|(c, _)| c)
    }

    /// Like `get`, but also reports whether the key was a name or a synonym.
    pub fn lookup(&self, term: &str) -> Option<(&Concept, KeyKind)> {
        self.index
            .get(&normalize_key(term))
            .map(|&(i, kind)| (&self.concepts[i], kind))
    }

    /// Look up by canonical name only.
    pub fn by_name(&self, name: &str) -> Option<&Concept> {
        match self.lookup(name) {
            Some((concept, KeyKind::Name)) => Some(concept),
            _ => None,
        }
    }

    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    /// Concept names in knowledge-base order — the matching vocabulary.
    pub fn names(&self) -> Vec<&str> {
        self.concepts.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn by_theory(&self, theory: Theory) -> Vec<&Concept> {
        self.concepts
            .iter()
            .filter(|c| c.theory == Some(theory))
            .collect()
    }

    /// Concepts grouped by category, categories sorted by name.
    pub fn categories(&self) -> BTreeMap<&str, Vec<&Concept>> {
        let mut groups: BTreeMap<&str, Vec<&Concept>> = BTreeMap::new();
        for concept in &self.concepts {
            groups.entry(concept.category.as_str()).or_default().push(concept);
        }
        groups
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}

/// Lowercase, unify typographic hyphens and collapse internal whitespace.
pub fn normalize_key(term: &str) -> String {
    term.split_whitespace()
        .map(|w| w.to_lowercase().replace(['\u{2010}', '\u{2011}', '\u{2013}'], "-"))
        .collect::<Vec<_>>()
        .join(" ")
}
