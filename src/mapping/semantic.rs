// Semantic matching — the last resort after exact and fuzzy matching fail.
//
// A SemanticMatcher produces a 0–1 similarity for the term against every
// choice. `semantic_match_term` wraps that in the selection rules: exact hits
// and strong plain-ratio hits short-circuit, and when both signals are weak
// the reported score is the weaker of the two so unrelated terms stay low.

use std::collections::{HashMap, HashSet};

use anyhow::Result;

use super::fuzzy;

/// Plain-ratio score (0–1) at or above which fuzzy evidence wins outright.
const STRONG_FUZZY: f64 = 0.8;

/// Trait for similarity backends — swap-ready abstraction.
pub trait SemanticMatcher: Send + Sync {
    /// Short backend name for logs and status output.
    fn name(&self) -> &'static str;

    /// Similarity (0.0–1.0) of `term` to each choice, same order as `choices`.
    fn similarities(&self, term: &str, choices: &[&str]) -> Result<Vec<f64>>;
}

/// Best choice for `term` combining plain-ratio and semantic evidence.
///
/// Returns `None` only when `choices` is empty.
pub fn semantic_match_term(
    term: &str,
    choices: &[&str],
    matcher: &dyn SemanticMatcher,
) -> Result<Option<(String, f64)>> {
    if choices.is_empty() {
        return Ok(None);
    }

    let term_clean = term.trim().to_lowercase();

    if let Some(exact) = choices.iter().find(|c| c.to_lowercase() == term_clean) {
        return Ok(Some((exact.to_string(), 1.0)));
    }

    let mut best_fuzzy: Option<(&str, f64)> = None;
    for &choice in choices {
        let score = fuzzy::ratio(&term_clean, &choice.to_lowercase()) / 100.0;
        if best_fuzzy.map_or(true, |(_, s)| score > s) {
            best_fuzzy = Some((choice, score));
        }
    }
    let (fuzzy_choice, fuzzy_score) = best_fuzzy.unwrap_or((choices[0], 0.0));

    if fuzzy_score >= STRONG_FUZZY {
        return Ok(Some((fuzzy_choice.to_string(), fuzzy_score)));
    }

    let lowered: Vec<String> = choices.iter().map(|c| c.to_lowercase()).collect();
    let lowered_refs: Vec<&str> = lowered.iter().map(String::as_str).collect();
    let sims = matcher.similarities(&term_clean, &lowered_refs)?;

    let mut best_sim: (&str, f64) = (choices[0], 0.0);
    for (&choice, &sim) in choices.iter().zip(sims.iter()) {
        if sim > best_sim.1 {
            best_sim = (choice, sim);
        }
    }
    let (sim_choice, sim_score) = best_sim;

    if fuzzy_score < 0.3 && sim_score < 0.7 {
        return Ok(Some((sim_choice.to_string(), fuzzy_score.min(sim_score))));
    }

    if fuzzy_score > sim_score {
        Ok(Some((fuzzy_choice.to_string(), fuzzy_score)))
    } else {
        Ok(Some((sim_choice.to_string(), sim_score)))
    }
}

/// Character-trigram cosine similarity. Local, instant, no model files.
///
/// Catches spelling variants and shared word stems ("platforms strategy",
/// "strategic platform") that token-level fuzzy scoring undervalues.
#[derive(Debug, Default, Clone)]
pub struct NgramMatcher;

impl SemanticMatcher for NgramMatcher {
    fn name(&self) -> &'static str {
        "ngram"
    }

    fn similarities(&self, term: &str, choices: &[&str]) -> Result<Vec<f64>> {
        let term_grams = trigram_weights(term);
        Ok(choices
            .iter()
            .map(|c| cosine_from_weights(&term_grams, &trigram_weights(c)))
            .collect())
    }
}

/// Count the character trigrams of each word, padded with spaces.
pub fn trigram_weights(text: &str) -> HashMap<String, f64> {
    let mut weights = HashMap::new();
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = format!(" {word} ").chars().collect();
        for gram in padded.windows(3) {
            *weights.entry(gram.iter().collect::<String>()).or_insert(0.0) += 1.0;
        }
    }
    weights
}

/// Cosine similarity of two sparse weight maps, 0.0 when either is empty.
pub fn cosine_from_weights(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let keys: HashSet<&String> = a.keys().chain(b.keys()).collect();
    if keys.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0;
    for key in keys {
        let x = a.get(key).copied().unwrap_or(0.0);
        let y = b.get(key).copied().unwrap_or(0.0);
        dot += x * y;
    }

    let mag_a: f64 = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let mag_b: f64 = b.values().map(|v| v * v).sum::<f64>().sqrt();
    let denom = mag_a * mag_b;
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(0.0, 1.0)
    }
}
