// Unit tests for fact extraction and key-term ranking.
//
// Runs the rule extractor over short business passages and checks what it
// keeps: vocabulary terms, business verbs, named entities, and the source
// tag on every fact.

use casewriter::extract::facts::{ExtractedFacts, FactKind, Source};
use casewriter::extract::keywords::KeywordRanker;
use casewriter::extract::process_case_text;
use casewriter::extract::rules::RuleExtractor;
use casewriter::extract::traits::FactExtractor;
use casewriter::knowledge::base::KnowledgeBase;

fn extractor() -> RuleExtractor {
    RuleExtractor::with_vocabulary(&KnowledgeBase::builtin().unwrap())
}

fn phrase_texts(facts: &ExtractedFacts) -> Vec<String> {
    facts.noun_phrases.iter().map(|f| f.text.to_lowercase()).collect()
}

// ============================================================
// vocabulary spotting
// ============================================================

#[test]
fn spots_multiword_synonym_across_stop_words() {
    let facts = extractor()
        .extract("Apply Porter's Five Forces to the airline industry.", Source::Question)
        .unwrap();
    let found = phrase_texts(&facts);
    assert!(found.contains(&"porter's five forces".to_string()), "got {found:?}");
}

#[test]
fn spots_vocabulary_regardless_of_case() {
    let facts = extractor()
        .extract("SWITCHING COSTS keep buyers loyal.", Source::Case)
        .unwrap();
    let found = phrase_texts(&facts);
    assert!(found.contains(&"switching costs".to_string()), "got {found:?}");
}

#[test]
fn default_extractor_has_no_vocabulary() {
    let facts = RuleExtractor::default()
        .extract("Barriers to entry protect incumbents.", Source::Case)
        .unwrap();
    let found = phrase_texts(&facts);
    assert!(!found.contains(&"barriers to entry".to_string()), "got {found:?}");
}

// ============================================================
// facts and sources
// ============================================================

#[test]
fn every_fact_carries_its_source() {
    let facts = extractor()
        .extract(
            "Tesla will expand its battery supply chain in Nevada.",
            Source::UserInputs,
        )
        .unwrap();
    assert!(!facts.is_empty());
    assert!(facts.terms().iter().all(|f| f.source == Source::UserInputs));
}

#[test]
fn business_verbs_are_lemmatized() {
    let facts = extractor()
        .extract("The firm acquired two rivals and expanded abroad.", Source::Case)
        .unwrap();
    let verbs: Vec<&str> = facts.business_verbs.iter().map(|f| f.text.as_str()).collect();
    assert!(verbs.contains(&"acquire"), "got {verbs:?}");
    assert!(verbs.contains(&"expand"), "got {verbs:?}");
    assert!(facts
        .business_verbs
        .iter()
        .all(|f| f.kind == FactKind::BusinessVerb));
}

#[test]
fn process_case_text_tags_both_passes() {
    let (case, question) = process_case_text(
        &extractor(),
        "Netflix built network effects.",
        "How strong are the network effects?",
    )
    .unwrap();
    assert!(case.terms().iter().all(|f| f.source == Source::Case));
    assert!(question.terms().iter().all(|f| f.source == Source::Question));
    assert!(phrase_texts(&question).contains(&"network effects".to_string()));
}

#[test]
fn blank_text_yields_no_facts() {
    let facts = extractor().extract("", Source::Instructions).unwrap();
    assert!(facts.is_empty());
    assert_eq!(facts.len(), 0);
}

// ============================================================
// KeywordRanker
// ============================================================

#[test]
fn ranker_respects_top_n() {
    let ranker = KeywordRanker { top_n_keywords: 3 };
    let text = "Uber matched riders with drivers. Drivers joined for flexible income. \
                Riders wanted short waits. Surge pricing balanced riders and drivers. \
                Regulators questioned driver classification.";
    let ranked = ranker.rank(text).unwrap();
    assert!(!ranked.is_empty());
    assert!(ranked.len() <= 3);
}

#[test]
fn ranker_drops_numeric_tokens() {
    let ranker = KeywordRanker::default();
    let ranked = ranker
        .rank("Revenue grew 2024. Margins fell 2023. Costs rose 2022.")
        .unwrap();
    assert!(ranked
        .iter()
        .all(|(word, _)| word.chars().any(char::is_alphabetic)));
}
