// Composition tests — the pipeline stages chained end to end.
//
//   extract -> map -> assemble -> export
//
// Everything runs against the built-in knowledge base and templates with the
// n-gram matcher, so there are no model files or network calls. Export tests
// write into the system temp directory and clean up.

use std::sync::Arc;

use casewriter::assemble::answer::{AnswerRequest, FALLBACK_ANSWER};
use casewriter::assemble::templates::TemplateSet;
use casewriter::config::Config;
use casewriter::export::{self, ExportFormat, ExportOptions};
use casewriter::extract::facts::Source;
use casewriter::knowledge::base::KnowledgeBase;
use casewriter::knowledge::theory::Theory;
use casewriter::mapping::semantic::NgramMatcher;
use casewriter::pipeline::Pipeline;

fn pipeline() -> Pipeline {
    Pipeline::from_parts(
        Arc::new(KnowledgeBase::builtin().unwrap()),
        TemplateSet::builtin(),
        Box::new(NgramMatcher),
        Config::default(),
    )
}

fn request(case: &str, question: &str) -> AnswerRequest {
    AnswerRequest {
        case_text: case.to_string(),
        question_text: question.to_string(),
        ..Default::default()
    }
}

const APPLE_CASE: &str = "Apple built a platform ecosystem around the iPhone. \
    Its competitive advantage comes from network effects: every new developer \
    on the App Store makes the device more valuable to buyers, and every buyer \
    attracts more developers. Switching costs keep customers loyal.";

// ============================================================
// Chain: question text -> concept -> answer
// ============================================================

#[test]
fn porters_five_forces_in_question_reaches_answer() {
    let answer = pipeline()
        .assemble_answer(&request(
            "The airline industry has many rivals and powerful suppliers.",
            "Apply Porter's Five Forces to the airline industry.",
        ))
        .unwrap();

    assert!(answer.text.contains("Five Forces"), "answer: {}", answer.text);
    assert!(answer.theories.contains(&Theory::CompetitiveDynamics));
}

#[test]
fn apple_case_covers_platform_concepts() {
    let answer = pipeline()
        .assemble_answer(&request(
            APPLE_CASE,
            "How does Apple sustain its competitive advantage?",
        ))
        .unwrap();

    let lower = answer.text.to_lowercase();
    assert!(lower.contains("competitive advantage"), "answer: {}", answer.text);
    assert!(lower.contains("network effects"), "answer: {}", answer.text);
    assert!(lower.contains("platform"), "answer: {}", answer.text);
    assert!(answer.theories.contains(&Theory::PlatformStrategy));
    assert!(answer.theories.contains(&Theory::Rbv));
}

#[test]
fn answer_has_sections_in_order() {
    let mut req = request(
        "Apple's network effects create a competitive advantage.",
        "Why does it last?",
    );
    req.instructions_text = "Answer in two paragraphs.".to_string();
    req.word_limit = Some(550);
    let text = pipeline().assemble_answer(&req).unwrap().text;

    let positions: Vec<usize> = [
        "## Strategic Concepts",
        "## Case-Specific Evidence",
        "## Additional Context",
        "## Conclusion",
    ]
    .iter()
    .map(|h| text.find(h).unwrap_or_else(|| panic!("missing {h} in:\n{text}")))
    .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "sections out of order:\n{text}");
}

// ============================================================
// Degenerate inputs
// ============================================================

#[test]
fn unrelated_text_gets_fallback() {
    let answer = pipeline()
        .assemble_answer(&request("Zorblat quixed the vumbles.", "Plenk?"))
        .unwrap();
    assert!(answer.text.starts_with(FALLBACK_ANSWER), "answer: {}", answer.text);
    assert!(answer.matches.is_empty());
    assert!(answer.theories.is_empty());
}

#[test]
fn empty_inputs_still_produce_text() {
    let answer = pipeline().assemble_answer(&AnswerRequest::default()).unwrap();
    assert!(!answer.text.trim().is_empty());
    assert!(answer.word_count > 0);
}

// ============================================================
// Request options
// ============================================================

#[test]
fn top_n_limits_matches_and_length() {
    let p = pipeline();
    let full = p
        .assemble_answer(&request(APPLE_CASE, "Discuss network effects and switching costs."))
        .unwrap();
    let mut limited_req = request(APPLE_CASE, "Discuss network effects and switching costs.");
    limited_req.top_n = Some(1);
    let limited = p.assemble_answer(&limited_req).unwrap();

    assert!(full.matches.len() > 1);
    assert_eq!(limited.matches.len(), 1);
    assert!(limited.word_count < full.word_count);
}

#[test]
fn only_question_ignores_case_concepts() {
    let mut req = request(APPLE_CASE, "Explain the barriers to entry.");
    req.only_question = true;
    let answer = pipeline().assemble_answer(&req).unwrap();

    assert!(!answer.matches.is_empty());
    assert!(answer
        .matches
        .iter()
        .all(|m| m.source == Some(Source::Question)));
    assert!(answer.text.contains("Barriers to Entry"));
}

#[test]
fn word_limit_and_style_prefix() {
    let mut req = request(APPLE_CASE, "What is Apple's competitive advantage?");
    req.word_limit = Some(30);
    req.style_instructions = "Make it student-like".to_string();
    let answer = pipeline().assemble_answer(&req).unwrap();

    assert!(answer.truncated);
    assert!(answer.text.starts_with("REVISED[Make it student-like]:"));
    assert!(answer.text.ends_with('…'));
}

// ============================================================
// Chain: analysis -> export -> read back
// ============================================================

#[test]
fn analysis_exports_to_every_format() {
    let dir = std::env::temp_dir().join("casewriter-composition-export");
    let _ = std::fs::remove_dir_all(&dir);

    let answer = pipeline()
        .assemble_answer(&request(APPLE_CASE, "What drives Apple's platform?"))
        .unwrap();
    let options = ExportOptions::default();

    for format in [ExportFormat::Markdown, ExportFormat::Docx, ExportFormat::Txt] {
        let path = dir.join(format!("answer.{}", format.extension()));
        let written = export::export(&answer.text, &path, None, &options).unwrap();
        assert_eq!(written, format);

        let back = export::read_input(&path).unwrap();
        assert!(back.contains("Strategic Concepts"), "{format}: {back}");
        assert!(back.contains("Network Effects"), "{format}: {back}");
    }

    std::fs::remove_dir_all(&dir).unwrap();
}
