// Answer composition from mapped concepts and theory templates.
//
// The answer is Markdown-flavoured plain text: `##` headings separate the
// sections so the exporters can turn them into document headings.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::templates::{render, TemplateSet};
use crate::extract::facts::Source;
use crate::knowledge::theory::Theory;
use crate::mapping::mapper::{
    group_by_category, identify_relevant_theories, top_matches, MappedConcept, UNMAPPED,
};

pub const DEFAULT_WORD_LIMIT: usize = 500;
pub const MAX_WORD_LIMIT: usize = 550;

pub const NO_CONCEPTS: &str = "No strategic concepts were detected.";
pub const FALLBACK_ANSWER: &str =
    "No strategic concepts were detected. Please broaden your question or lower matching thresholds.";

const ELLIPSIS: char = '…';

/// Everything the user supplies for one answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerRequest {
    pub case_text: String,
    pub question_text: String,
    pub instructions_text: String,
    pub user_inputs_text: String,
    pub style_instructions: String,
    /// Only use concepts found in the question
    pub only_question: bool,
    /// Keep at most this many matches; `None` or 0 keeps all
    pub top_n: Option<usize>,
    /// Word cap for the answer; `None` uses the default, capped at the maximum
    pub word_limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub theories: Vec<Theory>,
    pub matches: Vec<MappedConcept>,
    pub word_count: usize,
    pub truncated: bool,
}

/// One sentence per category listing its concepts.
///
/// `Unmapped` and empty categories are skipped. With nothing left the
/// result is the "no concepts" sentence.
pub fn build_concept_sentences(grouped: &[(String, Vec<MappedConcept>)]) -> String {
    let mut sentences = Vec::new();

    for (category, concepts) in grouped {
        if category == UNMAPPED {
            continue;
        }
        let labels: Vec<String> = concepts
            .iter()
            .filter(|c| c.is_mapped())
            .map(|c| match c.theory {
                Some(theory) => format!("{} ({})", c.label(), theory.code()),
                None => c.label().to_string(),
            })
            .collect();
        if labels.is_empty() {
            continue;
        }

        let mut name = category.replace('_', " ").to_lowercase();
        if !name.ends_with("concepts") {
            name.push_str(" concepts");
        }
        sentences.push(format!("In this case, the {name} include: {}.", labels.join(", ")));
    }

    if sentences.is_empty() {
        NO_CONCEPTS.to_string()
    } else {
        sentences.join(" ")
    }
}

/// Compose the answer text for a request from its mapped terms.
///
/// `mapped` is the full cascade output for every source; `key_terms` are the
/// TF-IDF terms of the case. The word limit covers the style prefix too.
pub fn compose_answer(
    templates: &TemplateSet,
    request: &AnswerRequest,
    mapped: &[MappedConcept],
    key_terms: &[String],
) -> Answer {
    let pool: Vec<MappedConcept> = if request.only_question {
        mapped
            .iter()
            .filter(|m| m.source == Some(Source::Question))
            .cloned()
            .collect()
    } else {
        mapped.to_vec()
    };

    let mut matches = top_matches(&pool);
    if let Some(n) = request.top_n.filter(|n| *n > 0) {
        matches.truncate(n);
    }
    let theories = identify_relevant_theories(&matches);

    let mut sections: Vec<String> = Vec::new();

    if matches.is_empty() {
        sections.push(FALLBACK_ANSWER.to_string());
    } else {
        sections.push(strategic_concepts(templates, &matches, &theories));
        sections.push(evidence(&matches, key_terms));
    }

    if let Some(context) = additional_context(request) {
        sections.push(context);
    }

    if !matches.is_empty() && !theories.is_empty() {
        let conclusions: Vec<String> = theories
            .iter()
            .map(|t| render_with(&templates.get(*t).conclusion, &theory_vars(*t, &matches)))
            .collect();
        sections.push(format!("## Conclusion\n\n{}", conclusions.join("\n\n")));
    }

    let body = sections.join("\n\n");
    let limit = request.word_limit.unwrap_or(DEFAULT_WORD_LIMIT);
    let revised = revise_answer(&body, &request.style_instructions);
    let (text, truncated) = enforce_word_limit(&revised, limit);
    let word_count = count_words(&text);

    debug!(
        matches = matches.len(),
        theories = theories.len(),
        word_count,
        truncated,
        "Composed answer"
    );

    Answer {
        text,
        theories,
        matches,
        word_count,
        truncated,
    }
}

fn strategic_concepts(templates: &TemplateSet, matches: &[MappedConcept], theories: &[Theory]) -> String {
    let mut parts = vec!["## Strategic Concepts".to_string()];

    for theory in theories {
        let template = templates.get(*theory);
        let vars = theory_vars(*theory, matches);
        parts.push(format!("### {}", theory.display_name()));
        parts.push(render_with(&template.intro, &vars));
        parts.push(render_with(&template.analysis, &vars));
    }

    // Concepts outside any framework still get described
    let unaffiliated: Vec<MappedConcept> =
        matches.iter().filter(|m| m.theory.is_none()).cloned().collect();
    if !unaffiliated.is_empty() {
        parts.push(build_concept_sentences(&group_by_category(&unaffiliated)));
    }

    parts.join("\n\n")
}

fn theory_vars(theory: Theory, matches: &[MappedConcept]) -> Vec<(&'static str, String)> {
    let members: Vec<MappedConcept> = matches
        .iter()
        .filter(|m| m.theory == Some(theory))
        .cloned()
        .collect();
    let names: Vec<&str> = members.iter().map(MappedConcept::label).collect();
    vec![
        ("CONCEPT_SENTENCES", build_concept_sentences(&group_by_category(&members))),
        ("CONCEPTS", names.join(", ")),
        ("THEORY", theory.display_name().to_string()),
    ]
}

fn render_with(template: &str, vars: &[(&'static str, String)]) -> String {
    let refs: Vec<(&str, &str)> = vars.iter().map(|(k, v)| (*k, v.as_str())).collect();
    render(template, &refs)
}

fn evidence(matches: &[MappedConcept], key_terms: &[String]) -> String {
    let mut lines = vec!["## Case-Specific Evidence".to_string(), String::new()];

    for m in matches {
        let percent = (m.confidence * 100.0).round() as u32;
        let mut line = format!("- {} ({percent}% match)", m.label());
        if let Some(definition) = &m.definition {
            line.push_str(&format!(": {definition}"));
        }
        if let Some(source) = m.source {
            line.push_str(&format!(" (from the {source}: \"{}\")", m.term));
        }
        lines.push(line);
    }

    if !key_terms.is_empty() {
        lines.push(String::new());
        lines.push(format!("Key terms: {}", key_terms.join(", ")));
    }

    lines.join("\n")
}

fn additional_context(request: &AnswerRequest) -> Option<String> {
    let mut parts = Vec::new();
    let instructions = request.instructions_text.trim();
    if !instructions.is_empty() {
        parts.push(format!("Instructions: {instructions}"));
    }
    let inputs = request.user_inputs_text.trim();
    if !inputs.is_empty() {
        parts.push(format!("User inputs: {inputs}"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(format!("## Additional Context\n\n{}", parts.join("\n\n")))
    }
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Cut `text` after `limit` words, keeping its original line layout.
///
/// The limit is capped at `MAX_WORD_LIMIT`; 0 means the default. Returns
/// the text and whether it was cut.
pub fn enforce_word_limit(text: &str, limit: usize) -> (String, bool) {
    let limit = match limit {
        0 => DEFAULT_WORD_LIMIT,
        n => n.min(MAX_WORD_LIMIT),
    };

    let mut words = 0;
    let mut in_word = false;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if in_word {
                words += 1;
                if words == limit {
                    if text[i..].trim().is_empty() {
                        return (text.to_string(), false);
                    }
                    let mut cut = drop_dangling_heading(text[..i].trim_end()).to_string();
                    cut.push(ELLIPSIS);
                    return (cut, true);
                }
            }
            in_word = false;
        } else {
            in_word = true;
        }
    }

    (text.to_string(), false)
}

/// Drop a trailing bare heading marker (`##`) left by a cut.
fn drop_dangling_heading(text: &str) -> &str {
    let start = text.rfind(char::is_whitespace).map_or(0, |i| i + 1);
    let last = &text[start..];
    if !last.is_empty() && last.chars().all(|c| c == '#') {
        text[..start].trim_end()
    } else {
        text
    }
}

/// Prefix the answer with the style it was revised for.
pub fn revise_answer(answer: &str, style: &str) -> String {
    let style = style.trim();
    if style.is_empty() {
        answer.to_string()
    } else {
        format!("REVISED[{style}]:\n{answer}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::mapper::MatchMethod;

    fn concept(name: &str, category: &str, theory: Option<Theory>, confidence: f64, source: Source) -> MappedConcept {
        MappedConcept {
            term: name.to_lowercase(),
            concept: Some(name.to_string()),
            definition: Some(format!("Definition of {name}.")),
            category: category.to_string(),
            theory,
            confidence,
            method: MatchMethod::Exact,
            source: Some(source),
        }
    }

    fn unmapped(term: &str) -> MappedConcept {
        MappedConcept {
            term: term.to_string(),
            concept: None,
            definition: None,
            category: UNMAPPED.to_string(),
            theory: None,
            confidence: 0.0,
            method: MatchMethod::Unmapped,
            source: Some(Source::Case),
        }
    }

    #[test]
    fn test_concept_sentences_format() {
        let grouped = vec![
            (
                "Strategic Theory".to_string(),
                vec![
                    concept("Opportunism", "Strategic Theory", Some(Theory::Tce), 1.0, Source::Case),
                    concept("Core Competence", "Strategic Theory", None, 1.0, Source::Case),
                ],
            ),
            ("Unmapped".to_string(), vec![unmapped("weather")]),
        ];
        assert_eq!(
            build_concept_sentences(&grouped),
            "In this case, the strategic theory concepts include: Opportunism (TCE), Core Competence."
        );
    }

    #[test]
    fn test_concept_sentences_category_already_plural() {
        let grouped = vec![(
            "MARKET_CONCEPTS".to_string(),
            vec![concept("Market Share", "MARKET_CONCEPTS", None, 1.0, Source::Case)],
        )];
        assert_eq!(
            build_concept_sentences(&grouped),
            "In this case, the market concepts include: Market Share."
        );
    }

    #[test]
    fn test_concept_sentences_empty() {
        assert_eq!(build_concept_sentences(&[]), NO_CONCEPTS);
        let only_unmapped = vec![("Unmapped".to_string(), vec![unmapped("x")])];
        assert_eq!(build_concept_sentences(&only_unmapped), NO_CONCEPTS);
    }

    #[test]
    fn test_compose_sections_in_order() {
        let mapped = vec![
            concept("Network Effects", "Strategic Theory", Some(Theory::PlatformStrategy), 1.0, Source::Case),
            concept("Market Share", "Market Strategy", None, 0.8, Source::Question),
        ];
        let request = AnswerRequest {
            instructions_text: "Use two frameworks.".into(),
            ..Default::default()
        };
        let answer = compose_answer(&TemplateSet::builtin(), &request, &mapped, &["platform".into()]);

        let text = &answer.text;
        let strategic = text.find("## Strategic Concepts").unwrap();
        let evidence = text.find("## Case-Specific Evidence").unwrap();
        let context = text.find("## Additional Context").unwrap();
        let conclusion = text.find("## Conclusion").unwrap();
        assert!(strategic < evidence && evidence < context && context < conclusion);

        assert!(text.contains("Network Effects (PlatformStrategy)"));
        assert!(text.contains("In this case, the market strategy concepts include: Market Share."));
        assert!(text.contains("- Market Share (80% match)"));
        assert!(text.contains("Key terms: platform"));
        assert!(text.contains("Instructions: Use two frameworks."));
        assert_eq!(answer.theories, vec![Theory::PlatformStrategy]);
        assert!(!answer.truncated);
    }

    #[test]
    fn test_compose_without_matches_uses_fallback() {
        let request = AnswerRequest {
            user_inputs_text: "Focus on costs".into(),
            ..Default::default()
        };
        let answer = compose_answer(&TemplateSet::builtin(), &request, &[unmapped("weather")], &[]);
        assert!(answer.text.starts_with(FALLBACK_ANSWER));
        assert!(answer.text.contains("User inputs: Focus on costs"));
        assert!(answer.matches.is_empty());
        assert!(!answer.text.contains("## Conclusion"));
    }

    #[test]
    fn test_only_question_and_top_n() {
        let mapped = vec![
            concept("Opportunism", "Strategic Theory", Some(Theory::Tce), 1.0, Source::Case),
            concept("Network Effects", "Strategic Theory", Some(Theory::PlatformStrategy), 0.9, Source::Question),
            concept("Value Chain", "Operations", None, 0.8, Source::Question),
        ];
        let request = AnswerRequest {
            only_question: true,
            top_n: Some(1),
            ..Default::default()
        };
        let answer = compose_answer(&TemplateSet::builtin(), &request, &mapped, &[]);
        assert_eq!(answer.matches.len(), 1);
        assert_eq!(answer.matches[0].concept.as_deref(), Some("Network Effects"));
        assert!(!answer.text.contains("Opportunism"));
    }

    #[test]
    fn test_style_prefix_applied() {
        let mapped = vec![concept("Opportunism", "Strategic Theory", Some(Theory::Tce), 1.0, Source::Case)];
        let request = AnswerRequest {
            style_instructions: "Make it student-like".into(),
            ..Default::default()
        };
        let answer = compose_answer(&TemplateSet::builtin(), &request, &mapped, &[]);
        assert!(answer.text.starts_with("REVISED[Make it student-like]:\n## Strategic Concepts"));
    }

    #[test]
    fn test_enforce_word_limit_truncates_at_word() {
        let (out, cut) = enforce_word_limit("one two three four", 2);
        assert_eq!(out, "one two…");
        assert!(cut);
    }

    #[test]
    fn test_enforce_word_limit_keeps_short_text() {
        let (out, cut) = enforce_word_limit("one two\n", 2);
        assert_eq!(out, "one two\n");
        assert!(!cut);
        let (out, cut) = enforce_word_limit("", 10);
        assert_eq!(out, "");
        assert!(!cut);
    }

    #[test]
    fn test_enforce_word_limit_caps_at_maximum() {
        let text = vec!["word"; 600].join(" ");
        let (out, cut) = enforce_word_limit(&text, 10_000);
        assert!(cut);
        assert_eq!(count_words(&out), MAX_WORD_LIMIT);
    }

    #[test]
    fn test_enforce_word_limit_drops_bare_heading_marker() {
        let (out, cut) = enforce_word_limit("one two\n\n## Conclusion\n\nmore words", 3);
        assert_eq!(out, "one two…");
        assert!(cut);
    }

    #[test]
    fn test_style_prefix_counts_toward_maximum() {
        let mut long = concept("Opportunism", "Strategic Theory", Some(Theory::Tce), 1.0, Source::Case);
        long.definition = Some(vec!["detail"; 700].join(" "));
        let request = AnswerRequest {
            style_instructions: "Write it like a second year student with short plain sentences and no jargon at all".into(),
            word_limit: Some(MAX_WORD_LIMIT),
            ..Default::default()
        };
        let answer = compose_answer(&TemplateSet::builtin(), &request, &[long], &[]);
        assert!(answer.truncated);
        assert!(answer.word_count <= MAX_WORD_LIMIT, "got {}", answer.word_count);
        assert!(answer.text.starts_with("REVISED[Write it like"));
    }

    #[test]
    fn test_revise_answer() {
        assert_eq!(revise_answer("text", ""), "text");
        assert_eq!(revise_answer("text", " formal "), "REVISED[formal]:\ntext");
    }
}
