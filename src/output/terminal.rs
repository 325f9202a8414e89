// Colored terminal output for analyses, term mappings and the knowledge base.
//
// main.rs display calls delegate here.

use colored::Colorize;

use crate::knowledge::base::KnowledgeBase;
use crate::knowledge::theory::Theory;
use crate::mapping::mapper::{MappedConcept, MatchMethod};
use crate::pipeline::Analysis;

/// Display the answer followed by the matches that produced it.
pub fn display_analysis(analysis: &Analysis) {
    let answer = &analysis.answer;

    println!(
        "\n{}",
        format!(
            "=== Answer ({} words{}) ===",
            answer.word_count,
            if answer.truncated { ", truncated" } else { "" }
        )
        .bold()
    );
    println!();
    for line in answer.text.lines() {
        if line.starts_with('#') {
            println!("{}", line.bold());
        } else {
            println!("{line}");
        }
    }
    println!();

    let theories: Vec<&str> = answer.theories.iter().map(|t| t.display_name()).collect();
    if theories.is_empty() {
        println!("  Theories: {}", "none".dimmed());
    } else {
        println!("  Theories: {}", theories.join(", ").cyan());
    }
    println!(
        "  Facts: {} case, {} question, {} other",
        analysis.facts.case.len(),
        analysis.facts.question.len(),
        analysis.facts.instructions.len() + analysis.facts.user_inputs.len(),
    );
    if !analysis.key_terms.is_empty() {
        println!("  Key terms: {}", analysis.key_terms.join(", ").dimmed());
    }

    display_mapping(&answer.matches);
}

/// Display how each term mapped.
pub fn display_mapping(mapped: &[MappedConcept]) {
    if mapped.is_empty() {
        println!("\nNo concepts matched.");
        return;
    }

    println!("\n{}", format!("=== Concept Matches ({}) ===", mapped.len()).bold());
    println!();

    println!(
        "  {:<28} {:<28} {:>5}  {:<9}  {:<20}",
        "Term".dimmed(),
        "Concept".dimmed(),
        "Conf".dimmed(),
        "Method".dimmed(),
        "Theory".dimmed(),
    );
    println!("  {}", "-".repeat(96).dimmed());

    for m in mapped {
        let concept = m.concept.as_deref().unwrap_or("-");
        let theory = m.theory.map(Theory::code).unwrap_or("-");
        println!(
            "  {:<28} {:<28} {:>5.2}  {:<9}  {:<20}",
            super::truncate_chars(&m.term, 26),
            super::truncate_chars(concept, 26),
            m.confidence,
            colorize_method(m.method),
            theory,
        );
    }
    println!();
}

/// List the knowledge base, grouped by category, optionally for one theory.
pub fn display_concepts(kb: &KnowledgeBase, theory: Option<Theory>) {
    let title = match theory {
        Some(t) => format!("=== {} concepts ===", t.display_name()),
        None => format!("=== Knowledge Base ({} concepts) ===", kb.len()),
    };
    println!("\n{}", title.bold());

    let mut shown = 0;
    for (category, concepts) in kb.categories() {
        let members: Vec<_> = concepts
            .into_iter()
            .filter(|c| theory.is_none() || c.theory == theory)
            .collect();
        if members.is_empty() {
            continue;
        }

        println!("\n  {}", category.cyan().bold());
        for concept in members {
            let code = concept
                .theory
                .map(|t| format!(" [{}]", t.code()))
                .unwrap_or_default();
            println!(
                "    {}{}  {}",
                concept.name,
                code.yellow(),
                super::truncate_chars(&concept.definition, 90).dimmed()
            );
            shown += 1;
        }
    }

    if shown == 0 {
        println!("\n  No concepts for this theory.");
    }
    println!();
}

fn colorize_method(method: MatchMethod) -> colored::ColoredString {
    let label = match method {
        MatchMethod::Exact => "exact",
        MatchMethod::Synonym => "synonym",
        MatchMethod::Fuzzy => "fuzzy",
        MatchMethod::Semantic => "semantic",
        MatchMethod::Unmapped => "unmapped",
    };
    match method {
        MatchMethod::Exact | MatchMethod::Synonym => label.green(),
        MatchMethod::Fuzzy => label.yellow(),
        MatchMethod::Semantic => label.bright_blue(),
        MatchMethod::Unmapped => label.dimmed(),
    }
}
