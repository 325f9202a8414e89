// System status display — configuration, knowledge base, templates, model.

use anyhow::Result;
use colored::Colorize;

use crate::assemble::templates::TemplateSection;
use crate::config::{Config, MatcherBackend};
use crate::knowledge::base::KnowledgeBase;
use crate::knowledge::theory::Theory;
use crate::model::{embedding_files_present, embedding_model_dir};

/// Display system status to the terminal.
pub fn show(config: &Config) -> Result<()> {
    let kb = match &config.knowledge_base {
        Some(path) => {
            let kb = KnowledgeBase::load(path)?;
            println!("Knowledge base: {} ({} concepts)", path.display(), kb.len());
            kb
        }
        None => {
            let kb = KnowledgeBase::builtin()?;
            println!("Knowledge base: built-in ({} concepts)", kb.len());
            kb
        }
    };
    let with_theory = kb.concepts().iter().filter(|c| c.theory.is_some()).count();
    println!(
        "  {} categories, {} concepts tied to a theory",
        kb.categories().len(),
        with_theory
    );

    let overrides = count_template_overrides(config);
    if overrides == 0 {
        println!("Templates: built-in ({} not found or empty)", config.templates_dir.display());
        println!("  Run `casewriter init-templates` to write editable copies");
    } else {
        println!(
            "Templates: {} ({} section overrides)",
            config.templates_dir.display(),
            overrides
        );
    }

    println!(
        "Matching: fuzzy >= {:.0}, semantic >= {:.2} via {}",
        config.fuzzy_threshold,
        config.semantic_threshold,
        config.matcher.name()
    );

    let model_dir = embedding_model_dir(&config.model_dir);
    if embedding_files_present(&config.model_dir) {
        println!("Embedding model: {} {}", model_dir.display(), "(present)".green());
    } else {
        let note = if config.matcher == MatcherBackend::Embedding {
            "(missing, required by CASEWRITER_MATCHER=embedding)".red()
        } else {
            "(not downloaded)".dimmed()
        };
        println!("Embedding model: {} {}", model_dir.display(), note);
    }

    println!(
        "Answers: up to {} words; Word export heading \"{}\" at {}pt",
        config.word_limit, config.heading, config.font_size
    );

    Ok(())
}

/// Number of template section files present in the templates directory.
pub fn count_template_overrides(config: &Config) -> usize {
    Theory::ALL
        .iter()
        .flat_map(|t| {
            let dir = config.templates_dir.join(t.code().to_lowercase());
            TemplateSection::ALL
                .iter()
                .map(move |s| dir.join(s.file_name()))
        })
        .filter(|p| p.is_file())
        .count()
}
