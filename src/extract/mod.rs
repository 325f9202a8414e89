// Fact extraction — candidate phrases, verbs and names pulled from free text.

pub mod facts;
pub mod keywords;
pub mod lexicon;
pub mod rules;
pub mod traits;

use anyhow::Result;
use tracing::info;

use facts::{ExtractedFacts, Source};
use traits::FactExtractor;

/// Extract facts from the case and the question with the same extractor.
pub fn process_case_text(
    extractor: &dyn FactExtractor,
    case_text: &str,
    question_text: &str,
) -> Result<(ExtractedFacts, ExtractedFacts)> {
    info!("Processing case and question text");
    let case_facts = extractor.extract(case_text, Source::Case)?;
    let question_facts = extractor.extract(question_text, Source::Question)?;
    Ok((case_facts, question_facts))
}
