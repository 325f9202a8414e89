// Fact extractor trait — swap-ready abstraction.
//
// The default implementation is rule based (stop words, a verb lexicon and
// capitalization). A model-backed extractor can slot in behind the same trait
// without touching mapping or assembly.

use anyhow::Result;

use super::facts::{ExtractedFacts, Source};

/// Trait for pulling structured facts out of a block of text.
pub trait FactExtractor: Send + Sync {
    /// Analyze `text` and tag every fact with `source`.
    fn extract(&self, text: &str, source: Source) -> Result<ExtractedFacts>;
}
