// TF-IDF key-term ranking.
//
// Uses the `keyword_extraction` crate with each sentence of the case as a
// separate document. Words that appear in every sentence get downweighted,
// words that carry one passage get boosted. The ranked terms surface in the
// evidence section of the answer next to the mapped concepts.

use anyhow::Result;
use keyword_extraction::tf_idf::{TfIdf, TfIdfParams};
use stop_words::{get, LANGUAGE};
use tracing::info;

/// Ranks the most distinctive words of a text.
pub struct KeywordRanker {
    /// How many top keywords to return
    pub top_n_keywords: usize,
}

impl Default for KeywordRanker {
    fn default() -> Self {
        Self { top_n_keywords: 8 }
    }
}

impl KeywordRanker {
    /// Rank keywords across `text`, split into sentence-sized documents.
    ///
    /// Returns an empty list for blank input rather than failing; key terms
    /// are an optional part of the answer.
    pub fn rank(&self, text: &str) -> Result<Vec<(String, f32)>> {
        let documents: Vec<String> = text
            .split(['.', '!', '?', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let stop_words: Vec<String> = get(LANGUAGE::English);
        let params = TfIdfParams::UnprocessedDocuments(&documents, &stop_words, None);
        let tfidf = TfIdf::new(params);

        let ranked: Vec<(String, f32)> = tfidf
            .get_ranked_word_scores(self.top_n_keywords)
            .into_iter()
            .filter(|(word, _)| word.chars().any(char::is_alphabetic))
            .collect();

        if let Some((top_keyword, top_score)) = ranked.first() {
            info!(
                keywords = ranked.len(),
                top_keyword = %top_keyword,
                top_score = top_score,
                "Ranked TF-IDF key terms"
            );
        }

        Ok(ranked)
    }
}
