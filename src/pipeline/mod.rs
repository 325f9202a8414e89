// Pipeline — extraction, mapping and assembly wired together from config.
//
// Export is left to the caller: the CLI writes files, the web UI streams
// bytes, tests look at the text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::assemble::answer::{compose_answer, Answer, AnswerRequest};
use crate::assemble::templates::TemplateSet;
use crate::config::{Config, MatcherBackend};
use crate::export::read_input;
use crate::extract::facts::{ExtractedFacts, Source};
use crate::extract::keywords::KeywordRanker;
use crate::extract::process_case_text;
use crate::extract::rules::RuleExtractor;
use crate::extract::traits::FactExtractor;
use crate::knowledge::base::KnowledgeBase;
use crate::mapping::embeddings::EmbeddingMatcher;
use crate::mapping::mapper::{ConceptMapper, MappedConcept};
use crate::mapping::semantic::{NgramMatcher, SemanticMatcher};
use crate::model::embedding_model_dir;

/// Facts found in each input text.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceFacts {
    pub case: ExtractedFacts,
    pub question: ExtractedFacts,
    pub instructions: ExtractedFacts,
    pub user_inputs: ExtractedFacts,
}

impl SourceFacts {
    pub fn all(&self) -> [&ExtractedFacts; 4] {
        [&self.case, &self.question, &self.instructions, &self.user_inputs]
    }

    pub fn total(&self) -> usize {
        self.all().iter().map(|f| f.len()).sum()
    }
}

/// Everything one run produced, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub facts: SourceFacts,
    /// Every extracted term, mapped or not
    pub mapped: Vec<MappedConcept>,
    pub key_terms: Vec<String>,
    pub answer: Answer,
}

/// Input files for one run. Optional texts default to empty.
#[derive(Debug, Clone, Default)]
pub struct InputFiles {
    pub case: PathBuf,
    pub question: PathBuf,
    pub instructions: Option<PathBuf>,
    pub user_inputs: Option<PathBuf>,
    pub style: Option<PathBuf>,
}

pub struct Pipeline {
    extractor: Box<dyn FactExtractor>,
    mapper: ConceptMapper,
    templates: TemplateSet,
    ranker: KeywordRanker,
    config: Config,
}

impl Pipeline {
    /// Build every stage from config: knowledge base, matcher backend and
    /// template overrides.
    pub fn new(config: Config) -> Result<Self> {
        let kb = match &config.knowledge_base {
            Some(path) => KnowledgeBase::load(path)?,
            None => KnowledgeBase::builtin()?,
        };
        let templates = TemplateSet::load(&config.templates_dir)?;

        config.require_matcher()?;
        let semantic: Box<dyn SemanticMatcher> = match config.matcher {
            MatcherBackend::Ngram => Box::new(NgramMatcher),
            MatcherBackend::Embedding => {
                Box::new(EmbeddingMatcher::load(&embedding_model_dir(&config.model_dir))?)
            }
        };

        Ok(Self::from_parts(Arc::new(kb), templates, semantic, config))
    }

    /// Assemble a pipeline from already-built parts.
    pub fn from_parts(
        kb: Arc<KnowledgeBase>,
        templates: TemplateSet,
        semantic: Box<dyn SemanticMatcher>,
        config: Config,
    ) -> Self {
        let extractor = RuleExtractor::with_vocabulary(&kb);
        let mapper = ConceptMapper::new(kb)
            .with_thresholds(config.fuzzy_threshold, config.semantic_threshold)
            .with_semantic(semantic);

        info!(
            concepts = mapper.knowledge_base().len(),
            matcher = mapper.semantic_backend().unwrap_or("none"),
            fuzzy_threshold = config.fuzzy_threshold,
            semantic_threshold = config.semantic_threshold,
            "Pipeline ready"
        );

        Self {
            extractor: Box::new(extractor),
            mapper,
            templates,
            ranker: KeywordRanker::default(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        self.mapper.knowledge_base()
    }

    pub fn mapper(&self) -> &ConceptMapper {
        &self.mapper
    }

    /// Extract from all four texts, map, and compose the answer.
    pub fn analyze(&self, request: &AnswerRequest) -> Result<Analysis> {
        let (case, question) =
            process_case_text(self.extractor.as_ref(), &request.case_text, &request.question_text)?;
        let instructions = self
            .extractor
            .extract(&request.instructions_text, Source::Instructions)?;
        let user_inputs = self
            .extractor
            .extract(&request.user_inputs_text, Source::UserInputs)?;
        let facts = SourceFacts {
            case,
            question,
            instructions,
            user_inputs,
        };

        let mapped = self.mapper.map_facts(&facts.all())?;

        let key_terms: Vec<String> = match self.ranker.rank(&request.case_text) {
            Ok(ranked) => ranked.into_iter().map(|(word, _)| word).collect(),
            Err(e) => {
                warn!(error = %e, "Key term ranking failed, continuing without key terms");
                Vec::new()
            }
        };

        let mut request = request.clone();
        if request.word_limit.is_none() {
            request.word_limit = Some(self.config.word_limit);
        }
        let answer = compose_answer(&self.templates, &request, &mapped, &key_terms);

        info!(
            facts = facts.total(),
            matches = answer.matches.len(),
            theories = answer.theories.len(),
            words = answer.word_count,
            "Analysis complete"
        );

        Ok(Analysis {
            facts,
            mapped,
            key_terms,
            answer,
        })
    }

    /// Just the answer.
    pub fn assemble_answer(&self, request: &AnswerRequest) -> Result<Answer> {
        Ok(self.analyze(request)?.answer)
    }

    /// Read the input files and analyze them with default answer options.
    pub fn run_files(&self, files: &InputFiles) -> Result<Analysis> {
        let request = request_from_files(files)?;
        self.analyze(&request)
    }
}

/// Load the texts named by `files` into a request.
pub fn request_from_files(files: &InputFiles) -> Result<AnswerRequest> {
    let optional = |path: &Option<PathBuf>| -> Result<String> {
        match path {
            Some(p) => read_input(p),
            None => Ok(String::new()),
        }
    };

    Ok(AnswerRequest {
        case_text: read_input(&files.case).context("Failed to load case text")?,
        question_text: read_input(&files.question).context("Failed to load question text")?,
        instructions_text: optional(&files.instructions)?,
        user_inputs_text: optional(&files.user_inputs)?,
        style_instructions: optional(&files.style)?.trim().to_string(),
        ..Default::default()
    })
}

/// Default output path next to the case file: `<case stem>_answer.<ext>`.
pub fn default_output_path(case: &Path, extension: &str) -> PathBuf {
    let stem = case
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("case");
    case.with_file_name(format!("{stem}_answer.{extension}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> Pipeline {
        Pipeline::from_parts(
            Arc::new(KnowledgeBase::builtin().unwrap()),
            TemplateSet::builtin(),
            Box::new(NgramMatcher),
            Config::default(),
        )
    }

    #[test]
    fn test_analyze_tags_sources() {
        let request = AnswerRequest {
            case_text: "The firm relies on network effects.".into(),
            question_text: "How do barriers to entry protect it?".into(),
            ..Default::default()
        };
        let analysis = pipeline().analyze(&request).unwrap();

        let sources: Vec<Option<Source>> = analysis
            .answer
            .matches
            .iter()
            .map(|m| m.source)
            .collect();
        assert!(sources.contains(&Some(Source::Case)));
        assert!(sources.contains(&Some(Source::Question)));
        assert!(analysis.answer.word_count > 0);
    }

    #[test]
    fn test_config_word_limit_applies() {
        let p = Pipeline::from_parts(
            Arc::new(KnowledgeBase::builtin().unwrap()),
            TemplateSet::builtin(),
            Box::new(NgramMatcher),
            Config {
                word_limit: 20,
                ..Default::default()
            },
        );
        let request = AnswerRequest {
            case_text: "Network effects and switching costs create a competitive advantage.".into(),
            question_text: "What is the platform strategy?".into(),
            ..Default::default()
        };
        let answer = p.assemble_answer(&request).unwrap();
        assert!(answer.truncated);
        assert!(answer.word_count <= 20);
    }

    #[test]
    fn test_run_files_reads_inputs() {
        let dir = std::env::temp_dir().join("casewriter-pipeline-files");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("case.txt"), "Suppliers hold bargaining power over the firm.").unwrap();
        std::fs::write(dir.join("question.md"), "Apply the five forces.").unwrap();
        std::fs::write(dir.join("style.txt"), "concise\n").unwrap();

        let files = InputFiles {
            case: dir.join("case.txt"),
            question: dir.join("question.md"),
            style: Some(dir.join("style.txt")),
            ..Default::default()
        };
        let analysis = pipeline().run_files(&files).unwrap();
        assert!(analysis.answer.text.starts_with("REVISED[concise]:"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_case_file_is_error() {
        let files = InputFiles {
            case: PathBuf::from("/nonexistent/case.txt"),
            question: PathBuf::from("/nonexistent/question.txt"),
            ..Default::default()
        };
        let err = request_from_files(&files).unwrap_err();
        assert!(format!("{err:#}").contains("case text"));
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("cases/katerra.docx"), "md"),
            PathBuf::from("cases/katerra_answer.md")
        );
    }
}
