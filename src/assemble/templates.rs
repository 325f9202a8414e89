// Theory templates — intro, analysis and conclusion text per framework.
//
// Every theory has a built-in template. A templates directory can override
// any section with `<dir>/<theory code, lowercased>/<section>.txt`; missing
// files fall back to the built-in text section by section.
//
// Placeholders use `{{NAME}}` and are substituted by `render`:
//   CONCEPT_SENTENCES — "In this case, the ... concepts include: ..."
//   CONCEPTS          — comma-separated concept names for the theory
//   THEORY            — the theory's display name

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex_lite::{Captures, Regex};
use tracing::{debug, info};

use crate::knowledge::theory::Theory;

/// One of the three parts of a theory template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSection {
    Intro,
    Analysis,
    Conclusion,
}

impl TemplateSection {
    pub const ALL: [TemplateSection; 3] = [
        TemplateSection::Intro,
        TemplateSection::Analysis,
        TemplateSection::Conclusion,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            TemplateSection::Intro => "intro.txt",
            TemplateSection::Analysis => "analysis.txt",
            TemplateSection::Conclusion => "conclusion.txt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TheoryTemplate {
    pub intro: String,
    pub analysis: String,
    pub conclusion: String,
}

impl TheoryTemplate {
    pub fn section(&self, section: TemplateSection) -> &str {
        match section {
            TemplateSection::Intro => &self.intro,
            TemplateSection::Analysis => &self.analysis,
            TemplateSection::Conclusion => &self.conclusion,
        }
    }

    fn section_mut(&mut self, section: TemplateSection) -> &mut String {
        match section {
            TemplateSection::Intro => &mut self.intro,
            TemplateSection::Analysis => &mut self.analysis,
            TemplateSection::Conclusion => &mut self.conclusion,
        }
    }
}

/// Templates for every theory.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    templates: HashMap<Theory, TheoryTemplate>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateSet {
    pub fn builtin() -> Self {
        let templates = Theory::ALL
            .into_iter()
            .map(|t| (t, default_template(t)))
            .collect();
        Self { templates }
    }

    /// Built-in templates with per-section overrides read from `dir`.
    ///
    /// A missing directory is not an error; it just means no overrides.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut set = Self::builtin();
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "No templates directory, using built-in templates");
            return Ok(set);
        }

        let mut overrides = 0usize;
        for (theory, template) in set.templates.iter_mut() {
            let theory_dir = dir.join(theory.code().to_lowercase());
            for section in TemplateSection::ALL {
                let path = theory_dir.join(section.file_name());
                if path.is_file() {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read template {}", path.display()))?;
                    *template.section_mut(section) = text.trim().to_string();
                    overrides += 1;
                }
            }
        }

        info!(dir = %dir.display(), overrides, "Loaded templates");
        Ok(set)
    }

    pub fn get(&self, theory: Theory) -> &TheoryTemplate {
        // Every theory is inserted by `builtin`
        &self.templates[&theory]
    }

    /// Write the built-in templates to `dir` so they can be edited.
    ///
    /// Existing files are left alone unless `force` is set. Returns the
    /// number of files written.
    pub fn write_defaults(dir: &Path, force: bool) -> Result<usize> {
        let mut written = 0;
        for theory in Theory::ALL {
            let theory_dir = dir.join(theory.code().to_lowercase());
            std::fs::create_dir_all(&theory_dir).with_context(|| {
                format!("Failed to create template directory {}", theory_dir.display())
            })?;
            let template = default_template(theory);
            for section in TemplateSection::ALL {
                let path = theory_dir.join(section.file_name());
                if path.exists() && !force {
                    continue;
                }
                std::fs::write(&path, format!("{}\n", template.section(section)))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                written += 1;
            }
        }
        Ok(written)
    }
}

/// Substitute `{{NAME}}` placeholders. Names are case-sensitive, surrounding
/// whitespace inside the braces is ignored, unknown names are left untouched.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER
        .get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid placeholder regex"));

    re.replace_all(template, |caps: &Captures<'_>| {
        let name = &caps[1];
        vars.iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}

fn template(intro: &str, analysis: &str, conclusion: &str) -> TheoryTemplate {
    TheoryTemplate {
        intro: intro.to_string(),
        analysis: analysis.to_string(),
        conclusion: conclusion.to_string(),
    }
}

/// The built-in template for a theory.
pub fn default_template(theory: Theory) -> TheoryTemplate {
    match theory {
        Theory::Tce => template(
            "Transaction Cost Economics (TCE) examines how firms choose to organize their economic activities, and when governing an exchange inside the firm beats buying it on the market.",
            "{{CONCEPT_SENTENCES}} These factors influence the firm's make-or-buy decisions and governance structures.",
            "TCE suggests the firm should integrate where asset specificity and hold-up risk are high, and contract where markets can discipline partners.",
        ),
        Theory::Rbv => template(
            "The Resource-Based View (RBV) of the firm focuses on internal resources and capabilities as the primary source of competitive advantage.",
            "{{CONCEPT_SENTENCES}} These resources and capabilities contribute to the firm's competitive position to the extent they are valuable, rare, inimitable and organized.",
            "The RBV framework explains how the firm's unique resource bundle can create a sustainable competitive advantage.",
        ),
        Theory::PlatformStrategy => template(
            "Platform strategy examines how firms create and capture value by connecting interdependent groups of users, complementors and suppliers.",
            "{{CONCEPT_SENTENCES}} These platform dynamics shape the firm's competitive strategy and market position.",
            "Platform strategy shows how the firm can leverage network effects and ecosystem complementarities, provided it reaches critical mass.",
        ),
        Theory::CompetitiveDynamics => template(
            "Competitive dynamics looks at industry structure and the moves and counter-moves of rivals.",
            "{{CONCEPT_SENTENCES}} Together these forces determine how much of the value created the firm can keep.",
            "The firm's position depends on how well it shapes, rather than merely reacts to, the forces acting on its industry.",
        ),
        Theory::DemandSideDisruption => template(
            "Demand-side disruption theory explains how simpler, cheaper offerings gain a foothold with over-served or non-consuming customers and then move upmarket.",
            "{{CONCEPT_SENTENCES}} These dynamics indicate where incumbents are exposed and where an entrant can gain traction.",
            "Disruption theory suggests the firm should judge opportunities by the customers incumbents ignore, not by head-to-head performance.",
        ),
        Theory::ArchitecturalDisruption => template(
            "Architectural disruption concerns innovations that reconfigure how existing components are linked into a system.",
            "{{CONCEPT_SENTENCES}} Such changes can leave incumbents' component knowledge intact while making their system knowledge obsolete.",
            "The firm's advantage rests on mastering the new architecture before rivals recognize that the rules of integration have changed.",
        ),
        Theory::DynamicCapabilities => template(
            "The dynamic capabilities framework asks how firms sense opportunities, seize them and reconfigure their resources as their environment changes.",
            "{{CONCEPT_SENTENCES}} These capabilities determine how quickly the firm can adapt its resource base.",
            "Sustained advantage depends less on any single resource than on the firm's capacity to keep renewing them.",
        ),
        Theory::PropertyRights => template(
            "Property rights theory examines how ownership of assets allocates residual control when contracts are incomplete.",
            "{{CONCEPT_SENTENCES}} Who owns the critical assets therefore shapes each party's incentive to invest.",
            "Ownership should sit with the party whose investments matter most to the value of the relationship.",
        ),
        Theory::ValueBasedStrategy => template(
            "Value-based strategy frames advantage as the gap between customers' willingness to pay and suppliers' willingness to sell.",
            "{{CONCEPT_SENTENCES}} These elements define how much value the firm creates and how much it can capture.",
            "The firm should pursue moves that widen the value stick and protect its added value.",
        ),
        Theory::Coopetition => template(
            "Co-opetition analyses the firm's value net of customers, suppliers, competitors and complementors.",
            "{{CONCEPT_SENTENCES}} Recognizing where players cooperate to create value and compete to divide it clarifies the firm's options.",
            "The firm can change the game by reshaping the players, added values, rules and scope of its value net.",
        ),
    }
}
