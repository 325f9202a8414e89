// Export — write the answer as Markdown, Word or plain text, and read
// input documents in the same formats.

pub mod docx;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

pub use self::docx::{docx_bytes, export_docx, read_docx_text};

pub const DEFAULT_HEADING: &str = "Case Analysis";
pub const DEFAULT_FONT_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Markdown,
    Docx,
    Txt,
}

impl ExportFormat {
    /// Infer the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        ext.parse::<ExportFormat>()
            .with_context(|| format!("Cannot export to {}", path.display()))
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Docx => "docx",
            ExportFormat::Txt => "txt",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "docx" => Ok(ExportFormat::Docx),
            "txt" | "text" => Ok(ExportFormat::Txt),
            other => anyhow::bail!("Unsupported export format '{other}' (expected md, docx or txt)"),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Options shared by all exporters; heading and font size only affect Word.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub overwrite: bool,
    /// Document title; `None` or empty leaves it out
    pub heading: Option<String>,
    /// Body font size in points
    pub font_size: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            heading: Some(DEFAULT_HEADING.to_string()),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

/// Refuse to clobber an existing file and make sure the parent exists.
pub(crate) fn prepare_target(path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        anyhow::bail!(
            "{} already exists. Pass --overwrite to replace it.",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Write the answer verbatim as Markdown.
pub fn export_markdown(answer: &str, path: &Path, overwrite: bool) -> Result<()> {
    prepare_target(path, overwrite)?;
    let mut text = answer.trim_end().to_string();
    text.push('\n');
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Exported Markdown answer");
    Ok(())
}

/// Write the answer as plain text, with heading markers stripped.
pub fn export_txt(answer: &str, path: &Path, overwrite: bool) -> Result<()> {
    prepare_target(path, overwrite)?;
    let mut text = plain_text(answer);
    text.push('\n');
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Exported plain-text answer");
    Ok(())
}

/// Export in the given format, or the one implied by the path.
pub fn export(
    answer: &str,
    path: &Path,
    format: Option<ExportFormat>,
    options: &ExportOptions,
) -> Result<ExportFormat> {
    let format = match format {
        Some(f) => f,
        None => ExportFormat::from_path(path)?,
    };
    match format {
        ExportFormat::Markdown => export_markdown(answer, path, options.overwrite)?,
        ExportFormat::Docx => export_docx(answer, path, options)?,
        ExportFormat::Txt => export_txt(answer, path, options.overwrite)?,
    }
    Ok(format)
}

/// Split a line into its heading level (count of leading `#`) and text.
pub fn heading_level(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    Some((level, rest.trim()))
}

/// Drop Markdown heading markers, keep everything else.
pub fn plain_text(answer: &str) -> String {
    answer
        .trim_end()
        .lines()
        .map(|line| match heading_level(line) {
            Some((_, text)) => text,
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read an input document: `.txt`/`.md` (or no extension) as UTF-8 text,
/// `.docx` as its paragraphs joined by newlines.
pub fn read_input(path: &Path) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();

    match ext.as_str() {
        "docx" => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            read_docx_text(&bytes).with_context(|| format!("Failed to parse {}", path.display()))
        }
        "" | "txt" | "md" | "markdown" | "text" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        other => anyhow::bail!(
            "Unsupported input file type '.{other}' for {} (expected .txt, .md or .docx)",
            path.display()
        ),
    }
}
