// Word documents via docx-rs.
//
// Markdown headings in the answer become Word heading styles (levels past 3
// collapse into Heading3); every other non-empty line is a body paragraph.

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use docx_rs::{Docx, Paragraph, Run, Style, StyleType};
use tracing::{debug, info};

use super::{heading_level, prepare_target, ExportOptions};

const MAX_HEADING_LEVEL: usize = 3;

/// Write the answer to a `.docx` file.
pub fn export_docx(answer: &str, path: &Path, options: &ExportOptions) -> Result<()> {
    prepare_target(path, options.overwrite)?;
    let bytes = docx_bytes(answer, options)?;
    std::fs::write(path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "Exported Word answer");
    Ok(())
}

/// Build the document in memory.
pub fn docx_bytes(answer: &str, options: &ExportOptions) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    build_document(answer, options)
        .build()
        .pack(&mut buf)
        .map_err(|e| anyhow::anyhow!("Failed to pack Word document: {}", e))?;
    Ok(buf.into_inner())
}

fn build_document(answer: &str, options: &ExportOptions) -> Docx {
    // docx sizes are in half-points
    let body_size = options.font_size.max(1) * 2;

    let mut doc = Docx::new()
        .add_style(
            Style::new("Title", StyleType::Paragraph)
                .name("Title")
                .size(body_size + 16)
                .bold(),
        )
        .add_style(
            Style::new("Heading1", StyleType::Paragraph)
                .name("Heading 1")
                .size(body_size + 8)
                .bold(),
        )
        .add_style(
            Style::new("Heading2", StyleType::Paragraph)
                .name("Heading 2")
                .size(body_size + 4)
                .bold(),
        )
        .add_style(
            Style::new("Heading3", StyleType::Paragraph)
                .name("Heading 3")
                .size(body_size + 2)
                .bold(),
        );

    if let Some(heading) = options.heading.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
        doc = doc.add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(heading))
                .style("Title"),
        );
    }

    let mut paragraphs = 0usize;
    for line in answer.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let paragraph = match heading_level(line) {
            Some((level, text)) => Paragraph::new()
                .add_run(Run::new().add_text(text))
                .style(&format!("Heading{}", level.min(MAX_HEADING_LEVEL))),
            None => Paragraph::new().add_run(Run::new().add_text(line.trim_end()).size(body_size)),
        };
        doc = doc.add_paragraph(paragraph);
        paragraphs += 1;
    }

    debug!(paragraphs, "Built Word document");
    doc
}

/// The text of every non-empty paragraph, joined by newlines.
pub fn read_docx_text(bytes: &[u8]) -> Result<String> {
    let docx = docx_rs::read_docx(bytes)
        .map_err(|e| anyhow::anyhow!("Failed to read Word document: {}", e))?;

    let mut lines: Vec<String> = Vec::new();
    for child in docx.document.children {
        if let docx_rs::DocumentChild::Paragraph(para) = child {
            let text: String = para
                .children
                .iter()
                .filter_map(|pc| match pc {
                    docx_rs::ParagraphChild::Run(run) => Some(
                        run.children
                            .iter()
                            .filter_map(|rc| match rc {
                                docx_rs::RunChild::Text(t) => Some(t.text.as_str()),
                                _ => None,
                            })
                            .collect::<String>(),
                    ),
                    _ => None,
                })
                .collect();

            if !text.trim().is_empty() {
                lines.push(text);
            }
        }
    }

    Ok(lines.join("\n"))
}
