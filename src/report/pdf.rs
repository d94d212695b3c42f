use chrono::Utc;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use super::layout::{report_lines, LineStyle, ReportInput, REPORT_TITLE};
use super::{ReportArtifact, ReportRenderer};
use crate::error::ReportError;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const PT_TO_MM: f32 = 0.3528;

/// Renders reports as single-column A4 PDFs with the builtin Helvetica fonts
pub struct PdfReportRenderer {
    output_dir: PathBuf,
    file_name: String,
}

impl PdfReportRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_name: file_name.into(),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }

    /// Lay the report out and serialize it, without touching disk
    pub fn render_bytes(&self, input: &ReportInput) -> Result<Vec<u8>, ReportError> {
        let (doc, page, layer) = PdfDocument::new(
            REPORT_TITLE,
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Layer 1",
        );

        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(render_error)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(render_error)?;

        let mut current = doc.get_page(page).get_layer(layer);
        let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

        for line in report_lines(input) {
            let advance = line.gap_before_mm + line.style.line_height_mm();
            if y - advance < MARGIN_MM {
                let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
                current = doc.get_page(page).get_layer(layer);
                y = PAGE_HEIGHT_MM - MARGIN_MM;
            }
            y -= advance;

            let size = line.style.font_size();
            let (font, x) = match line.style {
                LineStyle::Title => {
                    // Helvetica averages roughly half an em per glyph
                    let width = line.text.chars().count() as f32 * size * 0.5 * PT_TO_MM;
                    (&regular, ((PAGE_WIDTH_MM - width) / 2.0).max(MARGIN_MM))
                }
                LineStyle::Heading => (&bold, MARGIN_MM),
                LineStyle::Body => (&regular, MARGIN_MM),
            };

            current.use_text(line.text.clone(), size, Mm(x), Mm(y), font);
        }

        doc.save_to_bytes().map_err(render_error)
    }
}

fn render_error<E: std::fmt::Display>(e: E) -> ReportError {
    ReportError::Render {
        message: e.to_string(),
    }
}

impl ReportRenderer for PdfReportRenderer {
    fn render(&self, input: &ReportInput) -> Result<ReportArtifact, ReportError> {
        let bytes = self.render_bytes(input)?;

        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_path();
        fs::write(&path, &bytes)?;

        info!("Report written to {} ({} bytes)", path.display(), bytes.len());

        Ok(ReportArtifact {
            path,
            bytes,
            generated_at: Utc::now(),
        })
    }
}
