use crate::emotion::EmotionSummary;
use crate::notes::NoteAnalysis;

/// Everything a report is built from
#[derive(Debug, Clone, Default)]
pub struct ReportInput {
    /// None when no note was analyzed
    pub note_analysis: Option<NoteAnalysis>,

    /// None when the webcam was never used
    pub emotion_summary: Option<EmotionSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Heading,
    Body,
}

impl LineStyle {
    pub fn font_size(&self) -> f32 {
        match self {
            LineStyle::Title => 16.0,
            LineStyle::Heading => 14.0,
            LineStyle::Body => 12.0,
        }
    }

    /// Vertical space the line occupies, in millimetres
    pub fn line_height_mm(&self) -> f32 {
        match self {
            LineStyle::Title | LineStyle::Heading => 10.0,
            LineStyle::Body => 8.0,
        }
    }
}

/// One line of report text; `gap_before_mm` is blank space above it
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub text: String,
    pub style: LineStyle,
    pub gap_before_mm: f32,
}

impl ReportLine {
    fn new(text: impl Into<String>, style: LineStyle) -> Self {
        Self {
            text: text.into(),
            style,
            gap_before_mm: 0.0,
        }
    }

    fn after_gap(mut self, gap_mm: f32) -> Self {
        self.gap_before_mm = gap_mm;
        self
    }
}

pub const REPORT_TITLE: &str = "NeuroNote Analysis Report";

/// Text content of the report, top to bottom
pub fn report_lines(input: &ReportInput) -> Vec<ReportLine> {
    let mut lines = vec![ReportLine::new(REPORT_TITLE, LineStyle::Title)];

    lines.push(ReportLine::new("Notes Analysis", LineStyle::Heading).after_gap(10.0));
    match &input.note_analysis {
        Some(analysis) if !analysis.fields.is_empty() => {
            for field in &analysis.fields {
                lines.push(ReportLine::new(
                    format!("- {}: {}", field.display_name(), field.value),
                    LineStyle::Body,
                ));
            }
        }
        _ => lines.push(ReportLine::new("No notes data available", LineStyle::Body)),
    }

    lines.push(ReportLine::new("Emotion Analysis", LineStyle::Heading).after_gap(8.0));
    match &input.emotion_summary {
        Some(summary @ EmotionSummary::Distribution(_)) => {
            for line in summary.lines() {
                lines.push(ReportLine::new(format!("- {}", line), LineStyle::Body));
            }
        }
        Some(EmotionSummary::NoData) => {
            lines.push(ReportLine::new("No emotions detected", LineStyle::Body))
        }
        None => lines.push(ReportLine::new(
            "No emotion data collected (webcam not used)",
            LineStyle::Body,
        )),
    }

    lines
}
