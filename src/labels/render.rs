use super::summary::{SampleSummary, SummaryContext, render_summary};
use crate::batches::models::BatchDetails;

pub const QUARANTINE_MARKER: &str = "**QUARANTINE**";
pub const CLIPBOARD_DIVIDER: &str = "\n---\n\n";
pub const PAGE_BREAK: &str = "\u{c}";

/// One label: the sample's ordinal and its summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelBlock {
    pub ordinal: u32,
    pub summary: SampleSummary,
}

impl LabelBlock {
    /// `Sample {n}`, first line, test line and the quarantine marker when set
    pub fn text(&self) -> String {
        let quarantine = if self.summary.is_quarantine {
            format!("\n{QUARANTINE_MARKER}")
        } else {
            String::new()
        };
        format!(
            "Sample {}\n{}\n{}{quarantine}\n",
            self.ordinal, self.summary.first_line, self.summary.test_line
        )
    }
}

/// Labels of a stored batch, in sample-sequence order
pub fn persisted_label_blocks(details: &BatchDetails) -> Vec<LabelBlock> {
    let mut samples: Vec<_> = details.samples.iter().collect();
    samples.sort_by_key(|sample| sample.sample_sequence);
    samples
        .into_iter()
        .map(|sample| LabelBlock {
            ordinal: sample.sample_sequence,
            summary: render_summary(&SummaryContext::Persisted { sample }),
        })
        .collect()
}

/// Text for pasting into label software
pub fn render_clipboard(blocks: &[LabelBlock]) -> String {
    blocks
        .iter()
        .map(LabelBlock::text)
        .collect::<Vec<_>>()
        .join(CLIPBOARD_DIVIDER)
}

/// One page per label
pub fn render_print_pages(blocks: &[LabelBlock]) -> Vec<String> {
    blocks.iter().map(LabelBlock::text).collect()
}

/// Printable document with a form feed between pages
pub fn render_print_document(blocks: &[LabelBlock]) -> String {
    render_print_pages(blocks).join(PAGE_BREAK)
}
