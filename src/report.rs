//! Report view model: everything the page (or the CLI) shows for one record.
//!
//! [`ReportView::new`] applies the display defaults for missing fields and
//! tallies the bias labels; the web layer feeds the view to a template and the
//! CLI turns it into Markdown with [`ReportView::to_markdown`].

use crate::config::Classification;
use crate::record::{AnalysisRecord, Finding};
use serde::Serialize;

/// Delay before the browser print dialog opens, so the print styles apply first.
pub const PRINT_DELAY_MS: u64 = 1500;

/// Print-media rules emitted for exactly one render after "save as PDF".
pub const PRINT_CSS: &str = r#"<style>
@media print {
  nav, .sidebar, header.app-header { display: none !important; }
  button, form.action { display: none !important; }
  details.original-text { display: none !important; }
  .download-pdf-section { display: none !important; }
  pre, code { white-space: pre-wrap !important; word-wrap: break-word !important; }
}
</style>"#;

const NOT_AVAILABLE: &str = "N/A";

/// One-shot script opening the print dialog after [`PRINT_DELAY_MS`].
pub fn print_script() -> String {
    format!("<script>setTimeout(window.print, {PRINT_DELAY_MS});</script>")
}

/// Occurrences of one bias label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyEntry {
    pub label: String,
    pub count: usize,
    /// Bar length in percent of the most frequent label (1–100).
    pub bar_percent: usize,
}

/// Count bias labels across findings.
///
/// A `type` of `"gender, moral"` counts once for each label. Entries are
/// ordered by descending count, ties in order of first appearance.
pub fn tally_bias_types(findings: &[Finding]) -> Vec<TallyEntry> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for label in findings.iter().flat_map(Finding::labels) {
        match counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, n)) => *n += 1,
            None => counts.push((label, 1)),
        }
    }
    // Stable sort keeps first-appearance order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let max = counts.first().map(|(_, n)| *n).unwrap_or(1).max(1);
    counts
        .into_iter()
        .map(|(label, count)| TallyEntry {
            bar_percent: (count * 100).div_ceil(max).clamp(1, 100),
            label,
            count,
        })
        .collect()
}

/// Display form of one finding, in the order it is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindingView {
    pub title: String,
    pub excerpt: String,
    pub suggested_rewrite: String,
    pub explanation: String,
}

/// Everything needed to render the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportView {
    /// `"45%"`, or `"N/A"` when the model gave no usable number.
    pub percentage: String,
    pub classification: String,
    pub tally: Vec<TallyEntry>,
    pub summary: String,
    pub findings: Vec<FindingView>,
    pub rewritten_document: String,
}

impl ReportView {
    pub fn new(record: &AnalysisRecord, classification: Classification) -> Self {
        let findings = record
            .findings
            .iter()
            .map(|f| FindingView {
                title: capitalize(f.bias_type.as_deref().unwrap_or("unknown")),
                excerpt: or_na(&f.excerpt),
                suggested_rewrite: or_na(&f.suggested_rewrite),
                explanation: or_na(&f.explanation),
            })
            .collect();

        Self {
            percentage: record
                .bias_percentage
                .map(|p| format!("{p}%"))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            classification: classification.label().to_string(),
            tally: tally_bias_types(&record.findings),
            summary: record
                .summary
                .clone()
                .unwrap_or_else(|| "Summary not available.".to_string()),
            findings,
            rewritten_document: record
                .rewritten_document
                .clone()
                .unwrap_or_else(|| "Rewrite not available.".to_string()),
        }
    }

    /// Render as a standalone Markdown document.
    pub fn to_markdown(&self) -> String {
        let mut md = String::from("# Bias Analysis Report\n\n");
        md.push_str(&format!("- **Estimated bias:** {}\n", self.percentage));
        md.push_str(&format!("- **Thematic classification:** {}\n\n", self.classification));

        if !self.tally.is_empty() {
            md.push_str("## Bias Type Distribution\n\n| Bias type | Occurrences |\n| --- | ---: |\n");
            for entry in &self.tally {
                md.push_str(&format!("| {} | {} |\n", entry.label, entry.count));
            }
            md.push('\n');
        }

        md.push_str("## Summary\n\n");
        md.push_str(self.summary.trim());
        md.push_str("\n\n## Findings\n\n");

        if self.findings.is_empty() {
            md.push_str("No significant bias detected in the analysis.\n\n");
        }
        for finding in &self.findings {
            md.push_str(&format!("### Bias type: {}\n\n", finding.title));
            md.push_str("**Problematic excerpt**\n\n");
            md.push_str(&fenced(&finding.excerpt));
            md.push_str("**Suggested neutral rewrite**\n\n");
            md.push_str(&fenced(&finding.suggested_rewrite));
            md.push_str(&format!("**Explanation:** {}\n\n", finding.explanation.trim()));
        }

        md.push_str("## Fully Rewritten Text\n\n");
        md.push_str(&fenced(&self.rewritten_document));
        md
    }
}

fn or_na(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(s: &str) -> String {
    let mut chars = s.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn fenced(body: &str) -> String {
    let fence = if body.contains("```") { "````" } else { "```" };
    format!("{fence}text\n{}\n{fence}\n\n", body.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(bias_type: Option<&str>) -> Finding {
        Finding {
            bias_type: bias_type.map(str::to_string),
            excerpt: Some("excerpt".into()),
            explanation: Some("why".into()),
            suggested_rewrite: Some("neutral".into()),
        }
    }

    #[test]
    fn combined_type_counts_each_label() {
        let tally = tally_bias_types(&[finding(Some("gender, moral"))]);
        assert_eq!(tally.len(), 2);
        assert!(tally.iter().all(|e| e.count == 1));
        assert_eq!(tally[0].label, "gender");
        assert_eq!(tally[1].label, "moral");
    }

    #[test]
    fn tally_orders_by_count_then_first_seen() {
        let tally = tally_bias_types(&[
            finding(Some("racial")),
            finding(Some("gender, moral")),
            finding(Some("moral")),
            finding(Some("gender")),
        ]);
        let labels: Vec<_> = tally.iter().map(|e| (e.label.as_str(), e.count)).collect();
        assert_eq!(labels, vec![("gender", 2), ("moral", 2), ("racial", 1)]);
        assert_eq!(tally[0].bar_percent, 100);
        assert_eq!(tally[2].bar_percent, 50);
    }

    #[test]
    fn missing_type_tallies_as_unknown() {
        let tally = tally_bias_types(&[finding(None)]);
        assert_eq!(tally[0].label, "unknown");
    }

    #[test]
    fn defaults_for_missing_fields() {
        let view = ReportView::new(&AnalysisRecord::default(), Classification::default());
        assert_eq!(view.percentage, "N/A");
        assert_eq!(view.classification, "Unclassified");
        assert_eq!(view.summary, "Summary not available.");
        assert_eq!(view.rewritten_document, "Rewrite not available.");
        assert!(view.tally.is_empty());
        assert!(view.findings.is_empty());
    }

    #[test]
    fn finding_view_capitalises_and_defaults() {
        let record = AnalysisRecord {
            bias_percentage: Some(62),
            findings: vec![Finding {
                bias_type: Some("moral, COGNITIVE".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let view = ReportView::new(&record, Classification::Family);
        assert_eq!(view.percentage, "62%");
        assert_eq!(view.findings[0].title, "Moral, cognitive");
        assert_eq!(view.findings[0].excerpt, "N/A");
        assert_eq!(view.classification, "Family");
    }

    #[test]
    fn markdown_has_sections_in_order() {
        let record = AnalysisRecord {
            bias_percentage: Some(30),
            summary: Some("Some bias.".into()),
            findings: vec![finding(Some("gender"))],
            rewritten_document: Some("All neutral.".into()),
        };
        let md = ReportView::new(&record, Classification::Civil).to_markdown();
        let excerpt = md.find("**Problematic excerpt**").unwrap();
        let rewrite = md.find("**Suggested neutral rewrite**").unwrap();
        let explanation = md.find("**Explanation:**").unwrap();
        assert!(excerpt < rewrite && rewrite < explanation);
        assert!(md.contains("| gender | 1 |"));
        assert!(md.contains("30%"));
        assert!(md.trim_end().ends_with("```"));
    }

    #[test]
    fn markdown_without_findings_says_so() {
        let md = ReportView::new(&AnalysisRecord::default(), Classification::Other).to_markdown();
        assert!(md.contains("No significant bias detected"));
        assert!(!md.contains("Bias Type Distribution"));
    }

    #[test]
    fn print_script_uses_fixed_delay() {
        assert_eq!(
            print_script(),
            "<script>setTimeout(window.print, 1500);</script>"
        );
        assert!(PRINT_CSS.contains("@media print"));
    }
}
