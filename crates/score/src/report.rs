//! Text renderings of tallies: LaTeX table rows, per-novel counts, aligned tables.

use std::fmt::Write as _;

use crate::model::{Bucket, QuoteCategory, ScoreTally};
use crate::study::ModelReport;

/// Row order of the LaTeX block: overall first, then the categories.
pub const LATEX_ROWS: [RowKind; 4] = [
    RowKind::Overall,
    RowKind::Category(QuoteCategory::Anaphoric),
    RowKind::Category(QuoteCategory::Implicit),
    RowKind::Category(QuoteCategory::Explicit),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Overall,
    Category(QuoteCategory),
}

impl RowKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Overall => "Overall",
            Self::Category(c) => c.as_str(),
        }
    }

    pub fn bucket<'a>(&self, tally: &'a ScoreTally) -> &'a Bucket {
        match self {
            Self::Overall => &tally.overall,
            Self::Category(c) => tally.bucket(*c),
        }
    }
}

/// Accuracy to one decimal, or `N/A` for an empty bucket.
pub fn format_accuracy(bucket: &Bucket) -> String {
    match bucket.accuracy() {
        Some(pct) => format!("{pct:.1}"),
        None => "N/A".to_string(),
    }
}

/// One LaTeX row: accuracies across context windows joined by ` & `, ended by `\\`.
pub fn latex_row<'a>(buckets: impl IntoIterator<Item = &'a Bucket>) -> String {
    let cells: Vec<String> = buckets.into_iter().map(format_accuracy).collect();
    format!("{} \\\\", cells.join(" & "))
}

/// The four LaTeX rows (overall, anaphoric, implicit, explicit) for one model.
pub fn latex_block(model: &ModelReport) -> Vec<String> {
    LATEX_ROWS
        .iter()
        .map(|kind| latex_row(model.contexts.iter().map(|cell| kind.bucket(&cell.pooled))))
        .collect()
}

/// `Emma: total:785, anaphoric:201, implicit:340, explicit:244`
pub fn counts_line(novel: &str, tally: &ScoreTally) -> String {
    format!(
        "{novel}: total:{}, anaphoric:{}, implicit:{}, explicit:{}",
        tally.total(),
        tally.anaphoric.count,
        tally.implicit.count,
        tally.explicit.count,
    )
}

/// Human-readable table for one model: one line per context window.
pub fn render_table(model: &ModelReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", model.label);
    let _ = writeln!(
        out,
        "{:>8} {:>10} {:>10} {:>10} {:>10}",
        "context", "overall", "anaphoric", "implicit", "explicit"
    );
    for cell in &model.contexts {
        let t = &cell.pooled;
        let _ = writeln!(
            out,
            "{:>8} {:>10} {:>10} {:>10} {:>10}",
            cell.context,
            format_accuracy(&t.overall),
            format_accuracy(&t.anaphoric),
            format_accuracy(&t.implicit),
            format_accuracy(&t.explicit),
        );
    }
    out
}

/// Multi-line summary of a single tally with raw counts next to percentages.
pub fn render_tally(tally: &ScoreTally) -> String {
    let mut out = String::new();
    let rows = std::iter::once(RowKind::Overall)
        .chain(QuoteCategory::ALL.into_iter().map(RowKind::Category));
    for kind in rows {
        let b = kind.bucket(tally);
        let _ = writeln!(
            out,
            "{:<10} {:>6} / {:<6} {:>6}",
            kind.label(),
            b.correct,
            b.count,
            format_accuracy(b)
        );
    }
    if tally.unattributed > 0 {
        let _ = writeln!(out, "({} row(s) without a true speaker)", tally.unattributed);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RunOutcome;
    use crate::study::{ContextCell, NovelRun};

    fn tally(overall: (usize, usize), ana: (usize, usize), imp: (usize, usize), exp: (usize, usize)) -> ScoreTally {
        ScoreTally {
            overall: Bucket::new(overall.0, overall.1),
            anaphoric: Bucket::new(ana.0, ana.1),
            implicit: Bucket::new(imp.0, imp.1),
            explicit: Bucket::new(exp.0, exp.1),
            unattributed: 0,
        }
    }

    fn model() -> ModelReport {
        let cell = |context: u32, pooled: ScoreTally| ContextCell {
            context,
            pooled,
            novels: vec![NovelRun {
                novel: "Emma".into(),
                predictions: format!("context{context}/m/Emma.csv"),
                outcome: RunOutcome {
                    tally: pooled,
                    quotation_rows: pooled.total(),
                    prediction_rows: pooled.total(),
                    dropped_rows: 0,
                },
            }],
        };
        ModelReport {
            model: "m".into(),
            label: "Model M".into(),
            contexts: vec![
                cell(0, tally((1, 3), (0, 1), (0, 0), (1, 2))),
                cell(4, tally((2, 3), (1, 1), (0, 0), (1, 2))),
            ],
        }
    }

    #[test]
    fn accuracy_one_decimal() {
        assert_eq!(format_accuracy(&Bucket::new(1, 3)), "33.3");
        assert_eq!(format_accuracy(&Bucket::new(2, 3)), "66.7");
        assert_eq!(format_accuracy(&Bucket::new(0, 0)), "N/A");
    }

    #[test]
    fn latex_rows_in_report_order() {
        let rows = latex_block(&model());
        assert_eq!(
            rows,
            [
                "33.3 & 66.7 \\\\",
                "0.0 & 100.0 \\\\",
                "N/A & N/A \\\\",
                "50.0 & 50.0 \\\\",
            ]
        );
    }

    #[test]
    fn counts_line_format() {
        let t = tally((5, 10), (1, 3), (2, 4), (2, 3));
        assert_eq!(counts_line("Emma", &t), "Emma: total:10, anaphoric:3, implicit:4, explicit:3");
    }

    #[test]
    fn table_has_line_per_context() {
        let text = render_table(&model());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Model M");
        assert_eq!(lines.len(), 4);
        assert!(lines[3].trim_start().starts_with('4'));
        assert!(lines[3].contains("66.7"));
    }

    #[test]
    fn tally_summary_mentions_unattributed() {
        let mut t = tally((1, 2), (0, 0), (1, 2), (0, 0));
        t.unattributed = 1;
        let text = render_tally(&t);
        assert!(text.starts_with("Overall"));
        assert!(text.contains("N/A"));
        assert!(text.contains("1 row(s) without a true speaker"));
    }
}
