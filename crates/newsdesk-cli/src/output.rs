//! Plain-text rendering of pipeline reports for the terminal.

use std::fmt::Write as _;

use newsdesk_rag::{IngestReport, NewsletterRun, StatusLine};

fn push_status(out: &mut String, status: &[StatusLine]) {
    for line in status {
        let _ = writeln!(out, "{line}");
    }
}

pub(crate) fn render_ingest(report: &IngestReport) -> String {
    let mut out = String::new();
    push_status(&mut out, &report.status);
    let _ = writeln!(
        out,
        "Stored {} documents ({} company, {} market).",
        report.total_stored(),
        report.company.stored,
        report.market.stored
    );
    out
}

const PROVIDER_HINT: &str = "Hint: a provider rejected a request; check API keys and quota.";

pub(crate) fn render_newsletter(run: &NewsletterRun) -> String {
    let mut out = String::new();
    push_status(&mut out, &run.status);
    if run
        .degraded
        .iter()
        .any(|d| d.failure.kind.is_operator_actionable())
    {
        let _ = writeln!(out, "{PROVIDER_HINT}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "=== Daily Market Newsletter ===");
    let _ = writeln!(out, "{}", run.newsletter);
    let _ = writeln!(out);
    let _ = writeln!(out, "Accuracy Score: {}%", run.accuracy.score);
    out
}
