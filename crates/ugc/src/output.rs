//! Colored terminal output on stderr.

use console::{Style, Term};
use ugc_platform::{ItemId, JobOutcome};

/// Label column width for [`Output::field`].
const LABEL_WIDTH: usize = 16;

/// Terminal output formatter.
///
/// Everything goes to stderr so stdout stays free for `--json` reports.
pub(crate) struct Output {
    term: Term,
    ok: Style,
    warn: Style,
    fail: Style,
    heading: Style,
    label: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            fail: Style::new().red(),
            heading: Style::new().cyan().bold(),
            label: Style::new().dim(),
        }
    }

    fn line(&self, text: &str) {
        let _ = self.term.write_line(text);
    }

    fn styled(&self, style: &Style, msg: &str) {
        self.line(&style.apply_to(msg).to_string());
    }

    pub(crate) fn info(&self, msg: &str) {
        self.line(msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        self.styled(&self.ok, msg);
    }

    pub(crate) fn warning(&self, msg: &str) {
        self.styled(&self.warn, msg);
    }

    pub(crate) fn error(&self, msg: &str) {
        self.styled(&self.fail, msg);
    }

    pub(crate) fn highlight(&self, msg: &str) {
        self.styled(&self.heading, msg);
    }

    /// Print a `label: value` line with a dimmed, padded label.
    pub(crate) fn field(&self, label: &str, value: &str) {
        let padded = format!("{:<LABEL_WIDTH$}", format!("{label}:"));
        self.line(&format!("{}{value}", self.label.apply_to(padded)));
    }

    /// Print the submit result, colored by how it ended.
    pub(crate) fn submit_outcome(&self, outcome: &JobOutcome<ItemId>) {
        match outcome {
            JobOutcome::Success(_) => self.success("Item update submitted successfully!"),
            JobOutcome::Failure { .. } => self.error(&format!("Item update {outcome}")),
            JobOutcome::NeedsUserAgreement => self.warning(
                "The user needs to accept the workshop legal agreement before the update is visible.",
            ),
            JobOutcome::Pending => {
                self.warning("Submit result not received; check the item page for the update.");
            }
        }
    }
}
