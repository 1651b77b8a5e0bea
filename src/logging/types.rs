//! Core logging types: host entries, status, and the [`Log`] trait.

/// Per-host result for summary reporting.
#[derive(Debug, Clone)]
pub struct HostEntry {
    /// Fully qualified host name.
    pub name: String,
    /// Final status of the host.
    pub status: HostStatus,
    /// Optional detail message (e.g., number of skipped keys or an error).
    pub message: Option<String>,
}

/// Outcome of processing one host file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    /// The host file was rewritten.
    Updated,
    /// The change specification produced no difference.
    Unchanged,
    /// No host file or no inventory record exists for the device.
    NoData,
    /// Changes were computed but not written.
    DryRun,
    /// The host could not be processed.
    Failed,
}

impl HostStatus {
    /// Every status, in summary order.
    pub const ALL: [Self; 5] = [
        Self::Updated,
        Self::Unchanged,
        Self::NoData,
        Self::DryRun,
        Self::Failed,
    ];

    /// Lower-case label written to the log file and used as the `status`
    /// field of summary events.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::NoData => "no data",
            Self::DryRun => "dry-run",
            Self::Failed => "failed",
        }
    }

    /// Inverse of [`label`](Self::label).
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.label() == label)
    }

    /// Console icon and ANSI color.
    #[must_use]
    pub const fn marker(self) -> (&'static str, &'static str) {
        match self {
            Self::Updated => ("✓", "\x1b[32m"),
            Self::Unchanged | Self::NoData => ("·", "\x1b[2m"),
            Self::DryRun => ("~", "\x1b[37m"),
            Self::Failed => ("✗", "\x1b[31m"),
        }
    }
}

/// Abstraction over logging backends.
///
/// Both [`Logger`](super::logger::Logger) (direct output) and
/// [`BufferedLog`](super::buffered::BufferedLog) (deferred output for
/// parallel hosts) implement this trait, allowing command code to log
/// without knowing whether output is immediate or buffered.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a host result for the summary.
    fn record_host(&self, name: &str, status: HostStatus, message: Option<&str>);
}
