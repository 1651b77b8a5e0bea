//! Structured logger with dry-run awareness and per-host summary collection.
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

use super::types::{HostEntry, HostStatus, Log};
use super::utils::{log_file_path, terminal_columns};
use super::{DRY_RUN_TARGET, STAGE_TARGET, SUMMARY_TARGET};

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
///
/// The `record_host` method is **not** included because its signature differs
/// from the `fn(&self, &str)` pattern shared by the display methods.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with dry-run awareness and summary collection.
///
/// All messages are also written to `$XDG_CACHE_HOME/invsync/<command>.log`
/// by the file layer installed by
/// [`init_subscriber`](super::subscriber::init_subscriber).
#[derive(Debug)]
pub struct Logger {
    hosts: Mutex<Vec<HostEntry>>,
    log_file: Option<PathBuf>,
    /// Serializes console output from parallel host flushes.
    pub(super) flush_lock: Mutex<()>,
    /// Names of hosts currently being processed in parallel.
    pub(super) active_hosts: Mutex<Vec<String>>,
    /// Whether a progress line is currently displayed (`0` = no, `1` = yes).
    ///
    /// The progress line is truncated to a single terminal row.
    pub(super) progress_rows: Mutex<u16>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display in the run summary; it does not
    /// write to the file itself.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            hosts: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
            flush_lock: Mutex::new(()),
            active_hosts: Mutex::new(Vec::new()),
            progress_rows: Mutex::new(0),
        }
    }

    /// Return the log file path, if available.
    #[cfg(test)]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return a clone of all recorded host entries.
    #[must_use]
    pub fn host_entries(&self) -> Vec<HostEntry> {
        self.hosts.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Return the current value of `progress_rows` (test-only).
    #[cfg(test)]
    pub(crate) fn progress_rows_count(&self) -> u16 {
        *self
            .progress_rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Record a host result for the summary.
    pub fn record_host(&self, name: &str, status: HostStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.hosts.lock() {
            guard.push(HostEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Count the number of failed hosts.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.count(HostStatus::Failed)
    }

    fn count(&self, status: HostStatus) -> usize {
        self.hosts.lock().map_or(0, |guard| {
            guard.iter().filter(|h| h.status == status).count()
        })
    }

    /// Print the summary of all recorded hosts.
    ///
    /// Hosts without data are counted but not listed.
    pub fn print_summary(&self) {
        let hosts = self.host_entries();
        if hosts.is_empty() {
            return;
        }

        self.stage("Summary");

        for host in hosts.iter().filter(|h| h.status != HostStatus::NoData) {
            let suffix = host
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));
            tracing::info!(
                target: SUMMARY_TARGET,
                status = host.status.label(),
                "{}{suffix}",
                host.name
            );
        }

        let totals: Vec<String> = HostStatus::ALL
            .into_iter()
            .map(|status| format!("{} {}", self.count(status), status.label()))
            .collect();
        tracing::info!(
            target: SUMMARY_TARGET,
            "{} hosts: {}",
            hosts.len(),
            totals.join(", ")
        );

        if let Some(path) = &self.log_file {
            tracing::info!(target: SUMMARY_TARGET, "log: {}", path.display());
        }
    }

    /// Erase the in-progress status line from the console.
    ///
    /// No-op if no progress line is currently shown.
    /// Must be called while holding `flush_lock`.
    #[allow(clippy::print_stdout)]
    pub(super) fn clear_progress(&self) {
        let mut guard = self
            .progress_rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *guard > 0 {
            print!("\r\x1b[K");
            std::io::stdout().flush().ok();
            *guard = 0;
        }
    }

    /// Print an in-progress status line to the console and mark it as shown.
    ///
    /// The host-name list is truncated to fit within a single terminal row.
    /// Must be called while holding `flush_lock`.
    #[allow(clippy::print_stdout)]
    pub(super) fn draw_progress(&self, names: &str) {
        let cols = terminal_columns();
        let prefix_width = 4;
        let max_name_chars = cols.saturating_sub(prefix_width);
        let display_names = if names.chars().count() > max_name_chars {
            let truncated: String = names
                .chars()
                .take(max_name_chars.saturating_sub(1))
                .collect();
            format!("{truncated}…")
        } else {
            names.to_string()
        };
        print!("  \x1b[2m▹ {display_names}\x1b[0m");
        std::io::stdout().flush().ok();
        let mut guard = self
            .progress_rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = 1;
    }

    /// Record that a host has started processing in parallel.
    ///
    /// Acquires the flush lock, erases any previous progress line, adds the
    /// host to the active set, and redraws the status line.
    pub fn notify_host_start(&self, name: &str) {
        let _guard = self
            .flush_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.clear_progress();
        let names = self.active_hosts.lock().map_or_else(
            |_| name.to_string(),
            |mut active| {
                active.push(name.to_string());
                active.join(", ")
            },
        );
        self.draw_progress(&names);
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn record_host(&self, name: &str, status: HostStatus, message: Option<&str>) {
        self.record_host(name, status, message);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::isolated_logger;
    use std::fs;

    #[test]
    fn logger_new() {
        let (log, _tmp, _guard) = isolated_logger();
        assert!(log.host_entries().is_empty(), "expected empty host list");
    }

    #[test]
    fn record_host_with_message() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_host("host1.example.com", HostStatus::Updated, Some("1 key skipped"));
        let hosts = log.host_entries();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].name, "host1.example.com");
        assert_eq!(hosts[0].status, HostStatus::Updated);
        assert_eq!(hosts[0].message, Some("1 key skipped".to_string()));
    }

    #[test]
    fn failure_count_returns_correct_count() {
        let (log, _tmp, _guard) = isolated_logger();
        assert_eq!(log.failure_count(), 0);
        log.record_host("a", HostStatus::Updated, None);
        log.record_host("b", HostStatus::Failed, Some("error 1"));
        log.record_host("c", HostStatus::Failed, Some("error 2"));
        log.record_host("d", HostStatus::NoData, None);
        assert_eq!(log.failure_count(), 2);
    }

    #[test]
    fn log_trait_delegates_to_logger() {
        let (log, _tmp, _guard) = isolated_logger();
        let log_ref: &dyn Log = &log;
        log_ref.record_host("via-trait", HostStatus::Unchanged, None);
        assert_eq!(log.host_entries().len(), 1);
    }

    #[test]
    fn log_file_is_created() {
        let (log, _tmp, _guard) = isolated_logger();
        let path = log.log_path().expect("log path should exist");
        assert!(path.exists(), "log file should be created by the file layer");
    }

    #[test]
    fn debug_always_written_to_file() {
        let (log, _tmp, _guard) = isolated_logger();
        let marker = format!("debug-marker-{}", std::process::id());
        log.debug(&marker);
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(contents.contains("[debug]"));
        assert!(contents.contains(&marker));
    }

    #[test]
    fn levels_are_tagged_in_file() {
        let (log, _tmp, _guard) = isolated_logger();
        let pid = std::process::id();
        log.warn(&format!("warn-{pid}"));
        log.error(&format!("error-{pid}"));
        log.stage(&format!("stage-{pid}"));
        log.dry_run(&format!("dryrun-{pid}"));
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(contents.contains(&format!("[warn] warn-{pid}")));
        assert!(contents.contains(&format!("[error] error-{pid}")));
        assert!(contents.contains(&format!("==> stage-{pid}")));
        assert!(contents.contains(&format!("[dry run] dryrun-{pid}")));
    }

    #[test]
    fn summary_is_written_to_file() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_host("h1", HostStatus::Updated, None);
        log.record_host("nodata-host.example.com", HostStatus::NoData, None);
        log.print_summary();
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(contents.contains("==> Summary"));
        assert!(contents.contains("[updated] h1"));
        assert!(contents.contains(
            "2 hosts: 1 updated, 0 unchanged, 1 no data, 0 dry-run, 0 failed"
        ));
        assert!(
            !contents.contains("nodata-host.example.com"),
            "hosts without data are not listed"
        );
    }

    #[test]
    fn notify_host_start_tracks_active_hosts() {
        let (log, _tmp, _guard) = isolated_logger();
        assert_eq!(log.progress_rows_count(), 0);
        log.notify_host_start("host1");
        assert_eq!(log.progress_rows_count(), 1);
        let active = log.active_hosts.lock().unwrap().clone();
        assert_eq!(active, ["host1"]);
    }

    #[test]
    fn draw_progress_caps_rows_to_one() {
        let (log, _tmp, _guard) = isolated_logger();
        log.draw_progress(&"a".repeat(500));
        assert_eq!(log.progress_rows_count(), 1);
    }
}
