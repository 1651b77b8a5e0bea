//! Logging infrastructure for structured console and file output.

mod buffered;
mod logger;
mod subscriber;
mod types;
mod utils;

pub use buffered::BufferedLog;
pub use logger::Logger;
pub use subscriber::init_subscriber;
pub use types::{HostEntry, HostStatus, Log};
pub(crate) use utils::xdg_dir;

/// Tracing target for stage headers.
pub const STAGE_TARGET: &str = "invsync::stage";

/// Tracing target for dry-run lines.
pub const DRY_RUN_TARGET: &str = "invsync::dry_run";

/// Tracing target for keys the engine skipped. Events carry `location`
/// and `reason` fields.
pub const SKIP_TARGET: &str = "invsync::skip";

/// Tracing target for run summary lines. Per-host lines carry a `status`
/// field holding a [`HostStatus::label`].
pub const SUMMARY_TARGET: &str = "invsync::summary";

/// Span enclosing the work done for one host. Events emitted inside it
/// are attributed to `name` in the console and the log file.
#[must_use]
pub fn host_span(name: &str) -> tracing::Span {
    tracing::info_span!("host", host = %name)
}

/// Serializes environment manipulation across parallel test threads.
#[cfg(test)]
pub(crate) static TEST_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Create a Logger backed by an isolated per-thread tracing subscriber
/// with a [`FileLayer`](subscriber::FileLayer), so that tracing events
/// emitted by logger methods actually reach the log file during tests.
///
/// The returned guard must be kept alive for the duration of the test;
/// dropping it restores the previous thread-local dispatcher.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn isolated_logger() -> (Logger, tempfile::TempDir, tracing::dispatcher::DefaultGuard) {
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let env_lock = TEST_ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    // SAFETY: Protected by TEST_ENV_MUTEX; restored before lock is released.
    #[allow(unsafe_code)]
    unsafe {
        std::env::set_var("XDG_CACHE_HOME", tmp.path());
    }
    let file_layer = subscriber::FileLayer::new("test").expect("failed to create file layer");
    let log = Logger::new("test");
    // SAFETY: Protected by TEST_ENV_MUTEX.
    #[allow(unsafe_code)]
    unsafe {
        std::env::remove_var("XDG_CACHE_HOME");
    }
    drop(env_lock);
    let subscriber = tracing_subscriber::registry()
        .with(subscriber::HostScope)
        .with(file_layer.with_filter(LevelFilter::DEBUG));
    let guard = tracing::dispatcher::set_default(&tracing::Dispatch::new(subscriber));
    (log, tmp, guard)
}
