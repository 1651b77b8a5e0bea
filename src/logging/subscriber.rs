//! Tracing subscriber setup: host attribution, console formatter, file layer.
//!
//! Events are rendered from their invsync fields rather than their message
//! alone: the enclosing [`host_span`](super::host_span) names the host,
//! engine skips carry `location` and `reason`, and summary lines carry the
//! host `status`. Messages never contain ANSI codes; only the console adds
//! color.
use std::fmt;
use std::fs;
use std::io::Write as _;
use std::sync::Mutex;

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::{LookupSpan, Scope};

use super::types::HostStatus;
use super::utils::log_file_path;
use super::{DRY_RUN_TARGET, SKIP_TARGET, STAGE_TARGET, SUMMARY_TARGET};

/// The fields invsync events and spans may carry.
#[derive(Debug, Default)]
struct Fields {
    message: String,
    host: Option<String>,
    location: Option<String>,
    reason: Option<String>,
    status: Option<String>,
}

impl Fields {
    fn of_event(event: &Event<'_>) -> Self {
        let mut fields = Self::default();
        event.record(&mut fields);
        fields
    }

    fn set(&mut self, name: &str, value: String) {
        match name {
            "message" => self.message = value,
            "host" => self.host = Some(value),
            "location" => self.location = Some(value),
            "reason" => self.reason = Some(value),
            "status" => self.status = Some(value),
            _ => {}
        }
    }

    /// `location: reason` of a skip event, falling back to the message.
    fn skip(&self) -> String {
        match (&self.location, &self.reason) {
            (Some(location), Some(reason)) => format!("{location}: {reason}"),
            _ => self.message.clone(),
        }
    }
}

impl Visit for Fields {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.set(field.name(), format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.set(field.name(), value.to_string());
    }
}

/// Host name stored in the extensions of a [`host_span`](super::host_span).
#[derive(Debug)]
struct HostName(String);

/// Innermost host named by a span in `scope`.
fn enclosing_host<'a, S: LookupSpan<'a>>(scope: Option<Scope<'a, S>>) -> Option<String> {
    scope?.find_map(|span| {
        let extensions = span.extensions();
        extensions.get::<HostName>().map(|host| host.0.clone())
    })
}

fn host_prefix(host: Option<&str>) -> String {
    host.map_or_else(String::new, |host| format!("{host}: "))
}

/// Records the `host` field of new spans so both output layers can
/// attribute events to a host.
#[derive(Debug)]
pub(super) struct HostScope;

impl<S> Layer<S> for HostScope
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut fields = Fields::default();
        attrs.record(&mut fields);
        if let (Some(host), Some(span)) = (fields.host, ctx.span(id)) {
            span.extensions_mut().insert(HostName(host));
        }
    }
}

/// Plain-text log line for an event, without the timestamp.
fn file_line(level: Level, target: &str, fields: &Fields, host: Option<&str>) -> String {
    let msg = &fields.message;
    let at = host_prefix(host);
    match (level, target) {
        (_, SKIP_TARGET) => format!("    [skip] {at}{}", fields.skip()),
        (Level::INFO, STAGE_TARGET) => format!("==> {msg}"),
        (Level::INFO, DRY_RUN_TARGET) => format!("    [dry run] {at}{msg}"),
        (Level::INFO, SUMMARY_TARGET) => fields.status.as_ref().map_or_else(
            || format!("    {msg}"),
            |status| format!("    [{status}] {msg}"),
        ),
        (Level::ERROR, _) => format!("    [error] {at}{msg}"),
        (Level::WARN, _) => format!("    [warn] {at}{msg}"),
        (Level::DEBUG | Level::TRACE, _) => format!("    [debug] {target}: {at}{msg}"),
        _ => format!("    {at}{msg}"),
    }
}

/// Appends every event to the persistent log file with a UTC timestamp.
///
/// Captures `DEBUG` and above regardless of console verbosity, so engine
/// skips always end up in the file.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Create the log file for `command` with a run header.
    ///
    /// Returns `None` if the cache directory or the file cannot be created.
    pub(super) fn new(command: &str) -> Option<Self> {
        let path = log_file_path(command)?;
        let version =
            option_env!("INVSYNC_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let rule = "=".repeat(42);
        let header = format!(
            "{rule}\ninvsync {version} {command} {}\n{rule}\n",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"),
        );
        fs::write(&path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S> Layer<S> for FileLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let fields = Fields::of_event(event);
        let host = enclosing_host(ctx.event_scope(event));
        let line = file_line(*metadata.level(), metadata.target(), &fields, host.as_deref());

        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "[{}] {line}", chrono::Utc::now().format("%H:%M:%S")).ok();
        }
    }
}

/// Console rendering: colored stage and dry-run lines, summary lines with
/// a status icon, and dimmed engine skips attributed to their host.
struct ConsoleFormatter;

impl<S, N> FormatEvent<S, N> for ConsoleFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let fields = Fields::of_event(event);
        let msg = &fields.message;

        match (*metadata.level(), metadata.target()) {
            (Level::ERROR, _) => writeln!(writer, "\x1b[31mERROR\x1b[0m {msg}"),
            (Level::WARN, _) => writeln!(writer, "\x1b[33mWARN\x1b[0m  {msg}"),
            (_, SKIP_TARGET) => {
                let at = host_prefix(enclosing_host(ctx.event_scope()).as_deref());
                writeln!(writer, "  \x1b[2m- {at}{}\x1b[0m", fields.skip())
            }
            (Level::INFO, STAGE_TARGET) => {
                writeln!(writer, "\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m")
            }
            (Level::INFO, DRY_RUN_TARGET) => writeln!(writer, "  \x1b[33m[DRY RUN]\x1b[0m {msg}"),
            (Level::INFO, SUMMARY_TARGET) => {
                match fields.status.as_deref().and_then(HostStatus::from_label) {
                    Some(status) => {
                        let (icon, color) = status.marker();
                        writeln!(writer, "  {color}{icon} {msg}\x1b[0m")
                    }
                    None => writeln!(writer, "  {msg}"),
                }
            }
            (Level::INFO, _) => writeln!(writer, "  {msg}"),
            _ => writeln!(writer, "  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Installs host attribution, a console layer (warnings and errors to
/// stderr, the rest to stdout) and a file layer writing every event,
/// including `debug`, to `$XDG_CACHE_HOME/invsync/<command>.log`.
/// Must be called once at program startup, before any logging.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        filter::LevelFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let make_writer = std::io::stderr
        .with_max_level(Level::WARN)
        .and(std::io::stdout.with_min_level(Level::INFO));

    let console_layer = tracing_subscriber::fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(make_writer)
        .with_filter(console_level);

    let file_layer = FileLayer::new(command).map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(HostScope)
        .with(console_layer)
        .with(file_layer)
        .init();
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logging::{host_span, isolated_logger};

    fn fields(message: &str) -> Fields {
        Fields {
            message: message.to_string(),
            ..Fields::default()
        }
    }

    #[test]
    fn skip_line_names_host_location_and_reason() {
        let skip = Fields {
            location: Some("network.ipv6".to_string()),
            reason: Some("key 'IPv6' not found".to_string()),
            ..fields("skipped")
        };
        assert_eq!(
            file_line(Level::DEBUG, SKIP_TARGET, &skip, Some("host1.example.com")),
            "    [skip] host1.example.com: network.ipv6: key 'IPv6' not found"
        );
    }

    #[test]
    fn summary_line_carries_status_label() {
        let entry = Fields {
            status: Some("failed".to_string()),
            ..fields("host2.example.com (bad yaml)")
        };
        assert_eq!(
            file_line(Level::INFO, SUMMARY_TARGET, &entry, None),
            "    [failed] host2.example.com (bad yaml)"
        );
        assert_eq!(
            file_line(Level::INFO, SUMMARY_TARGET, &fields("3 hosts"), None),
            "    3 hosts"
        );
    }

    #[test]
    fn debug_line_includes_target() {
        assert_eq!(
            file_line(Level::DEBUG, "invsync_cli::inventory", &fields("fetching"), None),
            "    [debug] invsync_cli::inventory: fetching"
        );
    }

    #[test]
    fn events_inside_host_span_are_attributed() {
        let (log, _tmp, _guard) = isolated_logger();
        {
            let _span = host_span("host7.example.com").entered();
            tracing::debug!(
                target: SKIP_TARGET,
                location = "nics",
                reason = "array 'interface_list' is a null",
                "skipped"
            );
            log.warn("slow response");
        }
        log.warn("outside");
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(contents.contains(
            "[skip] host7.example.com: nics: array 'interface_list' is a null"
        ));
        assert!(contents.contains("[warn] host7.example.com: slow response"));
        assert!(contents.contains("[warn] outside"));
    }
}
