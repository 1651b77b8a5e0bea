//! Command: update host_vars files from inventory records.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use rayon::prelude::*;

use super::{CommandSetup, finish};
use crate::cli::{GlobalOpts, UpdateOpts};
use crate::document::{self, Document, Mapping, NodeKind, equals};
use crate::engine::{ChangeSpec, RunReport, TransformEngine};
use crate::error::{DocumentError, SyncError};
use crate::inventory::InventorySource;
use crate::logging::{BufferedLog, HostStatus, Log, Logger, host_span};
use crate::transforms::PluginRegistry;

/// Everything an update run needs besides the inventory and the logger.
#[derive(Debug)]
pub struct UpdatePlan<'a> {
    /// Directory holding one `<fqdn>.yml` per host.
    pub host_vars: PathBuf,
    /// Change specification applied to every host.
    pub spec: &'a ChangeSpec,
    /// Transforms the specification may call.
    pub registry: &'a PluginRegistry,
    /// Report changes without writing.
    pub dry_run: bool,
    /// Process hosts concurrently.
    pub parallel: bool,
}

/// A host file paired with its linked device record.
#[derive(Debug)]
struct HostJob {
    name: String,
    path: PathBuf,
    device: Document,
}

/// Run the `update` command.
///
/// # Errors
///
/// Returns an error if configuration is incomplete, the change specification
/// is invalid, the data service cannot be queried, or any host failed.
pub fn run(global: &GlobalOpts, opts: &UpdateOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let ansible = setup
        .config
        .ansible_directory(opts.ansible_directory.as_deref())?;
    let spec = setup.config.change_spec(opts.changes.as_deref())?;
    let registry = setup.config.registry()?.freeze();
    log.debug(&format!(
        "{} top-level change(s), {} transform(s)",
        spec.len(),
        registry.len()
    ));
    let client = setup.connect()?;

    let plan = UpdatePlan {
        host_vars: ansible.join("host_vars"),
        spec: &spec,
        registry: registry.as_ref(),
        dry_run: global.dry_run,
        parallel: global.parallel,
    };
    update_hosts(&client, &opts.racks, &plan, log)?;
    finish(log)
}

/// Apply `plan` to every device in `racks` that has a host file.
///
/// Devices without a host file are recorded as having no data. Per-host
/// failures are recorded on `log` and do not stop the run.
///
/// # Errors
///
/// Returns an error before any host file is touched if the specification
/// calls an unregistered transform, or if the inventory cannot be queried.
pub fn update_hosts(
    source: &dyn InventorySource,
    racks: &[u64],
    plan: &UpdatePlan<'_>,
    log: &Arc<Logger>,
) -> Result<()> {
    TransformEngine::new(plan.registry).check(plan.spec)?;

    log.stage("Fetching devices");
    let devices = source.devices(racks)?;
    log.info(&format!("{} device(s)", devices.len()));

    let mut targets = Vec::new();
    let mut pending = Vec::new();
    for device in devices {
        let Some(name) = device.get("name").and_then(Document::as_str) else {
            log.debug("skipping device without a name");
            continue;
        };
        let fqdn = source.fqdn(name);
        let path = plan.host_vars.join(format!("{fqdn}.yml"));
        if path.is_file() {
            targets.push((fqdn, path));
            pending.push(device);
        } else {
            log.debug(&format!("{fqdn}: no host file at {}", path.display()));
            log.record_host(&fqdn, HostStatus::NoData, None);
        }
    }

    if pending.is_empty() {
        log.info("no host files to update");
        return Ok(());
    }

    let linked = source.link_device_data(pending)?;
    let jobs: Vec<HostJob> = targets
        .into_iter()
        .zip(linked)
        .map(|((name, path), device)| HostJob { name, path, device })
        .collect();

    log.stage(if plan.dry_run {
        "Checking hosts"
    } else {
        "Updating hosts"
    });
    if plan.parallel {
        jobs.par_iter().for_each(|job| {
            log.notify_host_start(&job.name);
            let buf = BufferedLog::new(Arc::clone(log));
            process_host(job, plan, &buf);
            buf.flush_and_complete(&job.name);
        });
    } else {
        for job in &jobs {
            process_host(job, plan, &**log);
        }
    }
    Ok(())
}

fn process_host(job: &HostJob, plan: &UpdatePlan<'_>, log: &dyn Log) {
    let _span = host_span(&job.name).entered();
    match sync_host(job, plan, log) {
        Ok((status, report)) => {
            let message = (!report.is_clean())
                .then(|| format!("{} key(s) skipped", report.failures.len()));
            log.record_host(&job.name, status, message.as_deref());
        }
        Err(e) => {
            log.error(&format!("{}: {e}", job.name));
            log.record_host(&job.name, HostStatus::Failed, Some(&e.to_string()));
        }
    }
}

fn sync_host(
    job: &HostJob,
    plan: &UpdatePlan<'_>,
    log: &dyn Log,
) -> Result<(HostStatus, RunReport), SyncError> {
    let before = match document::io::load(&job.path)? {
        Document::Object(map) => map,
        other => {
            return Err(DocumentError::Parse {
                path: job.path.display().to_string(),
                message: format!(
                    "expected a mapping at the top level, found {}",
                    NodeKind::of(&other)
                ),
            }
            .into());
        }
    };

    let mut after = before.clone();
    let report = TransformEngine::new(plan.registry).run(plan.spec, &job.device, &mut after)?;

    let changed = changed_keys(&before, &after);
    if changed.is_empty() {
        log.debug(&format!("{}: up to date", job.name));
        return Ok((HostStatus::Unchanged, report));
    }

    if plan.dry_run {
        for key in changed {
            log.dry_run(&format!("would update {}: {key}", job.name));
        }
        return Ok((HostStatus::DryRun, report));
    }

    let written = document::io::save(&job.path, &Document::Object(after))?;
    if written {
        log.info(&format!("updated {}", job.path.display()));
        Ok((HostStatus::Updated, report))
    } else {
        Ok((HostStatus::Unchanged, report))
    }
}

/// Top-level keys added, removed or modified between `before` and `after`,
/// in `after`'s order followed by removed keys.
fn changed_keys<'a>(before: &'a Mapping, after: &'a Mapping) -> Vec<&'a str> {
    let mut keys: Vec<&str> = after
        .iter()
        .filter(|(key, value)| before.get(*key).is_none_or(|old| !equals(old, value)))
        .map(|(key, _)| key.as_str())
        .collect();
    keys.extend(
        before
            .keys()
            .filter(|key| !after.contains_key(*key))
            .map(String::as_str),
    );
    keys
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::isolated_logger;
    use serde_json::json;
    use std::fs;

    fn mapping(value: Document) -> Mapping {
        value.as_object().cloned().unwrap()
    }

    fn job(dir: &std::path::Path, content: &str, device: Document) -> HostJob {
        let path = dir.join("host1.example.com.yml");
        fs::write(&path, content).unwrap();
        HostJob {
            name: "host1.example.com".to_string(),
            path,
            device,
        }
    }

    fn plan<'a>(spec: &'a ChangeSpec, registry: &'a PluginRegistry, dry_run: bool) -> UpdatePlan<'a> {
        UpdatePlan {
            host_vars: PathBuf::new(),
            spec,
            registry,
            dry_run,
            parallel: false,
        }
    }

    #[test]
    fn changed_keys_reports_added_modified_and_removed() {
        let before = mapping(json!({"a": 1, "b": 2, "c": 3}));
        let after = mapping(json!({"a": 1, "b": 5, "d": 4}));
        assert_eq!(changed_keys(&before, &after), ["b", "d", "c"]);
    }

    #[test]
    fn changed_keys_ignores_key_order() {
        let before = mapping(json!({"a": 1, "b": 2}));
        let after = mapping(json!({"b": 2, "a": 1}));
        assert!(changed_keys(&before, &after).is_empty());
    }

    #[test]
    fn sync_host_writes_changes() {
        let (log, tmp, _guard) = isolated_logger();
        let job = job(tmp.path(), "keep: true\n", json!({"name": "host1"}));
        let spec = ChangeSpec::parse(&json!({"hostname": "name"})).unwrap();
        let registry = PluginRegistry::with_builtins();

        let (status, report) = sync_host(&job, &plan(&spec, &registry, false), &log).unwrap();

        assert_eq!(status, HostStatus::Updated);
        assert!(report.is_clean());
        let saved = document::io::load(&job.path).unwrap();
        assert_eq!(saved, json!({"keep": true, "hostname": "host1"}));
    }

    #[test]
    fn sync_host_dry_run_leaves_file() {
        let (log, tmp, _guard) = isolated_logger();
        let job = job(tmp.path(), "keep: true\n", json!({"name": "host1"}));
        let spec = ChangeSpec::parse(&json!({"hostname": "name"})).unwrap();
        let registry = PluginRegistry::with_builtins();

        let (status, _) = sync_host(&job, &plan(&spec, &registry, true), &log).unwrap();

        assert_eq!(status, HostStatus::DryRun);
        assert_eq!(fs::read_to_string(&job.path).unwrap(), "keep: true\n");
    }

    #[test]
    fn sync_host_unchanged_when_equal() {
        let (log, tmp, _guard) = isolated_logger();
        let job = job(tmp.path(), "hostname: host1\n", json!({"name": "host1"}));
        let spec = ChangeSpec::parse(&json!({"hostname": "name"})).unwrap();
        let registry = PluginRegistry::with_builtins();

        let (status, _) = sync_host(&job, &plan(&spec, &registry, false), &log).unwrap();

        assert_eq!(status, HostStatus::Unchanged);
    }

    #[test]
    fn sync_host_counts_skipped_keys() {
        let (log, tmp, _guard) = isolated_logger();
        let job = job(tmp.path(), "{}\n", json!({"name": "host1"}));
        let spec = ChangeSpec::parse(&json!({"hostname": "name", "serial": "serial"})).unwrap();
        let registry = PluginRegistry::with_builtins();

        let (status, report) = sync_host(&job, &plan(&spec, &registry, false), &log).unwrap();

        assert_eq!(status, HostStatus::Updated);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn sync_host_treats_empty_file_as_empty_mapping() {
        let (log, tmp, _guard) = isolated_logger();
        let job = job(tmp.path(), "", json!({"name": "host1"}));
        let spec = ChangeSpec::parse(&json!({"hostname": "name"})).unwrap();
        let registry = PluginRegistry::with_builtins();

        let (status, _) = sync_host(&job, &plan(&spec, &registry, false), &log).unwrap();

        assert_eq!(status, HostStatus::Updated);
    }

    #[test]
    fn sync_host_rejects_non_mapping_file() {
        let (log, tmp, _guard) = isolated_logger();
        let job = job(tmp.path(), "- a\n- b\n", json!({"name": "host1"}));
        let spec = ChangeSpec::parse(&json!({"hostname": "name"})).unwrap();
        let registry = PluginRegistry::with_builtins();

        let err = sync_host(&job, &plan(&spec, &registry, false), &log).unwrap_err();

        assert!(err.to_string().contains("expected a mapping"));
    }

    #[test]
    fn process_host_records_failure() {
        let (log, tmp, _guard) = isolated_logger();
        let job = job(tmp.path(), "key: [unclosed\n", json!({"name": "host1"}));
        let spec = ChangeSpec::parse(&json!({"hostname": "name"})).unwrap();
        let registry = PluginRegistry::with_builtins();

        process_host(&job, &plan(&spec, &registry, false), &log);

        let entries = log.host_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, HostStatus::Failed);
    }

    #[test]
    fn process_host_reports_skipped_count() {
        let (log, tmp, _guard) = isolated_logger();
        let job = job(tmp.path(), "{}\n", json!({}));
        let spec = ChangeSpec::parse(&json!({"hostname": "name"})).unwrap();
        let registry = PluginRegistry::with_builtins();

        process_host(&job, &plan(&spec, &registry, false), &log);

        let entries = log.host_entries();
        assert_eq!(entries[0].status, HostStatus::Unchanged);
        assert_eq!(entries[0].message.as_deref(), Some("1 key(s) skipped"));
    }

    #[test]
    fn skipped_keys_are_logged_under_the_host() {
        let (log, tmp, _guard) = isolated_logger();
        let job = job(tmp.path(), "{}\n", json!({"name": "host1"}));
        let spec = ChangeSpec::parse(&json!({"hostname": "name", "serial": "serial"})).unwrap();
        let registry = PluginRegistry::with_builtins();

        process_host(&job, &plan(&spec, &registry, false), &log);

        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(contents.contains("[skip] host1.example.com: serial: 'serial':"));
    }
}
