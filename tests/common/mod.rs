// Shared helpers for integration tests.
//
// Provides an in-memory inventory and a temporary-directory-backed ansible
// tree so each integration test can set up an isolated environment without
// repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use invsync_cli::commands::update::UpdatePlan;
use invsync_cli::document::Document;
use invsync_cli::engine::ChangeSpec;
use invsync_cli::error::InventoryError;
use invsync_cli::inventory::InventorySource;
use invsync_cli::logging::Logger;
use invsync_cli::transforms::PluginRegistry;
use serde_json::json;

/// Domain suffix applied by [`FakeInventory::fqdn`].
pub const SUFFIX: &str = ".example.com";

/// In-memory [`InventorySource`] holding pre-linked device records.
///
/// Each device carries a `rack_id` used by [`devices`](InventorySource::devices).
pub struct FakeInventory {
    pub devices: Vec<Document>,
    /// Power outlets; each names its device under `device.id`.
    pub outlets: Vec<Document>,
    /// Number of [`link_device_data`](InventorySource::link_device_data) calls.
    pub link_calls: AtomicUsize,
}

impl FakeInventory {
    /// Two devices in rack 1 and one in rack 2, each with interfaces.
    /// `host1` has two power outlets.
    pub fn sample() -> Self {
        Self {
            devices: vec![
                device(1, "host1", 1, "10.0.0.1/24"),
                device(2, "host2", 1, "10.0.0.2/24"),
                device(3, "host3", 2, "10.0.0.3/24"),
            ],
            outlets: vec![outlet(1, "host1", "A1"), outlet(1, "host1", "A2")],
            link_calls: AtomicUsize::new(0),
        }
    }

    /// How often device data was linked.
    pub fn link_calls(&self) -> usize {
        self.link_calls.load(Ordering::SeqCst)
    }
}

/// A linked device record at rack unit `id * 2` with two interfaces and
/// one IPv4 address on `eno1`.
pub fn device(id: u64, name: &str, rack: u64, address: &str) -> Document {
    json!({
        "id": id,
        "name": name,
        "display": name,
        "rack_id": rack,
        "position": id * 2,
        "serial": format!("SN{id:04}"),
        "device_type": {"display": "R650"},
        "rack": {"id": rack, "display": format!("R{rack:02}")},
        "interfaces": {
            "eno1": {
                "name": "eno1",
                "display": "eno1",
                "mac_address": format!("00:00:00:00:00:{id:02}"),
                "mtu": 1500,
                "type": {"label": "25GBASE-X (SFP28)"},
                "cable_peer": {"device": {"display": "tor1"}}
            },
            "ipmi": {
                "name": "ipmi",
                "display": "ipmi",
                "type": {"label": "1000BASE-T (1GE)"},
                "cable_peer": null
            }
        },
        "interface_list": [
            {"name": "eno1", "mgmt_only": false},
            {"name": "ipmi", "mgmt_only": true}
        ],
        "addresses": {"eno1": {"IPv4": address}}
    })
}

/// A power outlet record on device `id`.
pub fn outlet(id: u64, device: &str, name: &str) -> Document {
    json!({"display": name, "device": {"id": id, "display": device}})
}

impl InventorySource for FakeInventory {
    fn racks(&self) -> Result<Vec<Document>, InventoryError> {
        Ok(vec![json!({"id": 1}), json!({"id": 2})])
    }

    fn devices(&self, racks: &[u64]) -> Result<Vec<Document>, InventoryError> {
        Ok(self
            .devices
            .iter()
            .filter(|d| {
                racks.is_empty()
                    || d.get("rack_id")
                        .and_then(Document::as_u64)
                        .is_some_and(|r| racks.contains(&r))
            })
            .cloned()
            .collect())
    }

    fn devices_by_name(&self, names: &[String]) -> Result<Vec<Document>, InventoryError> {
        Ok(self
            .devices
            .iter()
            .filter(|d| {
                d.get("name")
                    .and_then(Document::as_str)
                    .is_some_and(|n| names.iter().any(|want| want == n))
            })
            .cloned()
            .collect())
    }

    fn devices_by_id(&self, ids: &[u64]) -> Result<Vec<Document>, InventoryError> {
        Ok(self
            .devices
            .iter()
            .filter(|d| d.get("id").and_then(Document::as_u64).is_some_and(|i| ids.contains(&i)))
            .cloned()
            .collect())
    }

    fn power_outlets(&self, device_id: u64) -> Result<Vec<Document>, InventoryError> {
        Ok(self
            .outlets
            .iter()
            .filter(|o| {
                o.pointer("/device/id")
                    .and_then(Document::as_u64)
                    .is_some_and(|i| i == device_id)
            })
            .cloned()
            .collect())
    }

    fn link_device_data(&self, devices: Vec<Document>) -> Result<Vec<Document>, InventoryError> {
        self.link_calls.fetch_add(1, Ordering::SeqCst);
        Ok(devices)
    }

    fn fqdn(&self, name: &str) -> String {
        if name.ends_with(SUFFIX) {
            name.to_string()
        } else {
            format!("{name}{SUFFIX}")
        }
    }
}

/// An isolated ansible directory backed by a [`tempfile::TempDir`].
pub struct AnsibleTree {
    /// Temporary directory holding `host_vars/`.
    pub root: tempfile::TempDir,
}

impl AnsibleTree {
    /// Create an empty `host_vars/` directory.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(root.path().join("host_vars")).expect("create host_vars");
        Self { root }
    }

    /// Path to `host_vars/`.
    pub fn host_vars(&self) -> PathBuf {
        self.root.path().join("host_vars")
    }

    /// Path of the host file for `fqdn`.
    pub fn host_file(&self, fqdn: &str) -> PathBuf {
        self.host_vars().join(format!("{fqdn}.yml"))
    }

    /// Write a host file for `fqdn`.
    pub fn with_host(self, fqdn: &str, content: &str) -> Self {
        std::fs::write(self.host_file(fqdn), content).expect("write host file");
        self
    }

    /// Read back the host file for `fqdn`.
    pub fn read(&self, fqdn: &str) -> String {
        std::fs::read_to_string(self.host_file(fqdn)).expect("read host file")
    }

    /// Parse the host file for `fqdn`.
    pub fn load(&self, fqdn: &str) -> Document {
        invsync_cli::document::io::load(&self.host_file(fqdn)).expect("load host file")
    }

    /// Root of the ansible tree.
    pub fn path(&self) -> &Path {
        self.root.path()
    }
}

/// Build an update plan over `tree` with the given options.
pub fn plan<'a>(
    tree: &AnsibleTree,
    spec: &'a ChangeSpec,
    registry: &'a PluginRegistry,
    dry_run: bool,
    parallel: bool,
) -> UpdatePlan<'a> {
    UpdatePlan {
        host_vars: tree.host_vars(),
        spec,
        registry,
        dry_run,
        parallel,
    }
}

/// A logger that collects host results for assertions.
pub fn logger() -> Arc<Logger> {
    Arc::new(Logger::new("integration-test"))
}
