//! Device inventory records fetched from the NetBox data service.
//!
//! Device records are returned as documents. [`InventorySource::link_device_data`]
//! attaches each device's interfaces, addresses and power ports so change
//! specifications can address them by path.
pub mod fetch;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

pub use fetch::{Fetch, HttpFetch};

use crate::config::Config;
use crate::document::{Document, Mapping, scalar_text};
use crate::error::{ConfigError, InventoryError};
use crate::path;

/// Bytes escaped in query values: everything but RFC 3986 unreserved.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Read access to device inventory.
pub trait InventorySource {
    /// All racks.
    ///
    /// # Errors
    ///
    /// Returns an error if the data service cannot be queried.
    fn racks(&self) -> Result<Vec<Document>, InventoryError>;

    /// Devices in the given racks, or in every rack when `racks` is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the data service cannot be queried.
    fn devices(&self, racks: &[u64]) -> Result<Vec<Document>, InventoryError>;

    /// Devices with the given names. A name carrying the domain suffix is
    /// retried without it when nothing matches, and a bare name is retried
    /// with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the data service cannot be queried.
    fn devices_by_name(&self, names: &[String]) -> Result<Vec<Document>, InventoryError>;

    /// Devices with the given ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the data service cannot be queried.
    fn devices_by_id(&self, ids: &[u64]) -> Result<Vec<Document>, InventoryError>;

    /// Power outlets of the device with id `device_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data service cannot be queried.
    fn power_outlets(&self, device_id: u64) -> Result<Vec<Document>, InventoryError>;

    /// Attach `interfaces`, `addresses` and `power_ports` to each device.
    ///
    /// # Errors
    ///
    /// Returns an error if the data service cannot be queried.
    fn link_device_data(&self, devices: Vec<Document>) -> Result<Vec<Document>, InventoryError>;

    /// Fully qualified name of a device.
    fn fqdn(&self, name: &str) -> String;
}

/// Bulk tables used to link device records, fetched once per client.
#[derive(Debug, Default)]
struct LinkTables {
    /// Device name → interface display name → interface.
    interfaces: HashMap<String, Mapping>,
    /// Device name → interface name → family label → address.
    addresses: HashMap<String, Mapping>,
    power_ports: Vec<Document>,
}

/// NetBox REST client.
///
/// Responses are cached per absolute URL for the client's lifetime.
#[derive(Debug)]
pub struct NetboxClient<F> {
    fetch: F,
    api_url: String,
    suffix: Option<String>,
    cache: Mutex<HashMap<String, Document>>,
    tables: Mutex<Option<Arc<LinkTables>>>,
}

impl NetboxClient<HttpFetch> {
    /// Create an HTTP client from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSetting`] if no token is configured.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let fetch = HttpFetch::new(config.token()?);
        Ok(Self::new(fetch, config.api_url(), config.suffix.clone()))
    }
}

impl<F: Fetch> NetboxClient<F> {
    /// Create a client for the API rooted at `api_url`.
    pub fn new(fetch: F, api_url: impl Into<String>, suffix: Option<String>) -> Self {
        Self {
            fetch,
            api_url: api_url.into(),
            suffix: suffix.filter(|s| !s.is_empty()),
            cache: Mutex::new(HashMap::new()),
            tables: Mutex::new(None),
        }
    }

    fn absolute(&self, url: &str) -> String {
        if url.starts_with("http") {
            url.to_string()
        } else {
            format!("{}{url}", self.api_url)
        }
    }

    /// Fetch `url` (relative to the API root unless absolute).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub fn get(&self, url: &str, use_cache: bool) -> Result<Document, InventoryError> {
        let url = self.absolute(url);
        if use_cache
            && let Some(hit) = self
                .cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&url)
        {
            tracing::debug!("returning cached: {url}");
            return Ok(hit.clone());
        }

        tracing::debug!("fetching: {url}");
        let doc = self.fetch.get_json(&url)?;
        if use_cache {
            self.cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(url, doc.clone());
        }
        Ok(doc)
    }

    /// Fetch a list endpoint, following `next` links and concatenating
    /// every page's `results`.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::MissingField`] if a page has no `results`
    /// sequence.
    pub fn list(&self, url: &str) -> Result<Vec<Document>, InventoryError> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());
        while let Some(url) = next.take() {
            let page = self.get(&url, true)?;
            let Some(results) = page.get("results").and_then(Document::as_array) else {
                return Err(InventoryError::MissingField {
                    url: self.absolute(&url),
                    field: "results".to_string(),
                });
            };
            items.extend(results.iter().cloned());
            next = page.get("next").and_then(Document::as_str).map(String::from);
        }
        Ok(items)
    }

    fn tables(&self) -> Result<Arc<LinkTables>, InventoryError> {
        if let Some(tables) = self
            .tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(tables));
        }

        let tables = Arc::new(LinkTables {
            interfaces: self.interfaces_by_device()?,
            addresses: self.addresses_by_device()?,
            power_ports: self.list("/dcim/power-ports/")?,
        });
        *self.tables.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&tables));
        Ok(tables)
    }

    fn interfaces_by_device(&self) -> Result<HashMap<String, Mapping>, InventoryError> {
        let mut by_device: HashMap<String, Mapping> = HashMap::new();
        for interface in self.list("/dcim/interfaces/")? {
            let (Ok(device), Ok(display)) = (
                path::get(&interface, "device.name"),
                path::get(&interface, "display"),
            ) else {
                tracing::debug!("interface without device or display name ignored");
                continue;
            };
            by_device
                .entry(scalar_text(device))
                .or_default()
                .insert(scalar_text(display), interface.clone());
        }
        Ok(by_device)
    }

    fn addresses_by_device(&self) -> Result<HashMap<String, Mapping>, InventoryError> {
        let mut by_device: HashMap<String, Mapping> = HashMap::new();
        for family in [4, 6] {
            for addr in self.list(&format!("/ipam/ip-addresses/?family={family}"))? {
                let fields = (
                    path::get(&addr, "assigned_object.device.display"),
                    path::get(&addr, "assigned_object.name"),
                    path::get(&addr, "family.label"),
                    path::get(&addr, "address"),
                );
                let (Ok(host), Ok(endpoint), Ok(label), Ok(address)) = fields else {
                    tracing::debug!("unassigned address ignored");
                    continue;
                };
                if host.is_null() || endpoint.is_null() {
                    continue;
                }
                let families = by_device
                    .entry(scalar_text(host))
                    .or_default()
                    .entry(scalar_text(endpoint))
                    .or_insert_with(|| Document::Object(Mapping::new()));
                if let Document::Object(families) = families {
                    families.insert(scalar_text(label), address.clone());
                }
            }
        }
        Ok(by_device)
    }

    fn find_by_name(&self, name: &str) -> Result<Vec<Document>, InventoryError> {
        let name = utf8_percent_encode(name, QUERY_VALUE);
        self.list(&format!("/dcim/devices/?name={name}"))
    }
}

impl<F: Fetch> InventorySource for NetboxClient<F> {
    fn racks(&self) -> Result<Vec<Document>, InventoryError> {
        self.list("/dcim/racks/")
    }

    fn devices(&self, racks: &[u64]) -> Result<Vec<Document>, InventoryError> {
        let racks = if racks.is_empty() {
            self.racks()?
                .iter()
                .filter_map(|rack| rack.get("id").and_then(Document::as_u64))
                .collect()
        } else {
            racks.to_vec()
        };

        let mut devices = Vec::new();
        for rack in racks {
            devices.extend(self.list(&format!("/dcim/devices/?rack_id={rack}"))?);
        }
        Ok(devices)
    }

    fn devices_by_name(&self, names: &[String]) -> Result<Vec<Document>, InventoryError> {
        let mut devices = Vec::new();
        for name in names {
            let mut found = self.find_by_name(name)?;
            if found.is_empty()
                && let Some(suffix) = &self.suffix
            {
                let retry = name
                    .strip_suffix(suffix.as_str())
                    .map_or_else(|| self.fqdn(name), String::from);
                found = self.find_by_name(&retry)?;
            }
            if found.is_empty() {
                tracing::debug!("no device named '{name}'");
            }
            devices.extend(found);
        }
        Ok(devices)
    }

    fn devices_by_id(&self, ids: &[u64]) -> Result<Vec<Document>, InventoryError> {
        ids.iter()
            .map(|id| self.get(&format!("/dcim/devices/{id}/"), true))
            .collect()
    }

    fn power_outlets(&self, device_id: u64) -> Result<Vec<Document>, InventoryError> {
        self.list(&format!("/dcim/power-outlets/?device_id={device_id}"))
    }

    fn link_device_data(&self, mut devices: Vec<Document>) -> Result<Vec<Document>, InventoryError> {
        let tables = self.tables()?;
        for device in &mut devices {
            let Some(name) = device.get("name").map(scalar_text) else {
                continue;
            };
            let power_ports: Vec<Document> = tables
                .power_ports
                .iter()
                .filter(|port| path::get(port, "device.name").is_ok_and(|n| scalar_text(n) == name))
                .cloned()
                .collect();
            let Document::Object(record) = device else {
                continue;
            };
            if let Some(interfaces) = tables.interfaces.get(&name) {
                record.insert("interfaces".to_string(), Document::Object(interfaces.clone()));
            }
            if let Some(addresses) = tables.addresses.get(&name) {
                record.insert("addresses".to_string(), Document::Object(addresses.clone()));
            }
            record.insert("power_ports".to_string(), Document::Array(power_ports));
        }
        Ok(devices)
    }

    fn fqdn(&self, name: &str) -> String {
        match &self.suffix {
            Some(suffix) if !name.ends_with(suffix.as_str()) => format!("{name}{suffix}"),
            _ => name.to_string(),
        }
    }
}
