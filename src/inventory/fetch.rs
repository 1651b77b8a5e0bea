//! HTTP access to the data service.
use std::time::Duration;

use crate::document::Document;
use crate::error::InventoryError;

/// Retrieves a JSON document from an absolute URL.
#[cfg_attr(test, mockall::automock)]
pub trait Fetch: Send + Sync {
    /// Fetch and decode the document at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Request`] for transport failures and error
    /// statuses, [`InventoryError::Decode`] for bodies that are not JSON.
    fn get_json(&self, url: &str) -> Result<Document, InventoryError>;
}

/// [`Fetch`] over HTTPS with token authentication.
pub struct HttpFetch {
    agent: ureq::Agent,
    authorization: String,
}

impl HttpFetch {
    /// Request timeout applied to every call.
    pub const TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a fetcher that authenticates with `token`.
    #[must_use]
    pub fn new(token: &str) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Self::TIMEOUT))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            authorization: format!("Token {token}"),
        }
    }
}

impl std::fmt::Debug for HttpFetch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetch").finish_non_exhaustive()
    }
}

impl Fetch for HttpFetch {
    fn get_json(&self, url: &str) -> Result<Document, InventoryError> {
        let request_err = |e: ureq::Error| InventoryError::Request {
            url: url.to_string(),
            message: e.to_string(),
        };
        let mut response = self
            .agent
            .get(url)
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json")
            .call()
            .map_err(request_err)?;
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(request_err)?;
        serde_json::from_str(&body).map_err(|e| InventoryError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
