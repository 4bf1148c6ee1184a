use std::sync::Arc;
use std::time;

use lead_common::record::UserLocation;
use once_cell::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::LocationLookupError;

/// Client for the public IP-geolocation endpoint queried once per page load.
#[derive(Clone)]
pub struct LocationClient {
    url: String,
    client: reqwest::Client,
    timeout: time::Duration,
}

impl LocationClient {
    pub fn new(url: &str, timeout: time::Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            url: url.to_owned(),
            client,
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(&config.location_url, config.location_timeout.0)
    }

    pub async fn lookup(&self) -> Result<UserLocation, LocationLookupError> {
        let request = async {
            self.client
                .get(&self.url)
                .send()
                .await?
                .error_for_status()?
                .json::<UserLocation>()
                .await
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(LocationLookupError::Timeout(self.timeout)),
        }
    }
}

/// Write-once slot holding the visitor location for the rest of the page session.
///
/// Readers never wait on it: until the lookup lands, or if it never does, `get` returns `None`
/// and record assembly falls back to the defaults.
#[derive(Clone, Default)]
pub struct LocationSlot(Arc<OnceCell<UserLocation>>);

impl LocationSlot {
    pub fn get(&self) -> Option<&UserLocation> {
        self.0.get()
    }

    /// Store the location. Only the first call has any effect.
    pub fn set(&self, location: UserLocation) -> bool {
        self.0.set(location).is_ok()
    }

    /// Run the lookup in the background. Failures are logged and otherwise swallowed.
    pub fn spawn_lookup(&self, client: LocationClient) -> JoinHandle<()> {
        let slot = self.clone();

        tokio::spawn(async move {
            match client.lookup().await {
                Ok(location) => {
                    info!(
                        city = location.city.as_deref().unwrap_or_default(),
                        country = location.country.as_deref().unwrap_or_default(),
                        "visitor location detected"
                    );
                    slot.set(location);
                }
                Err(error) => {
                    metrics::counter!("lead_location_lookups_failed").increment(1);
                    warn!("could not detect visitor location: {}", error);
                }
            }
        })
    }
}
