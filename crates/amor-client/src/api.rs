//! HTTP access to the preferences server.

use std::future::Future;
use std::time::Duration;

use amor_shared::constants::PREFERENCES_ROUTE;
use amor_shared::protocol::SaveResponse;
use amor_shared::{PartialPreferences, Preferences};
use reqwest::header::CACHE_CONTROL;
use tracing::debug;

use crate::error::ClientError;

/// Remote operations the controller relies on.
pub trait PreferencesApi: Send + Sync {
    /// Read the full document.
    fn fetch(&self) -> impl Future<Output = Result<Preferences, ClientError>> + Send;

    /// Merge-write `partial` and return the reconciled document.
    fn merge_write(
        &self,
        partial: &PartialPreferences,
    ) -> impl Future<Output = Result<Preferences, ClientError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpPreferencesApi {
    client: reqwest::Client,
    url: String,
}

impl HttpPreferencesApi {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}{}", server_url.trim_end_matches('/'), PREFERENCES_ROUTE),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PreferencesApi for HttpPreferencesApi {
    async fn fetch(&self) -> Result<Preferences, ClientError> {
        let resp = self
            .client
            .get(&self.url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let preferences = resp.json::<Preferences>().await?;
        debug!(url = %self.url, "Fetched preferences");
        Ok(preferences)
    }

    async fn merge_write(&self, partial: &PartialPreferences) -> Result<Preferences, ClientError> {
        let resp = self.client.post(&self.url).json(partial).send().await?;

        let status = resp.status();
        let text = resp.text().await?;

        let body = match serde_json::from_str::<SaveResponse>(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(ClientError::Rejected {
                    status: status.as_u16(),
                    message: text,
                })
            }
            Err(e) => return Err(ClientError::Decode(e)),
        };

        if !status.is_success() || !body.success {
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message: body.message,
            });
        }

        debug!(url = %self.url, "Saved preferences");
        body.preferences.ok_or(ClientError::MissingPreferences)
    }
}
