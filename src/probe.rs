use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::error::RebuildResult;

/// Classifies an HTTP endpoint as serving or not.
pub trait HttpProbe {
    /// `true` when a GET on `url` answers with a success status.
    fn is_reachable(&self, url: &str) -> bool;
}

/// [`HttpProbe`] backed by a blocking `reqwest` client.
///
/// Redirects are followed, so a login redirect on `/` still counts
/// as serving.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    const TIMEOUT: Duration = Duration::from_secs(3);

    /// Build the client. System proxy settings are ignored: the
    /// client only ever targets the local host.
    pub fn new() -> RebuildResult<Self> {
        let client = Client::builder()
            .timeout(Self::TIMEOUT)
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }
}

impl HttpProbe for HttpClient {
    fn is_reachable(&self, url: &str) -> bool {
        match self.client.get(url).send() {
            Ok(response) => {
                debug!(%url, status = %response.status(), "probe answered");
                response.status().is_success()
            }
            Err(err) => {
                debug!(%url, %err, "probe failed");
                false
            }
        }
    }
}
