use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::AppResult;

/// Best-effort copy of local state to a remote JSON store. Writes are detached;
/// failures are logged and dropped.
#[derive(Clone, Debug)]
pub struct Mirror {
    http_client: reqwest::Client,
    base_url: Option<String>,
}

impl Mirror {
    pub fn new(base_url: Option<String>) -> AppResult<Mirror> {
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Mirror { http_client, base_url })
    }

    pub fn disabled() -> Mirror {
        Mirror {
            http_client: reqwest::Client::new(),
            base_url: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }

    /// Fires one POST of `body` to `path`. The handle is only for callers that
    /// want to wait; dropping it leaves the write running.
    pub fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Option<JoinHandle<()>> {
        let base_url = self.base_url.as_ref()?;
        let url = format!("{base_url}{path}");

        let body = match serde_json::to_vec(body) {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(%url, "mirror write skipped, could not serialise: {err}");
                return None;
            }
        };

        let http_client = self.http_client.clone();
        Some(tokio::spawn(async move {
            let result = http_client
                .post(&url)
                .header(CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await
                .and_then(|response| response.error_for_status());

            match result {
                Ok(response) => tracing::debug!(%url, status = %response.status(), "mirror write done"),
                Err(err) => tracing::warn!(%url, "mirror write failed: {err}"),
            }
        }))
    }
}

/// Mirror writes are detached, so tests wait for the mock server to see them.
#[cfg(test)]
pub(crate) async fn wait_for_calls(mock: &httpmock::Mock<'_>, expected: usize) {
    for _ in 0..150 {
        if mock.calls_async().await >= expected {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    // any late duplicate would land now
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}
