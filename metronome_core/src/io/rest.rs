//! Blocking transport used to talk to the upstream REST services
use std::time::Duration;

use log::debug;
use thiserror::Error;

/// Anything that can fetch the text body behind a url
///
/// Every source plugin receives its client as an `Rc<dyn RestClient>`, so tests can
/// substitute an in-memory implementation.
pub trait RestClient {
    fn get_text(&self, url: &str) -> Result<String, RestError>;
}

/// [`RestClient`] backed by a blocking reqwest client
pub struct BlockingClient {
    client: reqwest::blocking::Client,
}

impl BlockingClient {
    pub fn new() -> Result<Self, RestError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(BlockingClient { client })
    }
}

impl RestClient for BlockingClient {
    fn get_text(&self, url: &str) -> Result<String, RestError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(RestError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text()?)
    }
}

#[derive(Debug, Error)]
pub enum RestError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("No response registered for {0}")]
    NotFound(String),
}
