//! Scoped HTTP session owned by a live source.

use std::time::Duration;

use prospector_shared::{AcquisitionConfig, ProspectorError, Result};
use reqwest::Client;
use tracing::{debug, info};

/// Lazily opened HTTP client. Opened on first use, released by [`close`].
///
/// [`close`]: AcquisitionSession::close
#[derive(Debug)]
pub struct AcquisitionSession {
    user_agent: String,
    timeout: Duration,
    client: Option<Client>,
}

impl AcquisitionSession {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout,
            client: None,
        }
    }

    pub fn from_config(config: &AcquisitionConfig) -> Self {
        Self::new(
            config.user_agent.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Get the client, opening the session if needed.
    pub fn client(&mut self) -> Result<&Client> {
        if self.client.is_none() {
            let client = Client::builder()
                .user_agent(self.user_agent.as_str())
                .redirect(reqwest::redirect::Policy::limited(5))
                .timeout(self.timeout)
                .build()
                .map_err(|e| {
                    ProspectorError::Network(format!("failed to build HTTP client: {e}"))
                })?;
            debug!("acquisition session opened");
            self.client = Some(client);
        }

        self.client
            .as_ref()
            .ok_or_else(|| ProspectorError::Network("acquisition session unavailable".into()))
    }

    pub fn is_open(&self) -> bool {
        self.client.is_some()
    }

    /// Release the session. Returns whether a session was open.
    pub fn close(&mut self) -> bool {
        let was_open = self.client.take().is_some();
        if was_open {
            info!("acquisition session closed");
        }
        was_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_lazily_and_closes_idempotently() {
        let mut session = AcquisitionSession::new("test-agent", Duration::from_secs(5));
        assert!(!session.is_open());
        assert!(!session.close());

        session.client().expect("open");
        assert!(session.is_open());

        assert!(session.close());
        assert!(!session.close());
        assert!(!session.is_open());
    }
}
