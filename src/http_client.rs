use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::error::{FetchError, Result, TransportError};

/// One blocking GET against the remote API, returning the raw body.
///
/// Implementations are shared by reference across pool workers, so they must
/// be `Sync`.
pub trait Transport: Sync {
    fn get(&self, path: &str) -> std::result::Result<String, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, path: &str) -> std::result::Result<String, TransportError> {
        (**self).get(path)
    }
}

/// `reqwest` transport. The inner `Client` pools connections and is safe to
/// use from every worker at once, so one instance serves a whole session.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let client = build_client(config.request_timeout)?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str) -> std::result::Result<String, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let resp = self
            .client
            .get(&url)
            .header(USER_AGENT, "Mozilla/5.0")
            .send()
            .map_err(map_reqwest_error)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        resp.text().map_err(map_reqwest_error)
    }
}

fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| FetchError::Client(err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    classify(
        err.is_timeout(),
        err.status().map(|status| status.as_u16()),
        &err.to_string(),
    )
}

fn classify(timed_out: bool, status: Option<u16>, message: &str) -> TransportError {
    match (timed_out, status) {
        (true, _) => TransportError::Timeout,
        (false, Some(code)) => TransportError::Status(code),
        (false, None) => TransportError::Io(message.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fpl_api::{fetch_league_snapshot, fetch_player_names};

    struct Failing(TransportError);

    impl Transport for Failing {
        fn get(&self, _path: &str) -> std::result::Result<String, TransportError> {
            Err(self.0.clone())
        }
    }

    #[test]
    fn timeout_wins_over_status() {
        assert_eq!(classify(true, Some(504), "slow"), TransportError::Timeout);
        assert_eq!(classify(false, Some(503), ""), TransportError::Status(503));
        assert_eq!(
            classify(false, None, "connection reset"),
            TransportError::Io("connection reset".to_string())
        );
    }

    #[test]
    fn timeout_maps_like_a_failed_status() {
        for err in [TransportError::Timeout, TransportError::Status(503)] {
            let got = fetch_player_names(&Failing(err.clone())).err();
            assert!(
                matches!(&got, Some(FetchError::RemoteUnavailable { source, .. }) if *source == err),
                "{got:?}"
            );

            let got = fetch_league_snapshot(&Failing(err.clone()), 1).err();
            assert!(
                matches!(&got, Some(FetchError::NotFound { source, .. }) if *source == err),
                "{got:?}"
            );
        }
    }
}
