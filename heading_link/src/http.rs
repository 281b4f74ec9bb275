use std::time::Duration;

use heading_traits::{BoxError, RobotLink};
use reqwest::blocking::Client;
use url::Url;

use crate::error::{LinkError, Result};

/// HTTP transport to the robot's command receiver.
///
/// One request per command, no retries. The HTTP status is ignored; any
/// non-empty UTF-8 body counts as an acknowledgement.
#[derive(Debug, Clone)]
pub struct HttpLink {
    client: Client,
    base: Url,
}

impl HttpLink {
    /// `timeout` of `None` keeps the client's default.
    pub fn new(base_address: &str, timeout: Option<Duration>) -> Result<Self> {
        let base = normalize_base(base_address)?;
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| LinkError::Transport(format!("building http client: {e}")))?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Full request URL for one command.
    pub fn command_url(&self, command: &str, left_speed: u8, right_speed: u8) -> Result<Url> {
        if command.is_empty() || !command.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(LinkError::InvalidTarget(format!(
                "command {command:?} is not a plain path segment"
            )));
        }
        let mut url = self
            .base
            .join(command)
            .map_err(|e| LinkError::InvalidTarget(format!("{}{command}: {e}", self.base)))?;
        url.query_pairs_mut()
            .append_pair("leftSpeed", &left_speed.to_string())
            .append_pair("rightSpeed", &right_speed.to_string());
        Ok(url)
    }

    fn get(&self, url: Url) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| LinkError::Transport(e.to_string()))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .map_err(|e| LinkError::Transport(format!("reading body: {e}")))?;
        let body = String::from_utf8(bytes.to_vec())
            .map_err(|_| LinkError::BadResponse("body is not UTF-8 text".into()))?;
        if body.is_empty() {
            return Err(LinkError::BadResponse(format!("empty body (status {status})")));
        }
        Ok(body)
    }
}

impl RobotLink for HttpLink {
    fn send(&mut self, command: &str, left_speed: u8, right_speed: u8) -> std::result::Result<String, BoxError> {
        let url = self.command_url(command, left_speed, right_speed)?;
        tracing::debug!(%url, "robot request");
        let body = self.get(url)?;
        tracing::debug!(command, reply = %body, "robot reply");
        Ok(body)
    }
}

fn normalize_base(s: &str) -> Result<Url> {
    let mut url = Url::parse(s.trim())
        .map_err(|e| LinkError::InvalidTarget(format!("{s:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none_or(str::is_empty) {
        return Err(LinkError::InvalidTarget(format!("{s:?} is not an http(s) address")));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
