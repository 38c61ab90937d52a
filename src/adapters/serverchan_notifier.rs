//! ServerChan (Server酱) WeChat push.
//!
//! `POST https://sctapi.ftqq.com/{key}.send` with form fields `title` and
//! `desp`. The service answers `{"code": 0, ...}` on success; any other code
//! is reported as a platform error.

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::info;

use crate::domain::error::NotifyError;
use crate::ports::notify_port::Notifier;

pub const KEY_ENV: &str = "SERVERCHAN_KEY";
const BASE_URL: &str = "https://sctapi.ftqq.com";

#[derive(Debug, Deserialize)]
struct SendResponse {
    code: i64,
    #[serde(default)]
    message: String,
}

pub struct ServerChanNotifier {
    client: Client,
    key: String,
}

impl ServerChanNotifier {
    pub fn new(client: Client, key: String) -> Self {
        Self { client, key }
    }

    /// Use the configured key, or `SERVERCHAN_KEY` from the environment.
    pub fn from_key(client: Client, configured: Option<String>) -> Result<Self, NotifyError> {
        let key = configured
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| {
                NotifyError::Config(format!(
                    "no [notify] serverchan_key configured and {} is unset",
                    KEY_ENV
                ))
            })?;
        Ok(Self::new(client, key.trim().to_string()))
    }

    pub fn send_url(&self) -> String {
        format!("{}/{}.send", BASE_URL, self.key)
    }
}

/// Accepts both a `{code: 0}` JSON reply and a plain non-JSON 2xx body.
fn check_reply(body: &str) -> Result<(), NotifyError> {
    match serde_json::from_str::<SendResponse>(body) {
        Ok(reply) if reply.code == 0 => Ok(()),
        Ok(reply) => Err(NotifyError::Platform(format!(
            "code {}: {}",
            reply.code, reply.message
        ))),
        Err(_) => Ok(()),
    }
}

impl Notifier for ServerChanNotifier {
    fn notify(&self, subject: &str, content: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.send_url())
            .form(&[("title", subject), ("desp", content)])
            .send()
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| NotifyError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(NotifyError::Platform(format!("HTTP {}: {}", status, body)));
        }
        check_reply(&body)?;
        info!(subject, "serverchan push sent");
        Ok(())
    }
}
