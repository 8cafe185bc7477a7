//! Best-effort webhook notification.
//!
//! Posts a JSON summary (hostname, serial, script name, status, arbitrary
//! extra metadata) to a caller-supplied URL. Delivery is a side channel:
//! failures are logged and swallowed, never propagated, and nothing is
//! retried.

use crate::error::Result;
use crate::logger::MdmLogger;
use crate::platform::Platform;
use crate::system_info::SystemInfo;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// The POSTed body. `extra` flattens into the top level, so the wire shape
/// is exactly `{hostname, serial, script_name, status, ...extra}`.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub hostname: String,
    pub serial: Option<String>,
    pub script_name: String,
    pub status: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub struct WebhookSender {
    url: String,
    script_name: String,
    system: SystemInfo,
    client: reqwest::blocking::Client,
    logger: Option<Arc<MdmLogger>>,
}

impl WebhookSender {
    pub fn new(url: impl Into<String>, script_name: impl Into<String>, platform: Platform) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()?;
        Ok(Self {
            url: url.into(),
            script_name: script_name.into(),
            system: SystemInfo::new(platform),
            client,
            logger: None,
        })
    }

    /// Report delivery failures through this logger instead of tracing.
    pub fn with_logger(mut self, logger: Arc<MdmLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Construct the payload that [`WebhookSender::send`] would post.
    /// Hostname and serial are looked up fresh per call.
    pub fn build_payload(
        &self,
        status: &str,
        extra: serde_json::Map<String, serde_json::Value>,
    ) -> WebhookPayload {
        WebhookPayload {
            hostname: self.system.hostname(),
            serial: self.system.serial_number(),
            script_name: self.script_name.clone(),
            status: status.to_string(),
            extra,
        }
    }

    /// POST the payload. Network failure or a non-2xx response is logged and
    /// swallowed; the deployment script's outcome never depends on webhook
    /// delivery.
    pub fn send(&self, status: &str, extra: serde_json::Map<String, serde_json::Value>) {
        let payload = self.build_payload(status, extra);
        match self.client.post(&self.url).json(&payload).send() {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                self.report_failure(&format!(
                    "Webhook returned {} for {}",
                    response.status(),
                    self.url
                ));
            }
            Err(err) => {
                self.report_failure(&format!("Webhook delivery to {} failed: {err}", self.url));
            }
        }
    }

    fn report_failure(&self, message: &str) {
        match &self.logger {
            Some(logger) => logger.error(message),
            None => warn!("{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn sender() -> WebhookSender {
        WebhookSender::new(
            "http://127.0.0.1:9/hook",
            "install-fonts",
            Platform::Linux,
        )
        .unwrap()
    }

    #[test]
    fn payload_key_set_is_exact() {
        let mut extra = serde_json::Map::new();
        extra.insert("policy".to_string(), serde_json::json!("fonts"));
        extra.insert("attempt".to_string(), serde_json::json!(2));

        let payload = sender().build_payload("success", extra);
        let value = serde_json::to_value(&payload).unwrap();
        let keys: BTreeSet<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            BTreeSet::from(["hostname", "serial", "script_name", "status", "attempt", "policy"])
        );
        assert_eq!(value["status"], "success");
        assert_eq!(value["script_name"], "install-fonts");
        assert_eq!(value["attempt"], 2);
    }

    #[test]
    fn payload_without_extras_keeps_core_keys() {
        let payload = sender().build_payload("failure", serde_json::Map::new());
        let value = serde_json::to_value(&payload).unwrap();
        let keys: BTreeSet<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            BTreeSet::from(["hostname", "serial", "script_name", "status"])
        );
    }

    #[test]
    fn delivery_failure_is_swallowed() {
        // Port 9 (discard) is not listening; send must neither panic nor
        // surface an error.
        sender().send("success", serde_json::Map::new());
    }
}
