//! Wire protocol between the client and the worker.
//!
//! Messages travel as JSON envelopes of the form
//! `{"action": <name>, "payload": <action-specific>}`. The action set is a
//! closed enum: dispatch on either side is an exhaustive match, and envelopes
//! whose action is not recognized fail decoding at the channel boundary where
//! they are logged and ignored, keeping the protocol forward-compatible.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::ConfigRecord;

/// Snapshot pushed from client to worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveConfigsPayload {
    /// Every configuration the client has seen, keyed by version.
    pub configs: BTreeMap<String, ConfigRecord>,

    /// The record the client currently treats as authoritative.
    #[serde(default)]
    pub current_config: Option<ConfigRecord>,

    /// Reassign the worker's current version even if it already has one.
    #[serde(default)]
    pub force_current_config: bool,
}

/// The worker's merged view, returned on a pull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigsPayload {
    pub configs: BTreeMap<String, ConfigRecord>,
    #[serde(default)]
    pub current_config: Option<ConfigRecord>,
}

/// Cache-presence query for a list of logical asset names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessQuery {
    pub required_assets: Vec<String>,
}

/// Cache-presence report, one entry per queried logical name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessPayload {
    pub readiness_report: BTreeMap<String, bool>,
}

/// Every message either party can send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload")]
pub enum Message {
    /// Client pushes its configuration snapshot for the worker to merge.
    #[serde(rename = "saveConfigsInServiceWorker")]
    SaveConfigs(SaveConfigsPayload),

    /// Client asks for the worker's merged configuration view.
    #[serde(rename = "askConfigsFromServiceWorker")]
    AskConfigs,

    /// Worker answers a pull with its configs and current version.
    #[serde(rename = "respondConfigsFromServiceWorker")]
    RespondConfigs(ConfigsPayload),

    /// Client asks which required assets are already cached.
    #[serde(rename = "askOfflineReadinessFromServiceWorker")]
    AskReadiness(ReadinessQuery),

    /// Worker answers a readiness query.
    #[serde(rename = "respondOfflineReadinessFromServiceWorker")]
    RespondReadiness(ReadinessPayload),
}

impl Message {
    /// Encode for transport.
    pub fn encode(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Decode an envelope received from the channel.
    pub fn decode(body: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(body.clone())
    }

    /// The action string of a raw envelope, for logging unrecognized ones.
    pub fn action_of(body: &Value) -> &str {
        body.get("action").and_then(Value::as_str).unwrap_or("<missing>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AssetManifest;

    fn record(version: &str) -> ConfigRecord {
        ConfigRecord {
            app_version: version.to_string(),
            loader_version: "1.0.2".to_string(),
            assets: AssetManifest::default(),
        }
    }

    #[test]
    fn test_save_configs_wire_shape() {
        let mut configs = BTreeMap::new();
        configs.insert("1.0.0".to_string(), record("1.0.0"));
        let message = Message::SaveConfigs(SaveConfigsPayload {
            configs,
            current_config: Some(record("1.0.0")),
            force_current_config: false,
        });

        let body = message.encode();
        assert_eq!(body["action"], "saveConfigsInServiceWorker");
        assert_eq!(body["payload"]["configs"]["1.0.0"]["app_version"], "1.0.0");
        assert_eq!(body["payload"]["currentConfig"]["loader_version"], "1.0.2");
        assert_eq!(body["payload"]["forceCurrentConfig"], false);
    }

    #[test]
    fn test_ask_configs_has_no_payload() {
        let body = Message::AskConfigs.encode();
        assert_eq!(body["action"], "askConfigsFromServiceWorker");
        assert!(body.get("payload").is_none());
    }

    #[test]
    fn test_readiness_round_trip() {
        let mut report = BTreeMap::new();
        report.insert("app.js".to_string(), true);
        report.insert("app.css".to_string(), false);
        let message = Message::RespondReadiness(ReadinessPayload { readiness_report: report });

        let body = message.encode();
        assert_eq!(body["action"], "respondOfflineReadinessFromServiceWorker");
        assert_eq!(body["payload"]["readinessReport"]["app.js"], true);

        let decoded = Message::decode(&body).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_unknown_action_fails_decode() {
        let body = serde_json::json!({"action": "purgeEverything", "payload": {}});
        assert!(Message::decode(&body).is_err());
        assert_eq!(Message::action_of(&body), "purgeEverything");
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let body = serde_json::json!({
            "action": "saveConfigsInServiceWorker",
            "payload": {"configs": {}}
        });
        let decoded = Message::decode(&body).unwrap();
        match decoded {
            Message::SaveConfigs(payload) => {
                assert!(payload.configs.is_empty());
                assert!(payload.current_config.is_none());
                assert!(!payload.force_current_config);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
