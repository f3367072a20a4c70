//! Messages of the `graphql-transport-ws` protocol as used by the
//! environment log subscription.

use crate::graphql::queries::STREAM_ENVIRONMENT_LOGS_SUBSCRIPTION;
use crate::record::LogRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SUBPROTOCOL: &str = "graphql-transport-ws";

pub const CONNECTION_INIT: &str = r#"{"type":"connection_init"}"#;

/// The only acceptable reply to [`CONNECTION_INIT`], compared byte for byte.
pub const CONNECTION_ACK: &[u8] = br#"{"type":"connection_ack"}"#;

pub const TYPE_SUBSCRIBE: &str = "subscribe";
pub const TYPE_NEXT: &str = "next";

/// Backlog replay requested on every (re)subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeWindow {
    /// Exclusive lower bound of replayed records.
    pub from: DateTime<Utc>,
    /// Maximum number of replayed records.
    pub limit: u32,
}

/// Everything needed to build one subscribe envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeRequest {
    pub environment_id: String,
    pub service_ids: Vec<String>,
    pub resume: ResumeWindow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: SubscribePayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribePayload {
    pub query: String,
    pub variables: SubscribeVariables,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeVariables {
    pub environment_id: String,
    pub filter: String,
    pub before_date: String,
    pub before_limit: u32,
}

impl SubscribeRequest {
    pub fn new(
        environment_id: impl Into<String>,
        service_ids: Vec<String>,
        resume: ResumeWindow,
    ) -> Self {
        Self {
            environment_id: environment_id.into(),
            service_ids,
            resume,
        }
    }

    /// Build the subscribe envelope with a fresh operation ID.
    pub fn to_message(&self) -> SubscribeMessage {
        SubscribeMessage {
            id: Uuid::new_v4().to_string(),
            kind: TYPE_SUBSCRIBE.to_string(),
            payload: SubscribePayload {
                query: STREAM_ENVIRONMENT_LOGS_SUBSCRIPTION.to_string(),
                variables: SubscribeVariables {
                    environment_id: self.environment_id.clone(),
                    filter: build_service_filter(&self.service_ids),
                    before_date: self
                        .resume
                        .from
                        .to_rfc3339_opts(SecondsFormat::Nanos, true),
                    before_limit: self.resume.limit,
                },
            },
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_message())
    }
}

/// Server-side filter selecting the given services:
/// `@service:<id> OR @service:<id> ...`.
pub fn build_service_filter(service_ids: &[String]) -> String {
    service_ids
        .iter()
        .map(|id| format!("@service:{id}"))
        .collect::<Vec<_>>()
        .join(" OR ")
}

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct NextPayload {
    data: LogsData,
}

#[derive(Debug, Deserialize)]
struct LogsData {
    #[serde(rename = "environmentLogs")]
    environment_logs: Vec<LogRecord>,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A `next` envelope and its batch.
    Logs(Vec<LogRecord>),
    /// Any other envelope type (`complete`, `error`, `ping`, ...).
    Other(String),
}

/// Decode an inbound frame. Only `next` payloads are decoded further; a
/// `next` payload that doesn't match the log batch shape is an error.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, serde_json::Error> {
    let envelope: Envelope = serde_json::from_slice(bytes)?;

    if envelope.kind != TYPE_NEXT {
        return Ok(Frame::Other(envelope.kind));
    }

    let payload = envelope.payload.unwrap_or(serde_json::Value::Null);
    let next: NextPayload = serde_json::from_value(payload)?;

    Ok(Frame::Logs(next.data.environment_logs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> ResumeWindow {
        ResumeWindow {
            from: "2024-05-01T12:00:00.5Z".parse().unwrap(),
            limit: 500,
        }
    }

    #[test]
    fn test_service_filter() {
        assert_eq!(build_service_filter(&[]), "");
        assert_eq!(build_service_filter(&["a".to_string()]), "@service:a");
        assert_eq!(
            build_service_filter(&["a".to_string(), "b".to_string(), "c".to_string()]),
            "@service:a OR @service:b OR @service:c"
        );
    }

    #[test]
    fn test_subscribe_message_shape() {
        let request = SubscribeRequest::new("e1", vec!["s1".to_string(), "s2".to_string()], window());
        let value: serde_json::Value = serde_json::from_str(&request.encode().unwrap()).unwrap();

        assert_eq!(value["type"], "subscribe");
        assert!(Uuid::parse_str(value["id"].as_str().unwrap()).is_ok());

        let variables = &value["payload"]["variables"];
        assert_eq!(variables["environmentId"], "e1");
        assert_eq!(variables["filter"], "@service:s1 OR @service:s2");
        assert_eq!(variables["beforeDate"], "2024-05-01T12:00:00.500000000Z");
        assert_eq!(variables["beforeLimit"], 500);
        assert!(value["payload"]["query"]
            .as_str()
            .unwrap()
            .contains("environmentLogs"));
    }

    #[test]
    fn test_each_message_gets_fresh_id() {
        let request = SubscribeRequest::new("e1", vec![], window());
        assert_ne!(request.to_message().id, request.to_message().id);
    }

    #[test]
    fn test_decode_next_frame() {
        let frame = br#"{"id":"1","type":"next","payload":{"data":{"environmentLogs":[
            {"message":"hi","severity":"info","timestamp":"2024-05-01T12:00:01Z",
             "attributes":[{"key":"level","value":"info"}],
             "tags":{"serviceId":"s1","deploymentInstanceId":"i1"}}
        ]}}}"#;

        match decode_frame(frame).unwrap() {
            Frame::Logs(logs) => {
                assert_eq!(logs.len(), 1);
                assert_eq!(logs[0].message, "hi");
                assert_eq!(logs[0].tags.service_id, "s1");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_decode_non_next_frame() {
        assert_eq!(
            decode_frame(br#"{"id":"1","type":"complete"}"#).unwrap(),
            Frame::Other("complete".to_string())
        );
        assert_eq!(
            decode_frame(br#"{"type":"ping"}"#).unwrap(),
            Frame::Other("ping".to_string())
        );
    }

    #[test]
    fn test_malformed_next_payload_is_error() {
        assert!(decode_frame(br#"{"id":"1","type":"next","payload":{"data":null}}"#).is_err());
        assert!(decode_frame(br#"{"id":"1","type":"next"}"#).is_err());
        assert!(decode_frame(b"not json").is_err());
    }
}
