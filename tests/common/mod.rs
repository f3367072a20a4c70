#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use logtrain::graphql::queries::{Environment, Project};
use logtrain::graphql::{ApiError, PlatformApi};
use logtrain::subscription::protocol::{SubscribeMessage, CONNECTION_ACK};
use logtrain::subscription::{Connector, Transport, TransportError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted reaction of a fake transport's `recv`.
#[derive(Debug, Clone)]
pub enum Step {
    Frame(Vec<u8>),
    Fail(&'static str),
    Panic,
    /// Never returns; used to park the reader until cancelled.
    Hang,
}

pub fn ack() -> Step {
    Step::Frame(CONNECTION_ACK.to_vec())
}

pub fn text(s: &str) -> Step {
    Step::Frame(s.as_bytes().to_vec())
}

pub fn next_frame(logs: Vec<serde_json::Value>) -> Step {
    let envelope = serde_json::json!({
        "id": "op",
        "type": "next",
        "payload": {"data": {"environmentLogs": logs}}
    });
    Step::Frame(envelope.to_string().into_bytes())
}

pub fn log_json(message: &str, level: &str, ts: DateTime<Utc>, instance: &str, service: &str) -> serde_json::Value {
    serde_json::json!({
        "message": message,
        "severity": level,
        "timestamp": ts.to_rfc3339_opts(SecondsFormat::Nanos, true),
        "attributes": [{"key": "level", "value": level}, {"key": "src", "value": "app"}],
        "tags": {
            "projectId": "p1",
            "environmentId": "e1",
            "serviceId": service,
            "deploymentId": "d1",
            "deploymentInstanceId": instance,
            "pluginId": null,
            "snapshotId": null
        }
    })
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub sent: Mutex<Vec<String>>,
    pub closes: AtomicUsize,
    pub connects: AtomicUsize,
}

impl Recorder {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Subscribe envelopes sent so far, in order.
    pub fn subscribes(&self) -> Vec<SubscribeMessage> {
        self.sent()
            .iter()
            .filter_map(|s| serde_json::from_str::<SubscribeMessage>(s).ok())
            .collect()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// How a fake transport's `close` behaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CloseBehavior {
    #[default]
    Clean,
    Panic,
    Hang,
}

pub struct ScriptedTransport {
    steps: VecDeque<Step>,
    recorder: Arc<Recorder>,
    on_close: CloseBehavior,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>, recorder: Arc<Recorder>) -> Self {
        Self {
            steps: steps.into(),
            recorder,
            on_close: CloseBehavior::Clean,
        }
    }

    pub fn on_close(mut self, behavior: CloseBehavior) -> Self {
        self.on_close = behavior;
        self
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.recorder.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        match self.steps.pop_front() {
            Some(Step::Frame(bytes)) => Ok(bytes),
            Some(Step::Fail(reason)) => Err(TransportError::Closed(Some(reason.to_string()))),
            Some(Step::Panic) => panic!("read from abruptly closed connection"),
            Some(Step::Hang) => std::future::pending().await,
            None => Err(TransportError::Closed(None)),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.recorder.closes.fetch_add(1, Ordering::SeqCst);
        match self.on_close {
            CloseBehavior::Clean => Ok(()),
            CloseBehavior::Panic => panic!("close on broken connection"),
            CloseBehavior::Hang => std::future::pending().await,
        }
    }
}

/// Hands out one scripted transport per connect, then fails.
pub struct ScriptedConnector {
    scripts: Mutex<VecDeque<Vec<Step>>>,
    pub recorder: Arc<Recorder>,
    on_close: CloseBehavior,
}

impl ScriptedConnector {
    pub fn new(scripts: Vec<Vec<Step>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            recorder: Arc::new(Recorder::default()),
            on_close: CloseBehavior::Clean,
        }
    }

    pub fn panicking_on_close(self) -> Self {
        self.closing_with(CloseBehavior::Panic)
    }

    pub fn hanging_on_close(self) -> Self {
        self.closing_with(CloseBehavior::Hang)
    }

    fn closing_with(mut self, behavior: CloseBehavior) -> Self {
        self.on_close = behavior;
        self
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>, TransportError> {
        self.recorder.connects.fetch_add(1, Ordering::SeqCst);

        let script = self.scripts.lock().unwrap().pop_front();
        match script {
            Some(steps) => {
                let transport = ScriptedTransport::new(steps, Arc::clone(&self.recorder))
                    .on_close(self.on_close);
                Ok(Box::new(transport))
            }
            None => Err(TransportError::Request("connection refused".to_string())),
        }
    }
}

pub fn project() -> Project {
    serde_json::from_value(serde_json::json!({
        "id": "p1",
        "name": "shop",
        "environments": {"edges": [
            {"node": {"id": "e1", "name": "production"}},
            {"node": {"id": "e2", "name": "staging"}}
        ]},
        "services": {"edges": [
            {"node": {"id": "s1", "name": "api", "serviceInstances": {"edges": [
                {"node": {"environmentId": "e1"}}
            ]}}},
            {"node": {"id": "s2", "name": "worker", "serviceInstances": {"edges": [
                {"node": {"environmentId": "e2"}}
            ]}}},
            {"node": {"id": "s4", "name": "web", "serviceInstances": {"edges": [
                {"node": {"environmentId": "e2"}},
                {"node": {"environmentId": "e1"}}
            ]}}}
        ]}
    }))
    .unwrap()
}

/// Connector whose dial never completes.
pub struct StalledConnector;

#[async_trait]
impl Connector for StalledConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>, TransportError> {
        std::future::pending().await
    }
}

/// In-memory platform API.
#[derive(Debug, Default)]
pub struct FakeApi {
    pub project: Option<Project>,
    pub environment_calls: AtomicUsize,
    pub project_calls: AtomicUsize,
}

impl FakeApi {
    pub fn with_project(project: Project) -> Self {
        Self {
            project: Some(project),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlatformApi for FakeApi {
    async fn environment(&self, id: &str) -> Result<Environment, ApiError> {
        self.environment_calls.fetch_add(1, Ordering::SeqCst);
        match &self.project {
            Some(project) => Ok(Environment {
                id: id.to_string(),
                name: "production".to_string(),
                project_id: project.id.clone(),
            }),
            None => Err(ApiError::GraphQl(vec!["Not Authorized".to_string()])),
        }
    }

    async fn project(&self, id: &str) -> Result<Project, ApiError> {
        self.project_calls.fetch_add(1, Ordering::SeqCst);
        match &self.project {
            Some(project) if project.id == id => Ok(project.clone()),
            Some(_) => Err(ApiError::GraphQl(vec![format!("Project {id} not found")])),
            None => Err(ApiError::GraphQl(vec!["Not Authorized".to_string()])),
        }
    }
}
