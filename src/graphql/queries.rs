use serde::{Deserialize, Serialize};

pub const ENVIRONMENT_QUERY: &str = r#"query environment($id: String!) {
  environment(id: $id) {
    id
    name
    projectId
  }
}"#;

pub const PROJECT_QUERY: &str = r#"query project($id: String!) {
  project(id: $id) {
    id
    name
    environments {
      edges {
        node {
          id
          name
        }
      }
    }
    services {
      edges {
        node {
          id
          name
          serviceInstances {
            edges {
              node {
                environmentId
              }
            }
          }
        }
      }
    }
  }
}"#;

pub const STREAM_ENVIRONMENT_LOGS_SUBSCRIPTION: &str = r#"subscription streamEnvironmentLogs($environmentId: String!, $filter: String, $beforeLimit: Int!, $beforeDate: String) {
  environmentLogs(environmentId: $environmentId, filter: $filter, beforeDate: $beforeDate, beforeLimit: $beforeLimit) {
    message
    severity
    timestamp
    attributes {
      key
      value
    }
    tags {
      projectId
      environmentId
      pluginId
      serviceId
      deploymentId
      deploymentInstanceId
      snapshotId
    }
  }
}"#;

/// Relay-style connection wrapper used by every list field in the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

impl<T> Connection<T> {
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|e| &e.node)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentData {
    pub environment: Environment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub project_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectData {
    pub project: Project,
}

/// A project with its environments and services, as returned by
/// [`PROJECT_QUERY`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub environments: Connection<EnvironmentNode>,
    #[serde(default)]
    pub services: Connection<ServiceNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentNode {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub service_instances: Connection<ServiceInstanceNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInstanceNode {
    pub environment_id: String,
}
