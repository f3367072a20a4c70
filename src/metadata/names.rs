use super::ResolutionError;
use crate::graphql::{PlatformApi, Project};
use crate::record::UNDEFINED_NAME;
use crate::target::Target;
use std::collections::HashMap;
use tracing::{debug, info};

/// Immutable mapping from project, environment and service IDs to their
/// display names.
///
/// Built once at startup and shared read-only with the enrichment pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTable {
    names: HashMap<String, String>,
}

impl NameTable {
    /// Build the table from a project graph: every environment, every service
    /// and the project itself.
    pub fn from_project(project: &Project) -> Self {
        let mut names = HashMap::new();

        for environment in project.environments.nodes() {
            names.insert(environment.id.clone(), environment.name.clone());
        }

        for service in project.services.nodes() {
            names.insert(service.id.clone(), service.name.clone());
        }

        names.insert(project.id.clone(), project.name.clone());

        Self { names }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Like [`NameTable::get`] but falls back to `"undefined"`.
    pub fn name_or_undefined(&self, id: &str) -> &str {
        self.get(id).unwrap_or(UNDEFINED_NAME)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for NameTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// Resolve the owning project of `target` and build its name table.
///
/// Uses the explicit project ID when present, otherwise asks the API for the
/// environment's project first. Errors are returned, never retried.
pub async fn resolve(api: &dyn PlatformApi, target: &Target) -> Result<NameTable, ResolutionError> {
    let project_id = match &target.project_id {
        Some(id) => id.clone(),
        None => {
            let environment = api
                .environment(&target.environment_id)
                .await
                .map_err(|source| ResolutionError::Environment {
                    id: target.environment_id.clone(),
                    source,
                })?;
            debug!(
                environment_id = %target.environment_id,
                project_id = %environment.project_id,
                "Resolved owning project from environment"
            );
            environment.project_id
        }
    };

    let project = api
        .project(&project_id)
        .await
        .map_err(|source| ResolutionError::Project {
            id: project_id.clone(),
            source,
        })?;

    let table = NameTable::from_project(&project);
    info!(
        project_id = %project.id,
        project = %project.name,
        entries = table.len(),
        "Built name table"
    );

    Ok(table)
}
