use super::ResolutionError;
use crate::graphql::{PlatformApi, Project};
use tracing::info;

/// IDs of services with at least one instance in `environment_id`, in the
/// order the API returned them.
pub fn services_in_environment(project: &Project, environment_id: &str) -> Vec<String> {
    project
        .services
        .nodes()
        .filter(|service| {
            service
                .service_instances
                .nodes()
                .any(|instance| instance.environment_id == environment_id)
        })
        .map(|service| service.id.clone())
        .collect()
}

/// Discover which services of a project run in the given environment.
pub async fn discover(
    api: &dyn PlatformApi,
    project_id: &str,
    environment_id: &str,
) -> Result<Vec<String>, ResolutionError> {
    let project = api
        .project(project_id)
        .await
        .map_err(|source| ResolutionError::Project {
            id: project_id.to_string(),
            source,
        })?;

    let services = services_in_environment(&project, environment_id);

    info!(
        project_id = %project_id,
        environment_id = %environment_id,
        count = services.len(),
        services = ?services,
        "Auto-discovered services"
    );

    Ok(services)
}
