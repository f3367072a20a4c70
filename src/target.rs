/// Which services to watch, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Environment whose log stream is subscribed to.
    pub environment_id: String,
    /// Owning project. When absent it is looked up from the environment.
    pub project_id: Option<String>,
    pub services: ServiceSelector,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceSelector {
    /// Operator-supplied service IDs, in the order given.
    Pinned(Vec<String>),
    /// Every service with an instance in the target environment, resolved
    /// once at startup. Services added later are not picked up until restart.
    Discover,
}

impl Target {
    pub fn pinned(environment_id: impl Into<String>, services: Vec<String>) -> Self {
        Self {
            environment_id: environment_id.into(),
            project_id: None,
            services: ServiceSelector::Pinned(services),
        }
    }

    pub fn discover(project_id: impl Into<String>, environment_id: impl Into<String>) -> Self {
        Self {
            environment_id: environment_id.into(),
            project_id: Some(project_id.into()),
            services: ServiceSelector::Discover,
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }
}
