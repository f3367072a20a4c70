pub mod discovery;
pub mod names;

use crate::graphql::ApiError;
use thiserror::Error;

pub use discovery::{discover, services_in_environment};
pub use names::{resolve, NameTable};

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("failed to fetch environment {id}: {source}")]
    Environment {
        id: String,
        #[source]
        source: ApiError,
    },

    #[error("failed to fetch project {id}: {source}")]
    Project {
        id: String,
        #[source]
        source: ApiError,
    },

    #[error("service discovery requires a project ID")]
    MissingProject,
}
