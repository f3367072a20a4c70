pub mod client;
pub mod queries;

pub use client::{ApiError, GraphQlClient, PlatformApi, DEFAULT_API_URL};
pub use queries::{Environment, Project};
