pub mod cli;
pub mod config;
pub mod graphql;
pub mod metadata;
pub mod pipeline;
pub mod record;
pub mod sink;
pub mod subscription;
pub mod target;
