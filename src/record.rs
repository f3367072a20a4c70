use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Name used for tag IDs that are missing from the name table.
pub const UNDEFINED_NAME: &str = "undefined";

/// A single log line observed on the platform's environment log stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub severity: String,

    pub timestamp: DateTime<Utc>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Vec<Attribute>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub value: String,
}

/// Identifiers attached to a record by the platform, plus the display names
/// filled in during enrichment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tags {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub project_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub environment_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub plugin_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub deployment_id: String,
    /// Empty for container-level records that have no running instance.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub deployment_instance_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub snapshot_id: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub project_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub environment_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_name: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
