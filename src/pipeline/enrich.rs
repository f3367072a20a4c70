use super::filter::LogFilters;
use crate::metadata::NameTable;
use crate::record::{LogRecord, Tags};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Why a record was dropped by [`process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Empty message carrying only the level attribute.
    EmptyNoise,
    /// Container-level record without a deployment instance.
    NoInstance,
    /// Timestamp at or before the watermark.
    Stale,
    Level,
    Content,
}

/// Decide whether `record` is dropped, checking in order and stopping at the
/// first rule that matches.
pub fn drop_reason(
    record: &LogRecord,
    watermark: DateTime<Utc>,
    filters: &LogFilters,
) -> Option<DropReason> {
    // Empty lines always carry exactly one attribute: the level.
    if record.message.is_empty() && record.attributes.len() == 1 {
        return Some(DropReason::EmptyNoise);
    }

    if record.tags.deployment_instance_id.is_empty() {
        return Some(DropReason::NoInstance);
    }

    if record.timestamp <= watermark {
        return Some(DropReason::Stale);
    }

    if !filters.allows_level(&record.severity) {
        return Some(DropReason::Level);
    }

    if !filters.matches_content(&record.message) {
        return Some(DropReason::Content);
    }

    None
}

/// Run one inbound batch through the drop rules and name enrichment.
///
/// Returns the surviving records and the advanced watermark. Each survivor
/// moves the watermark to its own timestamp, so a later record in the same
/// batch with an earlier timestamp is treated as stale.
pub fn process(
    batch: Vec<LogRecord>,
    watermark: DateTime<Utc>,
    table: &NameTable,
    filters: &LogFilters,
) -> (Vec<LogRecord>, DateTime<Utc>) {
    let mut watermark = watermark;
    let mut surviving = Vec::with_capacity(batch.len());

    for mut record in batch {
        match drop_reason(&record, watermark, filters) {
            None => {}
            Some(DropReason::NoInstance) => {
                debug!("skipping container log message");
                continue;
            }
            Some(DropReason::Level) => {
                debug!(
                    level = %record.severity,
                    wanted = ?filters.levels(),
                    "skipping undesired global log level"
                );
                continue;
            }
            Some(DropReason::Content) => {
                debug!(
                    content = %record.message,
                    filter = %filters.content(),
                    "skipping undesired global log content"
                );
                continue;
            }
            Some(_) => continue,
        }

        watermark = record.timestamp;
        enrich(&mut record.tags, table);
        surviving.push(record);
    }

    (surviving, watermark)
}

fn enrich(tags: &mut Tags, table: &NameTable) {
    tags.service_name = lookup(table, &tags.service_id, "service");
    tags.environment_name = lookup(table, &tags.environment_id, "environment");
    tags.project_name = lookup(table, &tags.project_id, "project");
}

fn lookup(table: &NameTable, id: &str, kind: &'static str) -> String {
    if table.get(id).is_none() {
        warn!(kind, id = %id, "{} name could not be found", kind);
    }
    table.name_or_undefined(id).to_string()
}
