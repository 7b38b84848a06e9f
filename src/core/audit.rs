//! Change tracking for persisted records.
//!
//! A write path snapshots the record before and after the change, [`diff`]s the two
//! snapshots under the record's [`LogOptions`] and hands any non-empty result to the
//! `activity_log` table through [`record_activity`]. The entry is written on the
//! caller's connection, so inside a transaction it commits or rolls back with the change.

use crate::{
    entities::{ActivityLog, activity_log},
    errors::{Error, Result},
};
use serde::Serialize;
use serde_json::{Map, Value};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Log channel used unless a record declares its own
pub const DEFAULT_LOG_NAME: &str = "default";

/// Attributes maintained by the persistence layer, never audited
const BOOKKEEPING_ATTRIBUTES: [&str; 3] = ["id", "created_at", "updated_at"];

/// Which attributes of a record are audited
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFields {
    /// Every persisted attribute except the bookkeeping columns.
    ///
    /// Not a literal "all fields": `id`, `created_at` and `updated_at` are left out,
    /// so a write that only bumps `updated_at` produces no dirty attributes.
    All,
    /// Only the named attributes
    Only(Vec<&'static str>),
}

/// Per-record audit policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    /// Log channel written to `activity_log.log_name`
    pub log_name: &'static str,
    /// Attributes eligible for logging
    pub log_only: LogFields,
    /// Log only attributes whose value changed
    pub log_only_dirty: bool,
    /// Write an entry even when no logged attribute changed
    pub submit_empty_logs: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            log_name: DEFAULT_LOG_NAME,
            log_only: LogFields::Only(Vec::new()),
            log_only_dirty: false,
            submit_empty_logs: true,
        }
    }
}

impl LogOptions {
    /// Audit every persisted attribute.
    #[must_use]
    pub fn log_all(mut self) -> Self {
        self.log_only = LogFields::All;
        self
    }

    /// Audit only the named attributes.
    #[must_use]
    pub fn log_only(mut self, attributes: &[&'static str]) -> Self {
        self.log_only = LogFields::Only(attributes.to_vec());
        self
    }

    /// Restrict entries to attributes that actually changed.
    #[must_use]
    pub const fn log_only_dirty(mut self) -> Self {
        self.log_only_dirty = true;
        self
    }

    /// Skip entries with no logged attributes.
    #[must_use]
    pub const fn dont_submit_empty_logs(mut self) -> Self {
        self.submit_empty_logs = false;
        self
    }

    fn is_logged(&self, attribute: &str) -> bool {
        match &self.log_only {
            LogFields::All => !BOOKKEEPING_ATTRIBUTES.iter().any(|name| *name == attribute),
            LogFields::Only(names) => names.iter().any(|name| *name == attribute),
        }
    }
}

/// The kind of write that produced an activity entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityEvent {
    /// Record inserted
    Created,
    /// Record modified
    Updated,
    /// Record removed
    Deleted,
}

impl ActivityEvent {
    /// Value stored in `activity_log.description`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

/// A record whose changes are written to the activity log.
pub trait Auditable: Serialize {
    /// Value stored in `activity_log.subject_type`
    const SUBJECT_TYPE: &'static str;

    /// Primary key of the record
    fn subject_id(&self) -> i64;

    /// Audit policy for this record type
    fn log_options() -> LogOptions;
}

/// Serializes a record into a flat attribute map.
pub fn snapshot<T: Serialize>(record: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(record)? {
        Value::Object(attributes) => Ok(attributes),
        other => Err(Error::Config {
            message: format!("Audited record must serialize to an object, got {other}"),
        }),
    }
}

/// Computes the `properties` of an activity entry from two snapshots.
///
/// `before` is `None` for inserts, `after` is `None` for deletes. Deletes log the
/// final attribute values. Updates log the new values under `attributes` and the
/// previous ones under `old`. Returns `None` when nothing is left to log and the
/// options suppress empty entries.
#[must_use]
pub fn diff(
    before: Option<&Map<String, Value>>,
    after: Option<&Map<String, Value>>,
    options: &LogOptions,
) -> Option<Value> {
    let mut attributes = Map::new();
    let mut old = Map::new();

    match (before, after) {
        (Some(before), Some(after)) => {
            for (key, new_value) in after.iter().filter(|(key, _)| options.is_logged(key)) {
                let old_value = before.get(key).cloned().unwrap_or(Value::Null);
                if options.log_only_dirty && old_value == *new_value {
                    continue;
                }
                attributes.insert(key.clone(), new_value.clone());
                old.insert(key.clone(), old_value);
            }
        }
        (None, Some(record)) | (Some(record), None) => {
            for (key, value) in record.iter().filter(|(key, _)| options.is_logged(key)) {
                attributes.insert(key.clone(), value.clone());
            }
        }
        (None, None) => {}
    }

    if attributes.is_empty() && !options.submit_empty_logs {
        return None;
    }

    let mut properties = Map::new();
    properties.insert("attributes".to_string(), Value::Object(attributes));
    if !old.is_empty() {
        properties.insert("old".to_string(), Value::Object(old));
    }
    Some(Value::Object(properties))
}

/// Diffs `before` and `after` and writes the result to the activity log.
///
/// Returns the inserted entry, or `None` when the diff was empty and suppressed.
pub async fn record_activity<C, T>(
    db: &C,
    event: ActivityEvent,
    before: Option<&T>,
    after: Option<&T>,
) -> Result<Option<activity_log::Model>>
where
    C: ConnectionTrait,
    T: Auditable,
{
    let Some(subject) = after.or(before) else {
        return Ok(None);
    };

    let options = T::log_options();
    let before_snapshot = before.map(snapshot).transpose()?;
    let after_snapshot = after.map(snapshot).transpose()?;

    let Some(properties) = diff(before_snapshot.as_ref(), after_snapshot.as_ref(), &options)
    else {
        tracing::debug!(
            subject_type = T::SUBJECT_TYPE,
            subject_id = subject.subject_id(),
            event = event.as_str(),
            "Skipping empty activity log entry"
        );
        return Ok(None);
    };

    let entry = activity_log::ActiveModel {
        log_name: Set(options.log_name.to_string()),
        description: Set(event.as_str().to_string()),
        subject_type: Set(T::SUBJECT_TYPE.to_string()),
        subject_id: Set(subject.subject_id()),
        properties: Set(properties),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = entry.insert(db).await?;
    Ok(Some(result))
}

/// Retrieves the activity entries for one record, oldest first.
pub async fn get_activity_for<C>(
    db: &C,
    subject_type: &str,
    subject_id: i64,
) -> Result<Vec<activity_log::Model>>
where
    C: ConnectionTrait,
{
    ActivityLog::find()
        .filter(activity_log::Column::SubjectType.eq(subject_type))
        .filter(activity_log::Column::SubjectId.eq(subject_id))
        .order_by_asc(activity_log::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
