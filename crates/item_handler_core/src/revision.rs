use chrono::{DateTime, SecondsFormat, Utc};

use crate::contract::{Item, PutItem};

/// UTC, microsecond precision, `Z` suffix.
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Builds the item a PUT writes.
///
/// The whole item is replaced, so `description` falls back to whatever the
/// request carried (empty when absent). `created_at` is stamped only when no
/// prior item exists; otherwise the prior value is carried forward as-is.
pub fn next_revision(existing: Option<&Item>, put: PutItem, now: &str) -> Item {
    let created_at = match existing {
        Some(previous) => previous.created_at.clone(),
        None => Some(now.to_string()),
    };

    Item {
        id: put.id,
        name: put.name,
        description: put.description,
        created_at,
        updated_at: now.to_string(),
    }
}
