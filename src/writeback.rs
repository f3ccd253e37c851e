//! Write-back of scheduled start times to the record source.
//!
//! After a merge, every task with at least one booking yields a
//! [`BookingUpdate`]: the original record key and the first booking's
//! interval. A [`RecordSink`] decides how updates reach the source;
//! [`JsonRecords`] updates an in-memory record list.
//!
//! UTC bookings are written as RFC 3339 with a `Z` suffix so the source does
//! not read them as local time. Other bookings are written as wall time.

use chrono::{NaiveDateTime, SecondsFormat};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::models::{keyword, Node};

/// Timestamp format written back for wall-time bookings.
pub const WRITE_BACK_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Default record field receiving the scheduled start.
pub const DEFAULT_BOOKING_FIELD: &str = "booking";

/// Scheduled slot of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingUpdate {
    /// Original record key.
    pub key: String,
    pub resource: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// `start` and `end` are UTC instants.
    pub utc: bool,
}

impl BookingUpdate {
    /// Start formatted for the record source.
    pub fn start_iso(&self) -> String {
        if self.utc {
            self.start.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true)
        } else {
            self.start.format(WRITE_BACK_FORMAT).to_string()
        }
    }
}

/// Collects one update per booked task, in tree order.
pub fn booking_updates(tree: &Node) -> Vec<BookingUpdate> {
    tree.walk_nodes(keyword::TASK)
        .into_iter()
        .filter_map(|task| {
            let booking = task.bookings().next()?;
            let interval = booking.booking_interval()?;
            Some(BookingUpdate {
                key: task.id().to_string(),
                resource: booking.id().to_string(),
                start: interval.start,
                end: interval.end,
                utc: interval.utc,
            })
        })
        .collect()
}

/// Destination for scheduled values.
pub trait RecordSink {
    /// Sets `field` on the record identified by `key`. Returns `false` when
    /// no such record exists.
    fn update(&mut self, key: &str, field: &str, value: Value) -> bool;
}

/// Pushes every booking update into `sink`. Returns the number of records
/// updated.
pub fn write_back<S: RecordSink>(tree: &Node, sink: &mut S, field: &str) -> usize {
    let mut updated = 0;
    for update in booking_updates(tree) {
        if sink.update(&update.key, field, Value::String(update.start_iso())) {
            updated += 1;
        } else {
            warn!(task = %update.key, "no record to write booking back to");
        }
    }
    info!(updated, field, "wrote bookings back");
    updated
}

/// In-memory JSON records keyed by a top-level identifier field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonRecords {
    records: Vec<Value>,
    id_field: String,
}

impl JsonRecords {
    pub fn new(records: Vec<Value>, id_field: impl Into<String>) -> Self {
        Self {
            records,
            id_field: id_field.into(),
        }
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Value> {
        self.records
    }

    fn matches(&self, record: &Value, key: &str) -> bool {
        match record.get(&self.id_field) {
            Some(Value::String(s)) => s == key,
            Some(Value::Number(n)) => n.to_string() == key,
            _ => false,
        }
    }
}

impl RecordSink for JsonRecords {
    fn update(&mut self, key: &str, field: &str, value: Value) -> bool {
        let Some(pos) = self.records.iter().position(|r| self.matches(r, key)) else {
            return false;
        };
        match self.records[pos].as_object_mut() {
            Some(object) => {
                object.insert(field.to_string(), value);
                true
            }
            None => false,
        }
    }
}
