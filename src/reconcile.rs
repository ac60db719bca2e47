//! ==============================================================================
//! reconcile.rs - merge a remote snapshot into the local history
//! ==============================================================================
//!
//! purpose:
//!     the one piece of real logic in a run. given the local history and an
//!     optional remote snapshot it:
//!       1. returns the history untouched when there is no snapshot
//!       2. projects the snapshot into a record tagged with the source
//!       3. appends it unless a record with the same time string exists
//!       4. sorts records by time string
//!       5. drops records at or before now - retention window
//!       6. raises the alert if the snapshot says huinan is on
//!
//! invariants:
//!     - time strings are compared raw: "2026-02-18 11:00:00" and
//!       "2026-02-18T11:00:00" are different records
//!     - the trim is all-or-nothing. one unparseable time skips it entirely
//!     - the alert is only ever raised here, never cleared
//!
//! relationships:
//!     - used by: main.rs
//!     - uses: timestamp.rs (formatting now, parsing record times)
//!
//! ==============================================================================

use crate::domain::{HistoryState, Record, RemoteSnapshot};
use crate::error::TrimError;
use crate::timestamp::{format_record_time, parse_instant, MISSING_TIME};

use serde_json::{Number, Value};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

/// what happened to the snapshot's record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    NoSnapshot,
    Inserted { time: String },
    Duplicate { time: String },
}

/// per-run summary for the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub insertion: Insertion,
    pub records_before: usize,
    pub records_after: usize,
    /// records dropped by the retention window
    pub trimmed: usize,
    /// set when the retention window could not be applied this run
    pub trim_skipped: Option<TrimError>,
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    retention: Duration,
    source_tag: String,
}

impl Reconciler {
    pub fn new(retention: Duration, source_tag: impl Into<String>) -> Self {
        Self {
            retention,
            source_tag: source_tag.into(),
        }
    }

    /// Merge `remote` into `local` as of `now`.
    pub fn reconcile(
        &self,
        local: HistoryState,
        remote: Option<RemoteSnapshot>,
        now: OffsetDateTime,
    ) -> HistoryState {
        self.reconcile_with_report(local, remote, now).0
    }

    /// Same as [`Reconciler::reconcile`], also describing what changed.
    ///
    /// `now` must carry the local UTC offset; record times without an offset
    /// are read as local wall-clock time.
    pub fn reconcile_with_report(
        &self,
        mut local: HistoryState,
        remote: Option<RemoteSnapshot>,
        now: OffsetDateTime,
    ) -> (HistoryState, MergeReport) {
        let records_before = local.records.len();

        let Some(remote) = remote else {
            let report = MergeReport {
                insertion: Insertion::NoSnapshot,
                records_before,
                records_after: records_before,
                trimmed: 0,
                trim_skipped: None,
            };
            return (local, report);
        };

        let candidate = self.project(&remote, now);
        let time = candidate.time_key().to_string();
        let exists = local.records.iter().any(|r| r.time == candidate.time);

        let insertion = if exists {
            info!(%time, "remote record already present, skipping");
            Insertion::Duplicate { time }
        } else {
            info!(%time, "remote record added");
            local.records.push(candidate);
            Insertion::Inserted { time }
        };

        local.records.sort_by(|a, b| a.time_key().cmp(b.time_key()));

        let (trimmed, trim_skipped) = match self.apply_retention(&mut local.records, now) {
            Ok(trimmed) => (trimmed, None),
            Err(e) => {
                debug!("retention window not applied: {}", e);
                (0, Some(e))
            }
        };

        if remote.is_nanhui {
            local.alert_active = true;
            local.alert_level = remote.level;
        }

        let report = MergeReport {
            insertion,
            records_before,
            records_after: local.records.len(),
            trimmed,
            trim_skipped,
        };
        (local, report)
    }

    fn project(&self, remote: &RemoteSnapshot, now: OffsetDateTime) -> Record {
        let time = remote
            .updated_at
            .clone()
            .unwrap_or_else(|| format_record_time(now));

        let reading = |n: &Option<Number>| n.clone().map_or_else(|| Value::from(0), Value::Number);

        Record {
            humidity: reading(&remote.humidity),
            dew: reading(&remote.dew),
            temp: reading(&remote.temp),
            time: Some(time),
            is_nanhui: Value::Bool(remote.is_nanhui),
            level: remote.level.clone().map_or(Value::Null, Value::String),
            source: Some(self.source_tag.clone()),
            ..Default::default()
        }
    }

    /// Drop records at or before the cutoff. Leaves `records` untouched on error.
    fn apply_retention(
        &self,
        records: &mut Vec<Record>,
        now: OffsetDateTime,
    ) -> Result<usize, TrimError> {
        // a window reaching past the representable range keeps everything
        let Some(cutoff) = now.checked_sub(self.retention) else {
            return Ok(0);
        };
        let local = now.offset();

        // parse everything before touching the vec
        let instants = records
            .iter()
            .map(|r| parse_instant(r.time.as_deref().unwrap_or(MISSING_TIME), local))
            .collect::<Result<Vec<_>, _>>()?;

        let before = records.len();
        let mut instants = instants.into_iter();
        records.retain(|_| instants.next().is_some_and(|at| at > cutoff));
        Ok(before - records.len())
    }
}
