//! Storage to display time zone correction for datetime columns

use chrono::offset::LocalResult;
use chrono::{DateTime, Duration, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;

use crate::error::{ExportError, Result};

/// Zone stored datetimes are written in, and zone they are shown in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeZones {
    pub storage: Tz,
    pub display: Tz,
}

impl Default for TimeZones {
    fn default() -> Self {
        TimeZones {
            storage: Tz::UTC,
            display: Tz::UTC,
        }
    }
}

impl TimeZones {
    pub fn new(storage: Tz, display: Tz) -> Self {
        TimeZones { storage, display }
    }
}

/// Converts stored wall-clock datetimes to display wall-clock datetimes
#[derive(Debug, Clone, Copy)]
pub struct TimeZoneCorrection {
    zones: TimeZones,
}

impl TimeZoneCorrection {
    pub fn new(zones: TimeZones) -> Self {
        TimeZoneCorrection { zones }
    }

    /// True when storage and display zones are the same
    pub fn is_identity(&self) -> bool {
        self.zones.storage == self.zones.display
    }

    /// Shift a stored datetime to the display zone.
    ///
    /// Local times skipped by a DST transition in the storage zone move
    /// forward by the length of the gap; repeated local times resolve to the
    /// earlier instant.
    pub fn correct(&self, stored: NaiveDateTime) -> Result<NaiveDateTime> {
        if self.is_identity() {
            return Ok(stored);
        }
        let instant = match self.zones.storage.from_local_datetime(&stored) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => self.skip_gap(stored)?,
        };
        Ok(instant.with_timezone(&self.zones.display).naive_local())
    }

    /// Read a local time that falls into a gap with the offset in effect
    /// before the transition
    fn skip_gap(&self, stored: NaiveDateTime) -> Result<DateTime<Tz>> {
        let storage = self.zones.storage;
        let before = storage
            .from_local_datetime(&(stored - Duration::days(1)))
            .earliest()
            .ok_or_else(|| {
                ExportError::InvalidValue(format!("{} does not exist in {}", stored, storage))
            })?;
        let offset = before.offset().fix().local_minus_utc();
        let utc = stored - Duration::seconds(i64::from(offset));
        Ok(storage.from_utc_datetime(&utc))
    }
}
