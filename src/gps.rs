//! GPS time as carried by DeviceTimeAns, and its conversion to UTC.
use core::time::Duration;

/// Seconds between the Unix epoch and the GPS epoch (1980-01-06 00:00:00 UTC).
pub const GPS_EPOCH_UNIX_OFFSET: u64 = 315_964_800;

/// GPS time (seconds since the GPS epoch) of every leap second inserted since the GPS epoch.
const LEAP_SECONDS: [u64; 18] = [
    46_828_800,
    78_364_801,
    109_900_802,
    173_059_203,
    252_028_804,
    315_187_205,
    346_723_206,
    393_984_007,
    425_520_008,
    457_056_009,
    504_489_610,
    551_750_411,
    599_184_012,
    820_108_813,
    914_803_214,
    1_025_136_015,
    1_119_744_016,
    1_167_264_017,
];

/// Number of leap seconds between GPS time and UTC at the given GPS second.
pub fn leap_seconds_at(gps_seconds: u64) -> u64 {
    LEAP_SECONDS.iter().filter(|&&t| t <= gps_seconds).count() as u64
}

/// Time since the GPS epoch in the DeviceTimeAns wire shape: whole seconds plus 1/256 s steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct GpsTime {
    pub seconds: u32,
    /// Units of 2^-8 seconds.
    pub fractional: u8,
}

impl GpsTime {
    const NANOS_PER_STEP: u32 = 3_906_250;

    pub fn new(seconds: u32, fractional: u8) -> Self {
        Self { seconds, fractional }
    }

    /// Duration elapsed since the GPS epoch.
    pub fn to_duration(&self) -> Duration {
        Duration::new(u64::from(self.seconds), u32::from(self.fractional) * Self::NANOS_PER_STEP)
    }

    /// Rounds a duration since the GPS epoch down to the nearest 1/256 s.
    ///
    /// Returns `None` when the seconds do not fit in 32 bits.
    pub fn from_duration(d: Duration) -> Option<Self> {
        let seconds = u32::try_from(d.as_secs()).ok()?;
        let fractional = (d.subsec_nanos() / Self::NANOS_PER_STEP) as u8;
        Some(Self { seconds, fractional })
    }

    /// Duration since the Unix epoch, in UTC (leap seconds removed).
    pub fn to_unix(&self) -> Duration {
        let gps = u64::from(self.seconds);
        let unix = gps + GPS_EPOCH_UNIX_OFFSET - leap_seconds_at(gps);
        Duration::new(unix, u32::from(self.fractional) * Self::NANOS_PER_STEP)
    }

    /// Converts a UTC time since the Unix epoch into GPS time.
    ///
    /// Returns `None` for times before the GPS epoch or too far in the future.
    pub fn from_unix(unix: Duration) -> Option<Self> {
        let utc = unix.as_secs().checked_sub(GPS_EPOCH_UNIX_OFFSET)?;
        let leaps = LEAP_SECONDS
            .iter()
            .enumerate()
            .filter(|&(i, &t)| t - i as u64 <= utc)
            .count() as u64;
        let d = Duration::new(utc + leaps, unix.subsec_nanos());
        Self::from_duration(d)
    }
}
