//! Utility functions for the health-profiles-ble crate.

/// Millimetres of mercury per kilopascal.
const MMHG_PER_KPA: f32 = 7.500_616;

/// Resolution of CSC event times (1/1024 s).
pub const CSC_EVENT_TIME_RESOLUTION: f64 = 1024.0;

/// Convert kilopascal to millimetres of mercury.
///
/// # Example
///
/// ```
/// use health_profiles_ble::kpa_to_mmhg;
///
/// let mmhg = kpa_to_mmhg(16.0);
/// assert!((mmhg - 120.01).abs() < 0.01);
/// ```
#[inline]
pub fn kpa_to_mmhg(kpa: f32) -> f32 {
    kpa * MMHG_PER_KPA
}

/// Convert millimetres of mercury to kilopascal.
///
/// # Example
///
/// ```
/// use health_profiles_ble::mmhg_to_kpa;
///
/// let kpa = mmhg_to_kpa(120.0);
/// assert!((kpa - 16.0).abs() < 0.01);
/// ```
#[inline]
pub fn mmhg_to_kpa(mmhg: f32) -> f32 {
    mmhg / MMHG_PER_KPA
}

/// Convert a CSC event time (1/1024 s ticks) to seconds.
#[inline]
pub fn event_time_to_seconds(ticks: u16) -> f64 {
    ticks as f64 / CSC_EVENT_TIME_RESOLUTION
}

/// Ticks elapsed between two CSC event times, accounting for the 16-bit
/// rollover every 64 seconds.
#[inline]
pub fn event_time_delta(previous: u16, current: u16) -> u16 {
    current.wrapping_sub(previous)
}
