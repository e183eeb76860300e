//! GATT UUIDs, flag-bit definitions, and field layout tables for the
//! Fitness Machine Service (FTMS) and Heart Rate Service.
//!
//! All UUIDs here are 16-bit Bluetooth SIG assigned numbers expanded into the
//! standard base UUID (`0000XXXX-0000-1000-8000-00805f9b34fb`).

use std::time::Duration;

use btleplug::api::bleuuid::uuid_from_u16;
use uuid::Uuid;

// ── Services ─────────────────────────────────────────────────────────────────

/// Fitness Machine Service, advertised by indoor bikes, rowers, skiergs,
/// treadmills, and similar equipment.
///
/// Used as the scan filter when looking for a machine.
pub const FITNESS_MACHINE_SERVICE: Uuid = uuid_from_u16(0x1826);

/// Heart Rate Service, advertised by chest straps and most optical armbands.
pub const HEART_RATE_SERVICE: Uuid = uuid_from_u16(0x180D);

// ── Characteristics ───────────────────────────────────────────────────────────

/// NOTIFY — Indoor Bike Data (FTMS §4.9).
///
/// A 16-bit flags word followed by a flag-dependent run of little-endian
/// fields: speed, cadence, distance, power, energy, and so on.
pub const INDOOR_BIKE_DATA: Uuid = uuid_from_u16(0x2AD2);

/// NOTIFY — Rower Data (FTMS §4.8).
///
/// Same framing scheme as [`INDOOR_BIKE_DATA`] but with the rower field set
/// (stroke rate, pace, ...). Also what ski ergometers notify on.
pub const ROWER_DATA: Uuid = uuid_from_u16(0x2AD1);

/// NOTIFY — Heart Rate Measurement (HRS §3.1).
///
/// An 8-bit flags byte; bit 0 selects an 8-bit or 16-bit BPM value.
pub const HEART_RATE_MEASUREMENT: Uuid = uuid_from_u16(0x2A37);

// ── Machine profiles ──────────────────────────────────────────────────────────

/// The kind of device a session talks to.
///
/// A profile fixes three things for the whole session: which service to
/// scan/filter on, which characteristic carries the telemetry, and how the
/// notification bytes decode ([`crate::parse::decode`]).
///
/// | Profile | Service | Data characteristic |
/// |---|---|---|
/// | `IndoorBike` | 0x1826 | 0x2AD2 Indoor Bike Data |
/// | `RowingErg` | 0x1826 | 0x2AD1 Rower Data |
/// | `HeartRateMonitor` | 0x180D | 0x2A37 Heart Rate Measurement |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineProfile {
    /// Indoor cycling trainer or spin bike.
    IndoorBike,
    /// Rowing or ski ergometer (both notify on Rower Data).
    RowingErg,
    /// Heart-rate strap or armband.
    HeartRateMonitor,
}

impl MachineProfile {
    /// The GATT service advertised by devices of this profile.
    pub fn service_uuid(&self) -> Uuid {
        match self {
            MachineProfile::IndoorBike | MachineProfile::RowingErg => FITNESS_MACHINE_SERVICE,
            MachineProfile::HeartRateMonitor => HEART_RATE_SERVICE,
        }
    }

    /// The characteristic whose notifications carry this profile's telemetry.
    pub fn data_characteristic(&self) -> Uuid {
        match self {
            MachineProfile::IndoorBike => INDOOR_BIKE_DATA,
            MachineProfile::RowingErg => ROWER_DATA,
            MachineProfile::HeartRateMonitor => HEART_RATE_MEASUREMENT,
        }
    }

    /// How long an unsolicited disconnect signal is debounced before the
    /// session starts reconnecting.
    ///
    /// BlueZ in particular can report a disconnect right after subscription
    /// while the link is actually still up, so the signal is only believed
    /// once it has persisted for this window. Heart-rate straps drop and
    /// recover faster than machines, so they get a shorter window.
    pub fn disconnect_debounce(&self) -> Duration {
        match self {
            MachineProfile::IndoorBike | MachineProfile::RowingErg => Duration::from_secs(5),
            MachineProfile::HeartRateMonitor => Duration::from_secs(3),
        }
    }

    /// Human-readable profile name for logs and the CLI.
    pub fn label(&self) -> &'static str {
        match self {
            MachineProfile::IndoorBike => "indoor bike",
            MachineProfile::RowingErg => "rowing erg",
            MachineProfile::HeartRateMonitor => "heart-rate monitor",
        }
    }

    /// The field table driving [`crate::parse::decode`], or `None` for the
    /// heart-rate profile (which has its own two-shape layout).
    pub(crate) fn field_table(&self) -> Option<&'static [FieldSlot]> {
        match self {
            MachineProfile::IndoorBike => Some(INDOOR_BIKE_FIELDS),
            MachineProfile::RowingErg => Some(ROWER_FIELDS),
            MachineProfile::HeartRateMonitor => None,
        }
    }
}

// ── Heart Rate Measurement flags ──────────────────────────────────────────────

/// Bit 0 of the Heart Rate Measurement flags byte: BPM is a 16-bit LE value
/// when set, an 8-bit value when clear.
pub const HR_FORMAT_UINT16: u8 = 1 << 0;

// ── Machine data field tables ─────────────────────────────────────────────────

/// Which [`crate::types::MetricFrame`] attribute (if any) a field slot feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Surfaced {
    /// Width is consumed, value is discarded.
    Skip,
    /// Crank cadence, u16 LE in 0.5 rpm units.
    Cadence,
    /// Stroke rate, u8 in 0.5 spm units (first byte of the slot).
    StrokeRate,
    /// Total distance, u24 LE meters.
    Distance,
    /// Instantaneous power, i16 LE watts.
    Power,
    /// Total energy, u16 LE kcal (first two bytes of the slot).
    Energy,
    /// Elapsed time, u16 LE seconds.
    Elapsed,
}

/// One optional field of a machine data characteristic.
///
/// The decoder walks the profile's slot list in order; a slot whose presence
/// test passes consumes exactly `width` bytes whether or not it is surfaced.
/// A wrong width here shifts every later field, so widths come straight from
/// the FTMS characteristic descriptions.
#[derive(Debug)]
pub(crate) struct FieldSlot {
    /// Flag-word bit governing this slot.
    pub bit: u16,
    /// Almost always true. The one exception is the "More Data" bit, which
    /// is inverted: bit *clear* means the slot is present.
    pub present_when_set: bool,
    /// On-wire byte width of the whole slot.
    pub width: usize,
    pub surfaced: Surfaced,
}

/// Indoor Bike Data (0x2AD2) layout, FTMS §4.9.1, in transmission order.
pub(crate) const INDOOR_BIKE_FIELDS: &[FieldSlot] = &[
    // Instantaneous Speed rides on the inverted More Data bit.
    FieldSlot { bit: 0, present_when_set: false, width: 2, surfaced: Surfaced::Skip },
    // Average Speed
    FieldSlot { bit: 1, present_when_set: true, width: 2, surfaced: Surfaced::Skip },
    // Instantaneous Cadence
    FieldSlot { bit: 2, present_when_set: true, width: 2, surfaced: Surfaced::Cadence },
    // Average Cadence
    FieldSlot { bit: 3, present_when_set: true, width: 2, surfaced: Surfaced::Skip },
    // Total Distance
    FieldSlot { bit: 4, present_when_set: true, width: 3, surfaced: Surfaced::Distance },
    // Resistance Level
    FieldSlot { bit: 5, present_when_set: true, width: 2, surfaced: Surfaced::Skip },
    // Instantaneous Power
    FieldSlot { bit: 6, present_when_set: true, width: 2, surfaced: Surfaced::Power },
    // Average Power
    FieldSlot { bit: 7, present_when_set: true, width: 2, surfaced: Surfaced::Skip },
    // Expended Energy: total u16 + per-hour u16 + per-minute u8.
    // Only the total is surfaced; the slot is still 5 bytes on the wire.
    FieldSlot { bit: 8, present_when_set: true, width: 5, surfaced: Surfaced::Energy },
    // Heart Rate (machine-measured; straps are used instead)
    FieldSlot { bit: 9, present_when_set: true, width: 1, surfaced: Surfaced::Skip },
    // Metabolic Equivalent
    FieldSlot { bit: 10, present_when_set: true, width: 1, surfaced: Surfaced::Skip },
    // Elapsed Time
    FieldSlot { bit: 11, present_when_set: true, width: 2, surfaced: Surfaced::Elapsed },
    // Remaining Time
    FieldSlot { bit: 12, present_when_set: true, width: 2, surfaced: Surfaced::Skip },
];

/// Rower Data (0x2AD1) layout, FTMS §4.8.1, in transmission order.
pub(crate) const ROWER_FIELDS: &[FieldSlot] = &[
    // Stroke Rate (u8, 0.5 spm) + Stroke Count (u16) ride on the inverted
    // More Data bit as one 3-byte slot; only the rate is surfaced.
    FieldSlot { bit: 0, present_when_set: false, width: 3, surfaced: Surfaced::StrokeRate },
    // Average Stroke Rate
    FieldSlot { bit: 1, present_when_set: true, width: 1, surfaced: Surfaced::Skip },
    // Total Distance
    FieldSlot { bit: 2, present_when_set: true, width: 3, surfaced: Surfaced::Distance },
    // Instantaneous Pace
    FieldSlot { bit: 3, present_when_set: true, width: 2, surfaced: Surfaced::Skip },
    // Average Pace
    FieldSlot { bit: 4, present_when_set: true, width: 2, surfaced: Surfaced::Skip },
    // Instantaneous Power
    FieldSlot { bit: 5, present_when_set: true, width: 2, surfaced: Surfaced::Power },
    // Average Power
    FieldSlot { bit: 6, present_when_set: true, width: 2, surfaced: Surfaced::Skip },
    // Resistance Level
    FieldSlot { bit: 7, present_when_set: true, width: 2, surfaced: Surfaced::Skip },
    // Expended Energy: total u16 + per-hour u16 + per-minute u8, 5 bytes.
    FieldSlot { bit: 8, present_when_set: true, width: 5, surfaced: Surfaced::Energy },
    // Heart Rate
    FieldSlot { bit: 9, present_when_set: true, width: 1, surfaced: Surfaced::Skip },
    // Metabolic Equivalent
    FieldSlot { bit: 10, present_when_set: true, width: 1, surfaced: Surfaced::Skip },
    // Elapsed Time
    FieldSlot { bit: 11, present_when_set: true, width: 2, surfaced: Surfaced::Elapsed },
    // Remaining Time
    FieldSlot { bit: 12, present_when_set: true, width: 2, surfaced: Surfaced::Skip },
];
