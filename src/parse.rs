//! Binary decoders for FTMS and Heart Rate Measurement notification payloads.
//!
//! All functions here are pure: no I/O, no state between calls, safe from any
//! context. The session task calls [`decode`] once per notification and drops
//! the frame on error — one malformed notification never ends a session.
//!
//! # Wire format
//!
//! The two machine characteristics (Indoor Bike Data 0x2AD2, Rower Data
//! 0x2AD1) share one framing scheme: a 16-bit little-endian flags word, then
//! a run of optional fields in a fixed, characteristic-specific order. Each
//! flag bit marks its field present (except the inverted "More Data" bit 0,
//! where *clear* means present). Every present field occupies a fixed byte
//! width, so the flags word fully determines the layout.
//!
//! Rather than one hand-written decoder per characteristic, a single driver
//! walks a per-profile slot table ([`crate::protocol::INDOOR_BIKE_FIELDS`],
//! [`crate::protocol::ROWER_FIELDS`]): test the bit, bounds-check, surface
//! the value if we care about it, and advance the cursor by the slot width
//! either way. Fields this crate does not surface (speed, averages,
//! resistance, pace, ...) still consume their width — skipping that would
//! shift every later field.
//!
//! Heart Rate Measurement (0x2A37) is a different, simpler shape and gets
//! its own small decoder: an 8-bit flags byte whose bit 0 selects an 8-bit
//! or 16-bit LE BPM at offset 1.

use thiserror::Error;

use crate::protocol::{FieldSlot, MachineProfile, Surfaced, HR_FORMAT_UINT16};
use crate::types::MetricFrame;

// ── Errors ───────────────────────────────────────────────────────────────────

/// A notification payload that does not decode.
///
/// Recovered locally by the session task: the frame is dropped and the
/// connection is unaffected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer is too short to hold its own flags field.
    #[error("notification of {len} bytes is too short for the flags field")]
    MissingFlags { len: usize },

    /// The flags claim a field the buffer does not have room for.
    #[error("notification truncated: field needs {needed} bytes at offset {offset}, buffer has {len}")]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Decode one raw notification for `profile` into a [`MetricFrame`].
///
/// Pure and deterministic: the same bytes always produce the same frame.
pub fn decode(profile: MachineProfile, data: &[u8]) -> Result<MetricFrame, DecodeError> {
    match profile.field_table() {
        Some(fields) => decode_machine(fields, data),
        None => decode_heart_rate(data),
    }
}

// ── Machine data (bike / erg) ─────────────────────────────────────────────────

fn read_u16_le(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

/// Table-driven walk over one machine data notification.
fn decode_machine(fields: &[FieldSlot], data: &[u8]) -> Result<MetricFrame, DecodeError> {
    if data.len() < 2 {
        return Err(DecodeError::MissingFlags { len: data.len() });
    }
    let flags = read_u16_le(data, 0);
    let mut cursor = 2usize;
    let mut frame = MetricFrame::default();

    for slot in fields {
        let bit_set = (flags >> slot.bit) & 1 == 1;
        if bit_set != slot.present_when_set {
            continue;
        }
        if cursor + slot.width > data.len() {
            return Err(DecodeError::Truncated {
                offset: cursor,
                needed: slot.width,
                len: data.len(),
            });
        }
        match slot.surfaced {
            Surfaced::Skip => {}
            Surfaced::Cadence => {
                frame.cadence = Some(read_u16_le(data, cursor) as f64 * 0.5);
            }
            Surfaced::StrokeRate => {
                frame.cadence = Some(data[cursor] as f64 * 0.5);
            }
            Surfaced::Distance => {
                frame.distance_m = Some(
                    data[cursor] as u32
                        | (data[cursor + 1] as u32) << 8
                        | (data[cursor + 2] as u32) << 16,
                );
            }
            Surfaced::Power => {
                frame.power_watts =
                    Some(i16::from_le_bytes([data[cursor], data[cursor + 1]]));
            }
            Surfaced::Energy => {
                // Total energy only; per-hour and per-minute rates share the
                // slot and are discarded with the rest of its width.
                frame.energy_kcal = Some(read_u16_le(data, cursor));
            }
            Surfaced::Elapsed => {
                frame.elapsed_secs = Some(read_u16_le(data, cursor));
            }
        }
        cursor += slot.width;
    }

    Ok(frame)
}

// ── Heart Rate Measurement ────────────────────────────────────────────────────

/// Decode a Heart Rate Measurement notification.
///
/// Trailing HRM fields (sensor contact, energy expended, RR intervals) are
/// ignored — nothing reads past the BPM value.
fn decode_heart_rate(data: &[u8]) -> Result<MetricFrame, DecodeError> {
    if data.is_empty() {
        return Err(DecodeError::MissingFlags { len: 0 });
    }
    let flags = data[0];
    let bpm = if flags & HR_FORMAT_UINT16 != 0 {
        if data.len() < 3 {
            return Err(DecodeError::Truncated {
                offset: 1,
                needed: 2,
                len: data.len(),
            });
        }
        read_u16_le(data, 1)
    } else {
        if data.len() < 2 {
            return Err(DecodeError::Truncated {
                offset: 1,
                needed: 1,
                len: data.len(),
            });
        }
        data[1] as u16
    };
    Ok(MetricFrame {
        heart_rate_bpm: Some(bpm),
        ..MetricFrame::default()
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
