//! Forwarding envelope codec
//!
//! Devices exposing several MIDI ports relay events from their secondary
//! ports through the primary one, wrapped in a non-commercial sysex:
//!
//! ```text
//! F0 7D <origin name> 00 <port> <kind> <payload>
//! ```
//!
//! With `kind = 1` the payload is `status data1 data2 F7`. With `kind = 0` the
//! payload is the complete inner sysex message (`F0 .. F7`).

use super::{RawEvent, SYSEX_END, SYSEX_START};

/// Non-commercial sysex manufacturer ID used for the envelope
pub const FORWARD_ID: u8 = 0x7D;

const KIND_SYSEX: u8 = 0;
const KIND_STANDARD: u8 = 1;

/// A decoded forwarding envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedEvent {
    /// Name of the device that forwarded the event
    pub origin: String,
    /// Port number the event originally arrived on
    pub port: u8,
    /// The embedded event
    pub event: RawEvent,
}

/// Wrap `event` in a forwarding envelope tagged with `port`
pub fn encode(origin: &str, port: u8, event: &RawEvent) -> RawEvent {
    let mut out = vec![SYSEX_START, FORWARD_ID];
    // Name bytes must stay valid sysex data and cannot contain the separator
    out.extend(origin.bytes().filter(|b| *b != 0 && *b < 0x80));
    out.push(0);
    out.push(port);

    match &event.sysex {
        Some(data) => {
            out.push(KIND_SYSEX);
            out.extend_from_slice(data);
        }
        None => {
            out.push(KIND_STANDARD);
            out.push(event.status);
            out.push(event.data1.unwrap_or(0));
            out.push(event.data2.unwrap_or(0));
            out.push(SYSEX_END);
        }
    }

    RawEvent::sysex(out)
}

/// Whether `event` carries a forwarding envelope
pub fn is_forwarded(event: &RawEvent) -> bool {
    matches!(event.sysex.as_deref(), Some([SYSEX_START, FORWARD_ID, ..]))
}

/// Port tag of a forwarded event
pub fn port_of(event: &RawEvent) -> Option<u8> {
    let (null, data) = header(event)?;
    data.get(null + 1).copied()
}

/// Unwrap the envelope, returning the port and embedded event
///
/// Unlike [`decode`] this skips the origin name, so unwrapping a standard
/// payload does not allocate.
pub fn unwrap(event: &RawEvent) -> Option<(u8, RawEvent)> {
    let (null, data) = header(event)?;
    let port = *data.get(null + 1)?;
    let kind = *data.get(null + 2)?;
    let payload = &data[(null + 3).min(data.len())..];

    let inner = match kind {
        KIND_STANDARD => match payload {
            [status, d1, d2, ..] => RawEvent::standard(*status, *d1, *d2),
            _ => return None,
        },
        KIND_SYSEX if payload.first() == Some(&SYSEX_START) => RawEvent::sysex(payload),
        _ => return None,
    };

    Some((port, inner))
}

/// Decode the full envelope, including the origin name
pub fn decode(event: &RawEvent) -> Option<ForwardedEvent> {
    let (null, data) = header(event)?;
    let (port, inner) = unwrap(event)?;
    Some(ForwardedEvent {
        origin: String::from_utf8_lossy(&data[2..null]).into_owned(),
        port,
        event: inner,
    })
}

/// Locate the origin name terminator
fn header(event: &RawEvent) -> Option<(usize, &[u8])> {
    if !is_forwarded(event) {
        return None;
    }
    let data = event.sysex.as_deref()?;
    let null = data.iter().skip(2).position(|&b| b == 0)? + 2;
    Some((null, data))
}
