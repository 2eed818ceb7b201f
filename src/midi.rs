//! MIDI utilities and raw event type
//!
//! Provides the [`RawEvent`] handed over by the host, message classification
//! for logging, and value conversions used by the decoding strategies.

pub mod forward;

use std::fmt;

/// Start of a system exclusive message
pub const SYSEX_START: u8 = 0xF0;

/// End of a system exclusive message
pub const SYSEX_END: u8 = 0xF7;

/// Universal device enquiry request, broadcast to every device ID
pub const UNIVERSAL_ENQUIRY: [u8; 6] = [0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7];

/// A single inbound MIDI message
///
/// Either a status/data1/data2 triplet or a sysex byte sequence (in which case
/// `status` is `0xF0` and the data bytes are empty). `handled` is set once some
/// consumer has claimed the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub status: u8,
    pub data1: Option<u8>,
    pub data2: Option<u8>,
    pub sysex: Option<Vec<u8>>,
    pub handled: bool,
}

impl RawEvent {
    /// Create a standard (non-sysex) event
    pub fn standard(status: u8, data1: u8, data2: u8) -> Self {
        Self {
            status,
            data1: Some(data1),
            data2: Some(data2),
            sysex: None,
            handled: false,
        }
    }

    /// Create a sysex event from the full message (including `F0` and `F7`)
    pub fn sysex(data: impl Into<Vec<u8>>) -> Self {
        Self {
            status: SYSEX_START,
            data1: None,
            data2: None,
            sysex: Some(data.into()),
            handled: false,
        }
    }

    /// Parse an event from raw bytes as delivered by the MIDI input callback
    ///
    /// Running status (a data byte first) is not supported and yields `None`.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let status = *data.first()?;
        if status < 0x80 {
            return None;
        }

        if status == SYSEX_START {
            return Some(Self::sysex(data));
        }

        Some(Self {
            status,
            data1: data.get(1).copied(),
            data2: data.get(2).copied(),
            sysex: None,
            handled: false,
        })
    }

    /// Encode the event back to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        match &self.sysex {
            Some(data) => data.clone(),
            None => std::iter::once(self.status)
                .chain(self.data1)
                .chain(self.data2)
                .collect(),
        }
    }

    pub fn is_sysex(&self) -> bool {
        self.sysex.is_some()
    }

    /// Upper nibble of the status byte (0x8..=0xF)
    pub fn type_nibble(&self) -> u8 {
        (self.status & 0xF0) >> 4
    }

    /// Channel (0-15) for channel messages, `None` for system messages
    pub fn channel(&self) -> Option<u8> {
        if self.status < 0xF0 {
            Some(self.status & 0x0F)
        } else {
            None
        }
    }

    /// Classify the event
    pub fn kind(&self) -> MessageKind {
        if self.is_sysex() {
            return MessageKind::SysEx;
        }
        match self.type_nibble() {
            0x8 => MessageKind::NoteOff,
            // Note On with velocity 0 is a Note Off
            0x9 if self.data2 == Some(0) => MessageKind::NoteOff,
            0x9 => MessageKind::NoteOn,
            0xA => MessageKind::PolyPressure,
            0xB => MessageKind::ControlChange,
            0xC => MessageKind::ProgramChange,
            0xD => MessageKind::ChannelPressure,
            0xE => MessageKind::PitchBend,
            _ => MessageKind::System,
        }
    }
}

/// Coarse message classification, used for logging and note decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    NoteOff,
    NoteOn,
    PolyPressure,
    ControlChange,
    ProgramChange,
    ChannelPressure,
    PitchBend,
    SysEx,
    System,
}

impl fmt::Display for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(data) = &self.sysex {
            return write!(f, "SysEx {} bytes", data.len());
        }

        let ch = self.channel().map(|c| c + 1).unwrap_or(0);
        let d1 = self.data1.unwrap_or(0);
        let d2 = self.data2.unwrap_or(0);
        match self.kind() {
            MessageKind::NoteOff => write!(f, "NoteOff ch:{} n:{} v:{}", ch, d1, d2),
            MessageKind::NoteOn => write!(f, "NoteOn ch:{} n:{} v:{}", ch, d1, d2),
            MessageKind::PolyPressure => write!(f, "PolyPressure ch:{} n:{} p:{}", ch, d1, d2),
            MessageKind::ControlChange => write!(f, "CC ch:{} cc:{} v:{}", ch, d1, d2),
            MessageKind::ProgramChange => write!(f, "ProgramChange ch:{} p:{}", ch, d1),
            MessageKind::ChannelPressure => write!(f, "ChannelPressure ch:{} p:{}", ch, d1),
            MessageKind::PitchBend => {
                write!(f, "PitchBend ch:{} v:{}", ch, convert::pb14_from_raw(d1, d2))
            }
            MessageKind::SysEx | MessageKind::System => {
                write!(f, "System {}", format_hex(&self.to_bytes()))
            }
        }
    }
}

/// MIDI value conversion utilities
pub mod convert {
    /// Combine pitch bend LSB/MSB into a 14-bit value (0-16383)
    pub fn pb14_from_raw(lsb: u8, msb: u8) -> u16 {
        (((msb & 0x7F) as u16) << 7) | (lsb & 0x7F) as u16
    }

    /// Convert a 7-bit value (0-127) to the unit range
    pub fn unit_from_7bit(value: u8) -> f32 {
        (value.min(127) as f32) / 127.0
    }

    /// Convert a 14-bit value (0-16383) to the unit range
    pub fn unit_from_14bit(value: u16) -> f32 {
        (value.min(16383) as f32) / 16383.0
    }

    /// Convert a unit value back to 7 bits, clamping out-of-range input
    pub fn unit_to_7bit(value: f32) -> u8 {
        (value.clamp(0.0, 1.0) * 127.0).round() as u8
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_standard() {
        let event = RawEvent::from_bytes(&[0x90, 60, 100]).unwrap();
        assert_eq!(event, RawEvent::standard(0x90, 60, 100));
        assert_eq!(event.kind(), MessageKind::NoteOn);
        assert_eq!(event.channel(), Some(0));
    }

    #[test]
    fn test_from_bytes_short_message() {
        // Program change only carries one data byte
        let event = RawEvent::from_bytes(&[0xC2, 5]).unwrap();
        assert_eq!(event.data1, Some(5));
        assert_eq!(event.data2, None);
        assert_eq!(event.to_bytes(), vec![0xC2, 5]);
    }

    #[test]
    fn test_from_bytes_sysex_keeps_delimiters() {
        let event = RawEvent::from_bytes(&UNIVERSAL_ENQUIRY).unwrap();
        assert!(event.is_sysex());
        assert_eq!(event.status, SYSEX_START);
        assert_eq!(event.sysex.as_deref(), Some(&UNIVERSAL_ENQUIRY[..]));
    }

    #[test]
    fn test_running_status_rejected() {
        assert!(RawEvent::from_bytes(&[0x40, 0x7F]).is_none());
        assert!(RawEvent::from_bytes(&[]).is_none());
    }

    #[test]
    fn test_note_on_velocity_zero_is_note_off() {
        let event = RawEvent::standard(0x93, 60, 0);
        assert_eq!(event.kind(), MessageKind::NoteOff);
        assert_eq!(event.to_string(), "NoteOff ch:4 n:60 v:0");
    }

    #[test]
    fn test_pitch_bend_display() {
        let event = RawEvent::standard(0xE0, 0x00, 0x40);
        assert_eq!(event.to_string(), "PitchBend ch:1 v:8192");
    }

    #[test]
    fn test_unit_conversions() {
        assert_eq!(convert::unit_from_7bit(0), 0.0);
        assert_eq!(convert::unit_from_7bit(127), 1.0);
        assert_eq!(convert::unit_from_14bit(16383), 1.0);
        assert_eq!(convert::unit_to_7bit(1.0), 127);
        assert_eq!(convert::unit_to_7bit(-3.0), 0);
        assert_eq!(convert::pb14_from_raw(0x7F, 0x7F), 16383);
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0xF0, 0x7E, 0x7F]), "F0 7E 7F");
    }
}
