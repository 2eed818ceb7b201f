//! Value decoding strategies
//!
//! A strategy turns the raw event that matched a control into a value in the
//! unit range. Controls differ in behaviour by swapping strategies, not by
//! type.

use crate::midi::{convert, forward, MessageKind, RawEvent};

#[derive(Debug, Clone, PartialEq)]
pub enum ValueStrategy {
    /// `data2 / 127` (faders, knobs, CC buttons sending a range)
    Data2,
    /// `1.0` when `data2` is non-zero, otherwise `0.0`
    ButtonData2,
    /// Note-on velocity, note-off (or zero velocity) decodes to `0.0`
    Note,
    /// `data1 / 127` (channel aftertouch)
    Data1,
    /// 14-bit pitch bend value
    Pitch,
    /// Constant value (single-press buttons)
    Fixed(f32),
    /// Always `0.0`, for ignored events
    Null,
    /// Unwrap a forwarding envelope, then apply the inner strategy
    Forwarded(Box<ValueStrategy>),
}

impl ValueStrategy {
    pub fn forwarded(inner: ValueStrategy) -> Self {
        ValueStrategy::Forwarded(Box::new(inner))
    }

    /// Decode `event`, clamped to `[0, 1]`
    pub fn decode(&self, event: &RawEvent) -> f32 {
        let value = match self {
            ValueStrategy::Data2 => convert::unit_from_7bit(event.data2.unwrap_or(0)),
            ValueStrategy::ButtonData2 => {
                if event.data2.unwrap_or(0) > 0 {
                    1.0
                } else {
                    0.0
                }
            }
            ValueStrategy::Note => match event.kind() {
                MessageKind::NoteOn => convert::unit_from_7bit(event.data2.unwrap_or(0)),
                _ => 0.0,
            },
            ValueStrategy::Data1 => convert::unit_from_7bit(event.data1.unwrap_or(0)),
            ValueStrategy::Pitch => convert::unit_from_14bit(convert::pb14_from_raw(
                event.data1.unwrap_or(0),
                event.data2.unwrap_or(0),
            )),
            ValueStrategy::Fixed(v) => *v,
            ValueStrategy::Null => 0.0,
            ValueStrategy::Forwarded(inner) => match forward::unwrap(event) {
                Some((_, decoded)) => inner.decode(&decoded),
                None => 0.0,
            },
        };

        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data2() {
        assert_eq!(ValueStrategy::Data2.decode(&RawEvent::standard(0xB0, 1, 127)), 1.0);
        assert_eq!(ValueStrategy::Data2.decode(&RawEvent::standard(0xB0, 1, 0)), 0.0);
    }

    #[test]
    fn test_button() {
        let s = ValueStrategy::ButtonData2;
        assert_eq!(s.decode(&RawEvent::standard(0xBF, 102, 1)), 1.0);
        assert_eq!(s.decode(&RawEvent::standard(0xBF, 102, 0)), 0.0);
    }

    #[test]
    fn test_note() {
        let s = ValueStrategy::Note;
        assert_eq!(s.decode(&RawEvent::standard(0x90, 60, 127)), 1.0);
        assert_eq!(s.decode(&RawEvent::standard(0x90, 60, 0)), 0.0);
        assert_eq!(s.decode(&RawEvent::standard(0x80, 60, 64)), 0.0);
    }

    #[test]
    fn test_pitch_center() {
        let v = ValueStrategy::Pitch.decode(&RawEvent::standard(0xE0, 0x00, 0x40));
        assert!((v - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_fixed_is_clamped() {
        assert_eq!(ValueStrategy::Fixed(3.0).decode(&RawEvent::standard(0x90, 1, 1)), 1.0);
        assert_eq!(ValueStrategy::Fixed(f32::NAN).decode(&RawEvent::standard(0x90, 1, 1)), 0.0);
    }

    #[test]
    fn test_forwarded() {
        let s = ValueStrategy::forwarded(ValueStrategy::Data2);
        let wrapped = forward::encode("LK", 2, &RawEvent::standard(0xBF, 0x29, 127));
        assert_eq!(s.decode(&wrapped), 1.0);
        // Not forwarded: nothing to decode
        assert_eq!(s.decode(&RawEvent::standard(0xBF, 0x29, 127)), 0.0);
    }
}
