//! Generators for controls most keyboards share
//!
//! Statuses are matched on every channel so the generated controls work
//! regardless of how the keyboard is configured.

use crate::control::{ControlKind, ControlSurface, ValueStrategy};
use crate::error::Result;
use crate::matcher::IndexTable;
use crate::pattern::{Pattern, ANY};

const NOTE_OFF_ANY: u8 = 0x80;
const NOTE_ON_LAST: u8 = 0x9F;

pub const SUSTAIN: u8 = 64;
pub const SOSTENUTO: u8 = 66;
pub const SOFT: u8 = 67;
pub const MOD_WHEEL: u8 = 1;

/// One control per note number, note on and note off on any channel
pub fn notes_all_channels() -> Result<IndexTable> {
    let notes = (0..=127u8)
        .map(|note| {
            ControlSurface::new(
                format!("note{}", note),
                ControlKind::Note,
                Pattern::basic(NOTE_OFF_ANY..=NOTE_ON_LAST, note, ANY),
                ValueStrategy::Note,
            )
            .with_coordinate(0, note as i32)
        })
        .collect();
    IndexTable::new(NOTE_OFF_ANY..=NOTE_ON_LAST, 0, notes, None)
}

/// Sustain, sostenuto and soft pedals
pub fn pedals() -> Vec<ControlSurface> {
    [("sustain", SUSTAIN), ("sostenuto", SOSTENUTO), ("soft", SOFT)]
        .into_iter()
        .enumerate()
        .map(|(i, (id, cc))| {
            ControlSurface::new(
                id,
                ControlKind::Pedal,
                Pattern::basic(0xB0..=0xBF, cc, ANY),
                ValueStrategy::ButtonData2,
            )
            .with_coordinate(0, i as i32)
        })
        .collect()
}

/// Channel pressure on any channel
pub fn channel_aftertouch_all_channels() -> ControlSurface {
    ControlSurface::new(
        "aftertouch",
        ControlKind::Aftertouch,
        Pattern::basic(0xD0..=0xDF, ANY, ANY),
        ValueStrategy::Data1,
    )
}

pub fn mod_wheel() -> ControlSurface {
    ControlSurface::new(
        "mod_wheel",
        ControlKind::ModWheel,
        Pattern::basic(0xB0..=0xBF, MOD_WHEEL, ANY),
        ValueStrategy::Data2,
    )
}

pub fn pitch_wheel() -> ControlSurface {
    ControlSurface::new(
        "pitch_wheel",
        ControlKind::PitchWheel,
        Pattern::basic(0xE0..=0xEF, ANY, ANY),
        ValueStrategy::Pitch,
    )
    .with_coordinate(0, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::RawEvent;

    #[test]
    fn test_notes_resolve_on_any_channel() {
        let table = notes_all_channels().unwrap();
        let on = table.resolve(&RawEvent::standard(0x93, 60, 127)).unwrap();
        assert_eq!(on.control.id(), "note60");
        assert_eq!(on.value, 1.0);

        let off = table.resolve(&RawEvent::standard(0x8F, 60, 64)).unwrap();
        assert_eq!(off.control.id(), "note60");
        assert_eq!(off.value, 0.0);

        assert!(table.resolve(&RawEvent::standard(0xB0, 60, 64)).is_none());
    }

    #[test]
    fn test_pedals() {
        let pedals: Vec<_> = pedals().into_iter().map(std::sync::Arc::new).collect();
        let hit = pedals
            .iter()
            .find_map(|p| p.try_match(&RawEvent::standard(0xB4, SOSTENUTO, 127)))
            .unwrap();
        assert_eq!(hit.control.id(), "sostenuto");
        assert_eq!(hit.value, 1.0);
    }

    #[test]
    fn test_channel_pressure_has_no_data2() {
        let aftertouch = std::sync::Arc::new(channel_aftertouch_all_channels());
        let event = RawEvent::from_bytes(&[0xD2, 127]).unwrap();
        assert_eq!(aftertouch.try_match(&event).unwrap().value, 1.0);
    }

    #[test]
    fn test_wheels() {
        let pitch = std::sync::Arc::new(pitch_wheel());
        let centre = pitch.try_match(&RawEvent::standard(0xE0, 0x00, 0x40)).unwrap();
        assert!((centre.value - 0.5).abs() < 0.001);

        let modw = std::sync::Arc::new(mod_wheel());
        assert!(modw.try_match(&RawEvent::standard(0xB0, 2, 0)).is_none());
    }
}
