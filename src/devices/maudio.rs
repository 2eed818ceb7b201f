//! M-Audio controllers

use crate::control::{ControlKind, ControlSurface, TransportButton, ValueStrategy};
use crate::device::{DeviceDescriptor, NameMatcher};
use crate::error::Result;
use crate::matcher::{Leaf, MatcherNode};
use crate::pattern::{enquiry_response, Pattern, ANY};

use super::generators;

pub const HAMMER_88_PRO: &str = "Maudio.Hammer88Pro";

/// Manufacturer `00 01 05`, family `00 3C`
const HAMMER_ENQUIRY_SUFFIX: [u8; 5] = [0x00, 0x01, 0x05, 0x00, 0x3C];

/// Port the DAW preset sends transport controls on
const DAW_PORT: u8 = 3;

/// Hammer 88 Pro
///
/// Needs the DAW and User presets loaded on the keyboard. Its port names are
/// generic, so it is only recognised by its enquiry response.
pub fn hammer88pro() -> DeviceDescriptor {
    DeviceDescriptor::new(HAMMER_88_PRO, build_hammer88pro)
        .with_name_matcher(NameMatcher::Never)
        .with_enquiry_response(enquiry_response(&HAMMER_ENQUIRY_SUFFIX))
}

fn transport(id: &str, button: TransportButton, status: u8, data1: u8) -> ControlSurface {
    ControlSurface::new(
        id,
        ControlKind::Transport(button),
        Pattern::forwarded(DAW_PORT, Pattern::basic(status, data1, ANY)),
        ValueStrategy::forwarded(ValueStrategy::ButtonData2),
    )
}

fn build_hammer88pro() -> Result<MatcherNode> {
    let leaf = Leaf::builder()
        // Clock start and timing clock
        .add_control(ControlSurface::new(
            "start",
            ControlKind::Null,
            Pattern::basic(0xFA, ANY, ANY),
            ValueStrategy::Null,
        ))
        .add_control(ControlSurface::new(
            "clock",
            ControlKind::Null,
            Pattern::basic(0xFC, ANY, ANY),
            ValueStrategy::Null,
        ))
        .add_indexed(generators::notes_all_channels()?)
        .add_controls(generators::pedals())
        .add_control(generators::channel_aftertouch_all_channels())
        .add_controls([
            transport("stop", TransportButton::Stop, 0xBF, 102),
            transport("play", TransportButton::Play, 0xBF, 103),
            transport("record", TransportButton::Record, 0xBF, 104),
            transport("rewind", TransportButton::Rewind, 0xBF, 105),
            transport("fast_forward", TransportButton::FastForward, 0xBF, 106),
            transport("loop", TransportButton::Loop, 0xBF, 107),
            transport("metronome", TransportButton::Metronome, 0xB9, 0x74),
        ])
        .add_control(generators::mod_wheel())
        .add_control(generators::pitch_wheel())
        .build();
    Ok(leaf.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{forward, RawEvent};

    #[test]
    fn test_transport_only_on_daw_port() {
        let device = hammer88pro().create().unwrap();
        let stop = RawEvent::standard(0xBF, 102, 127);

        let event = device.resolve(&forward::encode("Hammer", DAW_PORT, &stop)).unwrap();
        assert_eq!(event.control.id(), "stop");
        assert_eq!(event.value, 1.0);

        // Same CC from another port is not a transport control
        assert!(device.resolve(&forward::encode("Hammer", 1, &stop)).is_none());
    }

    #[test]
    fn test_clock_is_swallowed() {
        let device = hammer88pro().create().unwrap();
        let clock = device.resolve(&RawEvent::from_bytes(&[0xFC]).unwrap()).unwrap();
        assert_eq!(clock.control.kind(), ControlKind::Null);
        assert_eq!(clock.value, 0.0);
    }

    #[test]
    fn test_keyboard_controls() {
        let device = hammer88pro().create().unwrap();
        let id = |bytes: &[u8]| {
            device
                .resolve(&RawEvent::from_bytes(bytes).unwrap())
                .map(|e| e.control.id().to_string())
        };
        assert_eq!(id(&[0x90, 21, 100]).as_deref(), Some("note21"));
        assert_eq!(id(&[0xB0, 64, 127]).as_deref(), Some("sustain"));
        assert_eq!(id(&[0xB0, 1, 12]).as_deref(), Some("mod_wheel"));
        assert_eq!(id(&[0xE0, 0, 64]).as_deref(), Some("pitch_wheel"));
        assert_eq!(id(&[0xD0, 5]).as_deref(), Some("aftertouch"));
        assert_eq!(id(&[0xB0, 30, 1]), None);
    }
}
