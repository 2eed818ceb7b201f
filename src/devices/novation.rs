//! Novation Launchkey controllers
//!
//! Launchkeys expose the keyboard on their main port and the InControl
//! surface (faders, drum pads, metronome) on a second port, whose events
//! arrive wrapped in a forwarding envelope.

use crate::control::{ControlKind, ControlSurface, TransportButton, ValueStrategy};
use crate::device::{DeviceDescriptor, NameMatcher};
use crate::error::Result;
use crate::matcher::{Composite, Leaf, MatcherNode};
use crate::pattern::{enquiry_response, Pattern, ANY};

use super::generators;

pub const LAUNCHKEY_MK2: &str = "Novation.Launchkey.Mk2";

/// Novation manufacturer id, Launchkey Mk2 family
const MK2_ENQUIRY_SUFFIX: [u8; 4] = [0x00, 0x20, 0x29, 0x7B];

const INCONTROL_PORT: u8 = 2;
const INCONTROL_STATUS: u8 = 0xBF;
const INCONTROL_CHANNEL: u8 = 0x0F;

const FADER_START: u8 = 0x29;
const FADER_BUTTON_START: u8 = 0x33;
const MASTER_FADER: u8 = 0x07;
const MASTER_FADER_BUTTON: u8 = 0x3B;
const FADER_COUNT: usize = 8;

const METRONOME_NOTE: u8 = 0x70;

const DRUM_PADS: [[u8; 8]; 2] = [
    [0x60, 0x61, 0x62, 0x63, 0x64, 0x65, 0x66, 0x67],
    [0x70, 0x71, 0x72, 0x73, 0x74, 0x75, 0x76, 0x77],
];

pub fn launchkey_mk2() -> DeviceDescriptor {
    DeviceDescriptor::new(LAUNCHKEY_MK2, build_launchkey_mk2)
        .with_name_matcher(NameMatcher::Prefix("Launchkey MK2".into()))
        .with_enquiry_response(enquiry_response(&MK2_ENQUIRY_SUFFIX))
}

fn incontrol(pattern: Pattern) -> Pattern {
    Pattern::forwarded(INCONTROL_PORT, pattern)
}

fn fader_set() -> Result<Leaf> {
    let faders = (0..FADER_COUNT)
        .map(|i| {
            ControlSurface::new(
                format!("fader{}", i + 1),
                ControlKind::Fader,
                incontrol(Pattern::basic(INCONTROL_STATUS, FADER_START + i as u8, ANY)),
                ValueStrategy::forwarded(ValueStrategy::Data2),
            )
            .with_coordinate(0, i as i32)
        })
        .collect();
    let buttons = (0..FADER_COUNT)
        .map(|i| {
            ControlSurface::new(
                format!("fader_button{}", i + 1),
                ControlKind::Button,
                incontrol(Pattern::basic(
                    INCONTROL_STATUS,
                    FADER_BUTTON_START + i as u8,
                    ANY,
                )),
                ValueStrategy::forwarded(ValueStrategy::ButtonData2),
            )
            .with_group("Fader Buttons")
            .with_coordinate(0, i as i32)
        })
        .collect();

    Ok(Leaf::builder()
        .add_index_table(INCONTROL_STATUS, FADER_START, faders, Some(INCONTROL_PORT))?
        .add_index_table(
            INCONTROL_STATUS,
            FADER_BUTTON_START,
            buttons,
            Some(INCONTROL_PORT),
        )?
        .add_control(
            ControlSurface::new(
                "master_fader",
                ControlKind::Fader,
                incontrol(Pattern::basic(INCONTROL_STATUS, MASTER_FADER, ANY)),
                ValueStrategy::forwarded(ValueStrategy::Data2),
            )
            .with_coordinate(0, FADER_COUNT as i32),
        )
        .add_control(
            ControlSurface::new(
                "master_fader_button",
                ControlKind::Button,
                incontrol(Pattern::basic(INCONTROL_STATUS, MASTER_FADER_BUTTON, ANY)),
                ValueStrategy::forwarded(ValueStrategy::ButtonData2),
            )
            .with_group("Fader Buttons")
            .with_coordinate(0, FADER_COUNT as i32),
        )
        .build())
}

fn drum_pads() -> Leaf {
    let pads = DRUM_PADS.iter().enumerate().flat_map(|(row, notes)| {
        notes.iter().enumerate().map(move |(col, &note)| {
            ControlSurface::new(
                format!("pad{}_{}", row + 1, col + 1),
                ControlKind::DrumPad,
                incontrol(Pattern::note(note, INCONTROL_CHANNEL)),
                ValueStrategy::forwarded(ValueStrategy::Note),
            )
            .with_coordinate(row as i32, col as i32)
        })
    });
    Leaf::builder().add_controls(pads).build()
}

fn keyboard() -> Result<Leaf> {
    Ok(Leaf::builder()
        .add_indexed(generators::notes_all_channels()?)
        .add_controls(generators::pedals())
        .add_control(generators::mod_wheel())
        .add_control(generators::pitch_wheel())
        .build())
}

fn build_launchkey_mk2() -> Result<MatcherNode> {
    let metronome = Leaf::builder()
        .add_control(ControlSurface::new(
            "metronome",
            ControlKind::Transport(TransportButton::Metronome),
            incontrol(Pattern::note(METRONOME_NOTE, 0x00)),
            ValueStrategy::forwarded(ValueStrategy::Note),
        ))
        .build();

    let root = Composite::builder()
        .add(fader_set()?)
        .add(drum_pads())
        .add(metronome)
        .add(keyboard()?)
        .build();
    Ok(root.into())
}
