//! Control surfaces - logical hardware controls
//!
//! A control is identity (id, kind, group, coordinate) plus a [`Pattern`]
//! identifying its messages and a [`ValueStrategy`] decoding them. The last
//! committed output state (value, color, annotation) lives behind a lock so
//! controls can be shared between the matcher tree and the shadows bound to
//! them.

pub mod strategy;

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

use crate::midi::RawEvent;
use crate::pattern::Pattern;

pub use strategy::ValueStrategy;

/// Distance within which [`snap`] pulls a value onto its target
pub const SNAP_AMOUNT: f32 = 0.02;

/// Kind of hardware control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Button,
    Transport(TransportButton),
    Fader,
    Knob,
    Encoder,
    DrumPad,
    Note,
    ModWheel,
    PitchWheel,
    Pedal,
    Aftertouch,
    /// Matched but intentionally ignored (clock, active sensing, ...)
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportButton {
    Play,
    Stop,
    Record,
    Rewind,
    FastForward,
    Loop,
    Metronome,
}

impl ControlKind {
    /// Group used when a control doesn't name one
    pub fn default_group(&self) -> &'static str {
        match self {
            ControlKind::Button => "Buttons",
            ControlKind::Transport(_) => "Transport",
            ControlKind::Fader => "Faders",
            ControlKind::Knob => "Knobs",
            ControlKind::Encoder => "Encoders",
            ControlKind::DrumPad => "Drum Pads",
            ControlKind::Note => "Notes",
            ControlKind::ModWheel | ControlKind::PitchWheel => "Wheels",
            ControlKind::Pedal => "Pedals",
            ControlKind::Aftertouch => "Aftertouch",
            ControlKind::Null => "Null",
        }
    }

    /// Whether the control reports press/release rather than a position
    pub fn is_button(&self) -> bool {
        matches!(
            self,
            ControlKind::Button | ControlKind::Transport(_) | ControlKind::DrumPad
        )
    }
}

/// RGB color shown on a control
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// From a `0xRRGGBB` value
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }

    pub fn is_black(&self) -> bool {
        *self == Color::default()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Output state committed to a control
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlState {
    pub value: f32,
    pub color: Color,
    pub annotation: String,
}

/// A logical hardware control
pub struct ControlSurface {
    id: String,
    kind: ControlKind,
    pattern: Pattern,
    strategy: ValueStrategy,
    group: String,
    coordinate: (i32, i32),
    state: RwLock<ControlState>,
}

impl ControlSurface {
    pub fn new(
        id: impl Into<String>,
        kind: ControlKind,
        pattern: Pattern,
        strategy: ValueStrategy,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            pattern,
            strategy,
            group: kind.default_group().to_string(),
            coordinate: (0, 0),
            state: RwLock::new(ControlState::default()),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_coordinate(mut self, row: i32, col: i32) -> Self {
        self.coordinate = (row, col);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn strategy(&self) -> &ValueStrategy {
        &self.strategy
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn coordinate(&self) -> (i32, i32) {
        self.coordinate
    }

    /// Match `event` against this control's pattern and decode it
    pub fn try_match(self: &Arc<Self>, event: &RawEvent) -> Option<ControlEvent> {
        if self.pattern.matches(event) {
            Some(self.event_for(event))
        } else {
            None
        }
    }

    /// Build the control event for an event already known to belong here
    pub(crate) fn event_for(self: &Arc<Self>, event: &RawEvent) -> ControlEvent {
        ControlEvent {
            raw: event.clone(),
            control: Arc::clone(self),
            value: self.strategy.decode(event),
        }
    }

    /// Last committed value
    pub fn value(&self) -> f32 {
        self.state.read().value
    }

    /// Last committed color
    pub fn color(&self) -> Color {
        self.state.read().color
    }

    /// Last committed annotation
    pub fn annotation(&self) -> String {
        self.state.read().annotation.clone()
    }

    /// Snapshot of the committed state
    pub fn state(&self) -> ControlState {
        self.state.read().clone()
    }

    /// Replace the committed state in a single write
    pub(crate) fn commit(&self, state: ControlState) {
        *self.state.write() = state;
    }
}

impl fmt::Debug for ControlSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlSurface")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("group", &self.group)
            .field("coordinate", &self.coordinate)
            .finish()
    }
}

impl fmt::Display for ControlSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {:?})",
            self.id, self.group, self.coordinate
        )
    }
}

/// A raw event bound to the control it matched, with its decoded value
#[derive(Debug, Clone)]
pub struct ControlEvent {
    pub raw: RawEvent,
    pub control: Arc<ControlSurface>,
    pub value: f32,
}

impl ControlEvent {
    /// Whether the event came from `control`
    pub fn is_from(&self, control: &Arc<ControlSurface>) -> bool {
        Arc::ptr_eq(&self.control, control)
    }
}

/// Pull `value` onto `to` when it lies within [`SNAP_AMOUNT`]
pub fn snap(value: f32, to: f32, enabled: bool) -> f32 {
    if enabled && (value - to).abs() <= SNAP_AMOUNT {
        to
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::ANY;

    fn fader() -> Arc<ControlSurface> {
        Arc::new(
            ControlSurface::new(
                "fader1",
                ControlKind::Fader,
                Pattern::basic(0xB0, 0x29, ANY),
                ValueStrategy::Data2,
            )
            .with_coordinate(0, 1),
        )
    }

    #[test]
    fn test_try_match_decodes_value() {
        let control = fader();
        let event = control.try_match(&RawEvent::standard(0xB0, 0x29, 127)).unwrap();
        assert_eq!(event.value, 1.0);
        assert!(event.is_from(&control));
        assert_eq!(event.raw.data1, Some(0x29));

        assert!(control.try_match(&RawEvent::standard(0xB0, 0x2A, 127)).is_none());
    }

    #[test]
    fn test_identity_defaults() {
        let control = fader();
        assert_eq!(control.group(), "Faders");
        assert_eq!(control.coordinate(), (0, 1));
        assert_eq!(control.to_string(), "fader1 (Faders, (0, 1))");
        assert!(!control.kind().is_button());
        assert!(ControlKind::Transport(TransportButton::Play).is_button());
    }

    #[test]
    fn test_commit_replaces_state() {
        let control = fader();
        assert_eq!(control.state(), ControlState::default());

        control.commit(ControlState {
            value: 0.5,
            color: Color::from_hex(0xFF8000),
            annotation: "Volume".into(),
        });
        assert_eq!(control.value(), 0.5);
        assert_eq!(control.color(), Color::from_rgb(0xFF, 0x80, 0x00));
        assert_eq!(control.annotation(), "Volume");
    }

    #[test]
    fn test_color_display() {
        assert_eq!(Color::from_hex(0x00FF10).to_string(), "#00FF10");
        assert!(Color::default().is_black());
    }

    #[test]
    fn test_snap() {
        assert_eq!(snap(0.51, 0.5, true), 0.5);
        assert_eq!(snap(0.51, 0.5, false), 0.51);
        assert_eq!(snap(0.6, 0.5, true), 0.6);
    }
}
