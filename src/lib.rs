//! ctrlsurf - MIDI control surface runtime
//!
//! Identifies the attached controller, resolves its raw MIDI events to
//! logical controls and stages output state back to them.

pub mod config;
pub mod control;
pub mod detect;
pub mod device;
pub mod devices;
pub mod error;
pub mod host;
pub mod matcher;
pub mod midi;
pub mod pattern;
pub mod session;
pub mod shadow;

pub use control::{ControlEvent, ControlKind, ControlSurface, ValueStrategy};
pub use detect::{DetectionState, DeviceDetector};
pub use device::{Device, DeviceDescriptor, DeviceQuery, DeviceRegistry, NameMatcher};
pub use error::ValidationError;
pub use matcher::MatcherNode;
pub use midi::RawEvent;
pub use pattern::{Pattern, UnionPattern};
pub use session::Session;
pub use shadow::{ControlShadow, DeviceShadow};
