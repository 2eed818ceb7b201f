//! Session - one attached device from detection to control events
//!
//! Holds everything the runtime needs instead of a global context: the
//! registry, the host and the detector with its settings. Events go to
//! detection until a device is bound, then to that device's matcher tree.

use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

use crate::config::BootstrapConfig;
use crate::control::ControlEvent;
use crate::detect::{DetectionState, DeviceDetector};
use crate::device::{Device, DeviceRegistry};
use crate::host::Host;
use crate::midi::RawEvent;

pub struct Session<H: Host> {
    registry: Arc<DeviceRegistry>,
    host: H,
    detector: DeviceDetector,
}

impl<H: Host> Session<H> {
    pub fn new(registry: Arc<DeviceRegistry>, settings: BootstrapConfig, host: H) -> Self {
        Self {
            registry,
            host,
            detector: DeviceDetector::new(settings),
        }
    }

    pub fn initialise(&mut self, now: Instant) {
        self.detector.initialise(&self.registry, &mut self.host, now);
    }

    pub fn tick(&mut self, now: Instant) {
        self.detector.tick(&self.registry, &self.host, now);
    }

    /// Route an incoming event
    ///
    /// Returns the control event once a device is bound and one of its
    /// controls matches; the raw event is then marked handled.
    pub fn process_event(&mut self, event: &mut RawEvent) -> Option<ControlEvent> {
        match self.detector.state() {
            DetectionState::WaitingForDevice { .. } => {
                self.detector.process_event(&self.registry, event);
                None
            }
            DetectionState::Bound(device) => {
                let resolved = device.resolve(event);
                match &resolved {
                    Some(control_event) => {
                        event.handled = true;
                        trace!(
                            control = control_event.control.id(),
                            value = control_event.value,
                            "Resolved {}",
                            event
                        );
                    }
                    None => trace!("No control for {}", event),
                }
                resolved
            }
            DetectionState::Unrecognized => None,
        }
    }

    pub fn state(&self) -> &DetectionState {
        self.detector.state()
    }

    pub fn device(&self) -> Option<&Device> {
        self.detector.device()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }
}
