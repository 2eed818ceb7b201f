//! Device type detection
//!
//! Works out which registered device is attached:
//!
//! 1. configured name associations, checked against the name the host reports
//! 2. a universal device enquiry, matched against each device's response pattern
//! 3. after the timeout (or straight away with `skip_enquiry`), each device's
//!    name matcher
//!
//! Detection ends in [`DetectionState::Bound`] or [`DetectionState::Unrecognized`]
//! and never leaves those states. Time is passed in by the caller, the timeout
//! is only noticed on [`DeviceDetector::tick`].

use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::BootstrapConfig;
use crate::device::{Device, DeviceDescriptor, DeviceRegistry};
use crate::host::Host;
use crate::midi::{format_hex, RawEvent, UNIVERSAL_ENQUIRY};

pub const LOG_CAT: &str = "bootstrap.device.type_detect";

#[derive(Debug)]
pub enum DetectionState {
    WaitingForDevice {
        /// Set by [`DeviceDetector::initialise`]
        started_at: Option<Instant>,
        timeout: Duration,
    },
    Bound(Device),
    Unrecognized,
}

impl DetectionState {
    pub fn is_waiting(&self) -> bool {
        matches!(self, DetectionState::WaitingForDevice { .. })
    }

    pub fn device(&self) -> Option<&Device> {
        match self {
            DetectionState::Bound(device) => Some(device),
            _ => None,
        }
    }
}

impl fmt::Display for DetectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionState::WaitingForDevice { .. } => write!(f, "waiting for device"),
            DetectionState::Bound(device) => write!(f, "bound to {}", device.id()),
            DetectionState::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

#[derive(Debug)]
pub struct DeviceDetector {
    settings: BootstrapConfig,
    state: DetectionState,
}

impl DeviceDetector {
    pub fn new(settings: BootstrapConfig) -> Self {
        let timeout = settings.timeout();
        Self {
            settings,
            state: DetectionState::WaitingForDevice {
                started_at: None,
                timeout,
            },
        }
    }

    pub fn settings(&self) -> &BootstrapConfig {
        &self.settings
    }

    pub fn state(&self) -> &DetectionState {
        &self.state
    }

    pub fn device(&self) -> Option<&Device> {
        self.state.device()
    }

    /// Start detection
    ///
    /// Binds straight away through a name association, otherwise sends the
    /// enquiry (or falls back by name when enquiries are disabled).
    pub fn initialise<H: Host + ?Sized>(
        &mut self,
        registry: &DeviceRegistry,
        host: &mut H,
        now: Instant,
    ) {
        match &mut self.state {
            DetectionState::WaitingForDevice {
                started_at: started @ None,
                ..
            } => *started = Some(now),
            DetectionState::WaitingForDevice { .. } => {
                debug!(target: LOG_CAT, "Detection already started");
                return;
            }
            state => {
                debug!(target: LOG_CAT, state = %state, "Already detected, ignoring initialise");
                return;
            }
        }

        let name = host.device_name();
        if self.try_name_associations(registry, &name) {
            return;
        }

        if self.settings.skip_enquiry {
            info!(target: LOG_CAT, "Enquiry disabled, recognising by name");
            self.fallback(registry, &name);
        } else {
            debug!(
                target: LOG_CAT,
                sysex = %format_hex(&UNIVERSAL_ENQUIRY),
                "Sending universal device enquiry"
            );
            host.send_sysex(&UNIVERSAL_ENQUIRY);
        }
    }

    fn try_name_associations(&mut self, registry: &DeviceRegistry, name: &str) -> bool {
        let ids: Vec<String> = self
            .settings
            .name_associations
            .iter()
            .filter(|(associated, _)| associated == name)
            .map(|(_, id)| id.clone())
            .collect();

        for id in ids {
            match registry.device_by_id(&id) {
                Some(descriptor) => {
                    if self.bind(descriptor, "name association") {
                        return true;
                    }
                }
                None => error!(
                    target: LOG_CAT,
                    name = %name,
                    id = %id,
                    "Name association refers to an unknown device. Check that the id in \
                     bootstrap.name_associations matches a registered device"
                ),
            }
        }
        false
    }

    /// Feed an event while waiting for the enquiry response
    ///
    /// Only sysex is looked at. A recognised response is marked handled.
    /// Devices are tried in registration order; one that fails to build is
    /// skipped.
    pub fn process_event(&mut self, registry: &DeviceRegistry, event: &mut RawEvent) {
        if !self.state.is_waiting() || !event.is_sysex() {
            return;
        }

        let response: &RawEvent = event;
        let mut candidates = registry
            .devices()
            .iter()
            .filter(|d| d.matches_enquiry(response))
            .peekable();

        if candidates.peek().is_none() {
            debug!(
                target: LOG_CAT,
                sysex = %response,
                "Sysex is not a known enquiry response"
            );
            return;
        }

        if candidates.any(|descriptor| self.bind(descriptor, "enquiry response")) {
            event.handled = true;
        }
    }

    /// Fall back to name matching once the timeout has passed
    pub fn tick<H: Host + ?Sized>(&mut self, registry: &DeviceRegistry, host: &H, now: Instant) {
        let DetectionState::WaitingForDevice {
            started_at: Some(started_at),
            timeout,
        } = self.state
        else {
            return;
        };

        if now.saturating_duration_since(started_at) > timeout {
            info!(target: LOG_CAT, timeout = ?timeout, "No enquiry response, recognising by name");
            self.fallback(registry, &host.device_name());
        }
    }

    /// Recognise the device by its reported name, first buildable match wins
    fn fallback(&mut self, registry: &DeviceRegistry, name: &str) {
        let recognised = registry
            .devices()
            .iter()
            .filter(|d| d.matches_name(name))
            .any(|descriptor| self.bind(descriptor, "device name"));

        if !recognised {
            warn!(target: LOG_CAT, name = %name, "Device not recognised");
            self.state = DetectionState::Unrecognized;
        }
    }

    fn bind(&mut self, descriptor: &DeviceDescriptor, reason: &str) -> bool {
        match descriptor.create() {
            Ok(device) => {
                info!(target: LOG_CAT, id = descriptor.id(), via = reason, "Device recognised");
                self.state = DetectionState::Bound(device);
                true
            }
            Err(e) => {
                error!(target: LOG_CAT, id = descriptor.id(), "Failed to build device: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests;
