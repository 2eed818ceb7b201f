//! Devices and the device registry
//!
//! A [`DeviceDescriptor`] is what gets registered at startup: an id, how to
//! recognise the device (port name, enquiry response) and a factory for its
//! matcher tree. [`DeviceDescriptor::create`] turns it into a [`Device`] with
//! fresh controls for one session.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::control::{ControlEvent, ControlSurface};
use crate::error::Result;
use crate::matcher::MatcherNode;
use crate::midi::RawEvent;
use crate::pattern::Pattern;

const LOG_CAT: &str = "bootstrap.device.registry";

/// Predicate over the device name reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatcher {
    /// Device is only recognised through its enquiry response
    Never,
    Exact(String),
    Prefix(String),
    /// Case-insensitive substring
    Contains(String),
    AnyOf(Vec<NameMatcher>),
}

impl NameMatcher {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameMatcher::Never => false,
            NameMatcher::Exact(expected) => name == expected,
            NameMatcher::Prefix(prefix) => name.starts_with(prefix.as_str()),
            NameMatcher::Contains(needle) => name.to_lowercase().contains(&needle.to_lowercase()),
            NameMatcher::AnyOf(matchers) => matchers.iter().any(|m| m.matches(name)),
        }
    }
}

/// Builds the matcher tree of a device
pub type BuildFn = fn() -> Result<MatcherNode>;

/// Registration entry for a supported device
#[derive(Clone)]
pub struct DeviceDescriptor {
    id: String,
    name_matcher: NameMatcher,
    enquiry_response: Pattern,
    build: BuildFn,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, build: BuildFn) -> Self {
        Self {
            id: id.into(),
            name_matcher: NameMatcher::Never,
            enquiry_response: Pattern::Null,
            build,
        }
    }

    pub fn with_name_matcher(mut self, name_matcher: NameMatcher) -> Self {
        self.name_matcher = name_matcher;
        self
    }

    pub fn with_enquiry_response(mut self, pattern: Pattern) -> Self {
        self.enquiry_response = pattern;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name_matcher(&self) -> &NameMatcher {
        &self.name_matcher
    }

    pub fn enquiry_response(&self) -> &Pattern {
        &self.enquiry_response
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name_matcher.matches(name)
    }

    pub fn matches_enquiry(&self, event: &RawEvent) -> bool {
        self.enquiry_response.matches(event)
    }

    /// Build a device with fresh controls
    pub fn create(&self) -> Result<Device> {
        let root = (self.build)()?;
        Ok(Device::new(
            self.id.clone(),
            root,
            self.name_matcher.clone(),
            self.enquiry_response.clone(),
        ))
    }
}

impl fmt::Debug for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceDescriptor")
            .field("id", &self.id)
            .field("name_matcher", &self.name_matcher)
            .finish()
    }
}

/// A device bound to a session
#[derive(Debug)]
pub struct Device {
    id: String,
    root: MatcherNode,
    name_matcher: NameMatcher,
    enquiry_response: Pattern,
}

impl Device {
    pub fn new(
        id: impl Into<String>,
        root: MatcherNode,
        name_matcher: NameMatcher,
        enquiry_response: Pattern,
    ) -> Self {
        Self {
            id: id.into(),
            root,
            name_matcher,
            enquiry_response,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> &MatcherNode {
        &self.root
    }

    pub fn name_matcher(&self) -> &NameMatcher {
        &self.name_matcher
    }

    pub fn enquiry_response(&self) -> &Pattern {
        &self.enquiry_response
    }

    pub fn resolve(&self, event: &RawEvent) -> Option<ControlEvent> {
        self.root.resolve(event)
    }

    pub fn groups(&self) -> BTreeSet<String> {
        self.root.groups()
    }

    pub fn controls(&self, group: Option<&str>) -> Vec<Arc<ControlSurface>> {
        self.root.controls(group)
    }

    pub fn control(&self, id: &str) -> Option<Arc<ControlSurface>> {
        self.root.control(id)
    }
}

/// Registry lookup key
#[derive(Debug, Clone, Copy)]
pub enum DeviceQuery<'a> {
    /// Device name reported by the host
    Name(&'a str),
    /// Enquiry response sysex
    Sysex(&'a RawEvent),
}

/// Supported devices, in registration order
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<DeviceDescriptor>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every device shipped with the crate
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::devices::register_builtin(&mut registry);
        registry
    }

    /// Register a device, returns false if the id is already known
    pub fn register_device(&mut self, descriptor: DeviceDescriptor) -> bool {
        if self.device_by_id(descriptor.id()).is_some() {
            debug!(target: LOG_CAT, id = descriptor.id(), "Device already registered");
            return false;
        }
        info!(target: LOG_CAT, id = descriptor.id(), "Registered device");
        self.devices.push(descriptor);
        true
    }

    pub fn device_by_id(&self, id: &str) -> Option<&DeviceDescriptor> {
        self.devices.iter().find(|d| d.id() == id)
    }

    /// First registered device accepting the name or enquiry response
    pub fn get_device(&self, query: DeviceQuery<'_>) -> Option<&DeviceDescriptor> {
        match query {
            DeviceQuery::Name(name) => self.devices.iter().find(|d| d.matches_name(name)),
            DeviceQuery::Sysex(event) => self.devices.iter().find(|d| d.matches_enquiry(event)),
        }
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
