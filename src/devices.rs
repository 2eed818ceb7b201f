//! Built-in device catalog
//!
//! Each submodule describes one supported controller: how to recognise it and
//! which controls it exposes. [`register_builtin`] adds all of them to a
//! registry.

pub mod generators;
pub mod maudio;
pub mod novation;

use crate::device::DeviceRegistry;

/// Register every built-in device
pub fn register_builtin(registry: &mut DeviceRegistry) {
    registry.register_device(maudio::hammer88pro());
    registry.register_device(novation::launchkey_mk2());
}
