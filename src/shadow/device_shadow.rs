//! Device shadow - one staged shadow per control plus event bindings

use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::control::{ControlEvent, ControlSurface};
use crate::device::Device;

use super::{ControlShadow, LOG_CAT};

/// Handler run for events on a bound control; returns whether it handled the event
pub type EventCallback = Box<dyn FnMut(&mut ControlShadow, &ControlEvent) -> bool + Send>;

struct Binding {
    callback: EventCallback,
}

/// Shadows for every control of a device, plus event bindings
pub struct DeviceShadow {
    device_id: String,
    shadows: Vec<ControlShadow>,
    bound: Vec<Option<usize>>,
    bindings: Vec<Binding>,
}

impl DeviceShadow {
    pub fn new(device: &Device) -> Self {
        let shadows: Vec<ControlShadow> = device
            .controls(None)
            .into_iter()
            .map(ControlShadow::new)
            .collect();
        debug!(
            target: LOG_CAT,
            device = device.id(),
            "Shadowing {} controls",
            shadows.len()
        );
        Self {
            device_id: device.id().to_string(),
            bound: vec![None; shadows.len()],
            shadows,
            bindings: Vec::new(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Bind `callback` to every not yet bound control accepted by `predicate`
    ///
    /// Returns the number of controls bound. A binding that matches nothing is
    /// dropped.
    pub fn bind<P, F>(&mut self, predicate: P, callback: F) -> usize
    where
        P: Fn(&ControlSurface) -> bool,
        F: FnMut(&mut ControlShadow, &ControlEvent) -> bool + Send + 'static,
    {
        let binding = self.bindings.len();
        let mut count = 0;
        for (shadow, slot) in self.shadows.iter().zip(self.bound.iter_mut()) {
            if slot.is_none() && predicate(shadow.control()) {
                *slot = Some(binding);
                count += 1;
            }
        }

        if count > 0 {
            self.bindings.push(Binding {
                callback: Box::new(callback),
            });
        } else {
            warn!(target: LOG_CAT, device = %self.device_id, "Binding matched no free controls");
        }
        count
    }

    pub fn is_bound(&self, id: &str) -> bool {
        self.index_of_id(id)
            .map_or(false, |idx| self.bound[idx].is_some())
    }

    /// Stage the event's value into its control's shadow and run the binding
    ///
    /// Returns whether a binding handled the event.
    pub fn process(&mut self, event: &ControlEvent) -> bool {
        let Some(idx) = self
            .shadows
            .iter()
            .position(|s| event.is_from(s.control()))
        else {
            trace!(target: LOG_CAT, control = event.control.id(), "Event from a foreign control");
            return false;
        };

        let shadow = &mut self.shadows[idx];
        if let Err(e) = shadow.set_value(event.value) {
            warn!(target: LOG_CAT, control = event.control.id(), "{}", e);
        }

        match self.bound[idx] {
            Some(binding) => (self.bindings[binding].callback)(shadow, event),
            None => false,
        }
    }

    pub fn shadow(&self, id: &str) -> Option<&ControlShadow> {
        self.index_of_id(id).map(|idx| &self.shadows[idx])
    }

    pub fn shadow_mut(&mut self, id: &str) -> Option<&mut ControlShadow> {
        self.index_of_id(id).map(move |idx| &mut self.shadows[idx])
    }

    pub fn shadow_for(&mut self, control: &Arc<ControlSurface>) -> Option<&mut ControlShadow> {
        self.shadows
            .iter_mut()
            .find(|s| Arc::ptr_eq(s.control(), control))
    }

    pub fn shadows(&self) -> &[ControlShadow] {
        &self.shadows
    }

    /// Flush every shadow, returns how many controls were written
    pub fn apply(&mut self, thorough: bool) -> usize {
        let flushed = self
            .shadows
            .iter_mut()
            .map(|s| s.apply(thorough))
            .filter(|&flushed| flushed)
            .count();
        if flushed > 0 {
            trace!(target: LOG_CAT, device = %self.device_id, "Flushed {} controls", flushed);
        }
        flushed
    }

    fn index_of_id(&self, id: &str) -> Option<usize> {
        self.shadows.iter().position(|s| s.control().id() == id)
    }
}
