//! Control shadows - staged output state
//!
//! Mapping logic writes into a [`ControlShadow`] instead of the control
//! itself. Any number of writers can touch the same shadow during a tick;
//! [`ControlShadow::apply`] then commits value, color and annotation in one go.

pub mod device_shadow;

use std::sync::Arc;

use crate::control::{Color, ControlState, ControlSurface};
use crate::error::{Result, ValidationError};

pub use device_shadow::DeviceShadow;

pub(crate) const LOG_CAT: &str = "device.shadow";

#[derive(Debug)]
pub struct ControlShadow {
    control: Arc<ControlSurface>,
    value: f32,
    color: Color,
    annotation: String,
    dirty: bool,
}

impl ControlShadow {
    pub fn new(control: Arc<ControlSurface>) -> Self {
        Self {
            control,
            value: 0.0,
            color: Color::default(),
            annotation: String::new(),
            dirty: false,
        }
    }

    pub fn control(&self) -> &Arc<ControlSurface> {
        &self.control
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn annotation(&self) -> &str {
        &self.annotation
    }

    pub fn group(&self) -> &str {
        self.control.group()
    }

    pub fn coordinate(&self) -> (i32, i32) {
        self.control.coordinate()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Stage a new value
    ///
    /// Values outside `[0, 1]` (and NaN) are rejected without touching the
    /// staged state.
    pub fn set_value(&mut self, value: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::ValueOutOfRange { value });
        }
        if self.value != value {
            self.value = value;
            self.dirty = true;
        }
        Ok(())
    }

    pub fn set_color(&mut self, color: Color) {
        if self.color != color {
            self.color = color;
            self.dirty = true;
        }
    }

    pub fn set_annotation(&mut self, annotation: impl Into<String>) {
        let annotation = annotation.into();
        if self.annotation != annotation {
            self.annotation = annotation;
            self.dirty = true;
        }
    }

    /// Commit the staged state to the control
    ///
    /// Flushes when `thorough` is set or something changed since the last
    /// flush. Returns whether the control was written.
    pub fn apply(&mut self, thorough: bool) -> bool {
        if !(thorough || self.dirty) {
            return false;
        }
        self.control.commit(ControlState {
            value: self.value,
            color: self.color,
            annotation: self.annotation.clone(),
        });
        self.dirty = false;
        true
    }
}
