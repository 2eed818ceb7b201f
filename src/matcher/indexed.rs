//! Indexed fast path for contiguous control arrays
//!
//! Faders, pads and button rows are often differentiated purely by `data1`.
//! Instead of testing every control's pattern, the table checks one shared
//! pattern and indexes straight into the control list.

use std::borrow::Cow;
use std::sync::Arc;
use tracing::trace;

use crate::control::{ControlEvent, ControlSurface};
use crate::error::{Result, ValidationError};
use crate::midi::{forward, RawEvent};
use crate::pattern::{ByteMatcher, Pattern, ANY};

use super::LOG_CAT;

#[derive(Debug)]
pub struct IndexTable {
    pattern: Pattern,
    base: u8,
    port: Option<u8>,
    controls: Vec<Arc<ControlSurface>>,
}

impl IndexTable {
    /// Controls `controls[k]` answer to `(status, base + k, *)`
    ///
    /// `status` may be a set or range, e.g. to share one table between note on
    /// and note off.
    ///
    /// When `port` is set the events are expected inside a forwarding envelope
    /// from that port.
    pub fn new(
        status: impl Into<ByteMatcher>,
        base: u8,
        controls: Vec<ControlSurface>,
        port: Option<u8>,
    ) -> Result<Self> {
        if controls.is_empty() {
            return Err(ValidationError::EmptyIndexTable);
        }
        if base as usize + controls.len() > 0x80 {
            return Err(ValidationError::IndexRangeOverflow {
                base,
                count: controls.len(),
            });
        }

        let last = base + (controls.len() - 1) as u8;
        let mut pattern = Pattern::basic(status, base..=last, ANY);
        if let Some(port) = port {
            pattern = Pattern::forwarded(port, pattern);
        }

        Ok(Self {
            pattern,
            base,
            port,
            controls: controls.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn resolve(&self, event: &RawEvent) -> Option<ControlEvent> {
        if !self.pattern.matches(event) {
            return None;
        }

        let decoded = match self.port {
            Some(_) => Cow::Owned(forward::unwrap(event)?.1),
            None => Cow::Borrowed(event),
        };

        let idx = decoded.data1?.checked_sub(self.base)? as usize;
        match self.controls.get(idx) {
            Some(control) => Some(control.event_for(event)),
            None => {
                trace!(target: LOG_CAT, "Index {} outside table of {}", idx, self.controls.len());
                None
            }
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn controls(&self) -> &[Arc<ControlSurface>] {
        &self.controls
    }
}
