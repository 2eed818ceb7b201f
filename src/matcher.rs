//! Control matcher tree
//!
//! Resolves a raw event to at most one [`ControlEvent`]. Leaves hold priority
//! groups of controls (scanned in order, or dispatched through an
//! [`IndexTable`]); composites hold prioritised child nodes. At every level the
//! highest priority is tried first and registration order breaks ties, so the
//! outcome is deterministic even when patterns overlap.
//!
//! Trees are built once when a device is created and never change afterwards.

pub mod indexed;

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::control::{ControlEvent, ControlSurface};
use crate::error::Result;
use crate::midi::RawEvent;

pub use indexed::IndexTable;

pub(crate) const LOG_CAT: &str = "device.matcher";

/// Priority given to entries registered without one; evaluated first
pub const DEFAULT_PRIORITY: i32 = i32::MAX;

#[derive(Debug)]
pub enum MatcherNode {
    Leaf(Leaf),
    Composite(Composite),
}

impl MatcherNode {
    pub fn resolve(&self, event: &RawEvent) -> Option<ControlEvent> {
        match self {
            MatcherNode::Leaf(leaf) => leaf.resolve(event),
            MatcherNode::Composite(composite) => composite.resolve(event),
        }
    }

    /// Names of every group reachable from this node
    pub fn groups(&self) -> BTreeSet<String> {
        let mut groups = BTreeSet::new();
        self.visit(&mut |c| {
            groups.insert(c.group().to_string());
        });
        groups
    }

    /// Controls reachable from this node, in evaluation order
    pub fn controls(&self, group: Option<&str>) -> Vec<Arc<ControlSurface>> {
        let mut controls = Vec::new();
        self.visit(&mut |c| {
            if group.map_or(true, |g| c.group() == g) {
                controls.push(Arc::clone(c));
            }
        });
        controls
    }

    /// Find a control by id
    pub fn control(&self, id: &str) -> Option<Arc<ControlSurface>> {
        self.controls(None).into_iter().find(|c| c.id() == id)
    }

    fn visit(&self, f: &mut dyn FnMut(&Arc<ControlSurface>)) {
        match self {
            MatcherNode::Leaf(leaf) => {
                for control in leaf.groups.iter().flat_map(|g| g.controls()) {
                    f(control);
                }
            }
            MatcherNode::Composite(composite) => {
                for (_, child) in &composite.children {
                    child.visit(f);
                }
            }
        }
    }
}

impl From<Leaf> for MatcherNode {
    fn from(leaf: Leaf) -> Self {
        MatcherNode::Leaf(leaf)
    }
}

impl From<Composite> for MatcherNode {
    fn from(composite: Composite) -> Self {
        MatcherNode::Composite(composite)
    }
}

/// Priority-ordered groups of controls
#[derive(Debug, Default)]
pub struct Leaf {
    groups: Vec<ControlGroup>,
}

#[derive(Debug)]
struct ControlGroup {
    priority: i32,
    body: GroupBody,
}

#[derive(Debug)]
enum GroupBody {
    Scan(Vec<Arc<ControlSurface>>),
    Indexed(IndexTable),
}

impl ControlGroup {
    fn resolve(&self, event: &RawEvent) -> Option<ControlEvent> {
        match &self.body {
            GroupBody::Scan(controls) => controls.iter().find_map(|c| c.try_match(event)),
            GroupBody::Indexed(table) => table.resolve(event),
        }
    }

    fn controls(&self) -> &[Arc<ControlSurface>] {
        match &self.body {
            GroupBody::Scan(controls) => controls,
            GroupBody::Indexed(table) => table.controls(),
        }
    }
}

impl Leaf {
    pub fn builder() -> LeafBuilder {
        LeafBuilder::default()
    }

    pub fn resolve(&self, event: &RawEvent) -> Option<ControlEvent> {
        self.groups.iter().find_map(|g| g.resolve(event))
    }
}

#[derive(Debug, Default)]
pub struct LeafBuilder {
    groups: Vec<ControlGroup>,
}

impl LeafBuilder {
    pub fn add_control(self, control: ControlSurface) -> Self {
        self.add_control_with_priority(control, DEFAULT_PRIORITY)
    }

    /// Add a scanned control
    ///
    /// Consecutive controls at the same priority share one scan group; an
    /// indexed table registered in between starts a new one, keeping
    /// registration order intact.
    pub fn add_control_with_priority(mut self, control: ControlSurface, priority: i32) -> Self {
        let control = Arc::new(control);
        let last_at_priority = self
            .groups
            .iter_mut()
            .rev()
            .find(|g| g.priority == priority);

        match last_at_priority {
            Some(ControlGroup {
                body: GroupBody::Scan(controls),
                ..
            }) => controls.push(control),
            _ => self.groups.push(ControlGroup {
                priority,
                body: GroupBody::Scan(vec![control]),
            }),
        }
        self
    }

    pub fn add_controls(self, controls: impl IntoIterator<Item = ControlSurface>) -> Self {
        controls
            .into_iter()
            .fold(self, |builder, control| builder.add_control(control))
    }

    pub fn add_indexed(self, table: IndexTable) -> Self {
        self.add_indexed_with_priority(table, DEFAULT_PRIORITY)
    }

    pub fn add_indexed_with_priority(mut self, table: IndexTable, priority: i32) -> Self {
        self.groups.push(ControlGroup {
            priority,
            body: GroupBody::Indexed(table),
        });
        self
    }

    /// Convenience for [`IndexTable::new`] followed by [`Self::add_indexed`]
    pub fn add_index_table(
        self,
        status: impl Into<crate::pattern::ByteMatcher>,
        base: u8,
        controls: Vec<ControlSurface>,
        port: Option<u8>,
    ) -> Result<Self> {
        Ok(self.add_indexed(IndexTable::new(status, base, controls, port)?))
    }

    pub fn build(mut self) -> Leaf {
        // Stable: equal priorities keep registration order
        self.groups.sort_by(|a, b| b.priority.cmp(&a.priority));
        Leaf {
            groups: self.groups,
        }
    }
}

/// Prioritised child matchers, each tried as a unit
#[derive(Debug, Default)]
pub struct Composite {
    children: Vec<(i32, MatcherNode)>,
}

impl Composite {
    pub fn builder() -> CompositeBuilder {
        CompositeBuilder::default()
    }

    pub fn resolve(&self, event: &RawEvent) -> Option<ControlEvent> {
        self.children
            .iter()
            .find_map(|(_, child)| child.resolve(event))
    }
}

#[derive(Debug, Default)]
pub struct CompositeBuilder {
    children: Vec<(i32, MatcherNode)>,
}

impl CompositeBuilder {
    pub fn add(self, child: impl Into<MatcherNode>) -> Self {
        self.add_with_priority(child, DEFAULT_PRIORITY)
    }

    pub fn add_with_priority(mut self, child: impl Into<MatcherNode>, priority: i32) -> Self {
        self.children.push((priority, child.into()));
        self
    }

    pub fn build(mut self) -> Composite {
        self.children.sort_by(|a, b| b.0.cmp(&a.0));
        Composite {
            children: self.children,
        }
    }
}
