//! Serializable circuit state.
//!
//! Every field has a default, so snapshots written by tools that drop
//! empty or false fields still restore.

use arcstr::ArcStr;
use chipdef::{Catalog, Position, Wire};
use serde::{Deserialize, Serialize};

use crate::instance::{Body, Instance, PinStates};

/// The state of a whole circuit.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// The clock counter.
    pub clock: u64,
    /// The top-level instances.
    pub instances: Vec<InstanceSnapshot>,
    /// The top-level wires.
    pub wires: Vec<Wire>,
}

/// The state of one instance and, for composites, its internals.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceSnapshot {
    /// The instance ID.
    pub id: ArcStr,
    /// The chip type.
    #[serde(rename = "type")]
    pub chip: ArcStr,
    /// The cosmetic position.
    pub position: Option<Position>,
    /// Whether a viewer draws the internals.
    pub expanded: bool,
    /// The scalar output.
    pub value: bool,
    /// The latched value of an edge-triggered instance.
    pub next_value: bool,
    /// The last resolved inputs.
    pub inputs: PinStates,
    /// The named outputs.
    pub outputs: PinStates,
    /// The internal instances of a composite.
    pub internals: Vec<InstanceSnapshot>,
}

impl From<&Instance> for InstanceSnapshot {
    fn from(instance: &Instance) -> Self {
        Self {
            id: instance.id.clone(),
            chip: instance.chip.clone(),
            position: instance.position,
            expanded: instance.expanded,
            value: instance.value,
            next_value: instance.next_value,
            inputs: instance.inputs.clone(),
            outputs: instance.outputs.clone(),
            internals: instance
                .internals()
                .map(|internals| internals.components().iter().map(Into::into).collect())
                .unwrap_or_default(),
        }
    }
}

impl InstanceSnapshot {
    /// Rebuilds an instance from the catalog, then overlays the saved state.
    pub fn restore(&self, catalog: &Catalog) -> Instance {
        let mut instance = Instance::new(
            catalog,
            self.chip.clone(),
            self.id.clone(),
            self.position,
        );
        self.overlay(&mut instance);
        instance
    }

    /// Copies saved state onto an instance whose structure came from the catalog.
    ///
    /// Saved internals are matched to the rebuilt ones by ID; saved
    /// internals with no counterpart are ignored.
    fn overlay(&self, instance: &mut Instance) {
        instance.expanded = self.expanded;
        instance.value = self.value;
        instance.next_value = self.next_value;
        instance.inputs = self.inputs.clone();
        instance.outputs = self.outputs.clone();
        match instance.body {
            // Flip-flops only drive `OUT` on a tick, so it must agree with `value` now.
            Body::Primitive(_) if self.outputs.is_empty() => instance.drive(self.value),
            Body::Composite(ref mut internals) => {
                for saved in self.internals.iter() {
                    if let Some(component) = internals
                        .components
                        .iter_mut()
                        .find(|component| component.id == saved.id)
                    {
                        saved.overlay(component);
                    }
                }
            }
            _ => {}
        }
    }
}
