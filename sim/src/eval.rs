//! Combinational evaluation.
//!
//! Every pass recomputes every instance from the current state of its
//! scope, so the fixed point reached does not depend on instance order.
//! Composite instances run one pass over their internals per pass over
//! their parent scope.

use chipdef::{Catalog, ChipDefinition, PrimitiveKind, Wire};
use serde::{Deserialize, Serialize};
use tracing::{span, Level};

use crate::instance::{find, Body, Instance, PinStates};
use crate::pins::{assign_pins, declared_inputs};
use crate::SimOptions;

/// The outcome of settling a circuit.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SettleReport {
    /// The number of passes performed.
    pub passes: usize,
    /// Whether the last pass changed nothing.
    ///
    /// `false` means the pass limit was hit first, which usually indicates
    /// a combinational feedback loop.
    pub converged: bool,
}

/// Evaluates `instances` until nothing changes or the pass limit is reached.
///
/// At least one pass always runs, even with a limit of 0.
pub fn settle(
    catalog: &Catalog,
    instances: &mut [Instance],
    wires: &[Wire],
    options: &SimOptions,
) -> SettleReport {
    let _guard = span!(Level::DEBUG, "settle", instances = instances.len()).entered();
    let top = PinStates::new();
    let mut passes = 0;
    let mut changed = true;
    let limit = options.max_passes.max(1);
    while changed && passes < limit {
        passes += 1;
        changed = evaluate_scope(catalog, instances, wires, &top);
    }
    tracing::debug!(passes, converged = !changed, "settled");
    SettleReport {
        passes,
        converged: !changed,
    }
}

/// Runs a single pass over a scope.
///
/// `inherited` holds the inputs of the enclosing composite, which internal
/// wires may name as sources. Returns `true` if anything in the scope,
/// including nested scopes, changed.
pub(crate) fn evaluate_scope(
    catalog: &Catalog,
    instances: &mut [Instance],
    wires: &[Wire],
    inherited: &PinStates,
) -> bool {
    let mut changed = false;
    for idx in 0..instances.len() {
        let inputs = resolve_inputs(catalog, &instances[idx], instances, wires, inherited);
        changed |= evaluate_instance(catalog, &mut instances[idx], inputs);
    }
    changed
}

fn resolve_inputs(
    catalog: &Catalog,
    target: &Instance,
    scope: &[Instance],
    wires: &[Wire],
    inherited: &PinStates,
) -> PinStates {
    let declared = declared_inputs(catalog, &target.chip);
    let mut inputs = PinStates::new();
    for (wire, pin) in assign_pins(declared, wires, &target.id) {
        let bit = match find(scope, &wire.from) {
            Some(source) => match &wire.from_pin {
                Some(pin) => source.output(pin),
                None => source.value,
            },
            None => inherited.get(&wire.from).copied().unwrap_or(false),
        };
        inputs.insert(pin.clone(), bit);
    }
    inputs
}

fn evaluate_instance(catalog: &Catalog, instance: &mut Instance, inputs: PinStates) -> bool {
    let mut changed = false;
    if instance.inputs != inputs {
        instance.inputs = inputs;
        changed = true;
    }
    let value = instance.value;
    let next_value = instance.next_value;

    match instance.body {
        Body::Unknown => changed |= set_scalar(instance, false),
        Body::Primitive(PrimitiveKind::Input) => changed |= set_scalar(instance, value),
        Body::Primitive(PrimitiveKind::Dff) => {
            let declared = declared_inputs(catalog, &instance.chip);
            instance.next_value = declared
                .first()
                .and_then(|pin| instance.inputs.get(pin))
                .copied()
                .unwrap_or(false);
        }
        Body::Primitive(kind) => {
            let declared = declared_inputs(catalog, &instance.chip);
            let bit = |i: usize| {
                declared
                    .get(i)
                    .and_then(|pin| instance.inputs.get(pin))
                    .copied()
                    .unwrap_or(false)
            };
            let out = kind.evaluate(bit(0), bit(1), value);
            changed |= set_scalar(instance, out);
        }
        Body::Composite(ref mut internals) => {
            changed |= evaluate_scope(
                catalog,
                &mut internals.components,
                &internals.wires,
                &instance.inputs,
            );
            if let Some(ChipDefinition::Composite(def)) = catalog.get(&instance.chip) {
                let mapping = def.io_mapping();
                for (pin, tap) in mapping.outputs.iter() {
                    let bit = match find(&internals.components, &tap.id) {
                        Some(source) => match tap
                            .pin
                            .as_ref()
                            .and_then(|pin| source.outputs.get(pin))
                        {
                            Some(bit) => *bit,
                            None => source.value,
                        },
                        None => false,
                    };
                    if instance.outputs.insert(pin.clone(), bit) != Some(bit) {
                        changed = true;
                    }
                }
                if let Some(id) = &mapping.output {
                    instance.value = find(&internals.components, id)
                        .map(|source| source.value)
                        .unwrap_or(false);
                }
            }
        }
    }

    changed || instance.value != value || instance.next_value != next_value
}

/// Drives a primitive's scalar value and `OUT` pin. Returns `true` on change.
fn set_scalar(instance: &mut Instance, value: bool) -> bool {
    let before = instance.outputs.len() == 1 && instance.output(chipdef::OUT) == value;
    let changed = instance.value != value || !before;
    instance.drive(value);
    changed
}
