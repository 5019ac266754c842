//! Netlist assembly.
//!
//! Assembly runs in two passes: all instances are created first, so that
//! wire resolution can look up the type of any target regardless of where
//! it was declared.

use std::collections::HashSet;

use chipdef::{Catalog, Wire, INPUT};
use diagnostics::{IssueSet, Severity};
use netasm::{Program, WirePins};
use tracing::{span, Level};

use crate::instance::{find, Instance};
use crate::issues::{Cause, SimIssue};
use crate::pins::{assign_pins, declared_inputs};

/// Builds the top-level instances and wires of a program.
pub(crate) fn build(
    catalog: &Catalog,
    program: &Program,
    issues: &mut IssueSet<SimIssue>,
) -> (Vec<Instance>, Vec<Wire>) {
    let _guard = span!(Level::INFO, "assembling netlist").entered();

    let mut ids = HashSet::new();
    let mut instances = Vec::new();
    for decl in program.instances() {
        if !ids.insert(decl.id.clone()) {
            issues.add(SimIssue::new_and_log(
                Cause::DuplicateInstanceId {
                    id: decl.id.clone(),
                },
                Severity::Warning,
            ));
        }
        if decl.chip != INPUT && !catalog.contains(&decl.chip) {
            issues.add(SimIssue::new_and_log(
                Cause::UnknownChipType {
                    id: decl.id.clone(),
                    chip: decl.chip.clone(),
                },
                Severity::Info,
            ));
        }
        instances.push(Instance::new(
            catalog,
            decl.chip.clone(),
            decl.id.clone(),
            decl.position,
        ));
    }

    let wires: Vec<Wire> = program
        .wires()
        .map(|decl| {
            let wire = Wire::new(decl.from.clone(), decl.to.clone());
            match &decl.pins {
                WirePins::Implicit => wire,
                WirePins::Ambiguous(pin) => {
                    let is_target_input = find(&instances, &decl.to)
                        .and_then(|target| catalog.get(&target.chip))
                        .is_some_and(|def| def.has_input(pin));
                    if is_target_input {
                        wire.to_pin(pin.clone())
                    } else {
                        wire.from_pin(pin.clone())
                    }
                }
                WirePins::Both { from_pin, to_pin } => {
                    wire.from_pin(from_pin.clone()).to_pin(to_pin.clone())
                }
            }
        })
        .collect();

    order_inputs(catalog, &mut instances, &wires);
    tracing::debug!(
        instances = instances.len(),
        wires = wires.len(),
        "assembled netlist"
    );
    (instances, wires)
}

/// Reorders `INPUT` instances to follow the declared pin order of the first
/// non-`INPUT` instance they feed.
///
/// The anchor is the first declared non-`INPUT` instance that some `INPUT`
/// wires into. `INPUT`s that do not feed the anchor keep their relative
/// order after those that do. Only the slots already held by `INPUT`s are
/// rewritten; everything else stays in place.
pub(crate) fn order_inputs(catalog: &Catalog, instances: &mut [Instance], wires: &[Wire]) {
    let view: &[Instance] = instances;
    let slots: Vec<usize> = view
        .iter()
        .enumerate()
        .filter(|(_, instance)| instance.chip == INPUT)
        .map(|(idx, _)| idx)
        .collect();
    if slots.len() < 2 {
        return;
    }

    let is_input = |id: &str| slots.iter().any(|&idx| view[idx].id.as_str() == id);
    let anchor = view.iter().find(|instance| {
        instance.chip != INPUT
            && wires
                .iter()
                .any(|wire| wire.to == instance.id && is_input(&wire.from))
    });
    let Some(anchor) = anchor else {
        return;
    };

    let declared = declared_inputs(catalog, &anchor.chip);
    let assigned = assign_pins(declared, wires, &anchor.id);
    let mut order: Vec<usize> = Vec::with_capacity(slots.len());
    for pin in declared {
        for (wire, _) in assigned.iter().filter(|(_, p)| *p == pin) {
            let source = slots
                .iter()
                .copied()
                .find(|&idx| view[idx].id == wire.from);
            if let Some(idx) = source {
                if !order.contains(&idx) {
                    order.push(idx);
                }
            }
        }
    }
    for &idx in slots.iter() {
        if !order.contains(&idx) {
            order.push(idx);
        }
    }

    let reordered: Vec<Instance> = order.iter().map(|&idx| view[idx].clone()).collect();
    for (slot, instance) in slots.into_iter().zip(reordered) {
        instances[slot] = instance;
    }
}
