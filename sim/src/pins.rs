//! Pin assignment for wires that leave their target pin implicit.

use arcstr::ArcStr;
use chipdef::{Catalog, Wire};

/// Pin order for types missing from the catalog.
static FALLBACK_INPUTS: [ArcStr; 2] = [arcstr::literal!("A"), arcstr::literal!("B")];

/// The declared inputs of `chip`, in implicit assignment order.
pub(crate) fn declared_inputs<'a>(catalog: &'a Catalog, chip: &str) -> &'a [ArcStr] {
    match catalog.get(chip) {
        Some(def) => def.inputs(),
        None => &FALLBACK_INPUTS,
    }
}

/// Pairs each wire driving `target` with the input pin it drives.
///
/// Wires are taken in declaration order. An explicit `to_pin` is used as is;
/// otherwise the wire takes the first declared pin not yet claimed by an
/// earlier wire. Wires left without a free pin are omitted.
pub(crate) fn assign_pins<'a>(
    declared: &'a [ArcStr],
    wires: &'a [Wire],
    target: &str,
) -> Vec<(&'a Wire, &'a ArcStr)> {
    let mut assigned: Vec<(&Wire, &ArcStr)> = Vec::new();
    for wire in wires.iter().filter(|wire| wire.to.as_str() == target) {
        let pin = match &wire.to_pin {
            Some(pin) => Some(pin),
            None => declared
                .iter()
                .find(|pin| !assigned.iter().any(|(_, taken)| taken == pin)),
        };
        if let Some(pin) = pin {
            assigned.push((wire, pin));
        }
    }
    assigned
}
