//! Hierarchical instantiation.

use arcstr::ArcStr;
use chipdef::{Catalog, ChipDefinition, Position, PrimitiveKind, INPUT};

use crate::instance::{Body, Instance, Internals, PinStates};

impl Instance {
    /// Creates a fresh instance of `chip`, recursively instantiating its internals.
    ///
    /// Types missing from the catalog produce an instance that always outputs 0.
    /// `INPUT` is always a stimulus source, whether or not the catalog defines it.
    pub fn new(
        catalog: &Catalog,
        chip: impl Into<ArcStr>,
        id: impl Into<ArcStr>,
        position: Option<Position>,
    ) -> Self {
        let chip = upper(chip.into());
        let body = body_of(catalog, &chip, &mut Vec::new());
        Self::with_body(chip, id.into(), position, body)
    }

    fn with_body(chip: ArcStr, id: ArcStr, position: Option<Position>, body: Body) -> Self {
        Self {
            id,
            chip,
            position,
            expanded: false,
            value: false,
            next_value: false,
            inputs: PinStates::new(),
            outputs: PinStates::new(),
            body,
        }
    }
}

/// Builds a private copy of the internal scope of composite type `chip`.
///
/// Returns [`None`] for primitives and unknown types.
pub fn instantiate(catalog: &Catalog, chip: &str) -> Option<Internals> {
    match body_of(catalog, chip, &mut Vec::new()) {
        Body::Composite(internals) => Some(internals),
        _ => None,
    }
}

fn body_of(catalog: &Catalog, chip: &str, ancestry: &mut Vec<ArcStr>) -> Body {
    if chip == INPUT {
        return Body::Primitive(PrimitiveKind::Input);
    }
    match catalog.get(chip) {
        None => Body::Unknown,
        Some(ChipDefinition::Primitive(def)) => Body::Primitive(def.kind()),
        Some(ChipDefinition::Composite(def)) => {
            if ancestry.iter().any(|name| name.as_str() == chip) {
                tracing::error!(
                    chip,
                    ?ancestry,
                    "cyclic chip definition; instantiating without internals"
                );
                return Body::Unknown;
            }
            ancestry.push(chip.into());
            let components = def
                .components()
                .iter()
                .map(|spec| {
                    let body = body_of(catalog, &spec.chip, ancestry);
                    Instance::with_body(spec.chip.clone(), spec.id.clone(), spec.position, body)
                })
                .collect();
            ancestry.pop();
            Body::Composite(Internals {
                components,
                wires: def.wires().to_vec(),
            })
        }
    }
}

fn upper(name: ArcStr) -> ArcStr {
    if name.chars().any(|c| c.is_ascii_lowercase()) {
        name.to_ascii_uppercase().into()
    } else {
        name
    }
}
