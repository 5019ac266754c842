//! Chip instances.

use arcstr::ArcStr;
use chipdef::{Position, PrimitiveKind, Wire, OUT};
use indexmap::IndexMap;

/// Bit values keyed by pin name.
pub type PinStates = IndexMap<ArcStr, bool>;

/// A concrete placement of a chip type in a scope.
///
/// Instances of composite types own a private copy of their internal
/// netlist; no state is ever shared between two instances.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instance {
    pub(crate) id: ArcStr,
    pub(crate) chip: ArcStr,
    pub(crate) position: Option<Position>,
    pub(crate) expanded: bool,
    pub(crate) value: bool,
    pub(crate) next_value: bool,
    pub(crate) inputs: PinStates,
    pub(crate) outputs: PinStates,
    pub(crate) body: Body,
}

/// What an instance evaluates as.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Body {
    /// The type is not in the catalog. Always outputs 0.
    Unknown,
    /// A primitive gate, stimulus source, or flip-flop.
    Primitive(PrimitiveKind),
    /// A composite chip with its own internal scope.
    Composite(Internals),
}

/// The internal scope of a composite instance.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Internals {
    pub(crate) components: Vec<Instance>,
    pub(crate) wires: Vec<Wire>,
}

impl Instance {
    /// The ID of this instance, unique within its scope.
    #[inline]
    pub fn id(&self) -> &ArcStr {
        &self.id
    }

    /// The (upper-cased) chip type of this instance.
    #[inline]
    pub fn chip(&self) -> &ArcStr {
        &self.chip
    }

    /// The cosmetic position of this instance, if it has one.
    #[inline]
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Whether a viewer should draw the internals of this instance.
    #[inline]
    pub fn expanded(&self) -> bool {
        self.expanded
    }

    /// The scalar output of this instance.
    #[inline]
    pub fn value(&self) -> bool {
        self.value
    }

    /// The value latched for the next clock edge.
    ///
    /// Only meaningful for edge-triggered instances.
    #[inline]
    pub fn next_value(&self) -> bool {
        self.next_value
    }

    /// The inputs resolved during the most recent evaluation pass.
    #[inline]
    pub fn inputs(&self) -> &PinStates {
        &self.inputs
    }

    /// The named outputs of this instance.
    #[inline]
    pub fn outputs(&self) -> &PinStates {
        &self.outputs
    }

    /// Reads a named output, treating pins that were never driven as 0.
    pub fn output(&self, pin: &str) -> bool {
        self.outputs.get(pin).copied().unwrap_or(false)
    }

    /// How this instance evaluates.
    #[inline]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// The internal scope, if this is a composite instance.
    pub fn internals(&self) -> Option<&Internals> {
        match &self.body {
            Body::Composite(internals) => Some(internals),
            _ => None,
        }
    }

    /// Returns `true` if this instance is a primary stimulus source.
    pub fn is_input(&self) -> bool {
        matches!(self.body, Body::Primitive(PrimitiveKind::Input))
    }

    /// Sets the cosmetic expansion flag.
    #[inline]
    pub fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    /// Sets the scalar value and the `OUT` pin together.
    pub(crate) fn drive(&mut self, value: bool) {
        self.value = value;
        self.outputs.clear();
        self.outputs.insert(ArcStr::from(OUT), value);
    }
}

impl Internals {
    /// The internal instances, in blueprint order.
    #[inline]
    pub fn components(&self) -> &[Instance] {
        &self.components
    }

    /// The internal wires.
    #[inline]
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// Looks up an internal instance by ID.
    pub fn component(&self, id: &str) -> Option<&Instance> {
        find(&self.components, id)
    }
}

/// Finds the first instance in `scope` with the given ID.
pub(crate) fn find<'a>(scope: &'a [Instance], id: &str) -> Option<&'a Instance> {
    scope.iter().find(|instance| instance.id.as_str() == id)
}
