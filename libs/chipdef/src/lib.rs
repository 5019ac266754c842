//! Chip definitions.
//!
//! A [`Catalog`] maps chip type names to [`ChipDefinition`]s. A definition is
//! either a primitive, whose behavior is a fixed boolean function of its
//! inputs, or a composite, described by an internal netlist of other chips
//! plus an [`IoMapping`] tying its external pins to internal ones.
//!
//! Type names are case-insensitive and are stored upper-cased.
//! Instance IDs and pin names are case-sensitive.
#![warn(missing_docs)]

use std::fmt::{Display, Formatter};

use arcstr::ArcStr;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

mod builtin;
mod load;
pub mod validation;

pub use load::CatalogError;
pub use validation::{Cause, ValidatorIssue};


/// The reserved type name of primary stimulus sources.
pub const INPUT: &str = "INPUT";

/// The name of the scalar output pin of every primitive.
pub const OUT: &str = "OUT";

/// A cosmetic placement of a chip on a canvas.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// The horizontal coordinate.
    pub x: i64,
    /// The vertical coordinate.
    pub y: i64,
}

impl Position {
    /// Creates a new position.
    #[inline]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// A connection from an output of one instance to an input of another.
///
/// A missing `from_pin` reads the source's scalar value.
/// A missing `to_pin` assigns the first input pin of the target
/// (in the order its type declares them) not already driven by another wire.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wire {
    /// The ID of the driving instance, or the name of an external input pin
    /// of the enclosing composite.
    pub from: ArcStr,
    /// The output pin of the driving instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_pin: Option<ArcStr>,
    /// The ID of the driven instance.
    pub to: ArcStr,
    /// The input pin of the driven instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_pin: Option<ArcStr>,
}

impl Wire {
    /// Creates a wire between the scalar value of `from` and the next free input of `to`.
    pub fn new(from: impl Into<ArcStr>, to: impl Into<ArcStr>) -> Self {
        Self {
            from: from.into(),
            from_pin: None,
            to: to.into(),
            to_pin: None,
        }
    }

    /// Reads from the given output pin of the source.
    #[inline]
    pub fn from_pin(mut self, pin: impl Into<ArcStr>) -> Self {
        self.from_pin = Some(pin.into());
        self
    }

    /// Drives the given input pin of the target.
    #[inline]
    pub fn to_pin(mut self, pin: impl Into<ArcStr>) -> Self {
        self.to_pin = Some(pin.into());
        self
    }
}

/// The kinds of primitive chips.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveKind {
    /// A primary input. Holds whatever value it was last toggled to.
    Input,
    /// Logical AND.
    And,
    /// Logical OR.
    Or,
    /// Logical NAND.
    Nand,
    /// Logical NOT.
    Not,
    /// Logical XOR.
    Xor,
    /// An edge-triggered D flip-flop.
    ///
    /// Its input is latched while settling and only becomes its value
    /// when the clock ticks.
    Dff,
}

impl PrimitiveKind {
    /// Returns `true` if this kind only changes value on a clock edge.
    #[inline]
    pub fn is_edge_triggered(&self) -> bool {
        matches!(self, Self::Dff)
    }

    /// Computes the output of this primitive.
    ///
    /// `a` and `b` are the first two declared inputs, with unconnected
    /// pins reading as `false`. Kinds without a boolean function
    /// (inputs and flip-flops) keep their `current` value.
    pub fn evaluate(&self, a: bool, b: bool, current: bool) -> bool {
        match *self {
            Self::And => a && b,
            Self::Or => a || b,
            Self::Nand => !(a && b),
            Self::Not => !a,
            Self::Xor => a != b,
            Self::Input | Self::Dff => current,
        }
    }

    /// The type name under which this primitive is registered in the builtin catalog.
    pub fn name(&self) -> &'static str {
        match *self {
            Self::Input => INPUT,
            Self::And => "AND",
            Self::Or => "OR",
            Self::Nand => "NAND",
            Self::Not => "NOT",
            Self::Xor => "XOR",
            Self::Dff => "DFF",
        }
    }
}

impl Display for PrimitiveKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A chip with no internal structure.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveDef {
    kind: PrimitiveKind,
    inputs: Vec<ArcStr>,
    outputs: Vec<ArcStr>,
}

impl PrimitiveDef {
    /// Creates a primitive definition with the given pins.
    pub fn new<I, O>(kind: PrimitiveKind, inputs: I, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ArcStr>,
        O: IntoIterator,
        O::Item: Into<ArcStr>,
    {
        Self {
            kind,
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
        }
    }

    /// The kind of this primitive.
    #[inline]
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }
}

/// An internal sub-component of a composite chip.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// The ID of the sub-component, unique among its siblings.
    pub id: ArcStr,
    /// The type of the sub-component.
    #[serde(rename = "type")]
    pub chip: ArcStr,
    /// Where the sub-component is drawn when its parent is expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// An internal pin targeted by an external input of a composite.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    /// The ID of the internal component.
    pub id: ArcStr,
    /// The input pin of that component.
    pub pin: ArcStr,
}

/// The internal source of an external output of a composite.
///
/// Serialized either as a bare component ID or as `{ id, pin }`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "TapRepr", into = "TapRepr")]
pub struct OutputTap {
    /// The ID of the internal component.
    pub id: ArcStr,
    /// The output pin of that component.
    ///
    /// When absent, the component's scalar value is used.
    pub pin: Option<ArcStr>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TapRepr {
    Id(ArcStr),
    Pin { id: ArcStr, pin: Option<ArcStr> },
}

impl From<TapRepr> for OutputTap {
    fn from(value: TapRepr) -> Self {
        match value {
            TapRepr::Id(id) => Self { id, pin: None },
            TapRepr::Pin { id, pin } => Self { id, pin },
        }
    }
}

impl From<OutputTap> for TapRepr {
    fn from(value: OutputTap) -> Self {
        match value.pin {
            None => Self::Id(value.id),
            Some(pin) => Self::Pin {
                id: value.id,
                pin: Some(pin),
            },
        }
    }
}

/// The table connecting a composite's external pins to its internals.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoMapping {
    /// External input pin to the internal pins it fans out to.
    ///
    /// Evaluation routes external inputs through the composite's internal
    /// wires; this table documents the same fan-out and is checked against
    /// the declared inputs during validation.
    pub inputs: IndexMap<ArcStr, Vec<PinRef>>,
    /// External output pin to its internal source.
    pub outputs: IndexMap<ArcStr, OutputTap>,
    /// The internal component whose scalar value becomes the composite's scalar value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<ArcStr>,
}

/// A chip defined by an internal netlist of other chips.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CompositeDef {
    inputs: Vec<ArcStr>,
    #[serde(default)]
    outputs: Vec<ArcStr>,
    #[serde(default)]
    components: Vec<ComponentSpec>,
    #[serde(default)]
    wires: Vec<Wire>,
    #[serde(default)]
    io_mapping: IoMapping,
}

impl CompositeDef {
    /// Creates an empty composite with the given pins.
    pub fn new<I, O>(inputs: I, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ArcStr>,
        O: IntoIterator,
        O::Item: Into<ArcStr>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Adds an internal component.
    pub fn component(
        mut self,
        id: impl Into<ArcStr>,
        chip: impl Into<ArcStr>,
        x: i64,
        y: i64,
    ) -> Self {
        self.components.push(ComponentSpec {
            id: id.into(),
            chip: chip.into(),
            position: Some(Position::new(x, y)),
        });
        self
    }

    /// Adds an internal wire.
    #[inline]
    pub fn wire(mut self, wire: Wire) -> Self {
        self.wires.push(wire);
        self
    }

    /// Records that external input `pin` fans out to `targets`.
    pub fn map_input<'a>(
        mut self,
        pin: impl Into<ArcStr>,
        targets: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let targets = targets
            .into_iter()
            .map(|(id, pin)| PinRef {
                id: id.into(),
                pin: pin.into(),
            })
            .collect();
        self.io_mapping.inputs.insert(pin.into(), targets);
        self
    }

    /// Routes the scalar value of internal component `id` to external output `pin`.
    pub fn map_output(mut self, pin: impl Into<ArcStr>, id: impl Into<ArcStr>) -> Self {
        self.io_mapping.outputs.insert(
            pin.into(),
            OutputTap {
                id: id.into(),
                pin: None,
            },
        );
        self
    }

    /// Routes output `internal_pin` of internal component `id` to external output `pin`.
    pub fn map_output_pin(
        mut self,
        pin: impl Into<ArcStr>,
        id: impl Into<ArcStr>,
        internal_pin: impl Into<ArcStr>,
    ) -> Self {
        self.io_mapping.outputs.insert(
            pin.into(),
            OutputTap {
                id: id.into(),
                pin: Some(internal_pin.into()),
            },
        );
        self
    }

    /// Uses the scalar value of internal component `id` as this chip's scalar value.
    pub fn main_output(mut self, id: impl Into<ArcStr>) -> Self {
        self.io_mapping.output = Some(id.into());
        self
    }

    /// The internal components.
    #[inline]
    pub fn components(&self) -> &[ComponentSpec] {
        &self.components
    }

    /// The internal wires.
    #[inline]
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// The I/O mapping.
    #[inline]
    pub fn io_mapping(&self) -> &IoMapping {
        &self.io_mapping
    }

    /// Upper-cases the types of all internal components.
    pub(crate) fn normalize(&mut self) {
        for component in self.components.iter_mut() {
            if component.chip.chars().any(|c| c.is_ascii_lowercase()) {
                component.chip = component.chip.to_ascii_uppercase().into();
            }
        }
    }
}

/// A chip definition.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ChipDefinition {
    /// A chip with a fixed boolean behavior.
    Primitive(PrimitiveDef),
    /// A chip built from other chips.
    Composite(CompositeDef),
}

impl ChipDefinition {
    /// The declared input pins, in implicit assignment order.
    pub fn inputs(&self) -> &[ArcStr] {
        match self {
            Self::Primitive(def) => &def.inputs,
            Self::Composite(def) => &def.inputs,
        }
    }

    /// The declared output pins.
    pub fn outputs(&self) -> &[ArcStr] {
        match self {
            Self::Primitive(def) => &def.outputs,
            Self::Composite(def) => &def.outputs,
        }
    }

    /// Returns `true` if `pin` is a declared input of this chip.
    pub fn has_input(&self, pin: &str) -> bool {
        self.inputs().iter().any(|p| p == pin)
    }

    /// The primitive kind, if this is a primitive.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Primitive(def) => Some(def.kind),
            Self::Composite(_) => None,
        }
    }

    /// The composite contents, if this is a composite.
    pub fn as_composite(&self) -> Option<&CompositeDef> {
        match self {
            Self::Primitive(_) => None,
            Self::Composite(def) => Some(def),
        }
    }
}

impl From<PrimitiveDef> for ChipDefinition {
    #[inline]
    fn from(value: PrimitiveDef) -> Self {
        Self::Primitive(value)
    }
}

impl From<CompositeDef> for ChipDefinition {
    #[inline]
    fn from(value: CompositeDef) -> Self {
        Self::Composite(value)
    }
}

/// A read-only table of chip definitions, keyed by upper-cased type name.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Catalog {
    chips: IndexMap<ArcStr, ChipDefinition>,
}

impl Catalog {
    /// Creates a new, empty catalog.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition under the given type name, replacing any previous one.
    ///
    /// Returns the replaced definition, if there was one.
    pub fn insert(
        &mut self,
        name: impl Into<ArcStr>,
        definition: impl Into<ChipDefinition>,
    ) -> Option<ChipDefinition> {
        let name = name.into();
        let name = if name.chars().any(|c| c.is_ascii_lowercase()) {
            name.to_ascii_uppercase().into()
        } else {
            name
        };
        let mut definition = definition.into();
        if let ChipDefinition::Composite(def) = &mut definition {
            def.normalize();
        }
        self.chips.insert(name, definition)
    }

    /// Looks up the definition of the given (upper-cased) type name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&ChipDefinition> {
        self.chips.get(name)
    }

    /// Returns `true` if the catalog defines the given type.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.chips.contains_key(name)
    }

    /// Iterates over `(name, definition)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ArcStr, &ChipDefinition)> {
        self.chips.iter()
    }

    /// The number of definitions in the catalog.
    #[inline]
    pub fn len(&self) -> usize {
        self.chips.len()
    }

    /// Returns `true` if the catalog has no definitions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }
}
