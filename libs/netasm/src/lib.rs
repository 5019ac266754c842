//! Gate netlist programs.
//!
//! A program is a newline-delimited list of statements:
//!
//! ```text
//! TYPE ID [X Y]
//! WIRE SRC_ID DST_ID [PIN_OR_SRC_PIN] [DST_PIN]
//! ```
//!
//! Tokens are separated by whitespace. The `WIRE` keyword and chip types are
//! case-insensitive; IDs and pin names are not. Blank lines are ignored.
//! Malformed lines are skipped and reported as [`ParseIssue`]s rather than
//! failing the parse.
#![warn(missing_docs)]

use std::fmt::{Display, Formatter};

use arcstr::ArcStr;
use chipdef::Position;
use serde::{Deserialize, Serialize};

pub mod parser;

pub use parser::{Cause, ParseIssue, ParsedProgram, Parser};

#[cfg(test)]
mod tests;

/// The keyword introducing a wire statement.
pub const WIRE: &str = "WIRE";

/// A parsed program.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// The statements of the program, in source order.
    pub statements: Vec<Statement>,
}

/// A single statement.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// An instantiation of a chip.
    Instance(InstanceDecl),
    /// A wire between two instances.
    Wire(WireDecl),
}

/// An instantiation statement: `TYPE ID [X Y]`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct InstanceDecl {
    /// The chip type, upper-cased.
    pub chip: ArcStr,
    /// The instance ID.
    pub id: ArcStr,
    /// The coordinates, if both were given and valid.
    pub position: Option<Position>,
}

/// A wiring statement: `WIRE SRC DST [ARG1] [ARG2]`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct WireDecl {
    /// The source instance ID.
    pub from: ArcStr,
    /// The target instance ID.
    pub to: ArcStr,
    /// The optional pin arguments.
    pub pins: WirePins,
}

/// The pin arguments of a wire statement.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum WirePins {
    /// No pins: scalar source value to the next free target input.
    #[default]
    Implicit,
    /// One pin, either a target input or a source output.
    ///
    /// Which one it is depends on the target's chip type, so it is left for
    /// the assembler to decide.
    Ambiguous(ArcStr),
    /// A source output pin and a target input pin.
    Both {
        /// The source output pin.
        from_pin: ArcStr,
        /// The target input pin.
        to_pin: ArcStr,
    },
}

impl Program {
    /// Creates an empty program.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the given source, returning the program and any issues found.
    #[inline]
    pub fn parse(src: &str) -> ParsedProgram {
        Parser::parse(src)
    }

    /// Appends an instantiation.
    pub fn push_instance(
        &mut self,
        chip: impl Into<ArcStr>,
        id: impl Into<ArcStr>,
        position: Option<Position>,
    ) {
        self.statements.push(Statement::Instance(InstanceDecl {
            chip: chip.into(),
            id: id.into(),
            position,
        }));
    }

    /// Appends a wire.
    pub fn push_wire(&mut self, from: impl Into<ArcStr>, to: impl Into<ArcStr>, pins: WirePins) {
        self.statements.push(Statement::Wire(WireDecl {
            from: from.into(),
            to: to.into(),
            pins,
        }));
    }

    /// Iterates over the instantiation statements.
    pub fn instances(&self) -> impl Iterator<Item = &InstanceDecl> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Instance(decl) => Some(decl),
            Statement::Wire(_) => None,
        })
    }

    /// Iterates over the wiring statements.
    pub fn wires(&self) -> impl Iterator<Item = &WireDecl> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Wire(decl) => Some(decl),
            Statement::Instance(_) => None,
        })
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for statement in self.statements.iter() {
            writeln!(f, "{statement}")?;
        }
        Ok(())
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instance(decl) => {
                write!(f, "{} {}", decl.chip, decl.id)?;
                if let Some(pos) = decl.position {
                    write!(f, " {} {}", pos.x, pos.y)?;
                }
                Ok(())
            }
            Self::Wire(decl) => {
                write!(f, "{WIRE} {} {}", decl.from, decl.to)?;
                match &decl.pins {
                    WirePins::Implicit => Ok(()),
                    WirePins::Ambiguous(pin) => write!(f, " {pin}"),
                    WirePins::Both { from_pin, to_pin } => write!(f, " {from_pin} {to_pin}"),
                }
            }
        }
    }
}
