//! Simulation diagnostics.

use std::fmt::Display;

use arcstr::ArcStr;
use diagnostics::{Diagnostic, Severity};
use netasm::ParseIssue;
use serde::{Deserialize, Serialize};

/// An issue identified while assembling or simulating a circuit.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SimIssue {
    cause: Cause,
    severity: Severity,
}

/// The cause of a [`SimIssue`].
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Cause {
    /// A program line was skipped or only partially understood.
    Syntax(ParseIssue),
    /// Settling hit the pass limit before reaching a fixed point.
    DidNotConverge {
        /// The number of passes performed.
        passes: usize,
    },
    /// An instance has a type missing from the catalog. It will always output 0.
    UnknownChipType {
        /// The instance ID.
        id: ArcStr,
        /// The unknown type.
        chip: ArcStr,
    },
    /// Two top-level instances share an ID. Lookups resolve to the first.
    DuplicateInstanceId {
        /// The repeated ID.
        id: ArcStr,
    },
    /// A stimulus was applied to an instance that is not an `INPUT`.
    NotAnInput {
        /// The ID that was toggled.
        id: ArcStr,
    },
}

impl SimIssue {
    /// Creates a new issue and logs it immediately.
    pub(crate) fn new_and_log(cause: Cause, severity: Severity) -> Self {
        let result = Self { cause, severity };
        diagnostics::log_issue(&result);
        result
    }

    /// Wraps a parse issue without logging it again.
    pub(crate) fn from_parse(issue: ParseIssue) -> Self {
        Self {
            severity: issue.severity(),
            cause: Cause::Syntax(issue),
        }
    }

    /// Gets the underlying cause of this issue.
    #[inline]
    pub fn cause(&self) -> &Cause {
        &self.cause
    }
}

impl Diagnostic for SimIssue {
    fn severity(&self) -> Severity {
        self.severity
    }

    fn help(&self) -> Option<Box<dyn Display>> {
        match self.cause {
            Cause::DidNotConverge { .. } => Some(Box::new(
                "look for a combinational loop that does not pass through a DFF",
            )),
            _ => None,
        }
    }
}

impl Display for SimIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cause)
    }
}

impl Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax(issue) => write!(f, "{issue}"),
            Self::DidNotConverge { passes } => write!(
                f,
                "circuit did not settle after {passes} passes; values may be inconsistent"
            ),
            Self::UnknownChipType { id, chip } => write!(
                f,
                "unknown chip type: instance `{id}` has type `{chip}`, which is not in the catalog; it will always output 0"
            ),
            Self::DuplicateInstanceId { id } => write!(
                f,
                "duplicate instance IDs: found two or more instances named `{id}`; wires and lookups use the first"
            ),
            Self::NotAnInput { id } => {
                write!(f, "cannot toggle `{id}`: no INPUT instance has that ID")
            }
        }
    }
}
