//! Catalog validation.
//!
//! Validation runs once, when a catalog is loaded. The simulator itself
//! tolerates every issue reported here except cyclic definitions, which
//! would otherwise make instantiation recurse without bound.

use std::collections::HashSet;
use std::fmt::Display;

use arcstr::ArcStr;
use diagnostics::{Diagnostic, IssueSet, Severity};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::{span, Level};

use crate::{Catalog, ChipDefinition, CompositeDef};

/// An issue identified during validation of a catalog.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ValidatorIssue {
    cause: Cause,
    severity: Severity,
}

/// The cause of a [`ValidatorIssue`].
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Cause {
    /// A composite includes itself, directly or through other composites.
    CyclicDefinition {
        /// The chain of types forming the cycle, starting and ending with the same type.
        chain: Vec<ArcStr>,
    },
    /// Two internal components of a composite share an ID.
    DuplicateComponentIds {
        /// The composite type.
        chip: ArcStr,
        /// The repeated component ID.
        id: ArcStr,
    },
    /// An internal component has a type missing from the catalog.
    UnknownComponentType {
        /// The composite type.
        chip: ArcStr,
        /// The internal component ID.
        id: ArcStr,
        /// The unknown type.
        component_type: ArcStr,
    },
    /// The I/O mapping references an internal component that does not exist.
    DanglingMapping {
        /// The composite type.
        chip: ArcStr,
        /// The external pin (or `output` for the main output).
        pin: ArcStr,
        /// The missing internal component ID.
        id: ArcStr,
    },
    /// An internal wire endpoint is neither an internal component
    /// nor (for sources) an external input pin.
    UnknownWireEndpoint {
        /// The composite type.
        chip: ArcStr,
        /// The unresolved endpoint.
        endpoint: ArcStr,
    },
    /// The input mapping names a pin the composite does not declare.
    UnknownInputPin {
        /// The composite type.
        chip: ArcStr,
        /// The undeclared pin.
        pin: ArcStr,
    },
}

impl Diagnostic for ValidatorIssue {
    fn severity(&self) -> Severity {
        self.severity
    }
}

impl ValidatorIssue {
    /// Creates a new validator issue from the given cause and severity.
    pub(crate) fn new(cause: Cause, severity: Severity) -> Self {
        Self { cause, severity }
    }

    /// Creates a new validator issue and logs it immediately.
    pub(crate) fn new_and_log(cause: Cause, severity: Severity) -> Self {
        let result = Self::new(cause, severity);
        diagnostics::log_issue(&result);
        result
    }

    /// Gets the underlying cause of this issue.
    #[inline]
    pub fn cause(&self) -> &Cause {
        &self.cause
    }
}

impl Display for ValidatorIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cause)
    }
}

impl Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CyclicDefinition { chain } => {
                write!(f, "cyclic chip definition: ")?;
                for (i, name) in chain.iter().enumerate() {
                    if i > 0 {
                        write!(f, " -> ")?;
                    }
                    write!(f, "{name}")?;
                }
                Ok(())
            }
            Self::DuplicateComponentIds { chip, id } => write!(
                f,
                "duplicate component IDs: found two or more components named `{}` in chip `{}`",
                id, chip
            ),
            Self::UnknownComponentType {
                chip,
                id,
                component_type,
            } => write!(
                f,
                "unknown component type: component `{}` in chip `{}` has type `{}`, which is not in the catalog; it will always output 0",
                id, chip, component_type
            ),
            Self::DanglingMapping { chip, pin, id } => write!(
                f,
                "dangling I/O mapping: pin `{}` of chip `{}` references component `{}`, which does not exist",
                pin, chip, id
            ),
            Self::UnknownWireEndpoint { chip, endpoint } => write!(
                f,
                "unknown wire endpoint: a wire in chip `{}` references `{}`, which is neither a component nor an input pin; it will read as 0",
                chip, endpoint
            ),
            Self::UnknownInputPin { chip, pin } => write!(
                f,
                "unknown input pin: the I/O mapping of chip `{}` maps pin `{}`, which the chip does not declare",
                chip, pin
            ),
        }
    }
}

impl Catalog {
    /// Check whether or not this catalog is valid.
    pub fn validate(&self) -> IssueSet<ValidatorIssue> {
        let _guard = span!(Level::INFO, "validating chip catalog").entered();
        let mut issues = IssueSet::new();

        for (name, def) in self.iter() {
            if let ChipDefinition::Composite(def) = def {
                self.validate_composite(name, def, &mut issues);
            }
        }
        self.validate_acyclic(&mut issues);

        issues
    }

    fn validate_composite(
        &self,
        name: &ArcStr,
        def: &CompositeDef,
        issues: &mut IssueSet<ValidatorIssue>,
    ) {
        let _guard = span!(Level::DEBUG, "validating composite", chip = %name).entered();

        let mut ids = HashSet::new();
        for component in def.components() {
            if !ids.insert(component.id.clone()) {
                issues.add(ValidatorIssue::new_and_log(
                    Cause::DuplicateComponentIds {
                        chip: name.clone(),
                        id: component.id.clone(),
                    },
                    Severity::Error,
                ));
            }
            if !self.contains(&component.chip) {
                issues.add(ValidatorIssue::new_and_log(
                    Cause::UnknownComponentType {
                        chip: name.clone(),
                        id: component.id.clone(),
                        component_type: component.chip.clone(),
                    },
                    Severity::Warning,
                ));
            }
        }

        let inputs: HashSet<&str> = def.inputs.iter().map(|p| p.as_str()).collect();
        for wire in def.wires() {
            let source_known =
                ids.contains(&wire.from) || inputs.contains(wire.from.as_str());
            if !source_known {
                issues.add(ValidatorIssue::new_and_log(
                    Cause::UnknownWireEndpoint {
                        chip: name.clone(),
                        endpoint: wire.from.clone(),
                    },
                    Severity::Warning,
                ));
            }
            if !ids.contains(&wire.to) {
                issues.add(ValidatorIssue::new_and_log(
                    Cause::UnknownWireEndpoint {
                        chip: name.clone(),
                        endpoint: wire.to.clone(),
                    },
                    Severity::Warning,
                ));
            }
        }

        let mapping = def.io_mapping();
        let mut dangling = |pin: &ArcStr, id: &ArcStr| {
            if !ids.contains(id) {
                issues.add(ValidatorIssue::new_and_log(
                    Cause::DanglingMapping {
                        chip: name.clone(),
                        pin: pin.clone(),
                        id: id.clone(),
                    },
                    Severity::Error,
                ));
            }
        };
        for (pin, targets) in mapping.inputs.iter() {
            for target in targets {
                dangling(pin, &target.id);
            }
        }
        for (pin, tap) in mapping.outputs.iter() {
            dangling(pin, &tap.id);
        }
        if let Some(id) = &mapping.output {
            dangling(&arcstr::literal!("output"), id);
        }

        for pin in mapping.inputs.keys() {
            if !inputs.contains(pin.as_str()) {
                issues.add(ValidatorIssue::new_and_log(
                    Cause::UnknownInputPin {
                        chip: name.clone(),
                        pin: pin.clone(),
                    },
                    Severity::Warning,
                ));
            }
        }
    }

    fn validate_acyclic(&self, issues: &mut IssueSet<ValidatorIssue>) {
        let _guard = span!(Level::DEBUG, "checking for cyclic definitions").entered();
        let mut done = HashSet::new();
        for (name, _) in self.iter() {
            let mut path = IndexSet::new();
            self.dfs_cycles(name, &mut path, &mut done, issues);
        }
    }

    fn dfs_cycles(
        &self,
        name: &ArcStr,
        path: &mut IndexSet<ArcStr>,
        done: &mut HashSet<ArcStr>,
        issues: &mut IssueSet<ValidatorIssue>,
    ) {
        if done.contains(name) {
            return;
        }
        if let Some(start) = path.get_index_of(name) {
            let mut chain: Vec<ArcStr> = path.iter().skip(start).cloned().collect();
            chain.push(name.clone());
            issues.add(ValidatorIssue::new_and_log(
                Cause::CyclicDefinition { chain },
                Severity::Error,
            ));
            return;
        }

        if let Some(ChipDefinition::Composite(def)) = self.get(name) {
            path.insert(name.clone());
            for component in def.components() {
                self.dfs_cycles(&component.chip, path, done, issues);
            }
            path.pop();
        }
        done.insert(name.clone());
    }
}
