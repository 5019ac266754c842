//! A hierarchical gate-level logic simulator.
//!
//! A [`Simulator`] owns one top-level netlist, assembled from a program in
//! the [`netasm`] format against a [`Catalog`] of chip definitions. Every
//! mutation (assembly, stimulus, clock tick) is followed by a settle, which
//! re-evaluates the whole circuit until no value changes.
//!
//! Circuits never fail to simulate. Unknown chip types output 0, dangling
//! wires read 0, and combinational loops stop at a pass limit. Each of these
//! is recorded as a [`SimIssue`] on the operation that hit it.
//!
//! ```
//! use chipdef::Catalog;
//! use gatesim::Simulator;
//!
//! let mut sim = Simulator::new(Catalog::builtin());
//! sim.assemble("INPUT a\nINPUT b\nXOR x\nWIRE a x\nWIRE b x\n");
//! sim.toggle_input("a");
//! assert_eq!(sim.value("x"), Some(true));
//! sim.toggle_input("b");
//! assert_eq!(sim.value("x"), Some(false));
//! ```
#![warn(missing_docs)]

use std::sync::Arc;

use arcstr::ArcStr;
use chipdef::{Catalog, Wire};
use diagnostics::{IssueSet, Severity};
use netasm::{Program, WirePins};
use tracing::{span, Level};

mod assemble;
mod clock;
mod eval;
mod instance;
mod instantiate;
mod issues;
mod options;
mod pins;
mod snapshot;

pub use eval::{settle, SettleReport};
pub use instance::{Body, Instance, Internals, PinStates};
pub use instantiate::instantiate;
pub use issues::{Cause, SimIssue};
pub use options::{SimOptions, DEFAULT_MAX_PASSES};
pub use snapshot::{InstanceSnapshot, Snapshot};

#[cfg(test)]
pub(crate) mod tests;

/// A simulation context: one top-level netlist plus its clock.
#[derive(Clone, Debug)]
pub struct Simulator {
    catalog: Arc<Catalog>,
    options: SimOptions,
    instances: Vec<Instance>,
    wires: Vec<Wire>,
    clock: u64,
    issues: IssueSet<SimIssue>,
    last_report: Option<SettleReport>,
}

impl Simulator {
    /// Creates a simulator with an empty netlist and default options.
    #[inline]
    pub fn new(catalog: impl Into<Arc<Catalog>>) -> Self {
        Self::with_options(catalog, SimOptions::default())
    }

    /// Creates a simulator with an empty netlist and the given options.
    pub fn with_options(catalog: impl Into<Arc<Catalog>>, options: SimOptions) -> Self {
        Self {
            catalog: catalog.into(),
            options,
            instances: Vec::new(),
            wires: Vec::new(),
            clock: 0,
            issues: IssueSet::new(),
            last_report: None,
        }
    }

    /// Replaces the netlist with the one described by `src`, resets the
    /// clock, and settles.
    ///
    /// Lines that cannot be parsed are skipped and reported in [`Simulator::issues`].
    pub fn assemble(&mut self, src: &str) -> SettleReport {
        self.issues.clear();
        let parsed = Program::parse(src);
        self.issues
            .extend(parsed.issues.into_iter().map(SimIssue::from_parse));
        self.load(&parsed.program)
    }

    /// Replaces the netlist with an already-parsed program, resets the
    /// clock, and settles.
    pub fn assemble_program(&mut self, program: &Program) -> SettleReport {
        self.issues.clear();
        self.load(program)
    }

    fn load(&mut self, program: &Program) -> SettleReport {
        let (instances, wires) = assemble::build(&self.catalog, program, &mut self.issues);
        self.instances = instances;
        self.wires = wires;
        self.clock = 0;
        self.run_settle()
    }

    /// Re-evaluates the circuit until no value changes or the pass limit is hit.
    pub fn settle(&mut self) -> SettleReport {
        self.issues.clear();
        self.run_settle()
    }

    fn run_settle(&mut self) -> SettleReport {
        let report = eval::settle(
            &self.catalog,
            &mut self.instances,
            &self.wires,
            &self.options,
        );
        if !report.converged {
            self.issues.add(SimIssue::new_and_log(
                Cause::DidNotConverge {
                    passes: report.passes,
                },
                Severity::Warning,
            ));
        }
        self.last_report = Some(report);
        report
    }

    /// Advances the clock by one edge.
    ///
    /// Every flip-flop, at every depth, takes the value it latched during the
    /// last settle; the circuit is then settled again.
    pub fn tick(&mut self) -> SettleReport {
        let _guard = span!(Level::INFO, "clock tick", clock = self.clock + 1).entered();
        self.issues.clear();
        self.clock += 1;
        let committed = clock::commit_latches(&mut self.instances);
        tracing::debug!(committed, "committed latches");
        self.run_settle()
    }

    /// Flips the value of the `INPUT` instance `id` and settles.
    ///
    /// Returns [`None`] and records an issue if no `INPUT` has that ID.
    pub fn toggle_input(&mut self, id: &str) -> Option<SettleReport> {
        self.issues.clear();
        let Some(input) = self
            .instances
            .iter_mut()
            .find(|instance| instance.id.as_str() == id)
            .filter(|instance| instance.is_input())
        else {
            self.issues.add(SimIssue::new_and_log(
                Cause::NotAnInput { id: id.into() },
                Severity::Info,
            ));
            return None;
        };
        let value = !input.value;
        input.drive(value);
        tracing::debug!(id, value, "toggled input");
        Some(self.run_settle())
    }

    /// Sets the cosmetic expansion flag of top-level instance `id`.
    ///
    /// Returns `false` if there is no such instance.
    pub fn set_expanded(&mut self, id: &str, expanded: bool) -> bool {
        match self
            .instances
            .iter_mut()
            .find(|instance| instance.id.as_str() == id)
        {
            Some(instance) => {
                instance.set_expanded(expanded);
                true
            }
            None => false,
        }
    }

    /// The catalog this simulator instantiates from.
    #[inline]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The options used when settling.
    #[inline]
    pub fn options(&self) -> &SimOptions {
        &self.options
    }

    /// The top-level instances.
    #[inline]
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// The top-level wires.
    #[inline]
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// Looks up a top-level instance by ID.
    pub fn instance(&self, id: &str) -> Option<&Instance> {
        instance::find(&self.instances, id)
    }

    /// The scalar value of top-level instance `id`.
    pub fn value(&self, id: &str) -> Option<bool> {
        self.instance(id).map(Instance::value)
    }

    /// The named output `pin` of top-level instance `id`.
    ///
    /// Pins that were never driven read as 0.
    pub fn output(&self, id: &str, pin: &str) -> Option<bool> {
        self.instance(id).map(|instance| instance.output(pin))
    }

    /// The number of clock edges since the last assembly.
    #[inline]
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// The issues recorded by the most recent operation.
    #[inline]
    pub fn issues(&self) -> &IssueSet<SimIssue> {
        &self.issues
    }

    /// The outcome of the most recent settle, if any.
    #[inline]
    pub fn last_report(&self) -> Option<SettleReport> {
        self.last_report
    }

    /// Captures the full state of the circuit.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            clock: self.clock,
            instances: self.instances.iter().map(Into::into).collect(),
            wires: self.wires.clone(),
        }
    }

    /// Replaces the circuit with a snapshot and settles.
    ///
    /// Internals are rebuilt from the catalog, so a snapshot taken against a
    /// different catalog restores with the current definitions.
    pub fn restore(&mut self, snapshot: &Snapshot) -> SettleReport {
        let _guard = span!(Level::INFO, "restoring snapshot").entered();
        self.issues.clear();
        self.instances = snapshot
            .instances
            .iter()
            .map(|saved| saved.restore(&self.catalog))
            .collect();
        self.wires = snapshot.wires.clone();
        self.clock = snapshot.clock;
        self.run_settle()
    }

    /// Renders the top-level netlist as a program.
    ///
    /// A wire with exactly one explicit pin is written with a single pin
    /// argument, which is re-read as a target pin whenever the target type
    /// declares an input of that name.
    pub fn to_program(&self) -> Program {
        let mut program = Program::new();
        for instance in self.instances.iter() {
            program.push_instance(instance.chip.clone(), instance.id.clone(), instance.position);
        }
        for wire in self.wires.iter() {
            let pins = match (&wire.from_pin, &wire.to_pin) {
                (None, None) => WirePins::Implicit,
                (Some(pin), None) | (None, Some(pin)) => WirePins::Ambiguous(pin.clone()),
                (Some(from_pin), Some(to_pin)) => WirePins::Both {
                    from_pin: from_pin.clone(),
                    to_pin: to_pin.clone(),
                },
            };
            program.push_wire(wire.from.clone(), wire.to.clone(), pins);
        }
        program
    }

    /// The IDs of all top-level `INPUT` instances, in netlist order.
    pub fn input_ids(&self) -> impl Iterator<Item = &ArcStr> {
        self.instances
            .iter()
            .filter(|instance| instance.is_input())
            .map(Instance::id)
    }
}
