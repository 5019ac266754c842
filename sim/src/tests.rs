use test_log::test;

use chipdef::{Catalog, CompositeDef, Position, PrimitiveKind, Wire, OUT};
use diagnostics::Diagnostic;

use crate::*;

fn simulator() -> Simulator {
    Simulator::new(Catalog::builtin())
}

/// Drives every listed pin of a single `dut` instance from its own `INPUT`.
fn harness(chip: &str, pins: &[&str]) -> Simulator {
    let mut src = format!("{chip} dut\n");
    for pin in pins {
        src.push_str(&format!("INPUT in_{pin}\nWIRE in_{pin} dut {pin}\n"));
    }
    let mut sim = simulator();
    let report = sim.assemble(&src);
    assert!(report.converged);
    assert!(sim.issues().is_empty(), "{}", sim.issues());
    sim
}

fn set(sim: &mut Simulator, id: &str, value: bool) {
    if sim.value(id) != Some(value) {
        let report = sim.toggle_input(id).unwrap();
        assert!(report.converged);
    }
}

fn set_bus(sim: &mut Simulator, prefix: &str, value: u8) {
    for i in 0..4 {
        set(sim, &format!("in_{prefix}{i}"), value & (1 << i) != 0);
    }
}

fn read_bus(sim: &Simulator, prefix: &str) -> u8 {
    (0..4)
        .filter(|i| sim.output("dut", &format!("{prefix}{i}")).unwrap())
        .map(|i| 1 << i)
        .sum()
}

const COMBOS: [(bool, bool); 4] = [(false, false), (false, true), (true, false), (true, true)];

#[test]
fn primitive_gates_follow_truth_tables() {
    let gates: [(&str, fn(bool, bool) -> bool); 3] = [
        ("AND", |a, b| a && b),
        ("OR", |a, b| a || b),
        ("NAND", |a, b| !(a && b)),
    ];
    for (chip, expected) in gates {
        let mut sim = harness(chip, &["A", "B"]);
        for (a, b) in COMBOS {
            set(&mut sim, "in_A", a);
            set(&mut sim, "in_B", b);
            assert_eq!(sim.value("dut"), Some(expected(a, b)), "{chip}({a}, {b})");
            assert_eq!(sim.output("dut", OUT), Some(expected(a, b)));
        }
    }

    let mut sim = harness("NOT", &["In"]);
    assert_eq!(sim.value("dut"), Some(true));
    set(&mut sim, "in_In", true);
    assert_eq!(sim.value("dut"), Some(false));
}

#[test]
fn xor_composite_matches_primitive_xor() {
    let mut sim = harness("XOR", &["A", "B"]);
    for (a, b) in COMBOS {
        set(&mut sim, "in_A", a);
        set(&mut sim, "in_B", b);
        assert_eq!(
            sim.value("dut"),
            Some(PrimitiveKind::Xor.evaluate(a, b, false)),
            "XOR({a}, {b})"
        );
    }
}

#[test]
fn settling_a_settled_circuit_changes_nothing() {
    let mut sim = harness("FULL_ADDER", &["A", "B", "Cin"]);
    set(&mut sim, "in_A", true);
    set(&mut sim, "in_Cin", true);
    assert_eq!(sim.output("dut", "SUM"), Some(false));
    assert_eq!(sim.output("dut", "Cout"), Some(true));

    let before = sim.instances().to_vec();
    let report = sim.settle();
    assert_eq!(
        report,
        SettleReport {
            passes: 1,
            converged: true
        }
    );
    assert_eq!(sim.instances(), before.as_slice());
}

#[test]
fn acyclic_chain_settles_within_depth_plus_one() {
    // Declared back to front, so each pass only advances the change one gate.
    let mut sim = simulator();
    sim.assemble(
        "NOT n4\nNOT n3\nNOT n2\nNOT n1\nINPUT a\n\
         WIRE a n1\nWIRE n1 n2\nWIRE n2 n3\nWIRE n3 n4\n",
    );
    assert_eq!(sim.value("n4"), Some(false));

    let report = sim.toggle_input("a").unwrap();
    assert!(report.converged);
    assert!(report.passes <= 5, "took {} passes", report.passes);
    assert_eq!(sim.value("n4"), Some(true));
    assert_eq!(sim.last_report(), Some(report));
}

const REGISTER: &str = "INPUT d\nINPUT load\nBIT r\nWIRE d r In\nWIRE load r Load\n";

#[test]
fn bit_register_loads_on_tick_and_holds() {
    let mut sim = simulator();
    sim.assemble(REGISTER);
    set(&mut sim, "d", true);
    sim.tick();
    assert_eq!(sim.value("r"), Some(false), "loaded without Load");

    set(&mut sim, "load", true);
    assert_eq!(sim.value("r"), Some(false), "loaded before the clock edge");
    sim.tick();
    assert_eq!(sim.value("r"), Some(true));
    assert_eq!(sim.output("r", "Out"), Some(true));
    assert_eq!(sim.clock(), 2);

    set(&mut sim, "load", false);
    for d in [false, true, false] {
        set(&mut sim, "d", d);
        let report = sim.tick();
        assert!(report.converged);
        assert_eq!(sim.value("r"), Some(true));
    }
    assert_eq!(sim.clock(), 5);

    sim.assemble(REGISTER);
    assert_eq!(sim.clock(), 0);
    assert_eq!(sim.value("r"), Some(false));
}

#[test]
fn dff_value_changes_only_on_tick() {
    let mut sim = simulator();
    sim.assemble("INPUT d\nDFF q\nWIRE d q\n");
    sim.toggle_input("d");
    let q = sim.instance("q").unwrap();
    assert!(!q.value());
    assert!(q.next_value());

    sim.tick();
    assert_eq!(sim.value("q"), Some(true));
    assert_eq!(sim.output("q", OUT), Some(true));
}

#[test]
fn register_bits_are_independent() {
    let mut sim = harness("REGISTER_4_BIT", &["In0", "In1", "In2", "In3", "Load"]);
    set(&mut sim, "in_In1", true);
    set(&mut sim, "in_In3", true);
    set(&mut sim, "in_Load", true);
    sim.tick();
    set(&mut sim, "in_Load", false);
    set(&mut sim, "in_In1", false);
    sim.tick();
    assert_eq!(read_bus(&sim, "Out"), 0b1010);
}

#[test]
fn feedback_loop_stops_at_pass_limit() {
    let mut sim = simulator();
    let report = sim.assemble("NOT n\nWIRE n n\n");
    assert_eq!(
        report,
        SettleReport {
            passes: DEFAULT_MAX_PASSES,
            converged: false
        }
    );
    assert!(sim.issues().has_warning());
    assert!(sim
        .issues()
        .iter()
        .any(|issue| issue.cause() == &Cause::DidNotConverge { passes: 100 }));

    let mut sim = Simulator::with_options(Catalog::builtin(), SimOptions { max_passes: 7 });
    let report = sim.assemble("NOT n\nWIRE n n\n");
    assert_eq!(report.passes, 7);
    assert!(!report.converged);
}

#[test]
fn non_convergence_suggests_a_fix() {
    let mut sim = simulator();
    sim.assemble("NOT n\nWIRE n n\n");
    let issue = sim.issues().iter().next().unwrap();
    assert!(issue.help().is_some());

    sim.assemble("INPUT a\nfoo f\n");
    assert!(sim.issues().iter().all(|issue| issue.help().is_none()));
}

#[test]
fn zero_pass_limit_still_evaluates_once() {
    let mut sim = Simulator::with_options(Catalog::builtin(), SimOptions { max_passes: 0 });
    let report = sim.assemble("NOT n\n");
    assert_eq!(report.passes, 1);
    assert_eq!(sim.value("n"), Some(true));
}

#[test]
fn implicit_pins_fill_in_declared_order() {
    let mut sim = simulator();
    sim.assemble(
        "INPUT s\nINPUT a\nINPUT b\nMUX m\n\
         WIRE s m Sel\nWIRE a m\nWIRE b m\n",
    );
    assert_eq!(sim.wires()[0], Wire::new("s", "m").to_pin("Sel"));
    assert_eq!(sim.wires()[1], Wire::new("a", "m"));

    sim.toggle_input("a");
    let m = sim.instance("m").unwrap();
    assert_eq!(m.inputs().get("A"), Some(&true));
    assert_eq!(m.inputs().get("B"), Some(&false));
    assert_eq!(m.inputs().get("Sel"), Some(&false));
    assert!(m.value());

    sim.toggle_input("s");
    assert_eq!(sim.value("m"), Some(false));
}

#[test]
fn single_pin_argument_prefers_target_input() {
    let mut sim = simulator();
    sim.assemble(
        "INPUT a\nHALF_ADDER h\nAND g\n\
         WIRE a h B\nWIRE h g CARRY\nWIRE h g SUM\n",
    );
    assert_eq!(sim.wires()[0], Wire::new("a", "h").to_pin("B"));
    assert_eq!(sim.wires()[1], Wire::new("h", "g").from_pin("CARRY"));
    assert_eq!(sim.wires()[2], Wire::new("h", "g").from_pin("SUM"));

    sim.toggle_input("a");
    assert_eq!(sim.output("h", "SUM"), Some(true));
    assert_eq!(sim.output("h", "CARRY"), Some(false));
    let g = sim.instance("g").unwrap();
    assert_eq!(g.inputs().get("A"), Some(&false));
    assert_eq!(g.inputs().get("B"), Some(&true));
    assert!(!g.value());
}

#[test]
fn inputs_follow_pin_order_of_first_fed_chip() {
    let mut sim = simulator();
    sim.assemble(
        "INPUT b\nINPUT sel\nINPUT a\nINPUT extra\nMUX m\n\
         WIRE sel m Sel\nWIRE b m B\nWIRE a m A\n",
    );
    let ids: Vec<&str> = sim.instances().iter().map(|i| i.id().as_str()).collect();
    assert_eq!(ids, ["a", "b", "sel", "extra", "m"]);
    let inputs: Vec<&str> = sim.input_ids().map(|id| id.as_str()).collect();
    assert_eq!(inputs, ["a", "b", "sel", "extra"]);
}

#[test]
fn input_order_anchors_on_first_declared_chip() {
    let mut sim = simulator();
    sim.assemble(
        "AND g\nMUX m\nINPUT s\nINPUT a\nINPUT b\n\
         WIRE s m Sel\nWIRE a g\nWIRE b g\n",
    );
    let ids: Vec<&str> = sim.instances().iter().map(|i| i.id().as_str()).collect();
    assert_eq!(ids, ["g", "m", "a", "b", "s"]);
}

#[test]
fn settled_state_does_not_depend_on_instance_order() {
    let lines = ["INPUT d", "INPUT load", "BIT r", "DFF q", "XOR x"];
    let wires = "WIRE d r In\nWIRE load r Load\nWIRE r q\nWIRE q x\nWIRE d x\n";
    let program = |lines: &[&str]| format!("{}\n{wires}", lines.join("\n"));

    let mut forward = simulator();
    forward.assemble(&program(&lines));
    let mut reversed_lines = lines;
    reversed_lines.reverse();
    let mut reversed = simulator();
    reversed.assemble(&program(&reversed_lines));

    let check = |a: &Simulator, b: &Simulator| {
        for id in ["d", "load", "r", "q", "x"] {
            let (a, b) = (a.instance(id).unwrap(), b.instance(id).unwrap());
            assert_eq!(a.value(), b.value(), "value of {id}");
            assert_eq!(a.next_value(), b.next_value(), "next value of {id}");
            assert_eq!(a.outputs(), b.outputs(), "outputs of {id}");
        }
    };
    check(&forward, &reversed);
    for step in ["d", "load", "tick", "load", "tick", "d", "tick", "tick"] {
        for sim in [&mut forward, &mut reversed] {
            if step == "tick" {
                assert!(sim.tick().converged);
            } else {
                assert!(sim.toggle_input(step).unwrap().converged);
            }
        }
        check(&forward, &reversed);
    }
    assert_eq!(forward.value("r"), Some(true));
    assert_eq!(forward.value("q"), Some(true));
}

#[test]
fn unknown_types_output_zero() {
    let mut sim = simulator();
    sim.assemble("foo f 1 2\nINPUT a\nWIRE a f\n");
    let issue = sim.issues().iter().next().unwrap();
    assert_eq!(
        issue.cause(),
        &Cause::UnknownChipType {
            id: "f".into(),
            chip: "FOO".into(),
        }
    );
    assert!(!sim.issues().has_warning());

    sim.toggle_input("a");
    let f = sim.instance("f").unwrap();
    assert_eq!(f.body(), &Body::Unknown);
    assert_eq!(f.position(), Some(Position::new(1, 2)));
    assert_eq!(f.inputs().get("A"), Some(&true));
    assert!(!f.value());
}

#[test]
fn dangling_wires_read_zero() {
    let mut sim = simulator();
    sim.assemble("NOT n\nWIRE ghost n\n");
    assert_eq!(sim.instance("n").unwrap().inputs().get("In"), Some(&false));
    assert_eq!(sim.value("n"), Some(true));
}

#[test]
fn toggling_a_non_input_is_reported() {
    let mut sim = simulator();
    sim.assemble("AND g\n");
    assert_eq!(sim.toggle_input("g"), None);
    assert_eq!(
        sim.issues().iter().next().unwrap().cause(),
        &Cause::NotAnInput { id: "g".into() }
    );
    assert_eq!(sim.toggle_input("missing"), None);
    assert_eq!(sim.value("g"), Some(false));
}

#[test]
fn duplicate_ids_resolve_to_the_first() {
    let mut sim = simulator();
    sim.assemble("INPUT a\nNOT a\nNOT n\nWIRE a n\n");
    assert_eq!(sim.instances().len(), 3);
    assert_eq!(sim.issues().num_warnings(), 1);
    assert_eq!(sim.instance("a").unwrap().chip(), "INPUT");

    sim.toggle_input("a").unwrap();
    assert_eq!(sim.value("n"), Some(false));
}

#[test]
fn skipped_lines_are_reported() {
    let mut sim = simulator();
    sim.assemble("AND\nINPUT a x y\n");
    assert_eq!(sim.instances().len(), 1);
    assert_eq!(sim.issues().len(), 2);
    assert!(sim
        .issues()
        .iter()
        .all(|issue| matches!(issue.cause(), Cause::Syntax(_))));
    assert!(!sim.issues().has_warning());
}

const ADDER_PINS: [&str; 8] = ["A0", "B0", "A1", "B1", "A2", "B2", "A3", "B3"];

#[test]
fn four_bit_adder_adds() {
    let mut sim = harness("ADDER_4_BIT", &ADDER_PINS);
    for (a, b) in [(5u8, 6u8), (9, 9), (15, 1), (0, 0)] {
        set_bus(&mut sim, "A", a);
        set_bus(&mut sim, "B", b);
        let sum = a + b;
        assert_eq!(read_bus(&sim, "S"), sum & 0xf, "{a} + {b}");
        assert_eq!(sim.output("dut", "Cout"), Some(sum > 15), "{a} + {b}");
    }
}

const ALU_PINS: [&str; 14] = [
    "X0", "X1", "X2", "X3", "Y0", "Y1", "Y2", "Y3", "zx", "nx", "zy", "ny", "f", "no",
];

#[test]
fn alu_computes_hack_functions() {
    let mut sim = harness("ALU_4_BIT", &ALU_PINS);
    set_bus(&mut sim, "X", 5);
    set_bus(&mut sim, "Y", 3);

    set(&mut sim, "in_f", true);
    assert_eq!(read_bus(&sim, "Out"), 8, "x + y");

    set(&mut sim, "in_f", false);
    assert_eq!(read_bus(&sim, "Out"), 1, "x & y");

    set(&mut sim, "in_no", true);
    assert_eq!(read_bus(&sim, "Out"), 0b1110, "!(x & y)");

    set(&mut sim, "in_no", false);
    set(&mut sim, "in_zx", true);
    set(&mut sim, "in_nx", true);
    set(&mut sim, "in_zy", true);
    set(&mut sim, "in_f", true);
    assert_eq!(read_bus(&sim, "Out"), 0b1111, "-1");
}

#[test]
fn composite_instances_do_not_share_state() {
    let mut sim = simulator();
    sim.assemble(
        "INPUT d\nINPUT load\nBIT r1\nBIT r2\n\
         WIRE d r1 In\nWIRE load r1 Load\nWIRE d r2 In\n",
    );
    set(&mut sim, "d", true);
    set(&mut sim, "load", true);
    sim.tick();
    assert_eq!(sim.value("r1"), Some(true));
    assert_eq!(sim.value("r2"), Some(false));

    let dff = |id: &str| {
        sim.instance(id)
            .and_then(Instance::internals)
            .and_then(|internals| internals.component("dff"))
            .map(Instance::value)
    };
    assert_eq!(dff("r1"), Some(true));
    assert_eq!(dff("r2"), Some(false));
}

#[test]
fn instantiate_copies_blueprints() {
    let catalog = Catalog::builtin();
    assert!(instantiate(&catalog, "AND").is_none());
    assert!(instantiate(&catalog, "NOPE").is_none());

    let xor = instantiate(&catalog, "XOR").unwrap();
    let ids: Vec<&str> = xor.components().iter().map(|c| c.id().as_str()).collect();
    assert_eq!(ids, ["n1", "n2", "n3"]);
    assert_eq!(xor.wires().len(), 6);
    assert_eq!(xor.component("n1").unwrap().position(), Some(Position::new(50, 50)));

    let adder = instantiate(&catalog, "FULL_ADDER").unwrap();
    let ha1 = adder.component("ha1").unwrap().internals().unwrap();
    assert!(ha1.component("xor0").unwrap().internals().is_some());
}

#[test]
fn cyclic_definitions_instantiate_without_recursing() {
    let mut catalog = Catalog::builtin();
    catalog.insert(
        "SELF",
        CompositeDef::new(["A"], [OUT]).component("me", "SELF", 0, 0),
    );
    let internals = instantiate(&catalog, "SELF").unwrap();
    assert_eq!(internals.components()[0].body(), &Body::Unknown);

    let mut sim = Simulator::new(catalog);
    let report = sim.assemble("SELF s\n");
    assert!(report.converged);
    assert_eq!(sim.value("s"), Some(false));
}

#[test]
fn snapshots_round_trip_through_json() {
    let mut sim = simulator();
    sim.assemble(REGISTER);
    set(&mut sim, "d", true);
    set(&mut sim, "load", true);
    sim.tick();
    sim.set_expanded("r", true);

    let json = serde_json::to_string(&sim.snapshot()).unwrap();
    let snapshot: Snapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(snapshot, sim.snapshot());

    let mut restored = simulator();
    let report = restored.restore(&snapshot);
    assert!(report.converged);
    assert_eq!(restored.clock(), 1);
    assert_eq!(restored.instances(), sim.instances());
    assert!(restored.instance("r").unwrap().expanded());

    set(&mut restored, "load", false);
    set(&mut restored, "d", false);
    restored.tick();
    assert_eq!(restored.value("r"), Some(true));
}

#[test]
fn sparse_snapshots_use_defaults() {
    let snapshot: Snapshot = serde_json::from_str(
        r#"{"instances": [
            {"id": "a", "type": "input", "value": true},
            {"id": "n", "type": "NOT"}
        ], "wires": [{"from": "a", "to": "n"}]}"#,
    )
    .unwrap();
    assert_eq!(snapshot.clock, 0);

    let mut sim = simulator();
    sim.restore(&snapshot);
    assert!(sim.instance("a").unwrap().is_input());
    assert_eq!(sim.value("n"), Some(false));
    sim.toggle_input("a");
    assert_eq!(sim.value("n"), Some(true));
}

#[test]
fn sparse_flip_flop_snapshot_drives_out() {
    let snapshot: Snapshot = serde_json::from_str(
        r#"{"instances": [
            {"id": "q", "type": "DFF", "value": true},
            {"id": "n", "type": "NOT"}
        ], "wires": [{"from": "q", "from_pin": "OUT", "to": "n"}]}"#,
    )
    .unwrap();

    let mut sim = simulator();
    sim.restore(&snapshot);
    assert_eq!(sim.output("q", OUT), sim.value("q"));
    assert_eq!(sim.value("n"), Some(false));
    sim.tick();
    assert_eq!(sim.output("q", OUT), Some(false));
    assert_eq!(sim.value("n"), Some(true));
}

#[test]
fn exported_program_reassembles_identically() {
    let mut sim = simulator();
    sim.assemble(
        "INPUT a 0 0\nINPUT b 0 50\nhalf_adder h 100 25\nNOT n\n\
         WIRE a h A\nWIRE b h B\nWIRE h n CARRY\nWIRE h n SUM In\n",
    );
    let program = sim.to_program();
    let src = program.to_string();

    let mut again = simulator();
    again.assemble(&src);
    assert!(again.issues().is_empty(), "{}", again.issues());
    assert_eq!(again.wires(), sim.wires());
    assert_eq!(again.instances(), sim.instances());
    assert_eq!(again.to_program(), program);
}

#[test]
fn options_load_from_toml() {
    assert_eq!(SimOptions::from_toml("").unwrap(), SimOptions::default());
    assert_eq!(
        SimOptions::from_toml("max_passes = 7\n").unwrap().max_passes,
        7
    );
    assert!(SimOptions::from_toml("max_passes = \"many\"\n").is_err());
}
