use test_log::test;

use crate::*;

const HALF_ADDER: &str = r#"
INPUT a 0 0
input b 0 40

xor x 100 20
AND c
WIRE a x
wire b x
WIRE a c A
WIRE b c OUT B
"#;

#[test]
fn parse_half_adder() {
    let parsed = Program::parse(HALF_ADDER);
    assert!(parsed.issues.is_empty(), "{}", parsed.issues);
    let program = parsed.program;

    let instances: Vec<_> = program.instances().collect();
    assert_eq!(instances.len(), 4);
    assert_eq!(instances[1].chip, "INPUT");
    assert_eq!(instances[1].id, "b");
    assert_eq!(instances[1].position, Some(Position::new(0, 40)));
    assert_eq!(instances[2].chip, "XOR");
    assert_eq!(instances[3].position, None);

    let wires: Vec<_> = program.wires().collect();
    assert_eq!(wires.len(), 4);
    assert_eq!(wires[0].pins, WirePins::Implicit);
    assert_eq!(wires[1].from, "b");
    assert_eq!(wires[2].pins, WirePins::Ambiguous("A".into()));
    assert_eq!(
        wires[3].pins,
        WirePins::Both {
            from_pin: "OUT".into(),
            to_pin: "B".into(),
        }
    );
}

#[test]
fn ids_and_pins_keep_their_case() {
    let program = Program::parse("and Gate1\nWIRE Gate1 Gate2 sum Cin\n").program;
    let instance = program.instances().next().unwrap();
    assert_eq!(instance.chip, "AND");
    assert_eq!(instance.id, "Gate1");
    let wire = program.wires().next().unwrap();
    assert_eq!(
        wire.pins,
        WirePins::Both {
            from_pin: "sum".into(),
            to_pin: "Cin".into(),
        }
    );
}

#[test]
fn short_lines_are_skipped() {
    let parsed = Program::parse("AND\nWIRE a\nWIRE\nOR o\n");
    assert_eq!(parsed.program.statements.len(), 1);
    assert_eq!(parsed.issues.len(), 3);
    assert!(!parsed.issues.has_error());
    assert!(!parsed.issues.has_warning());
    let lines: Vec<_> = parsed.issues.iter().map(ParseIssue::line).collect();
    assert_eq!(lines, [1, 2, 3]);
    assert!(parsed
        .issues
        .iter()
        .all(|issue| matches!(issue.cause(), Cause::TooFewTokens { .. })));
}

#[test]
fn invalid_coordinates_drop_the_position() {
    let parsed = Program::parse("AND g1 10\nAND g2 x 5\nAND g3 -3 7\n");
    let positions: Vec<_> = parsed.program.instances().map(|i| i.position).collect();
    assert_eq!(positions, [None, None, Some(Position::new(-3, 7))]);
    assert_eq!(parsed.issues.len(), 2);
    assert!(matches!(
        parsed.issues.iter().next().unwrap().cause(),
        Cause::InvalidCoordinates { .. }
    ));
}

#[test]
fn extra_tokens_are_ignored() {
    let program = Program::parse("WIRE a b p q r\nAND g 1 2 3\n").program;
    assert_eq!(
        program.statements,
        [
            Statement::Wire(WireDecl {
                from: "a".into(),
                to: "b".into(),
                pins: WirePins::Both {
                    from_pin: "p".into(),
                    to_pin: "q".into(),
                },
            }),
            Statement::Instance(InstanceDecl {
                chip: "AND".into(),
                id: "g".into(),
                position: Some(Position::new(1, 2)),
            }),
        ]
    );
}

#[test]
fn tabs_and_crlf_separate_tokens() {
    let program = Program::parse("AND\tg1   4\t5\r\nWIRE  g1\tg2\r\n").program;
    assert_eq!(program.statements.len(), 2);
    let instance = program.instances().next().unwrap();
    assert_eq!(instance.position, Some(Position::new(4, 5)));
    assert_eq!(program.wires().next().unwrap().to, "g2");
}

#[test]
fn display_writes_parseable_source() {
    let mut program = Program::new();
    program.push_instance("INPUT", "a", Some(Position::new(1, 2)));
    program.push_instance("NOT", "n", None);
    program.push_wire("a", "n", WirePins::Implicit);
    program.push_wire("a", "n", WirePins::Ambiguous("In".into()));
    program.push_wire(
        "a",
        "n",
        WirePins::Both {
            from_pin: "OUT".into(),
            to_pin: "In".into(),
        },
    );

    let src = program.to_string();
    assert_eq!(
        src,
        "INPUT a 1 2\nNOT n\nWIRE a n\nWIRE a n In\nWIRE a n OUT In\n"
    );
    let reparsed = Program::parse(&src);
    assert!(reparsed.issues.is_empty());
    assert_eq!(reparsed.program, program);
}
