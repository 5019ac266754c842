//! The builtin chip catalog.

use crate::{Catalog, CompositeDef, PrimitiveDef, PrimitiveKind, Wire, INPUT, OUT};

impl Catalog {
    /// Creates a catalog containing the builtin primitives and composites.
    ///
    /// Primitives: `INPUT`, `AND`, `OR`, `NAND`, `NOT`, `DFF`.
    /// Composites: `XOR`, `MUX`, `MUX_4_BIT`, `NOT_4_BIT`, `AND_4_BIT`,
    /// `HALF_ADDER`, `FULL_ADDER`, `ADDER_4_BIT`, `ALU_4_BIT`, `BIT` and
    /// `REGISTER_4_BIT`.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();

        catalog.insert(
            INPUT,
            PrimitiveDef::new(PrimitiveKind::Input, [] as [&str; 0], [OUT]),
        );
        for kind in [PrimitiveKind::And, PrimitiveKind::Or, PrimitiveKind::Nand] {
            catalog.insert(kind.name(), PrimitiveDef::new(kind, ["A", "B"], [OUT]));
        }
        catalog.insert("NOT", PrimitiveDef::new(PrimitiveKind::Not, ["In"], [OUT]));
        catalog.insert("DFF", PrimitiveDef::new(PrimitiveKind::Dff, ["In"], [OUT]));

        catalog.insert("XOR", xor());
        catalog.insert("MUX", mux());
        catalog.insert("MUX_4_BIT", mux4());
        catalog.insert("NOT_4_BIT", not4());
        catalog.insert("AND_4_BIT", and4());
        catalog.insert("HALF_ADDER", half_adder());
        catalog.insert("FULL_ADDER", full_adder());
        catalog.insert("ADDER_4_BIT", adder4());
        catalog.insert("ALU_4_BIT", alu4());
        catalog.insert("BIT", bit());
        catalog.insert("REGISTER_4_BIT", register4());

        catalog
    }
}

/// `(A OR B) AND (A NAND B)`.
fn xor() -> CompositeDef {
    CompositeDef::new(["A", "B"], [OUT])
        .component("n1", "OR", 50, 50)
        .component("n2", "NAND", 50, 150)
        .component("n3", "AND", 200, 100)
        .wire(Wire::new("n1", "n3"))
        .wire(Wire::new("n2", "n3"))
        .wire(Wire::new("A", "n1").to_pin("A"))
        .wire(Wire::new("A", "n2").to_pin("A"))
        .wire(Wire::new("B", "n1").to_pin("B"))
        .wire(Wire::new("B", "n2").to_pin("B"))
        .map_input("A", [("n1", "A"), ("n2", "A")])
        .map_input("B", [("n1", "B"), ("n2", "B")])
        .main_output("n3")
}

/// Selects `A` when `Sel` is low and `B` when it is high.
fn mux() -> CompositeDef {
    CompositeDef::new(["A", "B", "Sel"], [OUT])
        .component("not1", "NOT", 50, 150)
        .component("and1", "AND", 200, 50)
        .component("and2", "AND", 200, 200)
        .component("or1", "OR", 350, 125)
        .wire(Wire::new("Sel", "not1").to_pin("In"))
        .wire(Wire::new("not1", "and1").to_pin("B"))
        .wire(Wire::new("Sel", "and2").to_pin("B"))
        .wire(Wire::new("A", "and1").to_pin("A"))
        .wire(Wire::new("B", "and2").to_pin("A"))
        .wire(Wire::new("and1", "or1").to_pin("A"))
        .wire(Wire::new("and2", "or1").to_pin("B"))
        .map_input("A", [("and1", "A")])
        .map_input("B", [("and2", "A")])
        .map_input("Sel", [("not1", "In"), ("and2", "B")])
        .main_output("or1")
}

fn mux4() -> CompositeDef {
    let mut def = CompositeDef::new(
        ["A0", "A1", "A2", "A3", "B0", "B1", "B2", "B3", "Sel"],
        ["Out0", "Out1", "Out2", "Out3"],
    );
    for i in 0..4 {
        let m = format!("m{i}");
        def = def
            .component(m.as_str(), "MUX", 50, 50 + 100 * i)
            .wire(Wire::new("Sel", m.as_str()).to_pin("Sel"));
    }
    for i in 0..4 {
        let m = format!("m{i}");
        def = def
            .wire(Wire::new(format!("A{i}"), m.as_str()).to_pin("A"))
            .wire(Wire::new(format!("B{i}"), m.as_str()).to_pin("B"));
    }
    let sel = ["m0", "m1", "m2", "m3"].map(|m| (m, "Sel"));
    def = def.map_input("Sel", sel);
    for (i, m) in ["m0", "m1", "m2", "m3"].into_iter().enumerate() {
        def = def
            .map_input(format!("A{i}"), [(m, "A")])
            .map_input(format!("B{i}"), [(m, "B")])
            .map_output(format!("Out{i}"), m);
    }
    def
}

fn not4() -> CompositeDef {
    let mut def = CompositeDef::new(["In0", "In1", "In2", "In3"], ["Out0", "Out1", "Out2", "Out3"]);
    for (i, n) in ["n0", "n1", "n2", "n3"].into_iter().enumerate() {
        def = def
            .component(n, "NOT", 50, 50 + 100 * i as i64)
            .wire(Wire::new(format!("In{i}"), n).to_pin("In"))
            .map_input(format!("In{i}"), [(n, "In")])
            .map_output(format!("Out{i}"), n);
    }
    def
}

fn and4() -> CompositeDef {
    let mut def = CompositeDef::new(
        ["A0", "A1", "A2", "A3", "B0", "B1", "B2", "B3"],
        ["Out0", "Out1", "Out2", "Out3"],
    );
    for (i, a) in ["a0", "a1", "a2", "a3"].into_iter().enumerate() {
        def = def.component(a, "AND", 50, 50 + 100 * i as i64);
    }
    for (i, a) in ["a0", "a1", "a2", "a3"].into_iter().enumerate() {
        def = def
            .wire(Wire::new(format!("A{i}"), a).to_pin("A"))
            .wire(Wire::new(format!("B{i}"), a).to_pin("B"))
            .map_input(format!("A{i}"), [(a, "A")])
            .map_input(format!("B{i}"), [(a, "B")])
            .map_output(format!("Out{i}"), a);
    }
    def
}

fn half_adder() -> CompositeDef {
    CompositeDef::new(["A", "B"], ["SUM", "CARRY"])
        .component("xor0", "XOR", 200, 50)
        .component("and0", "AND", 200, 200)
        .wire(Wire::new("A", "xor0").to_pin("A"))
        .wire(Wire::new("A", "and0").to_pin("A"))
        .wire(Wire::new("B", "xor0").to_pin("B"))
        .wire(Wire::new("B", "and0").to_pin("B"))
        .map_input("A", [("xor0", "A"), ("and0", "A")])
        .map_input("B", [("xor0", "B"), ("and0", "B")])
        .map_output("SUM", "xor0")
        .map_output("CARRY", "and0")
        .main_output("xor0")
}

fn full_adder() -> CompositeDef {
    CompositeDef::new(["A", "B", "Cin"], ["SUM", "Cout"])
        .component("ha1", "HALF_ADDER", 50, 50)
        .component("ha2", "HALF_ADDER", 400, 50)
        .component("or1", "OR", 400, 250)
        .wire(Wire::new("ha1", "ha2").from_pin("SUM").to_pin("A"))
        .wire(Wire::new("ha1", "or1").from_pin("CARRY"))
        .wire(Wire::new("ha2", "or1").from_pin("CARRY"))
        .wire(Wire::new("A", "ha1").to_pin("A"))
        .wire(Wire::new("B", "ha1").to_pin("B"))
        .wire(Wire::new("Cin", "ha2").to_pin("B"))
        .map_input("A", [("ha1", "A")])
        .map_input("B", [("ha1", "B")])
        .map_input("Cin", [("ha2", "B")])
        .map_output("SUM", "ha2")
        .map_output("Cout", "or1")
        .main_output("ha2")
}

/// A ripple-carry adder. Inputs are interleaved `A0, B0, A1, B1, ...`.
fn adder4() -> CompositeDef {
    let mut def = CompositeDef::new(
        ["A0", "B0", "A1", "B1", "A2", "B2", "A3", "B3"],
        ["S0", "S1", "S2", "S3", "Cout"],
    );
    let adders = ["fa0", "fa1", "fa2", "fa3"];
    for (i, fa) in adders.into_iter().enumerate() {
        def = def.component(fa, "FULL_ADDER", 50 + 300 * i as i64, 50);
    }
    for pair in adders.windows(2) {
        def = def.wire(Wire::new(pair[0], pair[1]).from_pin("Cout").to_pin("Cin"));
    }
    for (i, fa) in adders.into_iter().enumerate() {
        def = def
            .wire(Wire::new(format!("A{i}"), fa).to_pin("A"))
            .wire(Wire::new(format!("B{i}"), fa).to_pin("B"))
            .map_input(format!("A{i}"), [(fa, "A")])
            .map_input(format!("B{i}"), [(fa, "B")]);
    }
    def.map_output("S0", "fa0")
        .map_output("S1", "fa1")
        .map_output("S2", "fa2")
        .map_output_pin("S3", "fa3", "SUM")
        .map_output_pin("Cout", "fa3", "Cout")
        .main_output("fa3")
}

/// A 4-bit Hack-style ALU.
///
/// `zx`/`zy` zero an operand, `nx`/`ny` negate it, `f` selects between
/// AND (low) and ADD (high), and `no` negates the result.
fn alu4() -> CompositeDef {
    let mut def = CompositeDef::new(
        [
            "X0", "X1", "X2", "X3", "Y0", "Y1", "Y2", "Y3", "zx", "nx", "zy", "ny", "f", "no",
        ],
        ["Out0", "Out1", "Out2", "Out3"],
    )
    .component("mux_zx", "MUX_4_BIT", 50, 50)
    .component("not_nx", "NOT_4_BIT", 200, 50)
    .component("mux_nx", "MUX_4_BIT", 350, 50)
    .component("mux_zy", "MUX_4_BIT", 50, 350)
    .component("not_ny", "NOT_4_BIT", 200, 350)
    .component("mux_ny", "MUX_4_BIT", 350, 350)
    .component("alu_and", "AND_4_BIT", 600, 100)
    .component("alu_add", "ADDER_4_BIT", 600, 300)
    .component("mux_f", "MUX_4_BIT", 800, 200)
    .component("not_no", "NOT_4_BIT", 950, 100)
    .component("mux_no", "MUX_4_BIT", 1100, 200);

    // Operand preprocessing: zero, then optionally negate.
    for (operand, zero, neg, zmux, inv, nmux) in [
        ("X", "zx", "nx", "mux_zx", "not_nx", "mux_nx"),
        ("Y", "zy", "ny", "mux_zy", "not_ny", "mux_ny"),
    ] {
        def = def.wire(Wire::new(zero, zmux).to_pin("Sel"));
        for i in 0..4 {
            def = def.wire(Wire::new(format!("{operand}{i}"), zmux).to_pin(format!("A{i}")));
        }
        for i in 0..4 {
            def = def.wire(
                Wire::new(zmux, inv)
                    .from_pin(format!("Out{i}"))
                    .to_pin(format!("In{i}")),
            );
        }
        def = def.wire(Wire::new(neg, nmux).to_pin("Sel"));
        for i in 0..4 {
            def = def
                .wire(
                    Wire::new(zmux, nmux)
                        .from_pin(format!("Out{i}"))
                        .to_pin(format!("A{i}")),
                )
                .wire(
                    Wire::new(inv, nmux)
                        .from_pin(format!("Out{i}"))
                        .to_pin(format!("B{i}")),
                );
        }
    }

    for unit in ["alu_and", "alu_add"] {
        for i in 0..4 {
            def = def
                .wire(
                    Wire::new("mux_nx", unit)
                        .from_pin(format!("Out{i}"))
                        .to_pin(format!("A{i}")),
                )
                .wire(
                    Wire::new("mux_ny", unit)
                        .from_pin(format!("Out{i}"))
                        .to_pin(format!("B{i}")),
                );
        }
    }

    def = def.wire(Wire::new("f", "mux_f").to_pin("Sel"));
    for i in 0..4 {
        def = def
            .wire(
                Wire::new("alu_and", "mux_f")
                    .from_pin(format!("Out{i}"))
                    .to_pin(format!("A{i}")),
            )
            .wire(
                Wire::new("alu_add", "mux_f")
                    .from_pin(format!("S{i}"))
                    .to_pin(format!("B{i}")),
            );
    }
    for i in 0..4 {
        def = def.wire(
            Wire::new("mux_f", "not_no")
                .from_pin(format!("Out{i}"))
                .to_pin(format!("In{i}")),
        );
    }
    def = def.wire(Wire::new("no", "mux_no").to_pin("Sel"));
    for i in 0..4 {
        def = def
            .wire(
                Wire::new("mux_f", "mux_no")
                    .from_pin(format!("Out{i}"))
                    .to_pin(format!("A{i}")),
            )
            .wire(
                Wire::new("not_no", "mux_no")
                    .from_pin(format!("Out{i}"))
                    .to_pin(format!("B{i}")),
            );
    }

    for (pin, target) in [
        ("zx", "mux_zx"),
        ("nx", "mux_nx"),
        ("zy", "mux_zy"),
        ("ny", "mux_ny"),
        ("f", "mux_f"),
        ("no", "mux_no"),
    ] {
        def = def.map_input(pin, [(target, "Sel")]);
    }
    for i in 0..4 {
        let a = format!("A{i}");
        def = def
            .map_input(format!("X{i}"), [("mux_zx", a.as_str())])
            .map_input(format!("Y{i}"), [("mux_zy", a.as_str())])
            .map_output_pin(format!("Out{i}"), "mux_no", format!("Out{i}"));
    }
    def
}

/// A 1-bit register: loads `In` on the clock edge when `Load` is high,
/// otherwise holds its value.
fn bit() -> CompositeDef {
    CompositeDef::new(["In", "Load"], ["Out"])
        .component("mux", "MUX", 50, 50)
        .component("dff", "DFF", 200, 50)
        .wire(Wire::new("dff", "mux").to_pin("A"))
        .wire(Wire::new("In", "mux").to_pin("B"))
        .wire(Wire::new("Load", "mux").to_pin("Sel"))
        .wire(Wire::new("mux", "dff").to_pin("In"))
        .map_input("In", [("mux", "B")])
        .map_input("Load", [("mux", "Sel")])
        .map_output("Out", "dff")
        .main_output("dff")
}

fn register4() -> CompositeDef {
    let mut def = CompositeDef::new(
        ["In0", "In1", "In2", "In3", "Load"],
        ["Out0", "Out1", "Out2", "Out3"],
    );
    let bits = ["bit0", "bit1", "bit2", "bit3"];
    for (i, b) in bits.into_iter().enumerate() {
        def = def
            .component(b, "BIT", 50, 50 + 100 * i as i64)
            .wire(Wire::new(format!("In{i}"), b).to_pin("In"))
            .wire(Wire::new("Load", b).to_pin("Load"))
            .map_input(format!("In{i}"), [(b, "In")])
            .map_output(format!("Out{i}"), b);
    }
    def.map_input("Load", bits.map(|b| (b, "Load")))
}
