use loadsynth::circuit::{synthesize, CircuitError, Expr, MuxFamily, MuxSpec, Netlist, NodeId};
use loadsynth::config::SynthConfig;
use loadsynth::export::{to_spice, write_spice, CircuitEmitter, SpiceWriter};

fn mux_netlist(family: MuxFamily) -> Netlist {
    let mut netlist = Netlist::new();
    let spec = MuxSpec::new("m".into(), family, 4, 2, 2);
    netlist.extend(synthesize(&spec).unwrap().into_subckts()).unwrap();
    netlist
}

#[test]
fn test_spice_text() {
    let text = to_spice(&mux_netlist(MuxFamily::PassTransistor)).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], ".SUBCKT m_off n_in n_gate n_gate_n n_vdd n_gnd");
    assert_eq!(lines[1], "Xptran_lvl1_off n_in n_gnd n_gnd n_gnd ptran_m_L1");
    assert_eq!(lines[2], ".ENDS");
    assert!(lines.contains(&"Xwire_lvl1_1 n_1_1 n_1_2 wire Rw='wire_m_L1_res/2' Cw='wire_m_L1_cap/2'"));
    assert!(lines.contains(&".SUBCKT m_driven n_in n_out n_gate n_gate_n n_vdd n_gnd"));
    assert!(lines.contains(&"Xm_on n_in n_1_1 n_gate n_gate_n n_vdd n_gnd m_on"));
    assert_eq!(text.matches(".SUBCKT").count(), 5);
    assert_eq!(text.matches(".ENDS").count(), 5);
}

#[test]
fn test_literal_params_unquoted() {
    let mut writer = SpiceWriter::new(Vec::new());
    writer.begin_subckt("w", &[NodeId::new("a"), NodeId::new("b")]).unwrap();
    writer.emit_wire(&NodeId::new("wire_1"), &"a".into(), &"b".into(), &Expr::Literal(10.0), &Expr::named("c_w")).unwrap();
    writer.end_subckt().unwrap();

    let text = String::from_utf8(writer.into_inner()).unwrap();
    assert_eq!(text, ".SUBCKT w a b\nXwire_1 a b wire Rw=10 Cw='c_w'\n.ENDS\n\n");
}

#[test]
fn test_nested_subckt_rejected() {
    let mut writer = SpiceWriter::new(Vec::new());
    writer.begin_subckt("outer", &[]).unwrap();
    let err = writer.begin_subckt("inner", &[]).unwrap_err();
    assert!(matches!(err.circuit_error(), Some(CircuitError::NestedSubckt(_, _))));

    let mut writer = SpiceWriter::new(Vec::new());
    assert!(writer.end_subckt().is_err());
}

#[test]
fn test_output_is_byte_identical() {
    for family in [MuxFamily::PassTransistor, MuxFamily::TransmissionGate] {
        let first = to_spice(&mux_netlist(family)).unwrap();
        let second = to_spice(&mux_netlist(family)).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_collision_writes_nothing() {
    let dir = std::env::temp_dir().join(format!("loadsynth-collision-{}", std::process::id()));
    let job = format!(r#"{{
        "output_path": {:?},
        "muxes": [
            {{ "name": "sb_mux", "required_size": 9 }},
            {{ "name": "sb_mux", "required_size": 16 }}
        ]
    }}"#, dir);
    let config: SynthConfig = serde_json::from_str(&job).unwrap();

    let err = config.build_netlist().unwrap_err();
    assert!(err.is_naming_collision());
    assert!(!config.netlist_path().exists());
}

#[test]
fn test_write_netlist_file() {
    let dir = std::env::temp_dir().join(format!("loadsynth-write-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("mux.sp");

    let netlist = mux_netlist(MuxFamily::TransmissionGate);
    write_spice(&netlist, &path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, to_spice(&netlist).unwrap());

    std::fs::remove_dir_all(&dir).unwrap();
}
