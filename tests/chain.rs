use loadsynth::circuit::{
    assemble_local_wire, assemble_routing_wire, CircuitError, LoadCounts, LoadTargets,
    LocalWireSpecBuilder, MuxVariant, NodeId, PlacementSlot, RoutingWireSpec, RoutingWireSpecBuilder,
    TileLoads, WireSegment,
};

fn tile(sb: (usize, usize, usize), cb: (usize, usize, usize)) -> TileLoads {
    TileLoads::new(LoadCounts::new(sb.0, sb.1, sb.2), LoadCounts::new(cb.0, cb.1, cb.2))
}

fn routing(tiles: Vec<TileLoads>) -> RoutingWireSpec {
    RoutingWireSpecBuilder::default()
        .name("gen")
        .tiles(tiles)
        .sb_targets(LoadTargets::of("sb_mux", MuxVariant::Driven))
        .cb_targets(LoadTargets::of("cb_mux", MuxVariant::SenseOnly))
        .build()
        .unwrap()
}

fn assert_continuous(segments: &[WireSegment]) {
    for pair in segments.windows(2) {
        assert_eq!(pair[0].to, pair[1].from);
    }
}

#[test]
fn test_routing_wire_direction() {
    let chain = assemble_routing_wire(&routing(vec![tile((1, 1, 2), (1, 2, 4)); 2])).unwrap();
    assert_eq!(chain.subckt.name, "routing_wire_load_gen");

    let segments = chain.segments();
    assert_eq!(segments.len(), 14);
    assert_eq!(segments[0].from, NodeId::new("n_in"));
    assert_eq!(segments.last().unwrap().to, NodeId::new("n_tap"));
    assert_continuous(&segments);

    // tile 2 comes first and hands over at n_t1_in
    assert_eq!(chain.subckt.wires().next().unwrap().name, "wire_t2_1");
    assert_eq!(segments[6].to, NodeId::new("n_t1_in"));
}

#[test]
fn test_routing_wire_ports() {
    let chain = assemble_routing_wire(&routing(vec![tile((1, 1, 2), (1, 2, 4))])).unwrap();
    let ports: Vec<String> = chain.subckt.port_names().iter().map(|p| p.to_string()).collect();
    assert_eq!(ports, [
        "n_in", "n_out", "n_cb_out", "n_tap", "n_gate", "n_gate_n", "n_vdd", "n_gnd",
        "n_vdd_sb_mux_on", "n_vdd_cb_mux_on",
    ]);
    assert_eq!(chain.ports.rails.len(), 2);
}

#[test]
fn test_signal_loads_in_first_tile() {
    let chain = assemble_routing_wire(&routing(vec![tile((1, 1, 2), (1, 2, 4)); 3])).unwrap();

    let signal: Vec<_> = chain.signal_loads().collect();
    assert_eq!(signal.len(), 2);

    let sb = signal.iter().find(|i| i.target == "sb_mux_driven").unwrap();
    assert!(sb.name.to_string().starts_with("sb_t1_on"));
    assert_eq!(sb.nets[0], NodeId::new("n_tap"));
    assert_eq!(sb.nets[1], NodeId::new("n_out"));
    assert_eq!(sb.nets[4], NodeId::new("n_vdd_sb_mux_on"));

    let cb = signal.iter().find(|i| i.target == "cb_mux_sense").unwrap();
    assert!(cb.name.to_string().starts_with("cb_t1_on"));
    assert_eq!(cb.nets[1], NodeId::new("n_cb_out"));
    assert_eq!(cb.nets[4], NodeId::new("n_vdd_cb_mux_on"));

    // on-loads of other tiles end on their own nodes, powered from n_vdd
    let others: Vec<_> = chain.loads(PlacementSlot::On).filter(|i| !signal.contains(i)).collect();
    assert_eq!(others.len(), 4);
    for load in others {
        assert_eq!(load.nets[1].to_string(), format!("n_{}_out", load.name));
        assert_eq!(load.nets[4], NodeId::new("n_vdd"));
    }
}

#[test]
fn test_extra_on_loads_terminate_locally() {
    let chain = assemble_routing_wire(&routing(vec![tile((2, 2, 2), (1, 1, 1))])).unwrap();
    let sb_on: Vec<_> = chain.loads(PlacementSlot::On).filter(|i| i.target == "sb_mux_driven").collect();
    assert_eq!(sb_on.len(), 2);
    assert_eq!(sb_on.iter().filter(|i| i.nets[1] == NodeId::new("n_out")).count(), 1);
}

#[test]
fn test_load_counts() {
    let tiles = vec![tile((1, 1, 2), (1, 2, 4)), tile((2, 2, 6), (1, 3, 3))];
    let chain = assemble_routing_wire(&routing(tiles)).unwrap();
    assert_eq!(chain.loads(PlacementSlot::On).count(), 1 + 1 + 2 + 1);
    assert_eq!(chain.loads(PlacementSlot::Partial).count(), 1 + 2 + 2 + 3);
    assert_eq!(chain.loads(PlacementSlot::Off).count(), 2 + 4 + 6 + 3);

    // sb loads of tile 2 hang on the hand-over node
    let tile2_sb = chain.instances().iter()
        .filter(|i| i.name.to_string().starts_with("sb_t2"))
        .collect::<Vec<_>>();
    assert_eq!(tile2_sb.len(), 10);
    assert!(tile2_sb.iter().all(|i| i.nets[0] == NodeId::new("n_t1_in")));
}

#[test]
fn test_routing_wire_rc_total() {
    let chain = assemble_routing_wire(&routing(vec![tile((1, 1, 2), (1, 2, 4)), tile((1, 1, 1), (1, 1, 1))])).unwrap();
    let lookup = |name: &str| match name {
        "wire_gen_res" => Some(120.0),
        "wire_gen_cap" => Some(3.0),
        _ => None,
    };
    let segments = chain.segments();
    let r: f64 = segments.iter().map(|s| s.resistance.eval(&lookup).unwrap()).sum();
    let c: f64 = segments.iter().map(|s| s.capacitance.eval(&lookup).unwrap()).sum();
    approx::assert_relative_eq!(r, 120.0, epsilon = 1e-9);
    approx::assert_relative_eq!(c, 3.0, epsilon = 1e-9);
}

#[test]
fn test_invalid_counts_rejected() {
    let spec = routing(vec![tile((1, 1, 2), (1, 2, 4)), tile((0, 1, 2), (1, 2, 4))]);
    assert!(matches!(assemble_routing_wire(&spec), Err(CircuitError::Configuration(_))));

    let spec = routing(vec![tile((1, 1, 2), (1, 0, 4))]);
    assert!(matches!(assemble_routing_wire(&spec), Err(CircuitError::Configuration(_))));
}

#[test]
fn test_routing_wire_deterministic() {
    let spec = routing(vec![tile((1, 1, 2), (1, 2, 4)), tile((2, 2, 6), (1, 3, 3))]);
    let first = assemble_routing_wire(&spec).unwrap();
    let second = assemble_routing_wire(&spec).unwrap();
    assert_eq!(first.instances(), second.instances());
    assert_eq!(first.ports, second.ports);
}

#[test]
fn test_local_wire() {
    let spec = LocalWireSpecBuilder::default()
        .name("lr")
        .counts(LoadCounts::new(1, 2, 3))
        .targets(LoadTargets::of("local_mux", MuxVariant::OnMuxOnly))
        .build()
        .unwrap();
    let chain = assemble_local_wire(&spec).unwrap();
    assert_eq!(chain.subckt.name, "local_routing_wire_load_lr");
    assert!(chain.ports.cb_output.is_none());

    let segments = chain.segments();
    assert_eq!(segments.len(), 6);
    assert_continuous(&segments);
    assert!(segments.iter().all(|s| s.resistance.to_string() == "wire_lr_res/6"));

    let signal = chain.signal_loads().next().unwrap();
    assert_eq!(signal.target, "local_mux_on");
    assert_eq!(signal.nets[4], NodeId::new("n_vdd_local_mux_on"));
}
