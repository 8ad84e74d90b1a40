use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::check_arg;
use super::{
    split, CircuitError, Instance, LoadCounts, LoadPlan, MuxVariant, NodeId, PlacementSlot,
    PortDirection, Role, Subckt, WireRc, WireSegment, N_GATE, N_GATE_N, N_GND, N_IN, N_OUT, N_VDD,
};

pub const N_CB_OUT: &str = "n_cb_out";
pub const N_TAP: &str = "n_tap";
pub const N_VDD_SB_MUX_ON: &str = "n_vdd_sb_mux_on";
pub const N_VDD_CB_MUX_ON: &str = "n_vdd_cb_mux_on";
pub const N_VDD_LOCAL_MUX_ON: &str = "n_vdd_local_mux_on";

/// Names of the blocks instantiated for each load state.
///
/// The on block has pins `in out gate gate_n vdd gnd`, the partial and
/// off blocks `in gate gate_n vdd gnd`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct LoadTargets {
    pub on: String,
    pub partial: String,
    pub off: String,
}

impl LoadTargets {
    pub fn of(mux: &str, on: MuxVariant) -> Self {
        Self::new(
            on.subckt_name(mux),
            MuxVariant::Partial.subckt_name(mux),
            MuxVariant::Off.subckt_name(mux),
        )
    }

    fn target(&self, slot: PlacementSlot) -> &str {
        match slot {
            PlacementSlot::On => &self.on,
            PlacementSlot::Partial => &self.partial,
            PlacementSlot::Off => &self.off,
        }
    }
}

/// Loads hanging on one tile of a routing wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct TileLoads {
    /// Switch-block muxes at the far end of the tile.
    pub sb: LoadCounts,
    /// Connection-block muxes along the tile.
    pub cb: LoadCounts,
}

#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct RoutingWireSpec {
    pub name: String,
    /// `tiles[0]` is tile 1, the one that terminates the chain.
    pub tiles: Vec<TileLoads>,
    pub sb_targets: LoadTargets,
    pub cb_targets: LoadTargets,
    /// Defaults to `wire_<name>_res` / `wire_<name>_cap`.
    #[builder(default, setter(strip_option))]
    pub wire: Option<WireRc>,
}

impl RoutingWireSpec {
    pub fn wire_rc(&self) -> WireRc {
        self.wire.clone().unwrap_or_else(|| WireRc::named(&self.name))
    }
}

#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct LocalWireSpec {
    pub name: String,
    pub counts: LoadCounts,
    pub targets: LoadTargets,
    #[builder(default, setter(strip_option))]
    pub wire: Option<WireRc>,
}

impl LocalWireSpec {
    pub fn wire_rc(&self) -> WireRc {
        self.wire.clone().unwrap_or_else(|| WireRc::named(&self.name))
    }
}

/// Nodes a caller connects the chain with.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainPorts {
    pub input: NodeId,
    /// Driven by the one on-load that carries the signal to the next stage.
    pub output: NodeId,
    /// Far end of the wire, where wire delay is measured.
    pub tap: NodeId,
    pub cb_output: Option<NodeId>,
    /// Separate supplies of the instrumented on-loads.
    pub rails: Vec<NodeId>,
}

#[derive(Debug)]
pub struct LoadChain {
    pub subckt: Subckt,
    pub ports: ChainPorts,
}

impl LoadChain {
    pub fn segments(&self) -> Vec<WireSegment> {
        self.subckt.segments()
    }

    pub fn instances(&self) -> &[Instance] {
        &self.subckt.instances
    }

    pub fn loads(&self, slot: PlacementSlot) -> impl Iterator<Item = &Instance> {
        self.subckt.instances_with(move |r| matches!(r, Role::Load { slot: s, .. } if *s == slot))
    }

    pub fn signal_loads(&self) -> impl Iterator<Item = &Instance> {
        self.subckt.instances_with(|r| matches!(r, Role::Load { distinguished: true, .. }))
    }
}

/// Where one group of loads goes and how its instances are named.
struct LoadGroup<'a> {
    prefix: NodeId,
    targets: &'a LoadTargets,
    /// `(output, supply)` for the distinguished on-load; `None` terminates it locally.
    signal: Option<(NodeId, NodeId)>,
}

fn slot_tag(slot: PlacementSlot) -> &'static str {
    match slot {
        PlacementSlot::On => "on",
        PlacementSlot::Partial => "partial",
        PlacementSlot::Off => "off",
    }
}

fn add_loads(subckt: &mut Subckt, plan: &LoadPlan, group: &LoadGroup, attach: impl Fn(usize) -> NodeId) -> Result<(), CircuitError> {
    for (pos, slot) in plan.iter() {
        let node = attach(pos);
        let name = group.prefix.name(slot_tag(slot)).index(pos);
        let target = group.targets.target(slot);

        let inst = match slot {
            PlacementSlot::On => {
                let (output, supply, distinguished) = match &group.signal {
                    Some((output, supply)) if plan.is_distinguished(pos) => (output.clone(), supply.clone(), true),
                    _ => {
                        let dead_end = subckt.add_node(NodeId::new("n").join(&name).name("out"))?;
                        (dead_end, NodeId::new(N_VDD), false)
                    }
                };
                Instance::new(name, target, Role::Load { slot, distinguished })
                    .nets([node, output, N_GATE.into(), N_GATE_N.into(), supply, N_GND.into()])
            }
            PlacementSlot::Partial | PlacementSlot::Off => {
                Instance::new(name, target, Role::Load { slot, distinguished: false })
                    .nets([node, N_GATE.into(), N_GATE_N.into(), N_VDD.into(), N_GND.into()])
            }
        };
        subckt.add_instance(inst)?;
    }
    Ok(())
}

fn claim_inner_nodes(subckt: &mut Subckt, segments: &[WireSegment]) -> Result<(), CircuitError> {
    for seg in segments.iter().take(segments.len().saturating_sub(1)) {
        subckt.add_node(seg.to.clone())?;
    }
    Ok(())
}

fn add_common_ports(subckt: &mut Subckt) -> Result<(), CircuitError> {
    subckt.add_port(N_GATE, PortDirection::Input)?;
    subckt.add_port(N_GATE_N, PortDirection::Input)?;
    subckt.add_port(N_VDD, PortDirection::Source)?;
    subckt.add_port(N_GND, PortDirection::Source)?;
    Ok(())
}

/// Builds the load seen by a routing wire spanning `spec.tiles.len()` tiles.
///
/// Tile N is driven at `n_in` and feeds tile N-1, down to tile 1 whose far
/// end is `n_tap`. Each tile's share of the wire is split into one piece per
/// CB load, CB loads hang on the piece ends and SB loads on the tile end.
/// Only tile 1 carries the instrumented on-loads.
pub fn assemble_routing_wire(spec: &RoutingWireSpec) -> Result<LoadChain, CircuitError> {
    check_arg!(!spec.name.is_empty(), "routing wire name is empty");
    check_arg!(!spec.tiles.is_empty(), "routing wire '{}' spans no tile", spec.name);
    let tile_count = spec.tiles.len();
    let plans = spec.tiles.iter()
        .enumerate()
        .map(|(i, tile)| -> Result<(LoadPlan, LoadPlan), CircuitError> {
            let sb = LoadPlan::plan(tile.sb)
                .map_err(|e| CircuitError::config(format!("sb loads of tile {}: {}", i + 1, e)))?;
            let cb = LoadPlan::plan(tile.cb)
                .map_err(|e| CircuitError::config(format!("cb loads of tile {}: {}", i + 1, e)))?;
            Ok((sb, cb))
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!("assemble routing wire '{}' over {} tiles", spec.name, tile_count);
    let mut subckt = Subckt::new(format!("routing_wire_load_{}", spec.name));
    let input = subckt.add_port(N_IN, PortDirection::Input)?;
    let output = subckt.add_port(N_OUT, PortDirection::Output)?;
    let cb_output = subckt.add_port(N_CB_OUT, PortDirection::Output)?;
    let tap = subckt.add_port(N_TAP, PortDirection::Output)?;
    add_common_ports(&mut subckt)?;
    let sb_rail = subckt.add_port(N_VDD_SB_MUX_ON, PortDirection::Source)?;
    let cb_rail = subckt.add_port(N_VDD_CB_MUX_ON, PortDirection::Source)?;

    let tile_rc = spec.wire_rc().div(
        u32::try_from(tile_count).map_err(|_| CircuitError::config("too many tiles"))?,
    );
    let tile_name = |k: usize| NodeId::new(format!("t{}", k));

    let mut tile_in = input.clone();
    for k in (1..=tile_count).rev() {
        let (sb_plan, cb_plan) = &plans[k - 1];
        let tile_end = if k == 1 {
            tap.clone()
        } else {
            subckt.add_node(NodeId::new("n").join(&tile_name(k - 1)).name("in"))?
        };
        debug!("tile {}: {} -> {}", k, tile_in, tile_end);

        let via = NodeId::new("n").join(&tile_name(k)).name("w");
        let segments = split(&tile_rc, cb_plan.len(), &tile_in, &via, &tile_end)?;
        claim_inner_nodes(&mut subckt, &segments)?;
        subckt.add_wires(&NodeId::new("wire").join(&tile_name(k)), &segments)?;

        let cb = LoadGroup {
            prefix: NodeId::new("cb").join(&tile_name(k)),
            targets: &spec.cb_targets,
            signal: (k == 1).then(|| (cb_output.clone(), cb_rail.clone())),
        };
        add_loads(&mut subckt, cb_plan, &cb, |pos| segments[pos].to.clone())?;

        let sb = LoadGroup {
            prefix: NodeId::new("sb").join(&tile_name(k)),
            targets: &spec.sb_targets,
            signal: (k == 1).then(|| (output.clone(), sb_rail.clone())),
        };
        add_loads(&mut subckt, sb_plan, &sb, |_| tile_end.clone())?;

        tile_in = tile_end;
    }

    Ok(LoadChain {
        subckt,
        ports: ChainPorts { input, output, tap, cb_output: Some(cb_output), rails: vec![sb_rail, cb_rail] },
    })
}

/// Builds a single wire with one load per tap, in placement order.
pub fn assemble_local_wire(spec: &LocalWireSpec) -> Result<LoadChain, CircuitError> {
    check_arg!(!spec.name.is_empty(), "local wire name is empty");
    let plan = LoadPlan::plan(spec.counts)?;

    info!("assemble local wire '{}' with {} taps", spec.name, plan.len());
    let mut subckt = Subckt::new(format!("local_routing_wire_load_{}", spec.name));
    let input = subckt.add_port(N_IN, PortDirection::Input)?;
    let output = subckt.add_port(N_OUT, PortDirection::Output)?;
    let tap = subckt.add_port(N_TAP, PortDirection::Output)?;
    add_common_ports(&mut subckt)?;
    let rail = subckt.add_port(N_VDD_LOCAL_MUX_ON, PortDirection::Source)?;

    let segments = split(&spec.wire_rc(), plan.len(), &input, &NodeId::new("n").name("w"), &tap)?;
    claim_inner_nodes(&mut subckt, &segments)?;
    subckt.add_wires(&NodeId::new("wire").name("local"), &segments)?;

    let group = LoadGroup {
        prefix: NodeId::new("local"),
        targets: &spec.targets,
        signal: Some((output.clone(), rail.clone())),
    };
    add_loads(&mut subckt, &plan, &group, |pos| segments[pos].to.clone())?;

    Ok(LoadChain {
        subckt,
        ports: ChainPorts { input, output, tap, cb_output: None, rails: vec![rail] },
    })
}
