mod layout;
pub use layout::*;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::check_arg;
use super::{CircuitError, Instance, LoadTargets, NodeId, PortDirection, Role, Subckt, SwitchState, WireRc};

pub const N_IN: &str = "n_in";
pub const N_OUT: &str = "n_out";
pub const N_GATE: &str = "n_gate";
pub const N_GATE_N: &str = "n_gate_n";
pub const N_VDD: &str = "n_vdd";
pub const N_GND: &str = "n_gnd";

/// How the switches of a mux are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuxFamily {
    /// NMOS pass transistors, needs a level restorer after the tree.
    #[default]
    PassTransistor,
    /// NMOS/PMOS transmission gates.
    TransmissionGate,
}

impl MuxFamily {
    pub fn switch_prefix(&self) -> &'static str {
        match self {
            MuxFamily::PassTransistor => "ptran",
            MuxFamily::TransmissionGate => "tgate",
        }
    }

    /// `ptran_<mux>_L1`
    pub fn switch_target(&self, mux: &str, level: u8) -> String {
        format!("{}_{}_L{}", self.switch_prefix(), mux, level)
    }

    pub fn has_restorer(&self) -> bool {
        matches!(self, MuxFamily::PassTransistor)
    }

    /// Pin order: pass transistor `in out gate gnd`,
    /// transmission gate `in out gate gate_n vdd gnd`.
    pub fn switch_nets(&self, input: &NodeId, output: &NodeId, state: SwitchState) -> Vec<NodeId> {
        let input = match state {
            SwitchState::Stub => NodeId::new(N_GND),
            _ => input.clone(),
        };
        let (gate, gate_n) = match state {
            SwitchState::Conducting => (N_GATE, N_GATE_N),
            SwitchState::Blocking | SwitchState::Stub => (N_GND, N_VDD),
        };
        match self {
            MuxFamily::PassTransistor => vec![input, output.clone(), gate.into(), N_GND.into()],
            MuxFamily::TransmissionGate => vec![
                input, output.clone(), gate.into(), gate_n.into(), N_VDD.into(), N_GND.into(),
            ],
        }
    }
}

/// The electrically distinct blocks one mux is characterized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuxVariant {
    Off,
    Partial,
    OnMuxOnly,
    Driven,
    SenseOnly,
}

impl MuxVariant {
    pub const ALL: [MuxVariant; 5] = [
        MuxVariant::Off,
        MuxVariant::Partial,
        MuxVariant::OnMuxOnly,
        MuxVariant::Driven,
        MuxVariant::SenseOnly,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            MuxVariant::Off => "off",
            MuxVariant::Partial => "partial",
            MuxVariant::OnMuxOnly => "on",
            MuxVariant::Driven => "driven",
            MuxVariant::SenseOnly => "sense",
        }
    }

    pub fn subckt_name(&self, mux: &str) -> String {
        format!("{}_{}", mux, self.suffix())
    }

    pub fn has_output(&self) -> bool {
        !matches!(self, MuxVariant::Off | MuxVariant::Partial)
    }

    pub fn ports(&self) -> &'static [(&'static str, PortDirection)] {
        const WITHOUT_OUTPUT: &[(&str, PortDirection)] = &[
            (N_IN, PortDirection::Input),
            (N_GATE, PortDirection::Input),
            (N_GATE_N, PortDirection::Input),
            (N_VDD, PortDirection::Source),
            (N_GND, PortDirection::Source),
        ];
        const WITH_OUTPUT: &[(&str, PortDirection)] = &[
            (N_IN, PortDirection::Input),
            (N_OUT, PortDirection::Output),
            (N_GATE, PortDirection::Input),
            (N_GATE_N, PortDirection::Input),
            (N_VDD, PortDirection::Source),
            (N_GND, PortDirection::Source),
        ];
        if self.has_output() { WITH_OUTPUT } else { WITHOUT_OUTPUT }
    }
}

/// Two-level decomposition of an N-way mux.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct MuxSpec {
    pub name: String,
    pub family: MuxFamily,
    pub implemented_size: usize,
    /// Inner fan-in.
    pub level1_size: usize,
    /// Outer fan-in.
    pub level2_size: usize,
}

impl MuxSpec {
    /// `level2 = floor(sqrt(n))`, `level1 = ceil(n / level2)`.
    pub fn decompose<S: Into<String>>(name: S, family: MuxFamily, required_size: usize) -> Result<Self, CircuitError> {
        check_arg!(required_size >= 1, "mux required size is 0");
        let level2_size = required_size.isqrt();
        let level1_size = required_size.div_ceil(level2_size);
        Ok(Self::new(name.into(), family, level1_size * level2_size, level1_size, level2_size))
    }

    pub fn validate(&self) -> Result<(), CircuitError> {
        check_arg!(!self.name.is_empty(), "mux name is empty");
        check_arg!(self.level1_size >= 1, "mux '{}' level 1 size is 0", self.name);
        check_arg!(self.level2_size >= 1, "mux '{}' level 2 size is 0", self.name);

        let product = self.level1_size.checked_mul(self.level2_size)
            .ok_or_else(|| CircuitError::config(format!("mux '{}' sizes overflow", self.name)))?;
        let tolerance = self.level1_size.max(self.level2_size);
        check_arg!(
            product >= self.implemented_size && product - self.implemented_size < tolerance,
            "mux '{}' implemented size {} does not fit {}x{}",
            self.name, self.implemented_size, self.level1_size, self.level2_size
        );
        Ok(())
    }

    pub fn wire_l1(&self) -> WireRc {
        WireRc::named(&format!("{}_L1", self.name))
    }

    pub fn wire_l2(&self) -> WireRc {
        WireRc::named(&format!("{}_L2", self.name))
    }

    pub fn wire_driver(&self) -> WireRc {
        WireRc::named(&format!("{}_driver", self.name))
    }

    pub fn subckt_name(&self, variant: MuxVariant) -> String {
        variant.subckt_name(&self.name)
    }
}

/// All five blocks of one mux.
#[derive(Debug)]
pub struct MuxBlocks {
    pub spec: MuxSpec,
    pub blocks: Vec<(MuxVariant, Subckt)>,
}

impl MuxBlocks {
    pub fn get(&self, variant: MuxVariant) -> Option<&Subckt> {
        self.blocks.iter().find(|(v, _)| *v == variant).map(|(_, s)| s)
    }

    /// Blocks a wire load instantiates, with `on` as the on-state load.
    pub fn load_targets(&self, on: MuxVariant) -> LoadTargets {
        LoadTargets::of(&self.spec.name, on)
    }

    pub fn into_subckts(self) -> impl Iterator<Item = Subckt> {
        self.blocks.into_iter().map(|(_, s)| s)
    }
}

/// Builds every variant of `spec`. Nothing is built unless `spec` is valid.
pub fn synthesize(spec: &MuxSpec) -> Result<MuxBlocks, CircuitError> {
    spec.validate()?;
    info!(
        "synthesize mux '{}' ({}: {}x{})",
        spec.name, spec.implemented_size, spec.level1_size, spec.level2_size
    );
    let blocks = MuxVariant::ALL.iter()
        .map(|&variant| Ok((variant, MuxBuilder::new(spec, variant)?.build()?)))
        .collect::<Result<Vec<_>, CircuitError>>()?;
    Ok(MuxBlocks { spec: spec.clone(), blocks })
}

pub fn synthesize_variant(spec: &MuxSpec, variant: MuxVariant) -> Result<Subckt, CircuitError> {
    spec.validate()?;
    MuxBuilder::new(spec, variant)?.build()
}

struct MuxBuilder<'a> {
    spec: &'a MuxSpec,
    variant: MuxVariant,
    subckt: Subckt,
}

impl<'a> MuxBuilder<'a> {
    fn new(spec: &'a MuxSpec, variant: MuxVariant) -> Result<Self, CircuitError> {
        let mut subckt = Subckt::new(spec.subckt_name(variant));
        for &(name, direction) in variant.ports() {
            subckt.add_port(name, direction)?;
        }
        Ok(Self { spec, variant, subckt })
    }

    fn build(mut self) -> Result<Subckt, CircuitError> {
        debug!("build {:?} block of mux '{}'", self.variant, self.spec.name);
        match self.variant {
            MuxVariant::Off => {
                self.add_switch(1, "off", &N_IN.into(), &N_GND.into(), SwitchState::Blocking)?;
            }
            MuxVariant::Partial => {
                let junction = self.add_level1()?;
                self.add_switch(2, "off", &junction, &N_GND.into(), SwitchState::Blocking)?;
            }
            MuxVariant::OnMuxOnly => {
                let junction = self.add_level1()?;
                self.add_level2(&junction)?;
            }
            MuxVariant::Driven => self.add_output_stage(true)?,
            MuxVariant::SenseOnly => self.add_output_stage(false)?,
        }
        Ok(self.subckt)
    }

    fn switch_name(&self, level: u8, tag: &str) -> NodeId {
        NodeId::new(self.spec.family.switch_prefix()).name(format!("lvl{}", level)).name(tag)
    }

    fn add_switch(&mut self, level: u8, tag: &str, input: &NodeId, output: &NodeId, state: SwitchState) -> Result<(), CircuitError> {
        let name = self.switch_name(level, tag);
        self.add_switch_named(name, level, input, output, state)
    }

    fn add_switch_named(&mut self, name: NodeId, level: u8, input: &NodeId, output: &NodeId, state: SwitchState) -> Result<(), CircuitError> {
        let family = self.spec.family;
        let inst = Instance::new(name, family.switch_target(&self.spec.name, level), Role::Switch { level, state })
            .nets(family.switch_nets(input, output, state));
        self.subckt.add_instance(inst)
    }

    fn add_stubs(&mut self, level: u8, stubs: &[NodeId]) -> Result<(), CircuitError> {
        for (i, stub) in stubs.iter().enumerate() {
            let name = NodeId::next(&self.switch_name(level, "off"), i + 1);
            self.add_switch_named(name, level, &N_GND.into(), stub, SwitchState::Stub)?;
        }
        Ok(())
    }

    /// Conducting level-1 switch plus its stubs; returns the junction feeding level 2.
    fn add_level1(&mut self) -> Result<NodeId, CircuitError> {
        let layout = level1_layout(self.spec.level1_size, &self.spec.wire_l1(), |i| NodeId::new("n").index(1).index(i))?;
        self.subckt.add_node(layout.selected.clone())?;
        for stub in layout.stubs.iter() {
            self.subckt.add_node(stub.clone())?;
        }

        self.add_switch(1, "on", &N_IN.into(), &layout.selected, SwitchState::Conducting)?;
        self.subckt.add_wires(&NodeId::new("wire").name("lvl1"), &layout.segments)?;
        self.add_stubs(1, &layout.stubs)?;
        Ok(layout.exit)
    }

    fn add_level2(&mut self, junction: &NodeId) -> Result<(), CircuitError> {
        let layout = level2_layout(
            self.spec.level2_size,
            &self.spec.wire_l2(),
            |i| NodeId::new("n").index(2).index(i),
            N_OUT.into(),
        )?;
        for node in std::iter::once(&layout.selected).chain(layout.stubs.iter()) {
            if *node != layout.exit {
                self.subckt.add_node(node.clone())?;
            }
        }

        self.add_switch(2, "on", junction, &layout.selected, SwitchState::Conducting)?;
        self.subckt.add_wires(&NodeId::new("wire").name("lvl2"), &layout.segments)?;
        self.add_stubs(2, &layout.stubs)?;
        Ok(())
    }

    /// The on-path block followed by the sense inverter, and for `driven`
    /// a wire and a second inverter.
    fn add_output_stage(&mut self, driven: bool) -> Result<(), CircuitError> {
        let spec = self.spec;
        let name = &spec.name;
        let mux_out = self.subckt.add_node(NodeId::new("n").index(1).index(1))?;
        let on_block = self.spec.subckt_name(MuxVariant::OnMuxOnly);
        let inst = Instance::new(NodeId::new(on_block.clone()), on_block, Role::Block)
            .nets([N_IN.into(), mux_out.clone(), N_GATE.into(), N_GATE_N.into(), N_VDD.into(), N_GND.into()]);
        self.subckt.add_instance(inst)?;

        let sense_out: NodeId = if driven {
            self.subckt.add_node(NodeId::new("n").index(1).index(2))?
        } else {
            N_OUT.into()
        };

        if self.spec.family.has_restorer() {
            let rest = Instance::new(NodeId::new("rest").name(name.clone()), format!("rest_{}", name), Role::Restorer)
                .nets([mux_out.clone(), sense_out.clone(), N_VDD.into(), N_GND.into()]);
            self.subckt.add_instance(rest)?;
        }

        let inv1 = Instance::new(NodeId::new("inv").name(name.clone()).index(1), format!("inv_{}_1", name), Role::Inverter)
            .nets([mux_out, sense_out.clone(), N_VDD.into(), N_GND.into()]);
        self.subckt.add_instance(inv1)?;

        if driven {
            let driver_in = self.subckt.add_node(NodeId::new("n").index(1).index(3))?;
            let segment = self.spec.wire_driver().segment(sense_out, driver_in.clone());
            self.subckt.add_wire(NodeId::new("wire").name(name.clone()).name("driver"), &segment)?;

            let inv2 = Instance::new(NodeId::new("inv").name(name.clone()).index(2), format!("inv_{}_2", name), Role::Inverter)
                .nets([driver_in, N_OUT.into(), N_VDD.into(), N_GND.into()]);
            self.subckt.add_instance(inv2)?;
        }
        Ok(())
    }
}
