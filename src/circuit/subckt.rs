use std::collections::HashMap;
use tracing::{debug, info};
use crate::export::CircuitEmitter;
use crate::{ErrorContext, SynthResult};
use super::{CircuitError, Expr, Namespace, NodeId, PlacementSlot, WireSegment, WIRE_CAP_PARAM, WIRE_RES_PARAM, WIRE_SUBCKT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
    InOut,
    Source,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub name: NodeId,
    pub direction: PortDirection,
}

/// Electrical state of one mux switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchState {
    /// On the signal path, gate driven by `n_gate`.
    Conducting,
    /// Gate tied off, input driven by the circuit.
    Blocking,
    /// Gate tied off, input grounded; only loads the wire it hangs on.
    Stub,
}

/// What an instance stands for; never rendered, only inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Switch { level: u8, state: SwitchState },
    Wire,
    Load { slot: PlacementSlot, distinguished: bool },
    Restorer,
    Inverter,
    Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub name: NodeId,
    pub target: String,
    pub nets: Vec<NodeId>,
    pub params: Vec<(String, Expr)>,
    pub role: Role,
}

impl Instance {
    pub fn new<S: Into<String>>(name: NodeId, target: S, role: Role) -> Self {
        Self { name, target: target.into(), nets: vec![], params: vec![], role }
    }

    pub fn nets<I>(mut self, nets: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        self.nets.extend(nets.into_iter().map(Into::into));
        self
    }

    pub fn param<S: Into<String>>(mut self, name: S, value: Expr) -> Self {
        self.params.push((name.into(), value));
        self
    }

    pub fn wire(name: NodeId, segment: &WireSegment) -> Self {
        Self::new(name, WIRE_SUBCKT, Role::Wire)
            .nets([segment.from.clone(), segment.to.clone()])
            .param(WIRE_RES_PARAM, segment.resistance.clone())
            .param(WIRE_CAP_PARAM, segment.capacitance.clone())
    }

    pub fn param_value(&self, name: &str) -> Option<&Expr> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    pub fn segment(&self) -> Option<WireSegment> {
        if self.role != Role::Wire || self.nets.len() != 2 {
            return None;
        }
        Some(WireSegment::new(
            self.nets[0].clone(),
            self.nets[1].clone(),
            self.param_value(WIRE_RES_PARAM)?.clone(),
            self.param_value(WIRE_CAP_PARAM)?.clone(),
        ))
    }
}

/// One self-contained circuit block, built completely before it is emitted.
#[derive(Debug)]
pub struct Subckt {
    pub name: String,
    pub ports: Vec<Port>,
    pub instances: Vec<Instance>,
    nodes: Namespace,
    instance_names: Namespace,
}

impl Subckt {
    pub fn new<S: Into<String>>(name: S) -> Self {
        let name = name.into();
        Self {
            nodes: Namespace::new(format!("nodes of subckt '{}'", name)),
            instance_names: Namespace::new(format!("instances of subckt '{}'", name)),
            name,
            ports: vec![],
            instances: vec![],
        }
    }

    pub fn add_port<N: Into<NodeId>>(&mut self, name: N, direction: PortDirection) -> Result<NodeId, CircuitError> {
        let name = name.into();
        debug!("add port {} to subckt {}", name, self.name);
        if self.ports.iter().any(|p| p.name == name) {
            return Err(CircuitError::DuplicatePort(name.to_string(), self.name.clone()));
        }
        let name = self.nodes.claim(name)?;
        self.ports.push(Port { name: name.clone(), direction });
        Ok(name)
    }

    /// Claims a new internal node; reusing a name fails.
    pub fn add_node<N: Into<NodeId>>(&mut self, name: N) -> Result<NodeId, CircuitError> {
        self.nodes.claim(name.into())
    }

    pub fn add_instance(&mut self, instance: Instance) -> Result<(), CircuitError> {
        debug!("add instance {} ({}) to subckt {}", instance.name, instance.target, self.name);
        self.instance_names.claim(instance.name.clone())?;
        self.instances.push(instance);
        Ok(())
    }

    pub fn add_wire(&mut self, name: NodeId, segment: &WireSegment) -> Result<(), CircuitError> {
        self.add_instance(Instance::wire(name, segment))
    }

    /// Adds `segments` as `prefix_1 .. prefix_k`.
    pub fn add_wires(&mut self, prefix: &NodeId, segments: &[WireSegment]) -> Result<(), CircuitError> {
        for (i, segment) in segments.iter().enumerate() {
            self.add_wire(NodeId::next(prefix, i + 1), segment)?;
        }
        Ok(())
    }

    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    pub fn port_names(&self) -> Vec<NodeId> {
        self.ports.iter().map(|p| p.name.clone()).collect()
    }

    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.instances.iter().find(|i| i.name == name)
    }

    pub fn instances_with(&self, pred: impl Fn(&Role) -> bool) -> impl Iterator<Item = &Instance> {
        self.instances.iter().filter(move |i| pred(&i.role))
    }

    pub fn wires(&self) -> impl Iterator<Item = &Instance> {
        self.instances_with(|r| *r == Role::Wire)
    }

    pub fn segments(&self) -> Vec<WireSegment> {
        self.wires().filter_map(|w| w.segment()).collect()
    }

    pub fn emit(&self, emitter: &mut dyn CircuitEmitter) -> SynthResult<()> {
        emitter.begin_subckt(&self.name, &self.port_names())?;
        for inst in self.instances.iter() {
            match inst.segment() {
                Some(seg) => emitter.emit_wire(&inst.name, &seg.from, &seg.to, &seg.resistance, &seg.capacitance)?,
                None => emitter.emit_instance(&inst.name, &inst.nets, &inst.target, &inst.params)?,
            }
        }
        emitter.end_subckt()
    }
}

/// Ordered set of top-level blocks; block names are unique.
#[derive(Debug)]
pub struct Netlist {
    blocks: Vec<Subckt>,
    names: Namespace,
}

impl Default for Netlist {
    fn default() -> Self {
        Self::new()
    }
}

impl Netlist {
    pub fn new() -> Self {
        Self { blocks: vec![], names: Namespace::new("netlist") }
    }

    pub fn add(&mut self, subckt: Subckt) -> Result<(), CircuitError> {
        self.names.claim(NodeId::new(subckt.name.clone()))?;
        info!("add subckt '{}' ({} instances)", subckt.name, subckt.instances.len());
        self.blocks.push(subckt);
        Ok(())
    }

    pub fn extend(&mut self, subckts: impl IntoIterator<Item = Subckt>) -> Result<(), CircuitError> {
        for subckt in subckts {
            self.add(subckt)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Subckt> {
        self.blocks.iter().find(|b| b.name == name)
    }

    pub fn blocks(&self) -> &[Subckt] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Instances of blocks defined here must match the block's port count.
    pub fn validate(&self) -> Result<(), CircuitError> {
        let port_sizes: HashMap<&str, usize> = self.blocks.iter()
            .map(|b| (b.name.as_str(), b.ports.len()))
            .collect();

        for block in self.blocks.iter() {
            for inst in block.instances.iter() {
                if let Some(&size) = port_sizes.get(inst.target.as_str()) {
                    if size != inst.nets.len() {
                        return Err(CircuitError::PinSizeUnmatch(size, inst.nets.len(), format!("{}.{}", block.name, inst.name)));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn emit(&self, emitter: &mut dyn CircuitEmitter) -> SynthResult<()> {
        self.validate()?;
        for block in self.blocks.iter() {
            block.emit(emitter).with_context(|| format!("emit subckt '{}'", block.name))?;
        }
        Ok(())
    }
}
