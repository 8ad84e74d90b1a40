use crate::circuit::{CircuitError, Expr, NodeId};
use crate::SynthResult;
use super::CircuitEmitter;

#[derive(Debug, Clone, PartialEq)]
pub enum EmitEvent {
    Begin { name: String, ports: Vec<NodeId> },
    Instance { name: NodeId, nets: Vec<NodeId>, target: String, params: Vec<(String, Expr)> },
    Wire { name: NodeId, from: NodeId, to: NodeId, rw: Expr, cw: Expr },
    End { name: String },
    Comment(String),
}

/// Keeps every call in order. Two runs over the same input must leave
/// equal logs.
#[derive(Debug, Default)]
pub struct RecordEmitter {
    pub events: Vec<EmitEvent>,
    open: Option<String>,
}

impl RecordEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subckt_names(&self) -> Vec<&str> {
        self.events.iter().filter_map(|e| match e {
            EmitEvent::Begin { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect()
    }

    /// Events between `Begin { name }` and its `End`.
    pub fn body(&self, subckt: &str) -> Vec<&EmitEvent> {
        self.events.iter()
            .skip_while(|e| !matches!(e, EmitEvent::Begin { name, .. } if name == subckt))
            .skip(1)
            .take_while(|e| !matches!(e, EmitEvent::End { .. }))
            .collect()
    }

    fn check_open(&self, what: &NodeId) -> Result<(), CircuitError> {
        match self.open {
            Some(_) => Ok(()),
            None => Err(CircuitError::OutsideSubckt(what.to_string())),
        }
    }
}

impl CircuitEmitter for RecordEmitter {
    fn begin_subckt(&mut self, name: &str, ports: &[NodeId]) -> SynthResult<()> {
        if let Some(open) = &self.open {
            return Err(CircuitError::NestedSubckt(open.clone(), name.to_string()))?;
        }
        self.open = Some(name.to_string());
        self.events.push(EmitEvent::Begin { name: name.to_string(), ports: ports.to_vec() });
        Ok(())
    }

    fn emit_instance(&mut self, name: &NodeId, nets: &[NodeId], target: &str, params: &[(String, Expr)]) -> SynthResult<()> {
        self.check_open(name)?;
        self.events.push(EmitEvent::Instance {
            name: name.clone(),
            nets: nets.to_vec(),
            target: target.to_string(),
            params: params.to_vec(),
        });
        Ok(())
    }

    fn emit_wire(&mut self, name: &NodeId, from: &NodeId, to: &NodeId, rw: &Expr, cw: &Expr) -> SynthResult<()> {
        self.check_open(name)?;
        self.events.push(EmitEvent::Wire {
            name: name.clone(),
            from: from.clone(),
            to: to.clone(),
            rw: rw.clone(),
            cw: cw.clone(),
        });
        Ok(())
    }

    fn end_subckt(&mut self) -> SynthResult<()> {
        match self.open.take() {
            Some(name) => {
                self.events.push(EmitEvent::End { name });
                Ok(())
            }
            None => Err(CircuitError::OutsideSubckt(".ENDS".into()))?,
        }
    }

    fn emit_comment(&mut self, comment: &str) -> SynthResult<()> {
        self.events.push(EmitEvent::Comment(comment.to_string()));
        Ok(())
    }
}
