mod record;
mod spice;

pub use record::*;
pub use spice::*;

use crate::circuit::{Expr, NodeId, WIRE_CAP_PARAM, WIRE_RES_PARAM, WIRE_SUBCKT};
use crate::SynthResult;

/// Sink for the synthesized blocks.
///
/// Calls arrive as `begin_subckt`, any number of instances/wires, then
/// `end_subckt`. Blocks never nest; a block refers to another only by name
/// through an instance's target.
pub trait CircuitEmitter {
    fn begin_subckt(&mut self, name: &str, ports: &[NodeId]) -> SynthResult<()>;

    fn emit_instance(
        &mut self,
        name: &NodeId,
        nets: &[NodeId],
        target: &str,
        params: &[(String, Expr)],
    ) -> SynthResult<()>;

    fn emit_wire(&mut self, name: &NodeId, from: &NodeId, to: &NodeId, rw: &Expr, cw: &Expr) -> SynthResult<()> {
        let params = [
            (WIRE_RES_PARAM.to_string(), rw.clone()),
            (WIRE_CAP_PARAM.to_string(), cw.clone()),
        ];
        self.emit_instance(name, &[from.clone(), to.clone()], WIRE_SUBCKT, &params)
    }

    fn end_subckt(&mut self) -> SynthResult<()>;

    fn emit_comment(&mut self, _comment: &str) -> SynthResult<()> {
        Ok(())
    }
}
