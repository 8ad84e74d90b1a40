use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use itertools::Itertools;
use tracing::{debug, info};
use crate::circuit::{CircuitError, Expr, Netlist, NodeId};
use crate::{ErrorContext, SynthResult};
use super::CircuitEmitter;

/// Renders emission calls as SPICE subcircuit text.
pub struct SpiceWriter<W: Write> {
    writer: W,
    open: Option<String>,
}

impl<W: Write> SpiceWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, open: None }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn format_param(name: &str, value: &Expr) -> String {
        if value.is_literal() {
            format!("{}={}", name, value)
        } else {
            format!("{}='{}'", name, value)
        }
    }
}

impl<W: Write> CircuitEmitter for SpiceWriter<W> {
    fn begin_subckt(&mut self, name: &str, ports: &[NodeId]) -> SynthResult<()> {
        if let Some(open) = &self.open {
            return Err(CircuitError::NestedSubckt(open.clone(), name.to_string()))?;
        }
        debug!("write subckt {}", name);
        writeln!(self.writer, ".SUBCKT {} {}", name, ports.iter().join(" "))?;
        self.open = Some(name.to_string());
        Ok(())
    }

    fn emit_instance(&mut self, name: &NodeId, nets: &[NodeId], target: &str, params: &[(String, Expr)]) -> SynthResult<()> {
        if self.open.is_none() {
            return Err(CircuitError::OutsideSubckt(name.to_string()))?;
        }
        write!(self.writer, "X{} {} {}", name, nets.iter().join(" "), target)?;
        if !params.is_empty() {
            let params = params.iter().map(|(n, v)| Self::format_param(n, v)).join(" ");
            write!(self.writer, " {}", params)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn end_subckt(&mut self) -> SynthResult<()> {
        match self.open.take() {
            Some(name) => {
                writeln!(self.writer, ".ENDS\n")?;
                debug!("end subckt {}", name);
                Ok(())
            }
            None => Err(CircuitError::OutsideSubckt(".ENDS".into()))?,
        }
    }

    fn emit_comment(&mut self, comment: &str) -> SynthResult<()> {
        writeln!(self.writer, "* {}", comment)?;
        Ok(())
    }
}

/// Renders `netlist` to a string.
pub fn to_spice(netlist: &Netlist) -> SynthResult<String> {
    let mut writer = SpiceWriter::new(Vec::new());
    netlist.emit(&mut writer)?;
    String::from_utf8(writer.into_inner()).context("netlist text is not utf-8")
}

pub fn write_spice<P: AsRef<Path>>(netlist: &Netlist, path: P) -> SynthResult<()> {
    let path = path.as_ref();
    info!("write {} subckts to {:?}", netlist.len(), path);
    let text = to_spice(netlist)?;
    let file = File::create(path).with_context(|| format!("create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}
