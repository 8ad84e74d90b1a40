use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::circuit::{
    assemble_local_wire, assemble_routing_wire, synthesize, CircuitError, LoadCounts, LoadTargets,
    LocalWireSpec, MuxFamily, MuxSpec, MuxVariant, Netlist, RoutingWireSpec, TileLoads,
};
use crate::{ErrorContext, SynthResult};

/// A synthesis job, read from JSON.
#[derive(Debug, Deserialize, Serialize)]
pub struct SynthConfig {
    pub output_path: PathBuf,
    #[serde(default = "default_netlist_name")]
    pub netlist_name: String,
    #[serde(default)]
    pub muxes: Vec<MuxConfig>,
    #[serde(default)]
    pub routing_wires: Vec<RoutingWireConfig>,
    #[serde(default)]
    pub local_wires: Vec<LocalWireConfig>,
}

fn default_netlist_name() -> String {
    "loads.sp".into()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MuxConfig {
    pub name: String,
    #[serde(default)]
    pub family: MuxFamily,
    pub required_size: Option<usize>,
    pub implemented_size: Option<usize>,
    pub level1_size: Option<usize>,
    pub level2_size: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RoutingWireConfig {
    pub name: String,
    pub sb_mux: String,
    pub cb_mux: String,
    pub tiles: Vec<TileLoads>,
    #[serde(default = "default_sb_load")]
    pub sb_load: MuxVariant,
    #[serde(default = "default_sense_load")]
    pub cb_load: MuxVariant,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LocalWireConfig {
    pub name: String,
    pub mux: String,
    pub loads: LoadCounts,
    #[serde(default = "default_sense_load")]
    pub on_load: MuxVariant,
}

fn default_sb_load() -> MuxVariant {
    MuxVariant::Driven
}

fn default_sense_load() -> MuxVariant {
    MuxVariant::SenseOnly
}

impl MuxConfig {
    pub fn spec(&self) -> Result<MuxSpec, CircuitError> {
        match (self.level1_size, self.level2_size, self.required_size) {
            (Some(level1), Some(level2), required) => {
                let implemented = self.implemented_size.or(required).unwrap_or(level1 * level2);
                Ok(MuxSpec::new(self.name.clone(), self.family, implemented, level1, level2))
            }
            (None, None, Some(required)) => MuxSpec::decompose(self.name.clone(), self.family, required),
            _ => Err(CircuitError::config(format!(
                "mux '{}' needs either required_size or both level sizes", self.name
            ))),
        }
    }
}

impl SynthConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> SynthResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        let config: SynthConfig = serde_json::from_str(&content).context("parse config")?;
        Ok(config)
    }

    pub fn netlist_path(&self) -> PathBuf {
        self.output_path.join(&self.netlist_name)
    }

    pub fn create_output_path(&self) -> SynthResult<()> {
        if !self.output_path.exists() {
            std::fs::create_dir_all(&self.output_path)?;
            info!("created output directory: {:?}", self.output_path);
        }
        Ok(())
    }

    fn check_mux(&self, owner: &str, mux: &str) -> Result<(), CircuitError> {
        if self.muxes.iter().any(|m| m.name == mux) {
            Ok(())
        } else {
            Err(CircuitError::config(format!("'{}' loads unknown mux '{}'", owner, mux)))
        }
    }

    /// Builds every requested block; fails before anything is written.
    pub fn build_netlist(&self) -> SynthResult<Netlist> {
        let mut netlist = Netlist::new();

        for mux in self.muxes.iter() {
            let spec = mux.spec().with_context(|| format!("mux '{}'", mux.name))?;
            let blocks = synthesize(&spec).with_context(|| format!("synthesize mux '{}'", mux.name))?;
            netlist.extend(blocks.into_subckts())?;
        }

        for wire in self.routing_wires.iter() {
            self.check_mux(&wire.name, &wire.sb_mux)?;
            self.check_mux(&wire.name, &wire.cb_mux)?;
            let spec = RoutingWireSpec {
                name: wire.name.clone(),
                tiles: wire.tiles.clone(),
                sb_targets: LoadTargets::of(&wire.sb_mux, wire.sb_load),
                cb_targets: LoadTargets::of(&wire.cb_mux, wire.cb_load),
                wire: None,
            };
            let chain = assemble_routing_wire(&spec).with_context(|| format!("routing wire '{}'", wire.name))?;
            netlist.add(chain.subckt)?;
        }

        for wire in self.local_wires.iter() {
            self.check_mux(&wire.name, &wire.mux)?;
            let spec = LocalWireSpec {
                name: wire.name.clone(),
                counts: wire.loads,
                targets: LoadTargets::of(&wire.mux, wire.on_load),
                wire: None,
            };
            let chain = assemble_local_wire(&spec).with_context(|| format!("local wire '{}'", wire.name))?;
            netlist.add(chain.subckt)?;
        }

        netlist.validate()?;
        Ok(netlist)
    }
}
