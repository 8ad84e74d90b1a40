use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};
use loadsynth::{config::SynthConfig, export};

fn main_result() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.level())
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let config = SynthConfig::load(&args.config).context("load config")?;
    config.create_output_path().context("create output directory")?;

    let netlist = config.build_netlist().context("build netlist")?;
    info!("synthesized {} subckts", netlist.len());

    export::write_spice(&netlist, config.netlist_path()).context("write netlist")?;
    Ok(())
}

fn main() {
    if let Err(e) = main_result() {
        eprintln!("Err: {:#}", e);
        std::process::exit(1);
    }
}

/// Mux and wire-load netlist synthesizer
#[derive(Parser, Debug)]
#[command(name = "loadsynth")]
#[command(about = "Synthesize mux and wire-load subcircuits for characterization", long_about = None)]
struct Args {
    /// Path to the JSON job description
    #[arg(short, long)]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    pub fn level(&self) -> Level {
        if self.verbose { Level::DEBUG } else { Level::INFO }
    }
}
