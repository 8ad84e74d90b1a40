mod error;
mod naming;
mod wire;
mod placement;
mod subckt;
mod chain;
mod mux;

pub use error::*;
pub use naming::*;
pub use wire::*;
pub use placement::*;
pub use subckt::*;
pub use chain::*;
pub use mux::*;
