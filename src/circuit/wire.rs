use std::fmt;
use tracing::debug;
use crate::check_arg;
use super::{CircuitError, NodeId};

pub const WIRE_SUBCKT: &str = "wire";
pub const WIRE_RES_PARAM: &str = "Rw";
pub const WIRE_CAP_PARAM: &str = "Cw";

/// Parameter expression handed to the simulator, e.g. `wire_sb_mux_L1_res/4`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(f64),
    Named(String),
    Div(Box<Expr>, u32),
}

impl Expr {
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self::Named(name.into())
    }

    /// `(x/a)/b` folds into `x/(a*b)` so the rendered text stays flat.
    pub fn div(&self, divisor: u32) -> Self {
        match self {
            Expr::Div(base, d) => Expr::Div(base.clone(), d * divisor),
            Expr::Literal(v) => Expr::Literal(v / divisor as f64),
            other => Expr::Div(Box::new(other.clone()), divisor),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::Literal(_))
    }

    pub fn eval(&self, lookup: &impl Fn(&str) -> Option<f64>) -> Option<f64> {
        match self {
            Expr::Literal(v) => Some(*v),
            Expr::Named(name) => lookup(name),
            Expr::Div(base, d) => base.eval(lookup).map(|v| v / *d as f64),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Named(name) => f.write_str(name),
            Expr::Div(base, d) => write!(f, "{}/{}", base, d),
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Literal(value)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::Named(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct WireSegment {
    pub from: NodeId,
    pub to: NodeId,
    pub resistance: Expr,
    pub capacitance: Expr,
}

/// Nominal R/C pair of one physical wire.
#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct WireRc {
    pub resistance: Expr,
    pub capacitance: Expr,
}

impl WireRc {
    /// `wire_<name>_res` / `wire_<name>_cap`
    pub fn named(name: &str) -> Self {
        Self::new(
            Expr::named(format!("wire_{}_res", name)),
            Expr::named(format!("wire_{}_cap", name)),
        )
    }

    pub fn div(&self, divisor: u32) -> Self {
        Self::new(self.resistance.div(divisor), self.capacitance.div(divisor))
    }

    pub fn segment(&self, from: NodeId, to: NodeId) -> WireSegment {
        WireSegment::new(from, to, self.resistance.clone(), self.capacitance.clone())
    }
}

/// Splits a nominal wire into `segments` equal pieces from `from` to `to`.
///
/// Intermediate nodes are `NodeId::next(via, 1 .. segments)`; the pieces
/// chain left to right so `seg[i].to == seg[i+1].from`.
pub fn split(rc: &WireRc, segments: usize, from: &NodeId, via: &NodeId, to: &NodeId) -> Result<Vec<WireSegment>, CircuitError> {
    check_arg!(segments > 0, "wire from '{}' to '{}' split into 0 segments", from, to);
    let divisor = u32::try_from(segments)
        .map_err(|_| CircuitError::config(format!("too many wire segments: {}", segments)))?;
    let piece = rc.div(divisor);

    let mut result = Vec::with_capacity(segments);
    let mut left = from.clone();
    for i in 1..=segments {
        let right = if i == segments { to.clone() } else { NodeId::next(via, i) };
        debug!("wire segment {} -> {} ({})", left, right, piece.resistance);
        result.push(piece.segment(left, right.clone()));
        left = right;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_div_folds() {
        let r = Expr::named("wire_res");
        assert_eq!(r.div(2).div(3).to_string(), "wire_res/6");
        assert_eq!(Expr::Literal(6.0).div(3), Expr::Literal(2.0));
    }

    #[test]
    fn test_split_continuity() {
        let rc = WireRc::named("gen");
        let (from, via, to) = (NodeId::new("n_in"), NodeId::new("n_w"), NodeId::new("n_out"));
        let segs = split(&rc, 4, &from, &via, &to).unwrap();

        assert_eq!(segs.len(), 4);
        assert_eq!(segs[0].from, from);
        assert_eq!(segs[3].to, to);
        for pair in segs.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
        }
        assert_eq!(segs[1].resistance.to_string(), "wire_gen_res/4");
        assert_eq!(segs[2].capacitance.to_string(), "wire_gen_cap/4");
    }

    #[test]
    fn test_split_conserves_rc() {
        let rc = WireRc::new(Expr::named("r"), Expr::Literal(2e-15));
        let lookup = |name: &str| (name == "r").then_some(120.0);
        for k in 1..=17 {
            let segs = split(&rc, k, &NodeId::new("a"), &NodeId::new("m"), &NodeId::new("b")).unwrap();
            let r: f64 = segs.iter().map(|s| s.resistance.eval(&lookup).unwrap()).sum();
            let c: f64 = segs.iter().map(|s| s.capacitance.eval(&lookup).unwrap()).sum();
            assert!((r - 120.0).abs() < 1e-9);
            assert!((c - 2e-15).abs() < 1e-27);
        }
    }

    #[test]
    fn test_split_zero_segments() {
        let rc = WireRc::named("gen");
        let err = split(&rc, 0, &NodeId::new("a"), &NodeId::new("m"), &NodeId::new("b")).unwrap_err();
        assert!(matches!(err, CircuitError::Configuration(_)));
    }
}
