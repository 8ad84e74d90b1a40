use crate::circuit::{CircuitError, NodeId, WireRc, WireSegment};

/// Where the branches of one mux level hang on that level's wire.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelLayout {
    /// Node the selected switch drives.
    pub selected: NodeId,
    /// Nodes the non-selected switches drive, left to right.
    pub stubs: Vec<NodeId>,
    /// Wire pieces, left to right.
    pub segments: Vec<WireSegment>,
    /// Node the level hands on to the next stage.
    pub exit: NodeId,
}

fn divisor(n: usize) -> Result<u32, CircuitError> {
    u32::try_from(n).map_err(|_| CircuitError::config(format!("mux level size {} too large", n)))
}

/// Level 1: the selected switch drives `node(1)`, the other `size - 1`
/// switches follow along the wire, one `R/size` piece apart.
pub fn level1_layout(size: usize, rc: &WireRc, node: impl Fn(usize) -> NodeId) -> Result<LevelLayout, CircuitError> {
    let piece = rc.div(divisor(size)?);
    let selected = node(1);
    let stubs: Vec<NodeId> = (2..=size).map(&node).collect();

    let mut segments = Vec::with_capacity(stubs.len());
    let mut left = selected.clone();
    for stub in stubs.iter() {
        segments.push(piece.segment(left, stub.clone()));
        left = stub.clone();
    }

    Ok(LevelLayout { exit: selected.clone(), selected, stubs, segments })
}

/// Level 2: `size` attachment points on a line, `size - 1` gaps of
/// `R/(size-1)` each.
///
/// Even size: the exit splits the middle gap into two `R/(2(size-1))`
/// halves, with `size/2` branches on each side and the selected branch
/// just left of the exit.
///
/// Odd size: the exit sits on point `ceil(size/2) - 1`, which is the
/// selected branch; the first run holds `ceil(size/2)` branches and the
/// second run the remaining `floor(size/2)`.
pub fn level2_layout(size: usize, rc: &WireRc, node: impl Fn(usize) -> NodeId, exit: NodeId) -> Result<LevelLayout, CircuitError> {
    if size <= 1 {
        return Ok(LevelLayout { selected: exit.clone(), stubs: vec![], segments: vec![], exit });
    }

    let gaps = size - 1;
    let piece = rc.div(divisor(gaps)?);
    let half = rc.div(divisor(2 * gaps)?);

    let (selected_point, exit_on_point) = if size % 2 == 0 {
        (size / 2 - 1, false)
    } else {
        (size.div_ceil(2) - 1, true)
    };

    let point = |p: usize| -> NodeId {
        if exit_on_point && p == selected_point { exit.clone() } else { node(p + 1) }
    };

    let mut segments = Vec::with_capacity(size);
    for p in 0..gaps {
        let (left, right) = (point(p), point(p + 1));
        if !exit_on_point && p == selected_point {
            segments.push(half.segment(left, exit.clone()));
            segments.push(half.segment(exit.clone(), right));
        } else {
            segments.push(piece.segment(left, right));
        }
    }

    let stubs = (0..size).filter(|p| *p != selected_point).map(&point).collect();
    Ok(LevelLayout { selected: point(selected_point), stubs, segments, exit })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Expr;

    fn n2(i: usize) -> NodeId {
        NodeId::new("n").index(2).index(i)
    }

    fn lookup(name: &str) -> Option<f64> {
        (name == "r").then_some(60.0)
    }

    fn rc() -> WireRc {
        WireRc::new(Expr::named("r"), Expr::named("c"))
    }

    fn resistance(segs: &[WireSegment]) -> f64 {
        segs.iter().map(|s| s.resistance.eval(&lookup).unwrap()).sum()
    }

    #[test]
    fn test_level1_stub_pieces() {
        let layout = level1_layout(4, &rc(), |i| NodeId::new("n").index(1).index(i)).unwrap();
        assert_eq!(layout.stubs.len(), 3);
        assert_eq!(layout.segments.len(), 3);
        assert!(layout.segments.iter().all(|s| s.resistance.to_string() == "r/4"));
        assert_eq!(layout.selected.to_string(), "n_1_1");
    }

    #[test]
    fn test_level2_even_exit_mid_chain() {
        let layout = level2_layout(4, &rc(), n2, NodeId::new("n_out")).unwrap();
        assert_eq!(layout.stubs.len(), 3);
        assert_eq!(layout.selected.to_string(), "n_2_2");

        let exit_at = layout.segments.iter().position(|s| s.to == layout.exit).unwrap();
        let (left, right) = layout.segments.split_at(exit_at + 1);
        assert_eq!(left.last().unwrap().resistance.to_string(), "r/6");
        assert_eq!(right[0].resistance.to_string(), "r/6");
        assert!((resistance(left) - resistance(right)).abs() < 1e-9);
        assert!((resistance(&layout.segments) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_level2_odd_first_run_longer() {
        let layout = level2_layout(5, &rc(), n2, NodeId::new("n_out")).unwrap();
        assert_eq!(layout.selected, layout.exit);
        assert_eq!(layout.segments.len(), 4);
        assert!(layout.segments.iter().all(|s| s.resistance.to_string() == "r/4"));

        // points 0, 1 and the exit make the first run, 3 and 4 the second
        let exit_at = layout.segments.iter().position(|s| s.to == layout.exit).unwrap();
        assert_eq!(exit_at + 1, 2);
        assert_eq!(layout.stubs.len(), 4);
    }

    #[test]
    fn test_level2_single_branch() {
        let layout = level2_layout(1, &rc(), n2, NodeId::new("n_out")).unwrap();
        assert!(layout.segments.is_empty());
        assert!(layout.stubs.is_empty());
        assert_eq!(layout.selected.to_string(), "n_out");
    }
}
