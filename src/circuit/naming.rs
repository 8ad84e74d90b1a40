use std::collections::HashSet;
use std::fmt;
use tracing::debug;
use super::CircuitError;

/// One step in a hierarchical identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Name(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Name(name) => f.write_str(name),
            Segment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// A structured node/instance identifier, e.g. `n` / `t3` / `cb` / `2`.
///
/// Building an id never fails and never consults any state: the same
/// `(prefix, index)` always renders the same name. Uniqueness is the job
/// of [`Namespace`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    segments: Vec<Segment>,
}

impl NodeId {
    pub fn new<S: Into<String>>(root: S) -> Self {
        Self { segments: vec![Segment::Name(root.into())] }
    }

    pub fn next(prefix: &NodeId, index: usize) -> Self {
        prefix.index(index)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    pub fn name<S: Into<String>>(&self, name: S) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Name(name.into()));
        Self { segments }
    }

    /// Appends every segment of `other` below `self`.
    pub fn join(&self, other: &NodeId) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_descendant_of(&self, prefix: &NodeId) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i != 0 {
                f.write_str("_")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId::new(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        NodeId::new(value)
    }
}

impl From<&NodeId> for NodeId {
    fn from(value: &NodeId) -> Self {
        value.clone()
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

/// Call-scoped registry of rendered names.
///
/// Two different paths may still render to the same text (`a_1` + `2` vs
/// `a` + `1` + `2`), so claims are keyed on the rendered string.
#[derive(Debug, Default)]
pub struct Namespace {
    scope: String,
    claimed: HashSet<String>,
}

impl Namespace {
    pub fn new<S: Into<String>>(scope: S) -> Self {
        Self { scope: scope.into(), claimed: HashSet::new() }
    }

    pub fn claim(&mut self, id: NodeId) -> Result<NodeId, CircuitError> {
        let name = id.render();
        if name.is_empty() {
            return Err(CircuitError::config(format!("empty identifier in {}", self.scope)));
        }
        if !self.claimed.insert(name.clone()) {
            return Err(CircuitError::collision(self.scope.clone(), name));
        }
        debug!("claim '{}' in {}", name, self.scope);
        Ok(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.claimed.contains(&id.render())
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}
