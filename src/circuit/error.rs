#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CircuitError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("name '{name}' already used in {scope}")]
    NamingCollision { scope: String, name: String },

    #[error("port '{0}' already exists in subckt '{1}'")]
    DuplicatePort(String, String),

    #[error("unmatch pin size '{0}' and net size '{1}' for '{2}'")]
    PinSizeUnmatch(usize, usize, String),

    #[error("subckt '{0}' still open when '{1}' begins")]
    NestedSubckt(String, String),

    #[error("'{0}' emitted outside of any subckt")]
    OutsideSubckt(String),
}

impl CircuitError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn collision<S1: Into<String>, S2: Into<String>>(scope: S1, name: S2) -> Self {
        Self::NamingCollision { scope: scope.into(), name: name.into() }
    }
}

/// Fails with [`CircuitError::Configuration`] when the predicate does not hold.
#[macro_export]
macro_rules! check_arg {
    ($cond:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        if !($cond) {
            return Err($crate::circuit::CircuitError::Configuration(format!($fmt $(, $arg)*)).into());
        }
    };
}
