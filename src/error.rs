use crate::circuit::CircuitError;

#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Circuit(#[from] CircuitError),

    #[error("{0}")]
    Message(String),

    #[error("{msg} >> {err}")]
    Context { msg: String, err: Box<dyn std::error::Error + Send + Sync> }
}

impl SynthError {
    /// Walks through `Context` wrappers and returns the structural error underneath, if any.
    pub fn circuit_error(&self) -> Option<&CircuitError> {
        match self {
            Self::Circuit(e) => Some(e),
            Self::Context { err, .. } => {
                if let Some(e) = err.downcast_ref::<CircuitError>() {
                    Some(e)
                } else {
                    err.downcast_ref::<SynthError>().and_then(|e| e.circuit_error())
                }
            }
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self.circuit_error(), Some(CircuitError::Configuration(_)))
    }

    pub fn is_naming_collision(&self) -> bool {
        matches!(self.circuit_error(), Some(CircuitError::NamingCollision { .. }))
    }
}

pub type SynthResult<T> = Result<T, SynthError>;

pub trait ErrorContext<T> {
    fn context<S: Into<String>>(self, msg: S) -> SynthResult<T>;
    fn with_context<S: Into<String>>(self, f: impl Fn() -> S) -> SynthResult<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ErrorContext<T> for Result<T, E> {
    fn context<S: Into<String>>(self, msg: S) -> SynthResult<T> {
        self.map_err(|e| SynthError::Context { msg: msg.into(), err: Box::new(e) })
    }

    fn with_context<S: Into<String>>(self, f: impl Fn() -> S) -> SynthResult<T> {
        self.map_err(|e| SynthError::Context { msg: f().into(), err: Box::new(e) })
    }
}
