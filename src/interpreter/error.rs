use crate::types::JsValue;

/// Errors surfaced by binding resolution and the object protocol.
///
/// `TypeError` and `ReferenceError` are the language-level error kinds; the
/// caller turns them into a throw. The remaining variants report host misuse.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("TypeError: {0}")]
    TypeError(String),

    #[error("ReferenceError: {0}")]
    ReferenceError(String),

    /// A value thrown by a native function (for example a getter).
    #[error("uncaught exception: {0}")]
    Throw(JsValue),

    /// An object handle that does not name a live slot.
    #[error("invalid object handle")]
    InvalidHandle,

    /// A prototype assignment would make the chain cyclic.
    #[error("prototype cycle")]
    PrototypeCycle,

    /// `SetMutableBinding` on a declarative record with no such binding.
    #[error("no binding named `{0}` in this environment record")]
    MissingBinding(String),

    /// `CreateMutableBinding` on an object record whose binding object already
    /// has the property.
    #[error("binding `{0}` already exists on the binding object")]
    BindingExists(String),

    /// Immutable bindings exist only on declarative environment records.
    #[error("immutable bindings require a declarative environment record")]
    NotDeclarative,
}

impl EngineError {
    pub fn type_error(msg: impl Into<String>) -> Self {
        EngineError::TypeError(msg.into())
    }

    pub fn reference_error(msg: impl Into<String>) -> Self {
        EngineError::ReferenceError(msg.into())
    }

    pub fn is_type_error(&self) -> bool {
        matches!(self, EngineError::TypeError(_))
    }

    pub fn is_reference_error(&self) -> bool {
        matches!(self, EngineError::ReferenceError(_))
    }
}

pub type JsResult<T> = Result<T, EngineError>;
