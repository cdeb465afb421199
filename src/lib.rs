//! Binding resolution and the internal object protocol of an ES5 runtime:
//! property descriptors, object internal methods, environment records,
//! lexical environments, references and execution contexts.
//!
//! Everything hangs off one [`Interpreter`] instance; separate instances
//! share nothing.

pub mod interpreter;
pub mod types;

pub use interpreter::{
    EngineError, EnvRef, ExecutionContext, Interpreter, InterpreterOptions, JsFunction, JsResult,
    Operand, PartialDescriptor, PropertyDescriptor, PropertyKind, Reference, ReferenceBase,
};
pub use types::{JsObject, JsString, JsValue};
