use crate::types::{JsObject, JsString, JsValue};
use tracing::debug;

mod types;
pub use types::*;

mod error;
pub use error::{EngineError, JsResult};

mod helpers;
pub use helpers::{PreferredType, same_value, to_boolean};
mod heap;
mod object;
mod descriptor;
pub use descriptor::{is_accessor_descriptor, is_data_descriptor, is_generic_descriptor};
mod environment;
pub use environment::{new_declarative_environment, new_object_environment};
mod reference;
pub use reference::{Operand, Reference, ReferenceBase};
mod context;
pub use context::ExecutionContext;

/// Knobs for a fresh [`Interpreter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpreterOptions {
    /// Treat global code as strict mode code.
    pub strict: bool,
}

/// One independent runtime instance: the object heap, the global
/// environment and the execution context stack.
pub struct Interpreter {
    objects: Vec<Option<JsObjectData>>,
    free_list: Vec<usize>,
    global_object: JsObject,
    global_env: EnvRef,
    global_context: ExecutionContext,
    context_stack: Vec<ExecutionContext>,
    object_prototype: JsObject,
    function_prototype: JsObject,
    string_prototype: JsObject,
    number_prototype: JsObject,
    boolean_prototype: JsObject,
    throw_type_error: Option<JsObject>,
    options: InterpreterOptions,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_options(InterpreterOptions::default())
    }

    pub fn with_options(options: InterpreterOptions) -> Self {
        let mut objects = Vec::new();
        let mut alloc = |data: JsObjectData| {
            objects.push(Some(data));
            JsObject {
                id: objects.len() as u64 - 1,
            }
        };

        let object_prototype = alloc(JsObjectData::new(None, true));
        let function_prototype = alloc(primitive_prototype(object_prototype, "Function", None));
        let string_prototype = alloc(primitive_prototype(
            object_prototype,
            "String",
            Some(JsValue::String(JsString::default())),
        ));
        let number_prototype = alloc(primitive_prototype(
            object_prototype,
            "Number",
            Some(JsValue::Number(0.0)),
        ));
        let boolean_prototype = alloc(primitive_prototype(
            object_prototype,
            "Boolean",
            Some(JsValue::Boolean(false)),
        ));

        let mut global_data = JsObjectData::new(Some(object_prototype), true);
        global_data.class_name = "global".to_string();
        for (name, value) in [
            ("undefined", JsValue::Undefined),
            ("NaN", JsValue::Number(f64::NAN)),
            ("Infinity", JsValue::Number(f64::INFINITY)),
        ] {
            global_data.insert_property(
                name.to_string(),
                PropertyDescriptor::data(value, false, false, false),
            );
        }
        let global_object = alloc(global_data);

        let global_env = Environment::new_object(global_object, false, None);
        let global_context = ExecutionContext {
            variable_environment: global_env.clone(),
            lexical_environment: global_env.clone(),
            this_binding: JsValue::Object(global_object),
            strict: options.strict,
        };
        debug!(strict = options.strict, "created global environment");

        let mut interp = Self {
            objects,
            free_list: Vec::new(),
            global_object,
            global_env,
            global_context,
            context_stack: Vec::new(),
            object_prototype,
            function_prototype,
            string_prototype,
            number_prototype,
            boolean_prototype,
            throw_type_error: None,
            options,
        };
        interp.throw_type_error = Some(interp.allocate_function(JsFunction::native(
            "ThrowTypeError",
            0,
            |_, _, _| {
                Err(EngineError::type_error(
                    "'caller', 'callee', and 'arguments' properties may not be accessed in strict \
                     mode",
                ))
            },
        )));
        interp
    }

    pub fn options(&self) -> InterpreterOptions {
        self.options
    }

    pub fn global_object(&self) -> JsObject {
        self.global_object
    }

    /// The root lexical environment, bound to the global object.
    pub fn global_environment(&self) -> EnvRef {
        self.global_env.clone()
    }

    pub fn object_prototype(&self) -> JsObject {
        self.object_prototype
    }

    pub fn function_prototype(&self) -> JsObject {
        self.function_prototype
    }

    pub fn string_prototype(&self) -> JsObject {
        self.string_prototype
    }

    pub fn number_prototype(&self) -> JsObject {
        self.number_prototype
    }

    pub fn boolean_prototype(&self) -> JsObject {
        self.boolean_prototype
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

// §15.3.4, §15.5.4, §15.6.4, §15.7.4: the built-in prototypes are themselves
// instances of their class.
fn primitive_prototype(
    object_prototype: JsObject,
    class_name: &str,
    primitive_value: Option<JsValue>,
) -> JsObjectData {
    let mut data = JsObjectData::new(Some(object_prototype), true);
    data.class_name = class_name.to_string();
    if let Some(JsValue::String(s)) = &primitive_value {
        data.insert_property(
            "length".to_string(),
            PropertyDescriptor::data(JsValue::Number(s.len() as f64), false, false, false),
        );
    }
    data.primitive_value = primitive_value;
    data
}
