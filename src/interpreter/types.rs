use crate::interpreter::error::{EngineError, JsResult};
use crate::types::{JsObject, JsValue};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

pub type EnvRef = Rc<RefCell<Environment>>;

/// A Lexical Environment: one environment record plus the link to the
/// enclosing environment. The global environment is the only one whose
/// `outer` is `None`.
#[derive(Debug)]
pub struct Environment {
    pub(crate) record: EnvironmentRecord,
    pub(crate) outer: Option<EnvRef>,
}

impl Environment {
    pub fn new_declarative(outer: Option<EnvRef>) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            record: EnvironmentRecord::Declarative(DeclarativeRecord::default()),
            outer,
        }))
    }

    pub fn new_object(
        binding_object: JsObject,
        provide_this: bool,
        outer: Option<EnvRef>,
    ) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            record: EnvironmentRecord::Object(ObjectRecord {
                binding_object,
                provide_this,
            }),
            outer,
        }))
    }

    pub fn outer(&self) -> Option<EnvRef> {
        self.outer.clone()
    }

    /// The binding object of an object environment record.
    pub fn binding_object(&self) -> Option<JsObject> {
        match &self.record {
            EnvironmentRecord::Object(rec) => Some(rec.binding_object),
            EnvironmentRecord::Declarative(_) => None,
        }
    }
}

#[derive(Debug)]
pub(crate) enum EnvironmentRecord {
    Declarative(DeclarativeRecord),
    Object(ObjectRecord),
}

#[derive(Debug, Default)]
pub(crate) struct DeclarativeRecord {
    pub(crate) bindings: FxHashMap<String, Binding>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ObjectRecord {
    pub(crate) binding_object: JsObject,
    pub(crate) provide_this: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub(crate) value: JsValue,
    pub(crate) deletable: bool,
    pub(crate) kind: BindingKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BindingKind {
    Mutable,
    Immutable { initialized: bool },
}

pub type NativeFn = Rc<dyn Fn(&mut super::Interpreter, &JsValue, &[JsValue]) -> JsResult<JsValue>>;
pub type FunctionBody = Rc<dyn Fn(&mut super::Interpreter) -> JsResult<JsValue>>;

#[derive(Clone)]
pub enum JsFunction {
    /// A function whose body runs inside its own execution context. `scope` is
    /// the lexical environment captured at definition time.
    User {
        name: Option<String>,
        params: Vec<String>,
        scope: EnvRef,
        strict: bool,
        body: FunctionBody,
    },
    Native(String, usize, NativeFn),
}

impl JsFunction {
    pub fn native(
        name: impl Into<String>,
        arity: usize,
        f: impl Fn(&mut super::Interpreter, &JsValue, &[JsValue]) -> JsResult<JsValue> + 'static,
    ) -> Self {
        JsFunction::Native(name.into(), arity, Rc::new(f))
    }

    pub fn user(
        name: Option<String>,
        params: Vec<String>,
        scope: EnvRef,
        strict: bool,
        body: impl Fn(&mut super::Interpreter) -> JsResult<JsValue> + 'static,
    ) -> Self {
        JsFunction::User {
            name,
            params,
            scope,
            strict,
            body: Rc::new(body),
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            JsFunction::User { params, .. } => params.len(),
            JsFunction::Native(_, arity, _) => *arity,
        }
    }
}

impl std::fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsFunction::User { name, params, strict, .. } => f
                .debug_struct("User")
                .field("name", name)
                .field("params", params)
                .field("strict", strict)
                .finish_non_exhaustive(),
            JsFunction::Native(name, arity, _) => {
                f.debug_tuple("Native").field(name).field(arity).finish()
            }
        }
    }
}

/// A fully populated property descriptor, as stored on an object.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub enumerable: bool,
    pub configurable: bool,
    pub kind: PropertyKind,
}

/// `get`/`set` hold `undefined` when the accessor half is absent.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    Data { value: JsValue, writable: bool },
    Accessor { get: JsValue, set: JsValue },
}

impl PropertyDescriptor {
    pub fn data(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            enumerable,
            configurable,
            kind: PropertyKind::Data { value, writable },
        }
    }

    pub fn data_default(value: JsValue) -> Self {
        Self::data(value, true, true, true)
    }

    pub fn accessor(get: JsValue, set: JsValue, enumerable: bool, configurable: bool) -> Self {
        Self {
            enumerable,
            configurable,
            kind: PropertyKind::Accessor { get, set },
        }
    }

    pub fn is_data_descriptor(&self) -> bool {
        matches!(self.kind, PropertyKind::Data { .. })
    }

    pub fn is_accessor_descriptor(&self) -> bool {
        matches!(self.kind, PropertyKind::Accessor { .. })
    }

    pub fn value(&self) -> Option<&JsValue> {
        match &self.kind {
            PropertyKind::Data { value, .. } => Some(value),
            PropertyKind::Accessor { .. } => None,
        }
    }

    pub fn writable(&self) -> Option<bool> {
        match self.kind {
            PropertyKind::Data { writable, .. } => Some(writable),
            PropertyKind::Accessor { .. } => None,
        }
    }
}

/// Which half of a descriptor record is present. Decided once, when the
/// record is built, so consumers match exhaustively. A `Data` shape always
/// carries a value or writable field and an `Accessor` shape a getter or
/// setter; a record with neither is `Generic`.
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorShape {
    Data {
        value: Option<JsValue>,
        writable: Option<bool>,
    },
    Accessor {
        get: Option<JsValue>,
        set: Option<JsValue>,
    },
    Generic,
}

/// A property descriptor record where any field may be absent, as passed to
/// `[[DefineOwnProperty]]`. Built only through the constructors below so the
/// shape always agrees with the fields present.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialDescriptor {
    pub(crate) shape: DescriptorShape,
    pub(crate) enumerable: Option<bool>,
    pub(crate) configurable: Option<bool>,
}

/// Unclassified descriptor fields, e.g. read off a descriptor object.
#[derive(Debug, Clone, Default)]
pub struct DescriptorFields {
    pub value: Option<JsValue>,
    pub writable: Option<bool>,
    pub get: Option<JsValue>,
    pub set: Option<JsValue>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PartialDescriptor {
    pub fn from_fields(fields: DescriptorFields) -> JsResult<Self> {
        let has_data = fields.value.is_some() || fields.writable.is_some();
        let has_accessor = fields.get.is_some() || fields.set.is_some();
        let shape = match (has_data, has_accessor) {
            (true, true) => {
                return Err(EngineError::type_error(
                    "Invalid property descriptor. Cannot both specify accessors and a value or \
                     writable attribute",
                ));
            }
            (true, false) => DescriptorShape::Data {
                value: fields.value,
                writable: fields.writable,
            },
            (false, true) => DescriptorShape::Accessor {
                get: fields.get,
                set: fields.set,
            },
            (false, false) => DescriptorShape::Generic,
        };
        Ok(Self {
            shape,
            enumerable: fields.enumerable,
            configurable: fields.configurable,
        })
    }

    pub fn data(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            shape: DescriptorShape::Data {
                value: Some(value),
                writable: Some(writable),
            },
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    /// `{[[Value]]: value}` and nothing else.
    pub fn value_only(value: JsValue) -> Self {
        Self {
            shape: DescriptorShape::Data {
                value: Some(value),
                writable: None,
            },
            enumerable: None,
            configurable: None,
        }
    }

    /// With neither `get` nor `set` the record is generic.
    pub fn accessor(
        get: Option<JsValue>,
        set: Option<JsValue>,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        let shape = if get.is_none() && set.is_none() {
            DescriptorShape::Generic
        } else {
            DescriptorShape::Accessor { get, set }
        };
        Self {
            shape,
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    pub fn generic(enumerable: Option<bool>, configurable: Option<bool>) -> Self {
        Self {
            shape: DescriptorShape::Generic,
            enumerable,
            configurable,
        }
    }

    pub fn shape(&self) -> &DescriptorShape {
        &self.shape
    }

    pub fn enumerable(&self) -> Option<bool> {
        self.enumerable
    }

    pub fn configurable(&self) -> Option<bool> {
        self.configurable
    }

    pub fn is_data_descriptor(&self) -> bool {
        matches!(self.shape, DescriptorShape::Data { .. })
    }

    pub fn is_accessor_descriptor(&self) -> bool {
        matches!(self.shape, DescriptorShape::Accessor { .. })
    }

    pub fn is_generic_descriptor(&self) -> bool {
        matches!(self.shape, DescriptorShape::Generic)
    }

    /// True when no field at all is present.
    pub fn is_empty(&self) -> bool {
        self.is_generic_descriptor() && self.enumerable.is_none() && self.configurable.is_none()
    }

    /// Materializes a new property, defaulting every absent field.
    pub fn to_complete(&self) -> PropertyDescriptor {
        let kind = match &self.shape {
            DescriptorShape::Accessor { get, set } => PropertyKind::Accessor {
                get: get.clone().unwrap_or(JsValue::Undefined),
                set: set.clone().unwrap_or(JsValue::Undefined),
            },
            DescriptorShape::Data { value, writable } => PropertyKind::Data {
                value: value.clone().unwrap_or(JsValue::Undefined),
                writable: writable.unwrap_or(false),
            },
            DescriptorShape::Generic => PropertyKind::Data {
                value: JsValue::Undefined,
                writable: false,
            },
        };
        PropertyDescriptor {
            enumerable: self.enumerable.unwrap_or(false),
            configurable: self.configurable.unwrap_or(false),
            kind,
        }
    }
}

pub struct JsObjectData {
    pub(crate) properties: FxHashMap<String, PropertyDescriptor>,
    pub(crate) property_order: Vec<String>,
    pub(crate) prototype: Option<JsObject>,
    pub(crate) extensible: bool,
    pub(crate) class_name: String,
    pub(crate) primitive_value: Option<JsValue>,
    pub(crate) callable: Option<JsFunction>,
}

impl JsObjectData {
    pub(crate) fn new(prototype: Option<JsObject>, extensible: bool) -> Self {
        Self {
            properties: FxHashMap::default(),
            property_order: Vec::new(),
            prototype,
            extensible,
            class_name: "Object".to_string(),
            primitive_value: None,
            callable: None,
        }
    }

    pub(crate) fn own_descriptor(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(key)
    }

    pub(crate) fn insert_property(&mut self, key: String, desc: PropertyDescriptor) {
        if !self.properties.contains_key(&key) {
            self.property_order.push(key.clone());
        }
        self.properties.insert(key, desc);
    }

    pub(crate) fn remove_property(&mut self, key: &str) -> Option<PropertyDescriptor> {
        let removed = self.properties.remove(key);
        if removed.is_some() {
            self.property_order.retain(|k| k != key);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_fields_are_rejected() {
        let fields = DescriptorFields {
            value: Some(JsValue::Number(1.0)),
            get: Some(JsValue::Undefined),
            ..Default::default()
        };
        let err = PartialDescriptor::from_fields(fields).unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn fields_classify_by_shape() {
        let data = PartialDescriptor::from_fields(DescriptorFields {
            writable: Some(false),
            ..Default::default()
        })
        .unwrap();
        assert!(data.is_data_descriptor());

        let accessor = PartialDescriptor::from_fields(DescriptorFields {
            set: Some(JsValue::Undefined),
            ..Default::default()
        })
        .unwrap();
        assert!(accessor.is_accessor_descriptor());

        let generic = PartialDescriptor::from_fields(DescriptorFields {
            enumerable: Some(true),
            ..Default::default()
        })
        .unwrap();
        assert!(generic.is_generic_descriptor());
        assert!(!generic.is_empty());
    }

    #[test]
    fn to_complete_fills_defaults() {
        let desc = PartialDescriptor::value_only(JsValue::Number(7.0)).to_complete();
        assert_eq!(
            desc,
            PropertyDescriptor::data(JsValue::Number(7.0), false, false, false)
        );

        let acc =
            PartialDescriptor::accessor(Some(JsValue::Undefined), None, true, false).to_complete();
        assert_eq!(
            acc,
            PropertyDescriptor::accessor(JsValue::Undefined, JsValue::Undefined, true, false)
        );
    }

    #[test]
    fn accessor_without_functions_is_generic() {
        let desc = PartialDescriptor::accessor(None, None, true, false);
        assert!(desc.is_generic_descriptor());
        assert!(!desc.is_accessor_descriptor());
        assert_eq!(desc.enumerable(), Some(true));
        assert_eq!(desc.configurable(), Some(false));

        let undefined_getter =
            PartialDescriptor::accessor(Some(JsValue::Undefined), None, true, false);
        assert!(undefined_getter.is_accessor_descriptor());
    }

    #[test]
    fn object_data_keeps_insertion_order() {
        let mut data = JsObjectData::new(None, true);
        data.insert_property("b".into(), PropertyDescriptor::data_default(JsValue::Null));
        data.insert_property("a".into(), PropertyDescriptor::data_default(JsValue::Null));
        data.insert_property("b".into(), PropertyDescriptor::data_default(JsValue::Undefined));
        assert_eq!(data.property_order, vec!["b".to_string(), "a".to_string()]);
        data.remove_property("b");
        assert_eq!(data.property_order, vec!["a".to_string()]);
    }
}
