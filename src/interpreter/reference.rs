use super::*;
use tracing::trace;

/// What a [`Reference`] resolved against.
#[derive(Debug, Clone)]
pub enum ReferenceBase {
    /// The identifier was not found on any environment in the chain.
    Unresolvable,
    /// A boolean, number or string; boxed only for the duration of an access.
    Primitive(JsValue),
    Object(JsObject),
    Environment(EnvRef),
}

// §8.7 The Reference Specification Type
#[derive(Debug, Clone)]
pub struct Reference {
    base: ReferenceBase,
    name: String,
    strict: bool,
}

impl Reference {
    pub fn new(base: ReferenceBase, name: impl Into<String>, strict: bool) -> Self {
        Self {
            base,
            name: name.into(),
            strict,
        }
    }

    pub fn unresolvable(name: impl Into<String>, strict: bool) -> Self {
        Self::new(ReferenceBase::Unresolvable, name, strict)
    }

    /// The reference produced by a property accessor `base[name]`.
    /// `undefined` and `null` bases fail the object-coercible check.
    pub fn property(base: JsValue, name: impl Into<String>, strict: bool) -> JsResult<Self> {
        let name = name.into();
        let base = match base {
            JsValue::Undefined | JsValue::Null => {
                return Err(EngineError::TypeError(format!(
                    "Cannot read property '{name}' of {base}"
                )));
            }
            JsValue::Object(obj) => ReferenceBase::Object(obj),
            prim => ReferenceBase::Primitive(prim),
        };
        Ok(Self::new(base, name, strict))
    }

    pub fn get_base(&self) -> &ReferenceBase {
        &self.base
    }

    pub fn get_referenced_name(&self) -> &str {
        &self.name
    }

    pub fn is_strict_reference(&self) -> bool {
        self.strict
    }

    pub fn has_primitive_base(&self) -> bool {
        matches!(self.base, ReferenceBase::Primitive(_))
    }

    pub fn is_property_reference(&self) -> bool {
        matches!(self.base, ReferenceBase::Object(_) | ReferenceBase::Primitive(_))
    }

    pub fn is_unresolvable_reference(&self) -> bool {
        matches!(self.base, ReferenceBase::Unresolvable)
    }

    /// The base of a property reference as a language value.
    fn base_value(&self) -> Option<JsValue> {
        match &self.base {
            ReferenceBase::Object(obj) => Some(JsValue::Object(*obj)),
            ReferenceBase::Primitive(prim) => Some(prim.clone()),
            _ => None,
        }
    }
}

/// Either an already-evaluated value or a reference still to be resolved.
#[derive(Debug, Clone)]
pub enum Operand {
    Value(JsValue),
    Reference(Reference),
}

impl From<JsValue> for Operand {
    fn from(value: JsValue) -> Self {
        Operand::Value(value)
    }
}

impl From<Reference> for Operand {
    fn from(reference: Reference) -> Self {
        Operand::Reference(reference)
    }
}

/// What the special `[[Put]]` of §8.7.2 found on the boxed primitive.
enum PrimitivePut {
    Reject(&'static str),
    Setter(JsValue),
}

impl Interpreter {
    // §8.7.1 GetValue
    pub fn get_value(&mut self, operand: impl Into<Operand>) -> JsResult<JsValue> {
        let reference = match operand.into() {
            Operand::Value(value) => return Ok(value),
            Operand::Reference(reference) => reference,
        };
        let name = reference.name.as_str();
        match &reference.base {
            ReferenceBase::Unresolvable => {
                trace!(name, "GetValue on unresolvable reference");
                Err(EngineError::ReferenceError(format!("{name} is not defined")))
            }
            ReferenceBase::Object(obj) => self.get(*obj, name),
            ReferenceBase::Primitive(prim) => self.get_primitive_property(prim, name),
            ReferenceBase::Environment(env) => self.get_binding_value(env, name, reference.strict),
        }
    }

    /// `[[Get]]` on a boxed primitive. Getters see the primitive itself as
    /// `this`, never the box.
    fn get_primitive_property(&mut self, prim: &JsValue, name: &str) -> JsResult<JsValue> {
        let desc = self.with_transient_box(prim, |interp, boxed| interp.get_property(boxed, name))?;
        match desc {
            None => Ok(JsValue::Undefined),
            Some(PropertyDescriptor {
                kind: PropertyKind::Data { value, .. },
                ..
            }) => Ok(value),
            Some(PropertyDescriptor {
                kind: PropertyKind::Accessor { get, .. },
                ..
            }) => {
                if get.is_undefined() {
                    return Ok(JsValue::Undefined);
                }
                self.call(&get, prim.clone(), &[])
            }
        }
    }

    // §8.7.2 PutValue
    pub fn put_value(&mut self, operand: impl Into<Operand>, value: JsValue) -> JsResult<()> {
        let reference = match operand.into() {
            Operand::Value(_) => {
                return Err(EngineError::reference_error("Invalid assignment target"));
            }
            Operand::Reference(reference) => reference,
        };
        let name = reference.name.as_str();
        let strict = reference.strict;
        match &reference.base {
            ReferenceBase::Unresolvable => {
                if strict {
                    return Err(EngineError::ReferenceError(format!("{name} is not defined")));
                }
                trace!(name, "implicit global created by assignment");
                let global = self.global_object;
                self.put(global, name, value, false)
            }
            ReferenceBase::Object(obj) => self.put(*obj, name, value, strict),
            ReferenceBase::Primitive(prim) => {
                self.put_primitive_property(prim, name, value, strict)
            }
            ReferenceBase::Environment(env) => self.set_mutable_binding(env, name, value, strict),
        }
    }

    /// The special `[[Put]]` for primitive bases. The box is transient, so no
    /// property is ever created or changed on it.
    fn put_primitive_property(
        &mut self,
        prim: &JsValue,
        name: &str,
        value: JsValue,
        throw: bool,
    ) -> JsResult<()> {
        let outcome = self.with_transient_box(prim, |interp, boxed| {
            if !interp.can_put(boxed, name)? {
                return Ok(PrimitivePut::Reject("read only property"));
            }
            if interp.get_own_property(boxed, name)?.is_some_and(|d| d.is_data_descriptor()) {
                return Ok(PrimitivePut::Reject("own property of a primitive"));
            }
            Ok(match interp.get_property(boxed, name)? {
                Some(PropertyDescriptor {
                    kind: PropertyKind::Accessor { set, .. },
                    ..
                }) => PrimitivePut::Setter(set),
                _ => PrimitivePut::Reject("property on a primitive"),
            })
        })?;
        match outcome {
            PrimitivePut::Setter(set) => {
                self.call(&set, prim.clone(), &[value])?;
                Ok(())
            }
            PrimitivePut::Reject(what) if throw => Err(EngineError::TypeError(format!(
                "Cannot assign to {what} '{name}'"
            ))),
            PrimitivePut::Reject(_) => Ok(()),
        }
    }

    // §11.4.1 The delete Operator
    pub fn delete_operand(&mut self, operand: impl Into<Operand>) -> JsResult<bool> {
        let reference = match operand.into() {
            Operand::Value(_) => return Ok(true),
            Operand::Reference(reference) => reference,
        };
        let name = reference.name.as_str();
        match &reference.base {
            ReferenceBase::Unresolvable => Ok(true),
            ReferenceBase::Object(obj) => self.delete(*obj, name, reference.strict),
            ReferenceBase::Primitive(prim) => self.with_transient_box(prim, |interp, boxed| {
                interp.delete(boxed, name, reference.strict)
            }),
            ReferenceBase::Environment(env) => self.delete_binding(env, name),
        }
    }

    // §11.2.3 Function Calls, steps 6 and 7
    pub fn this_value_for_call(&self, operand: &Operand) -> JsValue {
        match operand {
            Operand::Reference(reference) => match &reference.base {
                ReferenceBase::Environment(env) => self.implicit_this_value(env),
                _ => reference.base_value().unwrap_or(JsValue::Undefined),
            },
            Operand::Value(_) => JsValue::Undefined,
        }
    }
}
