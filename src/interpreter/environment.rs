use super::*;
use tracing::trace;

// §10.2.2.2 NewDeclarativeEnvironment
pub fn new_declarative_environment(outer: Option<&EnvRef>) -> EnvRef {
    Environment::new_declarative(outer.cloned())
}

// §10.2.2.3 NewObjectEnvironment
pub fn new_object_environment(
    binding_object: JsObject,
    provide_this: bool,
    outer: Option<&EnvRef>,
) -> EnvRef {
    Environment::new_object(binding_object, provide_this, outer.cloned())
}

/// Object records are copied out so no `RefCell` borrow is held while the
/// object protocol runs (getters and setters may touch other environments).
fn object_record(env: &EnvRef) -> Option<ObjectRecord> {
    match &env.borrow().record {
        EnvironmentRecord::Object(rec) => Some(*rec),
        EnvironmentRecord::Declarative(_) => None,
    }
}

fn with_declarative<T>(env: &EnvRef, f: impl FnOnce(&mut DeclarativeRecord) -> T) -> Option<T> {
    match &mut env.borrow_mut().record {
        EnvironmentRecord::Declarative(rec) => Some(f(rec)),
        EnvironmentRecord::Object(_) => None,
    }
}

impl Interpreter {
    // §10.2.1.1.1, §10.2.1.2.1 HasBinding
    pub fn has_binding(&self, env: &EnvRef, name: &str) -> JsResult<bool> {
        match object_record(env) {
            Some(rec) => self.has_property(rec.binding_object, name),
            None => {
                Ok(with_declarative(env, |rec| rec.bindings.contains_key(name)).unwrap_or(false))
            }
        }
    }

    // §10.2.1.1.2, §10.2.1.2.2 CreateMutableBinding
    pub fn create_mutable_binding(
        &mut self,
        env: &EnvRef,
        name: &str,
        deletable: bool,
    ) -> JsResult<()> {
        trace!(name, deletable, "create mutable binding");
        if let Some(rec) = object_record(env) {
            if self.has_property(rec.binding_object, name)? {
                return Err(EngineError::BindingExists(name.to_string()));
            }
            let desc = PartialDescriptor::data(JsValue::Undefined, true, true, deletable);
            self.define_own_property(rec.binding_object, name, desc, true)?;
            return Ok(());
        }
        with_declarative(env, |rec| {
            rec.bindings.entry(name.to_string()).or_insert(Binding {
                value: JsValue::Undefined,
                deletable,
                kind: BindingKind::Mutable,
            });
        });
        Ok(())
    }

    // §10.2.1.1.3, §10.2.1.2.3 SetMutableBinding
    pub fn set_mutable_binding(
        &mut self,
        env: &EnvRef,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> JsResult<()> {
        trace!(name, strict, "set mutable binding");
        if let Some(rec) = object_record(env) {
            return self.put(rec.binding_object, name, value, strict);
        }
        let outcome = with_declarative(env, |rec| match rec.bindings.get_mut(name) {
            None => Err(EngineError::MissingBinding(name.to_string())),
            Some(binding) => match binding.kind {
                BindingKind::Mutable => {
                    binding.value = value;
                    Ok(())
                }
                BindingKind::Immutable { .. } if strict => Err(EngineError::TypeError(format!(
                    "Assignment to constant variable '{name}'."
                ))),
                BindingKind::Immutable { .. } => Ok(()),
            },
        });
        outcome.unwrap_or(Ok(()))
    }

    // §10.2.1.1.4, §10.2.1.2.4 GetBindingValue
    pub fn get_binding_value(
        &mut self,
        env: &EnvRef,
        name: &str,
        strict: bool,
    ) -> JsResult<JsValue> {
        if let Some(rec) = object_record(env) {
            if !self.has_property(rec.binding_object, name)? {
                if strict {
                    return Err(EngineError::ReferenceError(format!("{name} is not defined")));
                }
                return Ok(JsValue::Undefined);
            }
            return self.get(rec.binding_object, name);
        }
        let outcome = with_declarative(env, |rec| match rec.bindings.get(name) {
            None if strict => Err(EngineError::ReferenceError(format!("{name} is not defined"))),
            None => Ok(JsValue::Undefined),
            Some(Binding {
                kind: BindingKind::Immutable { initialized: false },
                ..
            }) if strict => Err(EngineError::ReferenceError(format!(
                "Cannot access '{name}' before initialization"
            ))),
            Some(binding) => Ok(binding.value.clone()),
        });
        outcome.unwrap_or(Ok(JsValue::Undefined))
    }

    // §10.2.1.1.5, §10.2.1.2.5 DeleteBinding
    pub fn delete_binding(&mut self, env: &EnvRef, name: &str) -> JsResult<bool> {
        trace!(name, "delete binding");
        if let Some(rec) = object_record(env) {
            return self.delete(rec.binding_object, name, false);
        }
        Ok(with_declarative(env, |rec| match rec.bindings.get(name) {
            None => true,
            Some(binding) if binding.deletable => {
                rec.bindings.remove(name);
                true
            }
            Some(_) => false,
        })
        .unwrap_or(true))
    }

    // §10.2.1.1.6, §10.2.1.2.6 ImplicitThisValue
    pub fn implicit_this_value(&self, env: &EnvRef) -> JsValue {
        match object_record(env) {
            Some(ObjectRecord {
                binding_object,
                provide_this: true,
            }) => JsValue::Object(binding_object),
            _ => JsValue::Undefined,
        }
    }

    // §10.2.1.1.7 CreateImmutableBinding
    pub fn create_immutable_binding(&mut self, env: &EnvRef, name: &str) -> JsResult<()> {
        trace!(name, "create immutable binding");
        with_declarative(env, |rec| {
            rec.bindings.entry(name.to_string()).or_insert(Binding {
                value: JsValue::Undefined,
                deletable: false,
                kind: BindingKind::Immutable { initialized: false },
            });
        })
        .ok_or(EngineError::NotDeclarative)
    }

    // §10.2.1.1.8 InitializeImmutableBinding
    pub fn initialize_immutable_binding(
        &mut self,
        env: &EnvRef,
        name: &str,
        value: JsValue,
    ) -> JsResult<()> {
        with_declarative(env, |rec| {
            if let Some(binding) = rec.bindings.get_mut(name)
                && binding.kind == (BindingKind::Immutable { initialized: false })
            {
                binding.value = value;
                binding.kind = BindingKind::Immutable { initialized: true };
            }
        })
        .ok_or(EngineError::NotDeclarative)
    }

    // §10.2.2.1 GetIdentifierReference
    pub fn get_identifier_reference(
        &self,
        lex: Option<&EnvRef>,
        name: &str,
        strict: bool,
    ) -> JsResult<Reference> {
        let mut cursor = lex.cloned();
        let mut depth = 0usize;
        while let Some(env) = cursor {
            if self.has_binding(&env, name)? {
                trace!(name, depth, "identifier resolved");
                return Ok(Reference::new(ReferenceBase::Environment(env), name, strict));
            }
            cursor = env.borrow().outer();
            depth += 1;
        }
        trace!(name, "identifier unresolvable");
        Ok(Reference::unresolvable(name, strict))
    }
}
