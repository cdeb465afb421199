use super::*;
use tracing::debug;

/// §10.3 Execution Contexts. The lexical environment changes as `with` and
/// `catch` blocks are entered; the variable environment never does.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub variable_environment: EnvRef,
    pub lexical_environment: EnvRef,
    pub this_binding: JsValue,
    pub strict: bool,
}

impl Interpreter {
    /// The context on top of the stack; the global context when no function
    /// is active.
    pub fn running_context(&self) -> &ExecutionContext {
        self.context_stack.last().unwrap_or(&self.global_context)
    }

    fn running_context_mut(&mut self) -> &mut ExecutionContext {
        match self.context_stack.last_mut() {
            Some(ctx) => ctx,
            None => &mut self.global_context,
        }
    }

    /// Number of function contexts above the global one.
    pub fn context_depth(&self) -> usize {
        self.context_stack.len()
    }

    pub fn this_binding(&self) -> JsValue {
        self.running_context().this_binding.clone()
    }

    /// Resolves `name` against the running context's lexical environment.
    pub fn resolve_identifier(&self, name: &str) -> JsResult<Reference> {
        let ctx = self.running_context();
        self.get_identifier_reference(Some(&ctx.lexical_environment), name, ctx.strict)
    }

    // §10.4.3 Entering Function Code
    pub fn enter_function_scope(
        &mut self,
        func: JsObject,
        this_arg: JsValue,
        args: &[JsValue],
    ) -> JsResult<ExecutionContext> {
        let Some(JsFunction::User {
            params,
            scope,
            strict,
            ..
        }) = self.function_of(func)?
        else {
            return Err(EngineError::type_error("Only user functions have a function scope"));
        };

        let this_binding = match this_arg {
            this if strict => this,
            JsValue::Undefined | JsValue::Null => JsValue::Object(self.global_object),
            JsValue::Object(obj) => JsValue::Object(obj),
            prim => JsValue::Object(self.to_object(&prim)?),
        };

        let env = new_declarative_environment(Some(&scope));
        self.bind_parameters(&env, &params, args, strict)?;
        if !params.iter().any(|p| p == "arguments") {
            let arguments = self.create_arguments_object(func, args, strict)?;
            if strict {
                self.create_immutable_binding(&env, "arguments")?;
                self.initialize_immutable_binding(&env, "arguments", arguments)?;
            } else {
                self.create_mutable_binding(&env, "arguments", false)?;
                self.set_mutable_binding(&env, "arguments", arguments, false)?;
            }
        }

        let ctx = ExecutionContext {
            variable_environment: env.clone(),
            lexical_environment: env,
            this_binding,
            strict,
        };
        self.context_stack.push(ctx.clone());
        debug!(depth = self.context_stack.len(), strict, "entered function scope");
        Ok(ctx)
    }

    /// Pops the running function context. The global context is never popped.
    pub fn exit_function_scope(&mut self) -> Option<ExecutionContext> {
        let ctx = self.context_stack.pop();
        if ctx.is_some() {
            debug!(depth = self.context_stack.len(), "exited function scope");
        }
        ctx
    }

    // §10.5 step 4: duplicate names bind the later argument.
    fn bind_parameters(
        &mut self,
        env: &EnvRef,
        params: &[String],
        args: &[JsValue],
        strict: bool,
    ) -> JsResult<()> {
        for (i, name) in params.iter().enumerate() {
            let value = args.get(i).cloned().unwrap_or(JsValue::Undefined);
            if !self.has_binding(env, name)? {
                self.create_mutable_binding(env, name, false)?;
            }
            self.set_mutable_binding(env, name, value, strict)?;
        }
        Ok(())
    }

    // §10.6 Arguments Object, without parameter aliasing.
    fn create_arguments_object(
        &mut self,
        func: JsObject,
        args: &[JsValue],
        strict: bool,
    ) -> JsResult<JsValue> {
        let obj = self.create_plain_object();
        self.object_data_mut(obj)?.class_name = "Arguments".to_string();
        self.define_own_property(
            obj,
            "length",
            PartialDescriptor::data(JsValue::Number(args.len() as f64), true, false, true),
            false,
        )?;
        for (i, arg) in args.iter().enumerate() {
            let element = PartialDescriptor::data(arg.clone(), true, true, true);
            self.define_own_property(obj, &i.to_string(), element, false)?;
        }
        if strict {
            let thrower = self
                .throw_type_error
                .map(JsValue::Object)
                .unwrap_or(JsValue::Undefined);
            for name in ["caller", "callee"] {
                let desc = PartialDescriptor::accessor(
                    Some(thrower.clone()),
                    Some(thrower.clone()),
                    false,
                    false,
                );
                self.define_own_property(obj, name, desc, false)?;
            }
        } else {
            self.define_own_property(
                obj,
                "callee",
                PartialDescriptor::data(JsValue::Object(func), true, false, true),
                false,
            )?;
        }
        Ok(JsValue::Object(obj))
    }

    // §13.2.1 [[Call]]
    pub fn call(&mut self, callee: &JsValue, this: JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        let func = match callee {
            JsValue::Object(obj) => self.function_of(*obj)?.map(|f| (*obj, f)),
            _ => None,
        };
        match func {
            None => Err(EngineError::TypeError(format!("{callee} is not a function"))),
            Some((_, JsFunction::Native(_, _, f))) => f(self, &this, args),
            Some((obj, JsFunction::User { body, .. })) => {
                self.enter_function_scope(obj, this, args)?;
                let result = body(self);
                self.exit_function_scope();
                result
            }
        }
    }

    // §10.5 step 8, with configurableBindings false.
    pub fn declare_variable(&mut self, name: &str) -> JsResult<()> {
        let ctx = self.running_context();
        let env = ctx.variable_environment.clone();
        let strict = ctx.strict;
        if !self.has_binding(&env, name)? {
            self.create_mutable_binding(&env, name, false)?;
            self.set_mutable_binding(&env, name, JsValue::Undefined, strict)?;
        }
        Ok(())
    }

    /// §12.10 `with (obj)`: returns the environment to restore on exit.
    pub fn enter_with_scope(&mut self, obj: JsObject) -> EnvRef {
        let previous = self.running_context().lexical_environment.clone();
        let env = new_object_environment(obj, true, Some(&previous));
        self.running_context_mut().lexical_environment = env;
        previous
    }

    /// §12.14 `catch (name)`: returns the environment to restore on exit.
    pub fn enter_catch_scope(&mut self, name: &str, value: JsValue) -> JsResult<EnvRef> {
        let previous = self.running_context().lexical_environment.clone();
        let env = new_declarative_environment(Some(&previous));
        self.create_mutable_binding(&env, name, false)?;
        self.set_mutable_binding(&env, name, value, false)?;
        self.running_context_mut().lexical_environment = env;
        Ok(previous)
    }

    pub fn restore_lexical_environment(&mut self, previous: EnvRef) {
        self.running_context_mut().lexical_environment = previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn num(n: f64) -> JsValue {
        JsValue::Number(n)
    }

    fn user_fn(interp: &mut Interpreter, params: &[&str], strict: bool) -> JsObject {
        let scope = interp.global_environment();
        let body = JsFunction::user(
            Some("f".to_string()),
            params.iter().map(|p| p.to_string()).collect(),
            scope,
            strict,
            |interp| Ok(interp.this_binding()),
        );
        interp.create_function(body).unwrap()
    }

    #[test]
    fn global_context_is_running_initially() {
        let interp = Interpreter::new();
        let ctx = interp.running_context();
        assert!(Rc::ptr_eq(&ctx.lexical_environment, &interp.global_environment()));
        assert_eq!(ctx.this_binding, JsValue::Object(interp.global_object()));
        assert_eq!(interp.context_depth(), 0);
    }

    #[test]
    fn function_scope_chains_to_captured_scope() {
        let mut interp = Interpreter::new();
        let captured = new_declarative_environment(Some(&interp.global_environment()));
        interp.create_mutable_binding(&captured, "outer", false).unwrap();
        let body =
            JsFunction::user(None, vec![], captured.clone(), false, |_| Ok(JsValue::Undefined));
        let f = interp.create_function(body).unwrap();
        let ctx = interp.enter_function_scope(f, JsValue::Undefined, &[]).unwrap();
        let outer = ctx.lexical_environment.borrow().outer().unwrap();
        assert!(Rc::ptr_eq(&outer, &captured));
        assert!(Rc::ptr_eq(&ctx.lexical_environment, &ctx.variable_environment));
        assert_eq!(interp.context_depth(), 1);

        let r = interp.resolve_identifier("outer").unwrap();
        assert!(matches!(
            r.get_base(),
            ReferenceBase::Environment(env) if Rc::ptr_eq(env, &captured)
        ));

        interp.exit_function_scope().unwrap();
        assert_eq!(interp.context_depth(), 0);
        assert!(interp.exit_function_scope().is_none());
    }

    #[test]
    fn sloppy_this_is_coerced() {
        let mut interp = Interpreter::new();
        let f = user_fn(&mut interp, &[], false);
        let global = JsValue::Object(interp.global_object());
        assert_eq!(interp.call(&JsValue::Object(f), JsValue::Undefined, &[]).unwrap(), global);
        assert_eq!(interp.call(&JsValue::Object(f), JsValue::Null, &[]).unwrap(), global);

        let boxed = interp.call(&JsValue::Object(f), num(2.0), &[]).unwrap();
        let JsValue::Object(boxed) = boxed else {
            panic!("primitive this should be boxed");
        };
        assert_eq!(interp.class_name(boxed).unwrap(), "Number");
        assert_eq!(interp.primitive_value(boxed).unwrap(), Some(num(2.0)));
    }

    #[test]
    fn strict_this_is_passed_through() {
        let mut interp = Interpreter::new();
        let f = user_fn(&mut interp, &[], true);
        let f = JsValue::Object(f);
        assert_eq!(interp.call(&f, JsValue::Undefined, &[]).unwrap(), JsValue::Undefined);
        assert_eq!(interp.call(&f, num(2.0), &[]).unwrap(), num(2.0));
    }

    #[test]
    fn parameters_are_bound() {
        let mut interp = Interpreter::new();
        let f = user_fn(&mut interp, &["a", "b", "a"], false);
        let ctx = interp
            .enter_function_scope(f, JsValue::Undefined, &[num(1.0), num(2.0), num(3.0)])
            .unwrap();
        let env = ctx.variable_environment;
        assert_eq!(interp.get_binding_value(&env, "a", false).unwrap(), num(3.0));
        assert_eq!(interp.get_binding_value(&env, "b", false).unwrap(), num(2.0));
        assert!(!interp.delete_binding(&env, "a").unwrap());
        interp.exit_function_scope();

        let f = user_fn(&mut interp, &["x", "y"], false);
        let ctx = interp.enter_function_scope(f, JsValue::Undefined, &[num(1.0)]).unwrap();
        let env = ctx.variable_environment;
        assert!(interp.has_binding(&env, "y").unwrap());
        assert_eq!(interp.get_binding_value(&env, "y", true).unwrap(), JsValue::Undefined);
    }

    #[test]
    fn sloppy_arguments_object() {
        let mut interp = Interpreter::new();
        let f = user_fn(&mut interp, &["a"], false);
        let ctx = interp
            .enter_function_scope(f, JsValue::Undefined, &[num(1.0), num(2.0)])
            .unwrap();
        let arguments = interp
            .get_binding_value(&ctx.variable_environment, "arguments", false)
            .unwrap();
        let JsValue::Object(args) = arguments else {
            panic!("arguments should be an object");
        };
        assert_eq!(interp.class_name(args).unwrap(), "Arguments");
        assert_eq!(interp.get(args, "length").unwrap(), num(2.0));
        assert_eq!(interp.get(args, "1").unwrap(), num(2.0));
        assert_eq!(interp.get(args, "callee").unwrap(), JsValue::Object(f));
        assert_eq!(interp.enumerable_keys(args).unwrap(), vec!["0".to_string(), "1".to_string()]);

        interp.set_mutable_binding(&ctx.variable_environment, "arguments", num(0.0), true).unwrap();
    }

    #[test]
    fn strict_arguments_object() {
        let mut interp = Interpreter::new();
        let f = user_fn(&mut interp, &[], true);
        let ctx = interp.enter_function_scope(f, JsValue::Undefined, &[num(1.0)]).unwrap();
        let env = ctx.variable_environment;
        let arguments = interp.get_binding_value(&env, "arguments", true).unwrap();
        let JsValue::Object(args) = arguments else {
            panic!("arguments should be an object");
        };
        assert!(interp.get(args, "callee").unwrap_err().is_type_error());
        assert!(interp.put(args, "caller", num(1.0), false).unwrap_err().is_type_error());
        assert!(interp
            .set_mutable_binding(&env, "arguments", num(0.0), true)
            .unwrap_err()
            .is_type_error());
    }

    #[test]
    fn parameter_named_arguments_wins() {
        let mut interp = Interpreter::new();
        let f = user_fn(&mut interp, &["arguments"], false);
        let ctx = interp.enter_function_scope(f, JsValue::Undefined, &[num(5.0)]).unwrap();
        let env = ctx.variable_environment;
        assert_eq!(interp.get_binding_value(&env, "arguments", false).unwrap(), num(5.0));
    }

    #[test]
    fn call_resolves_parameters_in_body() {
        let mut interp = Interpreter::new();
        let scope = interp.global_environment();
        let body = JsFunction::user(None, vec!["n".to_string()], scope, false, |interp| {
            let r = interp.resolve_identifier("n")?;
            interp.get_value(r)
        });
        let f = JsValue::Object(interp.create_function(body).unwrap());
        assert_eq!(interp.call(&f, JsValue::Undefined, &[num(4.0)]).unwrap(), num(4.0));
        assert_eq!(interp.context_depth(), 0);
    }

    #[test]
    fn call_pops_context_on_error() {
        let mut interp = Interpreter::new();
        let scope = interp.global_environment();
        let body = JsFunction::user(None, vec![], scope, true, |interp| {
            let r = interp.resolve_identifier("missing")?;
            interp.get_value(r)
        });
        let f = interp.create_function(body).unwrap();
        let err = interp.call(&JsValue::Object(f), JsValue::Undefined, &[]).unwrap_err();
        assert!(err.is_reference_error());
        assert_eq!(interp.context_depth(), 0);
    }

    #[test]
    fn call_rejects_non_callables() {
        let mut interp = Interpreter::new();
        let obj = interp.create_plain_object();
        let obj = JsValue::Object(obj);
        assert!(interp.call(&obj, JsValue::Undefined, &[]).unwrap_err().is_type_error());
        assert!(interp.call(&num(1.0), JsValue::Undefined, &[]).unwrap_err().is_type_error());
    }

    #[test]
    fn native_functions_have_no_scope() {
        let mut interp = Interpreter::new();
        let id = JsFunction::native("id", 1, |_, _, args| {
            Ok(args.first().cloned().unwrap_or(JsValue::Undefined))
        });
        let f = interp.create_function(id).unwrap();
        let err = interp.enter_function_scope(f, JsValue::Undefined, &[]).unwrap_err();
        assert!(err.is_type_error());
        let f = JsValue::Object(f);
        assert_eq!(interp.call(&f, JsValue::Undefined, &[num(1.0)]).unwrap(), num(1.0));
    }

    #[test]
    fn global_var_declaration_is_not_deletable() {
        let mut interp = Interpreter::new();
        interp.declare_variable("v").unwrap();
        let global = interp.global_object();
        let desc = interp.get_own_property(global, "v").unwrap().unwrap();
        assert!(!desc.configurable);
        assert!(desc.enumerable);

        let r = interp.resolve_identifier("v").unwrap();
        interp.put_value(r.clone(), num(1.0)).unwrap();
        interp.declare_variable("v").unwrap();
        assert_eq!(interp.get_value(r.clone()).unwrap(), num(1.0));
        assert!(!interp.delete_operand(r).unwrap());
    }

    #[test]
    fn function_var_declaration() {
        let mut interp = Interpreter::new();
        let f = user_fn(&mut interp, &["p"], false);
        let ctx = interp.enter_function_scope(f, JsValue::Undefined, &[num(1.0)]).unwrap();
        interp.declare_variable("local").unwrap();
        interp.declare_variable("p").unwrap();
        let env = ctx.variable_environment;
        assert!(interp.has_binding(&env, "local").unwrap());
        assert_eq!(interp.get_binding_value(&env, "p", false).unwrap(), num(1.0));
        let global = interp.global_object();
        assert!(!interp.has_property(global, "local").unwrap());
    }

    #[test]
    fn with_scope_resolves_through_object() {
        let mut interp = Interpreter::new();
        let obj = interp.create_plain_object();
        interp.put(obj, "m", num(1.0), true).unwrap();
        let previous = interp.enter_with_scope(obj);

        let r = interp.resolve_identifier("m").unwrap();
        assert_eq!(interp.this_value_for_call(&Operand::from(r.clone())), JsValue::Object(obj));
        interp.put_value(r, num(2.0)).unwrap();
        assert_eq!(interp.get(obj, "m").unwrap(), num(2.0));

        interp.restore_lexical_environment(previous);
        assert!(interp.resolve_identifier("m").unwrap().is_unresolvable_reference());
    }

    #[test]
    fn catch_scope_shadows_and_restores() {
        let mut interp = Interpreter::new();
        interp.declare_variable("e").unwrap();
        let previous = interp.enter_catch_scope("e", JsValue::string("boom")).unwrap();
        let r = interp.resolve_identifier("e").unwrap();
        assert_eq!(interp.get_value(r).unwrap(), JsValue::string("boom"));
        interp.restore_lexical_environment(previous);

        let r = interp.resolve_identifier("e").unwrap();
        assert_eq!(interp.get_value(r).unwrap(), JsValue::Undefined);
    }
}
