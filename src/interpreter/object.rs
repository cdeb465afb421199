use super::helpers::array_index;
use super::*;

fn reject(throw: bool, msg: impl FnOnce() -> String) -> JsResult<bool> {
    if throw {
        Err(EngineError::TypeError(msg()))
    } else {
        Ok(false)
    }
}

impl Interpreter {
    /// Allocates an ordinary object. `prototype` is a traversal-only link.
    pub fn create_object(&mut self, prototype: Option<JsObject>, extensible: bool) -> JsObject {
        self.allocate_object_slot(JsObjectData::new(prototype, extensible))
    }

    /// `new Object()`: an extensible object inheriting from `Object.prototype`.
    pub fn create_plain_object(&mut self) -> JsObject {
        self.create_object(Some(self.object_prototype), true)
    }

    // §13.2 Creating Function Objects
    pub fn create_function(&mut self, func: JsFunction) -> JsResult<JsObject> {
        let is_user = matches!(func, JsFunction::User { .. });
        let func_obj = self.allocate_function(func);

        // User functions get a prototype object whose constructor points back.
        if is_user {
            let proto = self.create_plain_object();
            self.object_data_mut(proto)?.insert_property(
                "constructor".to_string(),
                PropertyDescriptor::data(JsValue::Object(func_obj), true, false, true),
            );
            self.object_data_mut(func_obj)?.insert_property(
                "prototype".to_string(),
                PropertyDescriptor::data(JsValue::Object(proto), true, false, false),
            );
        }
        Ok(func_obj)
    }

    /// The function object itself, with only its `length` property.
    pub(crate) fn allocate_function(&mut self, func: JsFunction) -> JsObject {
        let mut obj_data = JsObjectData::new(Some(self.function_prototype), true);
        obj_data.class_name = "Function".to_string();
        obj_data.insert_property(
            "length".to_string(),
            PropertyDescriptor::data(JsValue::Number(func.arity() as f64), false, false, false),
        );
        obj_data.callable = Some(func);
        self.allocate_object_slot(obj_data)
    }

    pub fn is_callable(&self, val: &JsValue) -> bool {
        match val {
            JsValue::Object(o) => self
                .object_data(*o)
                .is_ok_and(|data| data.callable.is_some()),
            _ => false,
        }
    }

    pub(crate) fn function_of(&self, obj: JsObject) -> JsResult<Option<JsFunction>> {
        Ok(self.object_data(obj)?.callable.clone())
    }

    pub fn get_prototype_of(&self, obj: JsObject) -> JsResult<Option<JsObject>> {
        Ok(self.object_data(obj)?.prototype)
    }

    /// Reassigns `[[Prototype]]`. Returns false when `obj` is not extensible
    /// and the prototype would change; rejects links that close a cycle.
    pub fn set_prototype_of(
        &mut self,
        obj: JsObject,
        prototype: Option<JsObject>,
    ) -> JsResult<bool> {
        let data = self.object_data(obj)?;
        if data.prototype == prototype {
            return Ok(true);
        }
        if !data.extensible {
            return Ok(false);
        }
        let mut cursor = prototype;
        while let Some(p) = cursor {
            if p == obj {
                return Err(EngineError::PrototypeCycle);
            }
            cursor = self.object_data(p)?.prototype;
        }
        self.object_data_mut(obj)?.prototype = prototype;
        Ok(true)
    }

    pub fn is_extensible(&self, obj: JsObject) -> JsResult<bool> {
        Ok(self.object_data(obj)?.extensible)
    }

    pub fn prevent_extensions(&mut self, obj: JsObject) -> JsResult<()> {
        self.object_data_mut(obj)?.extensible = false;
        Ok(())
    }

    // §8.12.1 [[GetOwnProperty]], with the String object override of §15.5.5.2
    pub fn get_own_property(
        &self,
        obj: JsObject,
        key: &str,
    ) -> JsResult<Option<PropertyDescriptor>> {
        let data = self.object_data(obj)?;
        if let Some(desc) = data.own_descriptor(key) {
            return Ok(Some(desc.clone()));
        }
        if let Some(JsValue::String(s)) = &data.primitive_value
            && let Some(index) = array_index(key)
            && let Some(unit) = s.unit_at(index as usize)
        {
            return Ok(Some(PropertyDescriptor::data(
                JsValue::String(unit),
                false,
                true,
                false,
            )));
        }
        Ok(None)
    }

    // §8.12.2 [[GetProperty]]
    pub fn get_property(&self, obj: JsObject, key: &str) -> JsResult<Option<PropertyDescriptor>> {
        let mut cursor = Some(obj);
        while let Some(current) = cursor {
            if let Some(desc) = self.get_own_property(current, key)? {
                return Ok(Some(desc));
            }
            cursor = self.get_prototype_of(current)?;
        }
        Ok(None)
    }

    // §8.12.3 [[Get]]
    pub fn get(&mut self, obj: JsObject, key: &str) -> JsResult<JsValue> {
        match self.get_property(obj, key)? {
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
                self.call(&get, JsValue::Object(obj), &[])
            }
        }
    }

    // §8.12.4 [[CanPut]]
    pub fn can_put(&self, obj: JsObject, key: &str) -> JsResult<bool> {
        if let Some(desc) = self.get_own_property(obj, key)? {
            return Ok(match desc.kind {
                PropertyKind::Accessor { set, .. } => !set.is_undefined(),
                PropertyKind::Data { writable, .. } => writable,
            });
        }
        let extensible = self.is_extensible(obj)?;
        let Some(proto) = self.get_prototype_of(obj)? else {
            return Ok(extensible);
        };
        Ok(match self.get_property(proto, key)? {
            None => extensible,
            Some(PropertyDescriptor {
                kind: PropertyKind::Accessor { set, .. },
                ..
            }) => !set.is_undefined(),
            Some(PropertyDescriptor {
                kind: PropertyKind::Data { writable, .. },
                ..
            }) => extensible && writable,
        })
    }

    // §8.12.5 [[Put]]
    pub fn put(&mut self, obj: JsObject, key: &str, value: JsValue, throw: bool) -> JsResult<()> {
        if !self.can_put(obj, key)? {
            if throw {
                return Err(EngineError::TypeError(format!(
                    "Cannot assign to read only property '{key}'"
                )));
            }
            return Ok(());
        }
        if let Some(own) = self.get_own_property(obj, key)?
            && own.is_data_descriptor()
        {
            self.define_own_property(obj, key, PartialDescriptor::value_only(value), throw)?;
            return Ok(());
        }
        if let Some(PropertyDescriptor {
            kind: PropertyKind::Accessor { set, .. },
            ..
        }) = self.get_property(obj, key)?
        {
            self.call(&set, JsValue::Object(obj), &[value])?;
            return Ok(());
        }
        let desc = PartialDescriptor::data(value, true, true, true);
        self.define_own_property(obj, key, desc, throw)?;
        Ok(())
    }

    // §8.12.6 [[HasProperty]]
    pub fn has_property(&self, obj: JsObject, key: &str) -> JsResult<bool> {
        Ok(self.get_property(obj, key)?.is_some())
    }

    pub fn has_own_property(&self, obj: JsObject, key: &str) -> JsResult<bool> {
        Ok(self.get_own_property(obj, key)?.is_some())
    }

    // §8.12.7 [[Delete]]
    pub fn delete(&mut self, obj: JsObject, key: &str, throw: bool) -> JsResult<bool> {
        let Some(desc) = self.get_own_property(obj, key)? else {
            return Ok(true);
        };
        if desc.configurable {
            self.object_data_mut(obj)?.remove_property(key);
            return Ok(true);
        }
        reject(throw, || format!("Cannot delete property '{key}'"))
    }

    // §8.12.8 [[DefaultValue]]
    pub fn default_value(
        &mut self,
        obj: JsObject,
        hint: Option<PreferredType>,
    ) -> JsResult<JsValue> {
        let order = match hint {
            Some(PreferredType::String) => ["toString", "valueOf"],
            Some(PreferredType::Number) | None => ["valueOf", "toString"],
        };
        for name in order {
            let method = self.get(obj, name)?;
            if self.is_callable(&method) {
                let result = self.call(&method, JsValue::Object(obj), &[])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        Err(EngineError::type_error("Cannot convert object to primitive value"))
    }

    // §8.12.9 [[DefineOwnProperty]]
    pub fn define_own_property(
        &mut self,
        obj: JsObject,
        key: &str,
        desc: PartialDescriptor,
        throw: bool,
    ) -> JsResult<bool> {
        let current = self.get_own_property(obj, key)?;
        let extensible = self.is_extensible(obj)?;

        let Some(current) = current else {
            if !extensible {
                debug!(key, "define rejected: object is not extensible");
                return reject(throw, || {
                    format!("Cannot define property '{key}', object is not extensible")
                });
            }
            self.object_data_mut(obj)?
                .insert_property(key.to_string(), desc.to_complete());
            return Ok(true);
        };

        if desc.is_empty() {
            return Ok(true);
        }

        if !current.configurable {
            if desc.configurable == Some(true) {
                debug!(key, "define rejected: cannot make configurable");
                return reject(throw, || format!("Cannot redefine property: {key}"));
            }
            if desc.enumerable.is_some_and(|e| e != current.enumerable) {
                debug!(key, "define rejected: cannot change enumerable");
                return reject(throw, || format!("Cannot redefine property: {key}"));
            }
        }

        let enumerable = desc.enumerable.unwrap_or(current.enumerable);
        let configurable = desc.configurable.unwrap_or(current.configurable);

        let kind = match (current.kind, desc.shape) {
            (kind, DescriptorShape::Generic) => kind,
            (
                PropertyKind::Data {
                    value: cur_value,
                    writable: cur_writable,
                },
                DescriptorShape::Data { value, writable },
            ) => {
                if !current.configurable && !cur_writable {
                    if writable == Some(true) {
                        debug!(key, "define rejected: cannot make writable");
                        return reject(throw, || format!("Cannot redefine property: {key}"));
                    }
                    if value.as_ref().is_some_and(|v| !same_value(v, &cur_value)) {
                        debug!(key, "define rejected: value of read-only property");
                        return reject(throw, || {
                            format!("Cannot assign to read only property '{key}'")
                        });
                    }
                }
                PropertyKind::Data {
                    value: value.unwrap_or(cur_value),
                    writable: writable.unwrap_or(cur_writable),
                }
            }
            (
                PropertyKind::Accessor {
                    get: cur_get,
                    set: cur_set,
                },
                DescriptorShape::Accessor { get, set },
            ) => {
                if !current.configurable {
                    let changes = |new: &Option<JsValue>, old: &JsValue| {
                        new.as_ref().is_some_and(|v| !same_value(v, old))
                    };
                    if changes(&set, &cur_set) || changes(&get, &cur_get) {
                        debug!(key, "define rejected: accessor of non-configurable property");
                        return reject(throw, || format!("Cannot redefine property: {key}"));
                    }
                }
                PropertyKind::Accessor {
                    get: get.unwrap_or(cur_get),
                    set: set.unwrap_or(cur_set),
                }
            }
            (PropertyKind::Data { .. }, DescriptorShape::Accessor { get, set }) => {
                if !current.configurable {
                    debug!(key, "define rejected: data to accessor");
                    return reject(throw, || format!("Cannot redefine property: {key}"));
                }
                PropertyKind::Accessor {
                    get: get.unwrap_or(JsValue::Undefined),
                    set: set.unwrap_or(JsValue::Undefined),
                }
            }
            (PropertyKind::Accessor { .. }, DescriptorShape::Data { value, writable }) => {
                if !current.configurable {
                    debug!(key, "define rejected: accessor to data");
                    return reject(throw, || format!("Cannot redefine property: {key}"));
                }
                PropertyKind::Data {
                    value: value.unwrap_or(JsValue::Undefined),
                    writable: writable.unwrap_or(false),
                }
            }
        };

        self.object_data_mut(obj)?.insert_property(
            key.to_string(),
            PropertyDescriptor {
                enumerable,
                configurable,
                kind,
            },
        );
        Ok(true)
    }

    /// Own property names: string indices of a String object first, then the
    /// remaining keys in insertion order.
    pub fn own_property_keys(&self, obj: JsObject) -> JsResult<Vec<String>> {
        let data = self.object_data(obj)?;
        let mut keys = Vec::new();
        let mut seen = rustc_hash::FxHashSet::default();
        if let Some(JsValue::String(s)) = &data.primitive_value {
            keys.extend((0..s.len()).map(|i| i.to_string()));
            seen.extend(keys.iter().cloned());
        }
        for key in &data.property_order {
            if seen.insert(key.clone()) {
                keys.push(key.clone());
            }
        }
        Ok(keys)
    }

    /// Enumerable property names along the whole prototype chain, own first,
    /// shadowed names reported once.
    pub fn enumerable_keys(&self, obj: JsObject) -> JsResult<Vec<String>> {
        let mut seen = rustc_hash::FxHashSet::default();
        let mut keys = Vec::new();
        let mut cursor = Some(obj);
        while let Some(current) = cursor {
            for key in self.own_property_keys(current)? {
                if !seen.insert(key.clone()) {
                    continue;
                }
                if let Some(desc) = self.get_own_property(current, &key)?
                    && desc.enumerable
                {
                    keys.push(key);
                }
            }
            cursor = self.get_prototype_of(current)?;
        }
        Ok(keys)
    }
}
