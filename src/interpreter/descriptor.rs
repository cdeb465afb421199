use super::*;

// §8.10.1 - §8.10.3. An absent descriptor classifies as none of the three.

pub fn is_data_descriptor(desc: Option<&PartialDescriptor>) -> bool {
    desc.is_some_and(PartialDescriptor::is_data_descriptor)
}

pub fn is_accessor_descriptor(desc: Option<&PartialDescriptor>) -> bool {
    desc.is_some_and(PartialDescriptor::is_accessor_descriptor)
}

pub fn is_generic_descriptor(desc: Option<&PartialDescriptor>) -> bool {
    desc.is_some_and(PartialDescriptor::is_generic_descriptor)
}

impl Interpreter {
    // §8.10.4 FromPropertyDescriptor
    pub fn from_property_descriptor(
        &mut self,
        desc: Option<&PropertyDescriptor>,
    ) -> JsResult<JsValue> {
        let Some(desc) = desc else {
            return Ok(JsValue::Undefined);
        };
        let obj = self.create_plain_object();
        let mut fields = match &desc.kind {
            PropertyKind::Data { value, writable } => vec![
                ("value", value.clone()),
                ("writable", JsValue::Boolean(*writable)),
            ],
            PropertyKind::Accessor { get, set } => {
                vec![("get", get.clone()), ("set", set.clone())]
            }
        };
        fields.push(("enumerable", JsValue::Boolean(desc.enumerable)));
        fields.push(("configurable", JsValue::Boolean(desc.configurable)));
        for (name, value) in fields {
            let entry = PartialDescriptor::data(value, true, true, true);
            self.define_own_property(obj, name, entry, false)?;
        }
        Ok(JsValue::Object(obj))
    }

    // §8.10.5 ToPropertyDescriptor
    pub fn to_property_descriptor(&mut self, val: &JsValue) -> JsResult<PartialDescriptor> {
        let JsValue::Object(obj) = val else {
            return Err(EngineError::type_error("Property description must be an object"));
        };
        let obj = *obj;
        let mut fields = DescriptorFields::default();
        if let Some(v) = self.field(obj, "enumerable")? {
            fields.enumerable = Some(to_boolean(&v));
        }
        if let Some(v) = self.field(obj, "configurable")? {
            fields.configurable = Some(to_boolean(&v));
        }
        fields.value = self.field(obj, "value")?;
        if let Some(v) = self.field(obj, "writable")? {
            fields.writable = Some(to_boolean(&v));
        }
        for (name, slot) in [("get", &mut fields.get), ("set", &mut fields.set)] {
            let Some(f) = self.field(obj, name)? else {
                continue;
            };
            if !f.is_undefined() && !self.is_callable(&f) {
                return Err(EngineError::TypeError(format!(
                    "Property descriptor {name} must be a function"
                )));
            }
            *slot = Some(f);
        }
        PartialDescriptor::from_fields(fields)
    }

    fn field(&mut self, obj: JsObject, name: &str) -> JsResult<Option<JsValue>> {
        if self.has_property(obj, name)? {
            Ok(Some(self.get(obj, name)?))
        } else {
            Ok(None)
        }
    }
}
