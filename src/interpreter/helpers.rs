use super::*;
use crate::types::number_to_string;

/// Hint passed to `[[DefaultValue]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    String,
    Number,
}

// §9.2 ToBoolean
pub fn to_boolean(val: &JsValue) -> bool {
    match val {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
        JsValue::String(s) => !s.is_empty(),
        JsValue::Object(_) => true,
    }
}

// §9.12 SameValue
pub fn same_value(left: &JsValue, right: &JsValue) -> bool {
    match (left, right) {
        (JsValue::Number(a), JsValue::Number(b)) => {
            (a.is_nan() && b.is_nan()) || (a == b && a.is_sign_negative() == b.is_sign_negative())
        }
        (JsValue::Undefined, JsValue::Undefined) | (JsValue::Null, JsValue::Null) => true,
        (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
        (JsValue::String(a), JsValue::String(b)) => a == b,
        (JsValue::Object(a), JsValue::Object(b)) => a == b,
        _ => false,
    }
}

/// `P` as an array index, when `P` is the canonical decimal form of an
/// integer below 2^32 - 1.
pub(crate) fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u64 = key.parse().ok()?;
    if value >= u32::MAX as u64 {
        return None;
    }
    Some(value as u32)
}

impl Interpreter {
    // §9.1 ToPrimitive
    pub fn to_primitive(
        &mut self,
        val: &JsValue,
        hint: Option<PreferredType>,
    ) -> JsResult<JsValue> {
        match val {
            JsValue::Object(o) => self.default_value(*o, hint),
            other => Ok(other.clone()),
        }
    }

    // §9.8 ToString
    pub fn to_string(&mut self, val: &JsValue) -> JsResult<JsString> {
        Ok(match val {
            JsValue::Undefined | JsValue::Null | JsValue::Boolean(_) => {
                JsString::from(val.to_string().as_str())
            }
            JsValue::Number(n) => JsString::from(number_to_string(*n).as_str()),
            JsValue::String(s) => s.clone(),
            JsValue::Object(_) => {
                let prim = self.to_primitive(val, Some(PreferredType::String))?;
                return self.to_string(&prim);
            }
        })
    }

    // §9.9 ToObject
    pub fn to_object(&mut self, val: &JsValue) -> JsResult<JsObject> {
        match val {
            JsValue::Undefined | JsValue::Null => Err(EngineError::type_error(
                "Cannot convert undefined or null to object",
            )),
            JsValue::Object(o) => Ok(*o),
            JsValue::Boolean(_) | JsValue::Number(_) | JsValue::String(_) => {
                let (class_name, prototype) = match val {
                    JsValue::String(_) => ("String", self.string_prototype),
                    JsValue::Number(_) => ("Number", self.number_prototype),
                    _ => ("Boolean", self.boolean_prototype),
                };
                let mut obj_data = JsObjectData::new(Some(prototype), true);
                obj_data.class_name = class_name.to_string();
                if let JsValue::String(s) = val {
                    obj_data.insert_property(
                        "length".to_string(),
                        PropertyDescriptor::data(
                            JsValue::Number(s.len() as f64),
                            false,
                            false,
                            false,
                        ),
                    );
                }
                obj_data.primitive_value = Some(val.clone());
                Ok(self.allocate_object_slot(obj_data))
            }
        }
    }

    /// Boxes `val` for the duration of `f` and frees the box afterwards. The
    /// box never escapes: `f` only sees its handle.
    pub(crate) fn with_transient_box<T>(
        &mut self,
        val: &JsValue,
        f: impl FnOnce(&mut Self, JsObject) -> JsResult<T>,
    ) -> JsResult<T> {
        let boxed = self.to_object(val)?;
        let result = f(self, boxed);
        if !val.is_object() {
            self.release_object_slot(boxed);
        }
        result
    }

    pub fn class_name(&self, obj: JsObject) -> JsResult<&str> {
        Ok(self.object_data(obj)?.class_name.as_str())
    }

    /// The `[[PrimitiveValue]]` of a Boolean, Number or String object.
    pub fn primitive_value(&self, obj: JsObject) -> JsResult<Option<JsValue>> {
        Ok(self.object_data(obj)?.primitive_value.clone())
    }
}
