use std::fmt;

/// An ECMAScript language value (§8.1 - §8.6).
#[derive(Clone, Debug, PartialEq)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Object(JsObject),
}

impl JsValue {
    pub fn string(s: &str) -> Self {
        JsValue::String(JsString::from(s))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsValue::Object(_))
    }

    /// The `typeof`-style name, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Null => "null",
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Object(_) => "object",
        }
    }
}

impl From<JsObject> for JsValue {
    fn from(obj: JsObject) -> Self {
        JsValue::Object(obj)
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Boolean(b) => write!(f, "{b}"),
            JsValue::Number(n) => f.write_str(&number_to_string(*n)),
            JsValue::String(s) => write!(f, "{s}"),
            JsValue::Object(o) => write!(f, "[object #{}]", o.id),
            other => f.write_str(other.type_name()),
        }
    }
}

/// A String value: a sequence of UTF-16 code units (§8.4). Lone surrogates
/// are representable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct JsString {
    units: Vec<u16>,
}

impl JsString {
    pub fn units(&self) -> &[u16] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The one-unit string at `index`; String objects expose these as their
    /// index properties.
    pub fn unit_at(&self, index: usize) -> Option<JsString> {
        let unit = *self.units.get(index)?;
        Some(JsString { units: vec![unit] })
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString {
            units: s.encode_utf16().collect(),
        }
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        char::decode_utf16(self.units.iter().copied())
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .try_for_each(|c| fmt::Write::write_char(f, c))
    }
}

/// Handle to an object slot owned by an [`Interpreter`](crate::Interpreter).
///
/// Handles are plain ids: holding one never keeps the object alive, and
/// prototype links are stored as handles so chains are traversal-only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JsObject {
    pub id: u64,
}

// §9.8.1 ToString applied to the Number type
pub fn number_to_string(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x == 0.0 {
        "0".to_string()
    } else if x.is_infinite() {
        (if x > 0.0 { "Infinity" } else { "-Infinity" }).to_string()
    } else {
        ryu_js::Buffer::new().format_finite(x).to_string()
    }
}
