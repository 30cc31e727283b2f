use crate::context::{into_rc, Context, Kind, RcContext};
pub use serde_json::Value as JsonValue;

impl<'a> Context<'a> for &'a JsonValue {
    fn kind(&self) -> Kind {
        match self {
            JsonValue::Null => Kind::Nil,
            JsonValue::Bool(_) => Kind::Bool,
            JsonValue::Number(number) if number.is_f64() => Kind::Float,
            JsonValue::Number(_) => Kind::Integer,
            JsonValue::String(_) => Kind::String,
            JsonValue::Array(_) => Kind::Sequence,
            JsonValue::Object(_) => Kind::Struct,
        }
    }

    fn child(&self, name: &str) -> Option<RcContext<'a>> {
        match self {
            JsonValue::Object(members) => members.get(name).map(into_rc),
            _ => None,
        }
    }

    fn child_at(&self, index: usize) -> Option<RcContext<'a>> {
        match self {
            JsonValue::Array(items) => items.get(index).map(into_rc),
            _ => None,
        }
    }

    fn len(&self) -> usize {
        match self {
            JsonValue::Array(items) => items.len(),
            _ => 0,
        }
    }

    fn value(&self) -> Option<String> {
        match self {
            JsonValue::String(text) => Some(text.clone()),
            JsonValue::Number(number) => Some(number.to_string()),
            JsonValue::Bool(flag) => Some(flag.to_string()),
            JsonValue::Null => Some(String::new()),
            _ => None,
        }
    }

    fn is_truthy(&self) -> bool {
        match self {
            JsonValue::Null => false,
            JsonValue::Bool(flag) => *flag,
            JsonValue::String(text) => !text.is_empty(),
            JsonValue::Array(items) => !items.is_empty(),
            _ => true,
        }
    }
}
