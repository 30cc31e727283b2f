use crate::context::{into_rc, Context, Kind, RcContext};
pub use serde_yaml::Value as YamlValue;

// Tags collapse to the value they wrap.
fn flatten(value: &YamlValue) -> &YamlValue {
    match value {
        YamlValue::Tagged(tagged) => flatten(&tagged.value),
        other => other,
    }
}

impl<'a> Context<'a> for &'a YamlValue {
    fn kind(&self) -> Kind {
        match flatten(self) {
            YamlValue::Null => Kind::Nil,
            YamlValue::Bool(_) => Kind::Bool,
            YamlValue::Number(number) if number.is_f64() => Kind::Float,
            YamlValue::Number(_) => Kind::Integer,
            YamlValue::String(_) => Kind::String,
            YamlValue::Sequence(_) => Kind::Sequence,
            YamlValue::Mapping(_) => Kind::Struct,
            // flatten never hands one back
            YamlValue::Tagged(_) => Kind::Nil,
        }
    }

    fn child(&self, name: &str) -> Option<RcContext<'a>> {
        let value = flatten(self);
        match value {
            YamlValue::Mapping(_) => value.get(name).map(into_rc),
            _ => None,
        }
    }

    fn child_at(&self, index: usize) -> Option<RcContext<'a>> {
        match flatten(self) {
            YamlValue::Sequence(items) => items.get(index).map(into_rc),
            _ => None,
        }
    }

    fn len(&self) -> usize {
        match flatten(self) {
            YamlValue::Sequence(items) => items.len(),
            _ => 0,
        }
    }

    fn value(&self) -> Option<String> {
        match flatten(self) {
            YamlValue::String(text) => Some(text.clone()),
            YamlValue::Number(number) => Some(number.to_string()),
            YamlValue::Bool(flag) => Some(flag.to_string()),
            YamlValue::Null => Some(String::new()),
            _ => None,
        }
    }

    fn is_truthy(&self) -> bool {
        match flatten(self) {
            YamlValue::Null => false,
            YamlValue::Bool(flag) => *flag,
            YamlValue::String(text) => !text.is_empty(),
            YamlValue::Sequence(items) => !items.is_empty(),
            _ => true,
        }
    }
}
