use std::collections::HashMap;
use std::fmt::{self, Debug};

use crate::context::{into_rc, Context, Kind, LambdaTag, RcContext};

enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Tag(String),
    Mapping(HashMap<String, MapsAndLists>),
    Sequence(Vec<MapsAndLists>),
    Optional(Option<Box<MapsAndLists>>),
    Lambda(Box<dyn Fn(&LambdaTag<'_>) -> Option<String>>),
}

/// Self-contained tree of maps, lists and scalars for hosts without a
/// value system of their own.
pub struct MapsAndLists(Value);

impl MapsAndLists {
    pub fn null() -> MapsAndLists {
        MapsAndLists(Value::Null)
    }

    pub fn bool(flag: bool) -> MapsAndLists {
        MapsAndLists(Value::Bool(flag))
    }

    pub fn int(number: i64) -> MapsAndLists {
        MapsAndLists(Value::Int(number))
    }

    pub fn float(number: f64) -> MapsAndLists {
        MapsAndLists(Value::Float(number))
    }

    pub fn text(text: &str) -> MapsAndLists {
        MapsAndLists(Value::Text(text.to_owned()))
    }

    /// Enum-like value; renders as its tag name.
    pub fn tag(name: &str) -> MapsAndLists {
        MapsAndLists(Value::Tag(name.to_owned()))
    }

    pub fn mapping(mapping: HashMap<String, MapsAndLists>) -> MapsAndLists {
        MapsAndLists(Value::Mapping(mapping))
    }

    pub fn sequence(sequence: Vec<MapsAndLists>) -> MapsAndLists {
        MapsAndLists(Value::Sequence(sequence))
    }

    pub fn optional(inner: Option<MapsAndLists>) -> MapsAndLists {
        MapsAndLists(Value::Optional(inner.map(Box::new)))
    }

    /// Lambda with full access to the invoking tag.
    pub fn lambda<T>(fun: T) -> MapsAndLists
    where
        T: Fn(&LambdaTag<'_>) -> Option<String> + 'static,
    {
        MapsAndLists(Value::Lambda(Box::new(fun)))
    }

    /// Lambda that ignores the tag body.
    pub fn lambda0<T>(fun: T) -> MapsAndLists
    where
        T: Fn() -> String + 'static,
    {
        MapsAndLists::lambda(move |_| Some(fun()))
    }

    /// Lambda over the raw tag body.
    pub fn lambda1<T>(fun: T) -> MapsAndLists
    where
        T: Fn(&str) -> String + 'static,
    {
        MapsAndLists::lambda(move |tag: &LambdaTag<'_>| Some(fun(tag.body)))
    }
}

impl Debug for MapsAndLists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::Null => write!(f, "null"),
            Value::Bool(flag) => write!(f, "{flag}"),
            Value::Int(number) => write!(f, "{number}"),
            Value::Float(number) => write!(f, "{number}"),
            Value::Text(text) => write!(f, "{text:?}"),
            Value::Tag(name) => write!(f, "!{name}"),
            Value::Mapping(members) => f.debug_map().entries(members.iter()).finish(),
            Value::Sequence(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Optional(inner) => write!(f, "{inner:?}"),
            Value::Lambda(_) => write!(f, "<lambda>"),
        }
    }
}

impl<'a> Context<'a> for &'a MapsAndLists {
    fn kind(&self) -> Kind {
        match &self.0 {
            Value::Null => Kind::Nil,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Integer,
            Value::Float(_) => Kind::Float,
            Value::Text(_) => Kind::String,
            Value::Tag(_) => Kind::Enum,
            Value::Mapping(_) => Kind::Struct,
            Value::Sequence(_) => Kind::Sequence,
            Value::Optional(_) => Kind::Optional,
            Value::Lambda(_) => Kind::Lambda,
        }
    }

    fn child(&self, name: &str) -> Option<RcContext<'a>> {
        match &self.0 {
            Value::Mapping(members) => members.get(name).map(into_rc),
            _ => None,
        }
    }

    fn child_at(&self, index: usize) -> Option<RcContext<'a>> {
        match &self.0 {
            Value::Sequence(items) => items.get(index).map(into_rc),
            _ => None,
        }
    }

    fn len(&self) -> usize {
        match &self.0 {
            Value::Sequence(items) => items.len(),
            _ => 0,
        }
    }

    fn unwrapped(&self) -> Option<RcContext<'a>> {
        match &self.0 {
            Value::Optional(inner) => inner.as_deref().map(into_rc),
            _ => None,
        }
    }

    fn value(&self) -> Option<String> {
        match &self.0 {
            Value::Null => Some(String::new()),
            Value::Bool(flag) => Some(flag.to_string()),
            Value::Int(number) => Some(number.to_string()),
            Value::Float(number) => Some(number.to_string()),
            Value::Text(text) => Some(text.clone()),
            Value::Tag(name) => Some(name.clone()),
            Value::Optional(inner) => inner.as_deref().and_then(|value| value.value()),
            _ => None,
        }
    }

    fn invoke(&self, tag: &LambdaTag<'_>) -> Option<String> {
        match &self.0 {
            Value::Lambda(fun) => fun(tag),
            _ => None,
        }
    }

    fn is_truthy(&self) -> bool {
        match &self.0 {
            Value::Null => false,
            Value::Bool(flag) => *flag,
            Value::Text(text) => !text.is_empty(),
            Value::Sequence(items) => !items.is_empty(),
            Value::Optional(inner) => inner.as_deref().map_or(false, |value| value.is_truthy()),
            _ => true,
        }
    }
}
