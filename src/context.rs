use std::fmt::Debug;
use std::rc::Rc;

use crate::error::ParseError;

/// Discriminator a data value must be able to answer for itself.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Kind {
    Nil,
    Bool,
    Integer,
    Float,
    String,
    Enum,
    Struct,
    Sequence,
    Tuple,
    Optional,
    Lambda,
}

/// What a lambda gets to see when it is invoked.
#[derive(Debug)]
pub struct LambdaTag<'t> {
    /// Raw bytes between the section tags; empty for interpolation lambdas.
    pub body: &'t str,
    /// Delimiters in effect at the invoking tag. Section lambda results
    /// are re-parsed with these.
    pub delimiters: (&'t str, &'t str),
    /// Whether the invoking tag escapes its output.
    pub escaped: bool,
}

/// Capability set the renderer requires from an opaque data value.
///
/// A host implements this once per value system; see the adapters for
/// `serde_json::Value`, `serde_yaml::Value` and [`MapsAndLists`].
///
/// [`MapsAndLists`]: crate::MapsAndLists
pub trait Context<'a>: Debug {
    fn kind(&self) -> Kind;

    /// Member lookup on struct-like values.
    fn child(&self, _name: &str) -> Option<RcContext<'a>> {
        None
    }

    /// Element access on sequences and tuples.
    fn child_at(&self, _index: usize) -> Option<RcContext<'a>> {
        None
    }

    /// Sequence or tuple length.
    fn len(&self) -> usize {
        0
    }

    /// The inner value of a present optional.
    fn unwrapped(&self) -> Option<RcContext<'a>> {
        None
    }

    /// Primitive view used by interpolation; `None` renders as empty.
    fn value(&self) -> Option<String>;

    /// Lambda expansion; `None` counts as a failed invocation and
    /// contributes empty output.
    fn invoke(&self, _tag: &LambdaTag<'_>) -> Option<String> {
        None
    }

    fn is_truthy(&self) -> bool {
        match self.kind() {
            Kind::Nil => false,
            Kind::Bool => self.value().as_deref() == Some("true"),
            Kind::String | Kind::Enum => self.value().map_or(false, |v| !v.is_empty()),
            Kind::Sequence | Kind::Tuple => self.len() > 0,
            Kind::Optional => self.unwrapped().map_or(false, |v| v.is_truthy()),
            _ => true,
        }
    }
}

// Use an RC to ref as dotted names and iteration need the same data
// available in multiple stack frames. Since the actual Context
// implementation may be defined in an external crate, cloning may not
// be desirable.
pub type RcContext<'a> = Rc<dyn Context<'a> + 'a>;

pub fn into_rc<'a, T>(context: &'a T) -> RcContext<'a>
where
    &'a T: Context<'a>,
{
    Rc::new(context)
}

/// A tag path, split at parse time.
#[derive(Clone, PartialEq, Debug)]
pub(crate) enum Path<'a> {
    /// The single `.` token: the top frame itself.
    Implicit,
    Parts(Vec<&'a str>),
}

impl<'a> Path<'a> {
    pub(crate) fn parse(name: &'a str, offset: usize) -> Result<Self, ParseError> {
        if name == "." {
            return Ok(Path::Implicit);
        }
        let parts: Vec<&str> = name.split('.').collect();
        if name.is_empty() || parts.iter().any(|part| part.is_empty()) {
            return Err(ParseError::EmptyPath(offset));
        }
        Ok(Path::Parts(parts))
    }

    pub(crate) fn parts(&self) -> &[&'a str] {
        match self {
            Path::Implicit => &[],
            Path::Parts(parts) => parts,
        }
    }
}

/// Outcome of a path lookup. Lookups never error.
#[derive(Debug)]
pub(crate) enum Resolution<'a> {
    Resolved(RcContext<'a>),
    Lambda(RcContext<'a>),
    IteratorConsumed,
    ChainBroken,
    NotFound,
}

// Use a vector to keep implementation simple. The alternative would be
// a variation on linked list. The tradeof is copies of stack states.
// As mustache stacks are not very deep this seems acceptabe for now.
#[derive(Clone, Debug)]
pub(crate) struct Stack<'a> {
    frames: Vec<RcContext<'a>>,
}

impl<'a> Stack<'a> {
    pub(crate) fn root<T>(context: &'a T) -> Self
    where
        &'a T: Context<'a>,
    {
        Stack {
            frames: vec![into_rc(context)],
        }
    }

    pub(crate) fn push(&self, context: RcContext<'a>) -> Self {
        let mut frames = self.frames.clone();
        frames.push(context);
        Stack { frames }
    }

    fn top(&self) -> &RcContext<'a> {
        self.frames.last().expect("stack holds the root frame")
    }

    /// Search frames top-down for the head segment; the first frame that
    /// owns it is final, even when the descent then breaks.
    pub(crate) fn resolve(&self, path: &Path<'_>) -> Resolution<'a> {
        let parts = match path {
            Path::Implicit => {
                let top = Rc::clone(self.top());
                return if top.kind() == Kind::Lambda {
                    Resolution::Lambda(top)
                } else {
                    Resolution::Resolved(top)
                };
            }
            Path::Parts(parts) => parts,
        };
        for frame in self.frames.iter().rev() {
            if let Some(found) = frame.child(parts[0]) {
                return descend(found, &parts[1..]);
            }
        }
        Resolution::NotFound
    }
}

fn descend<'a>(mut value: RcContext<'a>, rest: &[&str]) -> Resolution<'a> {
    for part in rest {
        while value.kind() == Kind::Optional {
            match value.unwrapped() {
                Some(inner) => value = inner,
                None => return Resolution::ChainBroken,
            }
        }
        value = match value.kind() {
            Kind::Lambda => return Resolution::ChainBroken,
            Kind::Sequence | Kind::Tuple if *part == "len" => {
                return Resolution::Resolved(Rc::new(Len(value.len())));
            }
            _ => match value.child(part) {
                Some(next) => next,
                None => return Resolution::ChainBroken,
            },
        };
    }
    if value.kind() == Kind::Lambda {
        Resolution::Lambda(value)
    } else {
        Resolution::Resolved(value)
    }
}

/// Indexed access driving section iteration.
pub(crate) fn element<'a>(value: &RcContext<'a>, index: usize) -> Resolution<'a> {
    if index >= value.len() {
        return Resolution::IteratorConsumed;
    }
    match value.child_at(index) {
        Some(item) => Resolution::Resolved(item),
        None => Resolution::IteratorConsumed,
    }
}

/// The synthetic `len` member sequences expose.
#[derive(Debug)]
struct Len(usize);

impl<'a> Context<'a> for Len {
    fn kind(&self) -> Kind {
        Kind::Integer
    }

    fn value(&self) -> Option<String> {
        Some(self.0.to_string())
    }
}
