use std::fmt::Debug;
use std::io;

use log::debug;

use crate::context::{element, Kind, LambdaTag, Path, RcContext, Resolution, Stack};
use crate::error::RenderError;
use crate::template::{Partial, Partials, Template};

pub(crate) trait Segment: Debug + Send + Sync {
    fn render(
        &self,
        stack: &Stack<'_>,
        scope: &mut RenderScope<'_>,
        out: &mut Output<'_>,
    ) -> Result<(), RenderError>;

    /// Inner byte span of the section chain named by `parts`, if this
    /// element heads such a chain.
    fn locate(&self, _parts: &[&str]) -> Option<(usize, usize)> {
        None
    }
}

pub(crate) type Segments<'a> = Vec<Box<dyn Segment + 'a>>;

/// Per-render state threaded through every element, so the renderer
/// stays reentrant under lambda expansion.
pub(crate) struct RenderScope<'r> {
    pub(crate) partials: Option<&'r dyn Partials>,
    pub(crate) budget: Budget,
}

/// Live intermediate bytes measured against the caller's cap. Static
/// template text streams through and is never charged.
pub(crate) struct Budget {
    cap: Option<usize>,
    live: usize,
}

impl Budget {
    pub(crate) fn new(cap: Option<usize>) -> Self {
        Budget { cap, live: 0 }
    }

    fn charge(&mut self, bytes: usize, index: usize) -> Result<(), RenderError> {
        self.live += bytes;
        match self.cap {
            Some(cap) if self.live > cap => Err(RenderError::OutOfBudget { index }),
            _ => Ok(()),
        }
    }

    fn release(&mut self, bytes: usize) {
        self.live = self.live.saturating_sub(bytes);
    }
}

/// Byte sink wrapper owning the partial indent state.
pub(crate) struct Output<'w> {
    sink: &'w mut dyn io::Write,
    indent: String,
    at_line_start: bool,
}

impl<'w> Output<'w> {
    pub(crate) fn new(sink: &'w mut dyn io::Write) -> Self {
        Output {
            sink,
            indent: String::new(),
            at_line_start: true,
        }
    }

    fn write(&mut self, text: &str, index: usize) -> Result<(), RenderError> {
        if text.is_empty() {
            return Ok(());
        }
        if self.indent.is_empty() {
            self.sink
                .write_all(text.as_bytes())
                .map_err(|source| sink_failed(source, index))?;
            self.at_line_start = text.ends_with('\n');
            return Ok(());
        }
        for line in text.split_inclusive('\n') {
            // empty lines are not indented
            if self.at_line_start && line != "\n" && line != "\r\n" {
                self.sink
                    .write_all(self.indent.as_bytes())
                    .map_err(|source| sink_failed(source, index))?;
            }
            self.sink
                .write_all(line.as_bytes())
                .map_err(|source| sink_failed(source, index))?;
            self.at_line_start = line.ends_with('\n');
        }
        Ok(())
    }

    fn write_escaped(&mut self, text: &str, index: usize) -> Result<(), RenderError> {
        let mut rest = text;
        while let Some(at) = rest.find(&['&', '<', '>', '"', '\''][..]) {
            let (plain, tail) = rest.split_at(at);
            self.write(plain, index)?;
            let entity = match tail.as_bytes()[0] {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                _ => "&#39;",
            };
            self.write(entity, index)?;
            rest = &tail[1..];
        }
        self.write(rest, index)
    }

    fn push_indent(&mut self, indent: &str) {
        self.indent.push_str(indent);
    }

    fn pop_indent(&mut self, len: usize) {
        self.indent.truncate(self.indent.len() - len);
    }
}

fn sink_failed(source: io::Error, index: usize) -> RenderError {
    RenderError::SinkWriteFailed { index, source }
}

fn render_children(
    children: &Segments<'_>,
    stack: &Stack<'_>,
    scope: &mut RenderScope<'_>,
    out: &mut Output<'_>,
) -> Result<(), RenderError> {
    for child in children {
        child.render(stack, scope, out)?;
    }
    Ok(())
}

#[derive(Debug)]
pub(crate) struct TextSegment<'a> {
    text: &'a str,
    index: usize,
}

impl<'a> TextSegment<'a> {
    pub(crate) fn new(text: &'a str, index: usize) -> Self {
        TextSegment { text, index }
    }
}

impl Segment for TextSegment<'_> {
    fn render(
        &self,
        _stack: &Stack<'_>,
        _scope: &mut RenderScope<'_>,
        out: &mut Output<'_>,
    ) -> Result<(), RenderError> {
        out.write(self.text, self.index)
    }
}

#[derive(Debug)]
pub(crate) struct ValueSegment<'a> {
    path: Path<'a>,
    escaped: bool,
    delimiters: (&'a str, &'a str),
    index: usize,
}

impl<'a> ValueSegment<'a> {
    pub(crate) fn new(
        path: Path<'a>,
        escaped: bool,
        delimiters: (&'a str, &'a str),
        index: usize,
    ) -> Self {
        ValueSegment {
            path,
            escaped,
            delimiters,
            index,
        }
    }
}

impl Segment for ValueSegment<'_> {
    fn render(
        &self,
        stack: &Stack<'_>,
        scope: &mut RenderScope<'_>,
        out: &mut Output<'_>,
    ) -> Result<(), RenderError> {
        let text = match stack.resolve(&self.path) {
            Resolution::Resolved(value) => value.value(),
            Resolution::Lambda(value) => {
                let tag = LambdaTag {
                    body: "",
                    delimiters: self.delimiters,
                    escaped: self.escaped,
                };
                value.invoke(&tag)
            }
            _ => None,
        };
        let Some(text) = text else {
            return Ok(());
        };
        scope.budget.charge(text.len(), self.index)?;
        let written = if self.escaped {
            out.write_escaped(&text, self.index)
        } else {
            out.write(&text, self.index)
        };
        scope.budget.release(text.len());
        written
    }
}

#[derive(Debug)]
pub(crate) struct SectionSegment<'a> {
    path: Path<'a>,
    children: Segments<'a>,
    /// Exact bytes between the open and close tags, handed to lambdas.
    inner: &'a str,
    span: (usize, usize),
    delimiters: (&'a str, &'a str),
    index: usize,
}

impl<'a> SectionSegment<'a> {
    pub(crate) fn new(
        path: Path<'a>,
        children: Segments<'a>,
        inner: &'a str,
        span: (usize, usize),
        delimiters: (&'a str, &'a str),
        index: usize,
    ) -> Self {
        SectionSegment {
            path,
            children,
            inner,
            span,
            delimiters,
            index,
        }
    }

    fn render_value<'c>(
        &self,
        value: RcContext<'c>,
        stack: &Stack<'c>,
        scope: &mut RenderScope<'_>,
        out: &mut Output<'_>,
    ) -> Result<(), RenderError> {
        match value.kind() {
            Kind::Sequence | Kind::Tuple => {
                let mut at = 0;
                while let Resolution::Resolved(item) = element(&value, at) {
                    render_children(&self.children, &stack.push(item), scope, out)?;
                    at += 1;
                }
                Ok(())
            }
            Kind::Optional => match value.unwrapped() {
                Some(inner) => self.render_value(inner, stack, scope, out),
                None => Ok(()),
            },
            _ if value.is_truthy() => {
                render_children(&self.children, &stack.push(value), scope, out)
            }
            _ => Ok(()),
        }
    }

    fn render_lambda<'c>(
        &self,
        value: RcContext<'c>,
        stack: &Stack<'c>,
        scope: &mut RenderScope<'_>,
        out: &mut Output<'_>,
    ) -> Result<(), RenderError> {
        let (open, close) = self.delimiters;
        let tag = LambdaTag {
            body: self.inner,
            delimiters: self.delimiters,
            escaped: false,
        };
        let Some(expansion) = value.invoke(&tag) else {
            return Ok(());
        };
        scope.budget.charge(expansion.len(), self.index)?;
        let result = match Template::with_delimiters(&expansion, open, close) {
            Ok(fragment) => fragment.render_into(stack, scope, out),
            Err(err) => {
                debug!("lambda expansion failed to parse, dropped: {err}");
                Ok(())
            }
        };
        scope.budget.release(expansion.len());
        result
    }
}

impl Segment for SectionSegment<'_> {
    fn render(
        &self,
        stack: &Stack<'_>,
        scope: &mut RenderScope<'_>,
        out: &mut Output<'_>,
    ) -> Result<(), RenderError> {
        match stack.resolve(&self.path) {
            Resolution::Resolved(value) => self.render_value(value, stack, scope, out),
            Resolution::Lambda(value) => self.render_lambda(value, stack, scope, out),
            _ => Ok(()),
        }
    }

    fn locate(&self, parts: &[&str]) -> Option<(usize, usize)> {
        let own = self.path.parts();
        if own.is_empty() || parts.len() < own.len() || &parts[..own.len()] != own {
            return None;
        }
        let rest = &parts[own.len()..];
        if rest.is_empty() {
            Some(self.span)
        } else {
            self.children.iter().find_map(|child| child.locate(rest))
        }
    }
}

#[derive(Debug)]
pub(crate) struct InvertedSectionSegment<'a> {
    path: Path<'a>,
    children: Segments<'a>,
    index: usize,
}

impl<'a> InvertedSectionSegment<'a> {
    pub(crate) fn new(path: Path<'a>, children: Segments<'a>, index: usize) -> Self {
        InvertedSectionSegment {
            path,
            children,
            index,
        }
    }
}

impl Segment for InvertedSectionSegment<'_> {
    fn render(
        &self,
        stack: &Stack<'_>,
        scope: &mut RenderScope<'_>,
        out: &mut Output<'_>,
    ) -> Result<(), RenderError> {
        let falsy = match stack.resolve(&self.path) {
            Resolution::Resolved(value) => !value.is_truthy(),
            Resolution::Lambda(_) => false,
            _ => true,
        };
        if falsy {
            // no frame is pushed for inverted bodies
            render_children(&self.children, stack, scope, out)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug)]
pub(crate) struct PartialSegment<'a> {
    name: &'a str,
    indent: &'a str,
    index: usize,
}

impl<'a> PartialSegment<'a> {
    pub(crate) fn new(name: &'a str, indent: &'a str, index: usize) -> Self {
        PartialSegment {
            name,
            indent,
            index,
        }
    }
}

impl Segment for PartialSegment<'_> {
    fn render(
        &self,
        stack: &Stack<'_>,
        scope: &mut RenderScope<'_>,
        out: &mut Output<'_>,
    ) -> Result<(), RenderError> {
        let Some(partials) = scope.partials else {
            return Ok(());
        };
        let Some(found) = partials.get(self.name) else {
            debug!("partial `{}` not found, rendered empty", self.name);
            return Ok(());
        };
        scope.budget.charge(self.indent.len(), self.index)?;
        out.push_indent(self.indent);
        let result = match found {
            Partial::Parsed(template) => template.render_into(stack, scope, out),
            Partial::Source(source) => match Template::from(source) {
                Ok(template) => template.render_into(stack, scope, out),
                Err(err) => {
                    debug!("partial `{}` failed to parse, rendered empty: {err}", self.name);
                    Ok(())
                }
            },
        };
        out.pop_indent(self.indent.len());
        scope.budget.release(self.indent.len());
        result
    }
}

#[derive(Debug)]
pub(crate) struct ParentSegment<'a> {
    name: &'a str,
    children: Segments<'a>,
    index: usize,
}

impl<'a> ParentSegment<'a> {
    pub(crate) fn new(name: &'a str, children: Segments<'a>, index: usize) -> Self {
        ParentSegment {
            name,
            children,
            index,
        }
    }
}

impl Segment for ParentSegment<'_> {
    fn render(
        &self,
        _stack: &Stack<'_>,
        _scope: &mut RenderScope<'_>,
        _out: &mut Output<'_>,
    ) -> Result<(), RenderError> {
        debug!("parent tag `{}` reached at render time", self.name);
        Err(RenderError::FeatureUnsupported { index: self.index })
    }
}

#[derive(Debug)]
pub(crate) struct BlockSegment<'a> {
    name: &'a str,
    children: Segments<'a>,
    index: usize,
}

impl<'a> BlockSegment<'a> {
    pub(crate) fn new(name: &'a str, children: Segments<'a>, index: usize) -> Self {
        BlockSegment {
            name,
            children,
            index,
        }
    }
}

impl Segment for BlockSegment<'_> {
    fn render(
        &self,
        _stack: &Stack<'_>,
        _scope: &mut RenderScope<'_>,
        _out: &mut Output<'_>,
    ) -> Result<(), RenderError> {
        debug!("block tag `{}` reached at render time", self.name);
        Err(RenderError::FeatureUnsupported { index: self.index })
    }
}
