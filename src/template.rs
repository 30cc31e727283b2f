use std::collections::HashMap;
use std::io;

use log::trace;

use crate::context::{Context, Stack};
use crate::error::{ParseError, RenderError};
use crate::parser;
use crate::processor::{Budget, Output, RenderScope, Segments};
use crate::reader::Reader;

/// A parsed template. Immutable; a shared instance may be rendered from
/// several threads at once, each render with its own context and sink.
pub struct Template<'t> {
    segments: Segments<'t>,
}

impl<'t> Template<'t> {
    pub fn from(input: &'t str) -> Result<Self, ParseError> {
        Template::with_delimiters(input, "{{", "}}")
    }

    /// Parse with an initial delimiter pair other than `{{` / `}}`.
    pub fn with_delimiters(
        input: &'t str,
        open: &'t str,
        close: &'t str,
    ) -> Result<Self, ParseError> {
        let mut reader = Reader::with_delimiters(input, open, close);
        let segments = parser::process(&mut reader)?;
        trace!("parsed template: {} top-level elements", segments.len());
        Ok(Template { segments })
    }

    pub fn render<'c, C>(&self, context: &'c C) -> Result<String, RenderError>
    where
        &'c C: Context<'c>,
    {
        let mut sink = Vec::new();
        self.render_with(context, &mut sink, &RenderOptions::default())?;
        Ok(into_string(sink))
    }

    pub fn render_with_partials<'c, C>(
        &self,
        context: &'c C,
        partials: &dyn Partials,
    ) -> Result<String, RenderError>
    where
        &'c C: Context<'c>,
    {
        let options = RenderOptions {
            partials: Some(partials),
            ..RenderOptions::default()
        };
        let mut sink = Vec::new();
        self.render_with(context, &mut sink, &options)?;
        Ok(into_string(sink))
    }

    pub fn render_to<'c, C>(
        &self,
        context: &'c C,
        sink: &mut dyn io::Write,
    ) -> Result<(), RenderError>
    where
        &'c C: Context<'c>,
    {
        self.render_with(context, sink, &RenderOptions::default())
    }

    pub fn render_with<'c, C>(
        &self,
        context: &'c C,
        sink: &mut dyn io::Write,
        options: &RenderOptions<'_>,
    ) -> Result<(), RenderError>
    where
        &'c C: Context<'c>,
    {
        let stack = Stack::root(context);
        let mut scope = RenderScope {
            partials: options.partials,
            budget: Budget::new(options.budget),
        };
        let mut out = Output::new(sink);
        self.render_into(&stack, &mut scope, &mut out)
    }

    pub(crate) fn render_into(
        &self,
        stack: &Stack<'_>,
        scope: &mut RenderScope<'_>,
        out: &mut Output<'_>,
    ) -> Result<(), RenderError> {
        for segment in &self.segments {
            segment.render(stack, scope, out)?;
        }
        Ok(())
    }

    /// Exact inner byte range of the section named by a dotted path,
    /// searching nested sections segment by segment.
    pub fn section_location(&self, dotted: &str) -> Option<(usize, usize)> {
        let parts: Vec<&str> = dotted.split('.').collect();
        self.segments
            .iter()
            .find_map(|segment| segment.locate(&parts))
    }
}

// every write goes through &str
fn into_string(sink: Vec<u8>) -> String {
    String::from_utf8(sink).expect("render output is UTF-8")
}

/// Knobs for the entry points.
#[derive(Default)]
pub struct RenderOptions<'r> {
    /// Resolver for `{{>name}}` tags; absent partials render empty.
    pub partials: Option<&'r dyn Partials>,
    /// Cap in bytes on live intermediate allocation. Output is streamed,
    /// so template size does not count against this.
    pub budget: Option<usize>,
    /// Initial delimiter pair for the parse-and-render entry points;
    /// ignored when the template was parsed ahead of time.
    pub delimiters: Option<(&'r str, &'r str)>,
}

/// A partial as the host hands it back: raw source to be parsed on the
/// spot, or a template parsed ahead of time.
pub enum Partial<'p> {
    Source(&'p str),
    Parsed(&'p Template<'p>),
}

/// Host-side lookup for `{{>name}}` tags.
pub trait Partials {
    fn get(&self, name: &str) -> Option<Partial<'_>>;
}

impl<'h> Partials for HashMap<&'h str, &'h str> {
    fn get(&self, name: &str) -> Option<Partial<'_>> {
        HashMap::get(self, name).copied().map(Partial::Source)
    }
}

/// Named templates parsed up front and shared between renders.
pub struct TemplateMap<'t> {
    templates: HashMap<String, Template<'t>>,
}

impl<'t> TemplateMap<'t> {
    pub fn new(sources: HashMap<&str, &'t str>) -> Result<Self, ParseError> {
        let mut templates = HashMap::new();
        for (name, source) in sources {
            templates.insert(name.to_string(), Template::from(source)?);
        }
        Ok(TemplateMap { templates })
    }

    pub fn insert(&mut self, name: &str, template: Template<'t>) {
        self.templates.insert(name.to_string(), template);
    }
}

impl Partials for TemplateMap<'_> {
    fn get(&self, name: &str) -> Option<Partial<'_>> {
        self.templates.get(name).map(Partial::Parsed)
    }
}
