//! Streaming logic-less `{{mustache}}` templating.
//!
//! Templates parse into an immutable element tree and render against a
//! stack of opaque data frames reached through the [`Context`]
//! capability trait. Output streams into any [`std::io::Write`] sink;
//! intermediate allocation can be capped through
//! [`RenderOptions::budget`].
//!
//! ```
//! use brace::{JsonValue, Template};
//!
//! let data: JsonValue = serde_json::from_str(r#"{ "name": "World" }"#).unwrap();
//! let template = Template::from("Hello {{name}}!").unwrap();
//! assert_eq!(template.render(&data).unwrap(), "Hello World!");
//! ```

mod context;
mod error;
mod json;
mod maps_and_lists;
mod parser;
mod processor;
mod reader;
mod template;
mod yaml;

pub use self::context::{into_rc, Context, Kind, LambdaTag, RcContext};
pub use self::error::{Error, ParseError, RenderError};
pub use self::json::JsonValue;
pub use self::maps_and_lists::MapsAndLists;
pub use self::template::{Partial, Partials, RenderOptions, Template, TemplateMap};
pub use self::yaml::YamlValue;

use std::io;
use std::path::Path;

/// Parse a template source and render it in one call.
pub fn render_str<'c, C>(
    source: &str,
    context: &'c C,
    sink: &mut dyn io::Write,
    options: &RenderOptions<'_>,
) -> Result<(), Error>
where
    &'c C: Context<'c>,
{
    let template = match options.delimiters {
        Some((open, close)) => Template::with_delimiters(source, open, close)?,
        None => Template::from(source)?,
    };
    template.render_with(context, sink, options)?;
    Ok(())
}

/// Read a template file and render it in one call.
pub fn render_file<'c, C, P>(
    path: P,
    context: &'c C,
    sink: &mut dyn io::Write,
    options: &RenderOptions<'_>,
) -> Result<(), Error>
where
    &'c C: Context<'c>,
    P: AsRef<Path>,
{
    let source = std::fs::read_to_string(path)?;
    render_str(&source, context, sink, options)
}
