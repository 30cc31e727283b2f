use std::io;

/// Scan and parse failures, located by byte offset into the source.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("unclosed tag at byte {0}")]
    UnclosedTag(usize),
    #[error("section `{name}` opened at byte {offset} is never closed")]
    UnclosedSection { name: String, offset: usize },
    #[error("close tag `{name}` at byte {offset} does not match the open section")]
    MismatchedSection { name: String, offset: usize },
    #[error("invalid set-delimiters tag at byte {0}")]
    InvalidDelimiters(usize),
    #[error("empty tag path at byte {0}")]
    EmptyPath(usize),
}

/// Render failures, located by element index within the parsed tree.
///
/// Path lookups never fail; a name that resolves to nothing renders as
/// empty output instead.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("sink write failed at element {index}: {source}")]
    SinkWriteFailed {
        index: usize,
        #[source]
        source: io::Error,
    },
    #[error("allocation budget exhausted at element {index}")]
    OutOfBudget { index: usize },
    #[error("template inheritance is not supported (element {index})")]
    FeatureUnsupported { index: usize },
}

/// Union of the layer errors for the parse-and-render entry points.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("template could not be read: {0}")]
    Io(#[from] io::Error),
}
