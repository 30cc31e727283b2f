use crate::error::ParseError;

/// A classified tag body plus the byte range its markers cover.
#[derive(PartialEq, Debug)]
pub(crate) struct Tag<'a> {
    pub(crate) name: &'a str,
    /// Offset of the opening marker.
    pub(crate) start: usize,
    /// Offset just past the closing marker.
    pub(crate) end: usize,
}

#[derive(PartialEq, Debug)]
pub(crate) enum Token<'a> {
    Text(&'a str),
    /// Interpolation; the flag is true when output must be escaped.
    Value(Tag<'a>, bool),
    Section(Tag<'a>),
    InvertedSection(Tag<'a>),
    EndSection(Tag<'a>),
    /// Partial with the line whitespace captured when it stood alone.
    Partial(Tag<'a>, &'a str),
    Parent(Tag<'a>),
    Block(Tag<'a>),
    Delimiters(&'a str, &'a str),
    Comment,
}

pub(crate) struct Reader<'a> {
    input: &'a str,
    open: &'a str,
    close: &'a str,
    pos: usize,
    // the cursor sits inside a standalone tag run whose surrounding
    // line whitespace and trailing newline are consumed, not emitted
    in_standalone: bool,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Reader::with_delimiters(input, "{{", "}}")
    }

    pub(crate) fn with_delimiters(input: &'a str, open: &'a str, close: &'a str) -> Self {
        Reader {
            input,
            open,
            close,
            pos: 0,
            in_standalone: false,
        }
    }

    pub(crate) fn source(&self) -> &'a str {
        self.input
    }

    pub(crate) fn delimiters(&self) -> (&'a str, &'a str) {
        (self.open, self.close)
    }

    // The parser applies delimiter changes as soon as it sees the tag,
    // before the next pop; the rest of a standalone run is then walked
    // with the new markers.
    pub(crate) fn set_delimiters(&mut self, open: &'a str, close: &'a str) {
        self.open = open;
        self.close = close;
    }

    pub(crate) fn pop_front(&mut self) -> Result<Option<Token<'a>>, ParseError> {
        if self.in_standalone {
            self.advance_standalone();
        }
        if self.pos >= self.input.len() {
            return Ok(None);
        }
        match self.read_text() {
            Some(text) => Ok(Some(Token::Text(text))),
            None => self.read_tag().map(Some),
        }
    }

    // Move from the end of a tag to the next tag of the run, or out of
    // the run past its line terminator.
    fn advance_standalone(&mut self) {
        let bytes = self.input.as_bytes();
        let mut pos = self.pos;
        while pos < bytes.len() && is_blank(bytes[pos]) {
            pos += 1;
        }
        if pos >= bytes.len() {
            self.pos = pos;
            self.in_standalone = false;
        } else if bytes[pos] == b'\n' {
            self.pos = pos + 1;
            self.in_standalone = false;
        } else if self.input[pos..].starts_with(self.open) {
            self.pos = pos;
        } else {
            // a delimiter change rewrote the markers mid-run; whatever
            // is left on the line is ordinary text
            self.in_standalone = false;
        }
    }

    // Emit the text run before the next tag, cut back to the line start
    // when that tag opens a standalone run. None means a tag is next.
    fn read_text(&mut self) -> Option<&'a str> {
        let tail = &self.input[self.pos..];
        let tag_at = match tail.find(self.open) {
            Some(rel) => self.pos + rel,
            None => {
                self.pos = self.input.len();
                return Some(tail);
            }
        };
        let line_start = self.input[..tag_at].rfind('\n').map(|at| at + 1).unwrap_or(0);
        let text_end = if line_start >= self.pos
            && self.input[line_start..tag_at].bytes().all(is_blank)
            && self.standalone_line(tag_at)
        {
            self.in_standalone = true;
            line_start
        } else {
            tag_at
        };
        let text = &self.input[self.pos..text_end];
        self.pos = tag_at;
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    // A line holding nothing but whitespace and strippable tags is
    // trimmed whole, trailing newline included.
    fn standalone_line(&self, first_tag: usize) -> bool {
        let bytes = self.input.as_bytes();
        let mut pos = first_tag;
        loop {
            match self.span_tag_at(pos) {
                Some((inner, end)) if is_strippable(inner.chars().next()) => pos = end,
                _ => return false,
            }
            while pos < bytes.len() && is_blank(bytes[pos]) {
                pos += 1;
            }
            if pos >= bytes.len() || bytes[pos] == b'\n' {
                return true;
            }
            if !self.input[pos..].starts_with(self.open) {
                return false;
            }
        }
    }

    // (trimmed tag body, position past the closing marker), or None
    // when the closing marker is missing.
    fn span_tag_at(&self, start: usize) -> Option<(&'a str, usize)> {
        let after_open = start + self.open.len();
        let rest = &self.input[after_open..];
        let closer = match rest.chars().next() {
            Some('{') => format!("}}{}", self.close),
            Some('=') => format!("={}", self.close),
            _ => self.close.to_string(),
        };
        let rel = rest.find(&closer)?;
        Some((rest[..rel].trim(), after_open + rel + closer.len()))
    }

    fn read_tag(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.pos;
        let Some((inner, end)) = self.span_tag_at(start) else {
            self.pos = self.input.len();
            return Err(ParseError::UnclosedTag(start));
        };
        self.pos = end;
        let token = match inner.chars().next() {
            None => return Err(ParseError::EmptyPath(start)),
            Some('!') => Token::Comment,
            Some('=') => {
                let mut words = inner[1..].split_whitespace();
                match (words.next(), words.next(), words.next()) {
                    (Some(od), Some(cd), None) if !od.contains('=') && !cd.contains('=') => {
                        Token::Delimiters(od, cd)
                    }
                    _ => return Err(ParseError::InvalidDelimiters(start)),
                }
            }
            Some('#') => Token::Section(named_tag(inner, start, end)?),
            Some('^') => Token::InvertedSection(named_tag(inner, start, end)?),
            Some('/') => Token::EndSection(named_tag(inner, start, end)?),
            Some('<') => Token::Parent(named_tag(inner, start, end)?),
            Some('$') => Token::Block(named_tag(inner, start, end)?),
            Some('>') => {
                let tag = named_tag(inner, start, end)?;
                let indent = if self.in_standalone {
                    self.line_indent(start)
                } else {
                    ""
                };
                Token::Partial(tag, indent)
            }
            Some('&') | Some('{') => Token::Value(named_tag(inner, start, end)?, false),
            Some(_) => Token::Value(Tag { name: inner, start, end }, true),
        };
        Ok(token)
    }

    // Whitespace run between the tag and whatever precedes it on its line.
    fn line_indent(&self, tag_start: usize) -> &'a str {
        let bytes = self.input.as_bytes();
        let mut from = tag_start;
        while from > 0 && is_blank(bytes[from - 1]) {
            from -= 1;
        }
        &self.input[from..tag_start]
    }
}

fn named_tag<'a>(inner: &'a str, start: usize, end: usize) -> Result<Tag<'a>, ParseError> {
    let name = inner[1..].trim_start();
    if name.is_empty() {
        Err(ParseError::EmptyPath(start))
    } else {
        Ok(Tag { name, start, end })
    }
}

fn is_blank(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r')
}

fn is_strippable(sigil: Option<char>) -> bool {
    matches!(sigil, Some('#' | '^' | '/' | '>' | '<' | '$' | '!' | '='))
}
