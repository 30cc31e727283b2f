use crate::context::Path;
use crate::error::ParseError;
use crate::processor::{
    BlockSegment, InvertedSectionSegment, ParentSegment, PartialSegment, SectionSegment, Segment,
    Segments, TextSegment, ValueSegment,
};
use crate::reader::{Reader, Tag, Token};

pub(crate) fn process<'a>(reader: &mut Reader<'a>) -> Result<Segments<'a>, ParseError> {
    let mut segments = Segments::new();
    let mut index = 0;
    process_into(reader, &mut segments, None, &mut index)?;
    Ok(segments)
}

struct OpenSection<'a> {
    name: &'a str,
    offset: usize,
}

// Fills `segments` until the close tag of `section` (returned), or
// end-of-input for the root.
fn process_into<'a>(
    reader: &mut Reader<'a>,
    segments: &mut Segments<'a>,
    section: Option<&OpenSection<'a>>,
    index: &mut usize,
) -> Result<Option<Tag<'a>>, ParseError> {
    while let Some(token) = reader.pop_front()? {
        match token {
            Token::Text(text) => {
                segments.add_item(TextSegment::new(text, next(index)));
            }
            Token::Value(tag, escaped) => {
                let path = Path::parse(tag.name, tag.start)?;
                segments.add_item(ValueSegment::new(
                    path,
                    escaped,
                    reader.delimiters(),
                    next(index),
                ));
            }
            Token::Section(tag) => {
                let idx = next(index);
                let path = Path::parse(tag.name, tag.start)?;
                let delimiters = reader.delimiters();
                let (children, close) = subtree(reader, &tag, index)?;
                let inner = &reader.source()[tag.end..close.start];
                segments.add_item(SectionSegment::new(
                    path,
                    children,
                    inner,
                    (tag.end, close.start),
                    delimiters,
                    idx,
                ));
            }
            Token::InvertedSection(tag) => {
                let idx = next(index);
                let path = Path::parse(tag.name, tag.start)?;
                let (children, _) = subtree(reader, &tag, index)?;
                segments.add_item(InvertedSectionSegment::new(path, children, idx));
            }
            Token::Parent(tag) => {
                let idx = next(index);
                let (children, _) = subtree(reader, &tag, index)?;
                segments.add_item(ParentSegment::new(tag.name, children, idx));
            }
            Token::Block(tag) => {
                let idx = next(index);
                let (children, _) = subtree(reader, &tag, index)?;
                segments.add_item(BlockSegment::new(tag.name, children, idx));
            }
            Token::EndSection(tag) => {
                return match section {
                    Some(open) if open.name == tag.name => Ok(Some(tag)),
                    _ => Err(ParseError::MismatchedSection {
                        name: tag.name.to_string(),
                        offset: tag.start,
                    }),
                };
            }
            Token::Partial(tag, indent) => {
                segments.add_item(PartialSegment::new(tag.name, indent, next(index)));
            }
            Token::Delimiters(od, cd) => {
                reader.set_delimiters(od, cd);
            }
            Token::Comment => {}
        }
    }
    match section {
        Some(open) => Err(ParseError::UnclosedSection {
            name: open.name.to_string(),
            offset: open.offset,
        }),
        None => Ok(None),
    }
}

fn subtree<'a>(
    reader: &mut Reader<'a>,
    open: &Tag<'a>,
    index: &mut usize,
) -> Result<(Segments<'a>, Tag<'a>), ParseError> {
    let frame = OpenSection {
        name: open.name,
        offset: open.start,
    };
    let mut children = Segments::new();
    let close = process_into(reader, &mut children, Some(&frame), index)?
        // unreachable: a nested call only returns None at end-of-input,
        // which the section arm above turns into UnclosedSection
        .ok_or(ParseError::UnclosedSection {
            name: open.name.to_string(),
            offset: open.start,
        })?;
    Ok((children, close))
}

fn next(index: &mut usize) -> usize {
    let at = *index;
    *index += 1;
    at
}

trait SegmentsOps<'a> {
    fn add_item(&mut self, item: impl Segment + 'a);
}

impl<'a> SegmentsOps<'a> for Segments<'a> {
    fn add_item(&mut self, item: impl Segment + 'a) {
        self.push(Box::new(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Segments<'_>, ParseError> {
        let mut reader = Reader::new(input);
        process(&mut reader)
    }

    #[test]
    fn balanced_sections_parse() {
        let segments = parse("a{{#s}}b{{^t}}c{{/t}}{{/s}}d").unwrap();
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn comments_vanish() {
        let segments = parse("a{{! ignored }}b").unwrap();
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn mismatched_close_is_rejected() {
        assert_eq!(
            parse("{{#a}}{{/b}}x").unwrap_err(),
            ParseError::MismatchedSection {
                name: String::from("b"),
                offset: 6,
            }
        );
    }

    #[test]
    fn close_without_open_is_rejected() {
        assert_eq!(
            parse("x{{/a}}").unwrap_err(),
            ParseError::MismatchedSection {
                name: String::from("a"),
                offset: 1,
            }
        );
    }

    #[test]
    fn unclosed_section_is_rejected() {
        assert_eq!(
            parse("ab{{#s}}cd").unwrap_err(),
            ParseError::UnclosedSection {
                name: String::from("s"),
                offset: 2,
            }
        );
    }

    #[test]
    fn unclosed_tag_is_rejected() {
        assert_eq!(parse("{{x}").unwrap_err(), ParseError::UnclosedTag(0));
    }

    #[test]
    fn empty_dotted_segment_is_rejected() {
        assert_eq!(parse("{{a..b}}").unwrap_err(), ParseError::EmptyPath(0));
    }

    #[test]
    fn delimiter_changes_leave_no_segment() {
        let segments = parse("a{{=| |=}}|v|").unwrap();
        assert_eq!(segments.len(), 2);
    }
}
