//! Helpers for producing CommonMark output from `pulldown_cmark` events.

use pulldown_cmark::{CowStr, Event, LinkType, Tag};
use pulldown_cmark_to_cmark::cmark;
use std::borrow::Borrow;

use crate::error::Result;

/// Punctuation that would otherwise open emphasis, code spans, links, entities or inline
/// HTML, or end the link text a label is written into.
const ESCAPED_PUNCTUATION: &[char] = &['\\', '`', '*', '_', '[', ']', '<', '>', '!', '&', '~'];

pub trait EventIteratorExt {
    /// Consume an event collection and return a stringified representation.
    fn stringify(self) -> Result<String>;
}

impl<'a, I, E> EventIteratorExt for I
where
    I: Iterator<Item = E>,
    E: Borrow<Event<'a>>,
{
    fn stringify(self) -> Result<String> {
        let mut buffer = String::new();
        cmark(self, &mut buffer)?;

        Ok(buffer)
    }
}

/// Backslash-escape `text` so it reads back as the same literal text. Events are written
/// out verbatim, so plain text has to be escaped before it becomes an [`Event::Text`].
pub fn escape_text(text: &str) -> CowStr<'_> {
    if !text.contains(ESCAPED_PUNCTUATION) {
        return CowStr::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        if ESCAPED_PUNCTUATION.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }

    CowStr::from(escaped)
}

/// Push the events of an inline link labelled with `text`, escaped as literal text.
pub fn push_link<'a>(events: &mut Vec<Event<'a>>, text: &'a str, href: String) {
    let href = CowStr::from(href);

    events.push(Event::Start(Tag::Link(
        LinkType::Inline,
        href.clone(),
        CowStr::Borrowed(""),
    )));
    events.push(Event::Text(escape_text(text)));
    events.push(Event::End(Tag::Link(
        LinkType::Inline,
        href,
        CowStr::Borrowed(""),
    )));
}

#[cfg(test)]
mod test {
    use super::*;
    use pulldown_cmark::Parser;

    /// `(href, text)` of every link in `source`.
    fn parse_links(source: &str) -> Vec<(String, String)> {
        let mut links = Vec::new();
        let mut current: Option<(String, String)> = None;

        for event in Parser::new(source) {
            match event {
                Event::Start(Tag::Link(_, href, _)) => {
                    current = Some((href.to_string(), String::new()));
                }
                Event::Text(text) | Event::Code(text) | Event::Html(text) => {
                    if let Some((_, label)) = current.as_mut() {
                        label.push_str(&text);
                    }
                }
                Event::End(Tag::Link(..)) => links.extend(current.take()),
                _ => (),
            }
        }

        links
    }

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(escape_text("Chapter one"), CowStr::Borrowed("Chapter one")));
        assert_eq!(r"Fish \*and\* chips", escape_text("Fish *and* chips").as_ref());
    }

    #[test]
    fn escaped_links_keep_their_text() {
        let titles = [
            "Close ] bracket",
            "Fish *and* chips",
            "Bold <b>raw</b>",
            "Snake_case and `code`",
            "Back \\ slash & [brackets]!",
            "Tom & Jerry &amp; friends",
        ];

        for title in titles {
            let mut events = vec![Event::Start(Tag::Paragraph)];
            push_link(&mut events, title, String::from("#sections/a"));
            events.push(Event::End(Tag::Paragraph));

            let output = events.iter().stringify().expect("events failed to stringify");

            assert_eq!(
                vec![(String::from("#sections/a"), title.to_owned())],
                parse_links(&output),
                "{title} rendered as {output}"
            );
        }
    }
}
