use serde::{Deserialize, Serialize};

/// Anchor prefix used by the client-side story viewer to route to a section.
pub const SECTION_ANCHOR_PREFIX: &str = "#sections/";

pub const SUMMARY_SECTION_ID: &str = "summary";
pub const CALL_TO_ACTION_SECTION_ID: &str = "call-to-action";
pub const CONNECTED_STORIES_SECTION_ID: &str = "connected-stories";

pub const SUMMARY_TITLE: &str = "Summary";
pub const CALL_TO_ACTION_TITLE: &str = "How Can You Help?";
pub const CONNECTED_STORIES_TITLE: &str = "Connected Stories";

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableOfContents {
    /// All items making up the TOC, wrapper items included.
    pub items: Vec<TOCItem>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Link {
    /// The id of the section this link points to.
    pub section_id: String,
    /// The label shown for the link, never empty.
    pub name: String,
    /// Any table of content items nested below this link.
    pub nested_items: Vec<TOCItem>,
}

impl Link {
    pub fn new(section_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            section_id: section_id.into(),
            name: name.into(),
            nested_items: Vec::new(),
        }
    }

    pub fn with_nested_items(mut self, nested_items: Vec<TOCItem>) -> Self {
        self.nested_items = nested_items;
        self
    }
}

/// A table of contents item: either a link to a real section of the story, or one of the
/// fixed items wrapped around the sections.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TOCItem {
    /// Leads the TOC when the story has a summary.
    Summary,
    /// A link to a story section, including nested sections.
    Link(Link),
    /// Follows the sections when the story asks readers to act or to connect.
    CallToAction,
    /// Follows the call to action when connected stories are available.
    ConnectedStories,
}

impl TOCItem {
    pub fn section_id(&self) -> &str {
        match self {
            TOCItem::Summary => SUMMARY_SECTION_ID,
            TOCItem::Link(link) => &link.section_id,
            TOCItem::CallToAction => CALL_TO_ACTION_SECTION_ID,
            TOCItem::ConnectedStories => CONNECTED_STORIES_SECTION_ID,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TOCItem::Summary => SUMMARY_TITLE,
            TOCItem::Link(link) => &link.name,
            TOCItem::CallToAction => CALL_TO_ACTION_TITLE,
            TOCItem::ConnectedStories => CONNECTED_STORIES_TITLE,
        }
    }

    pub fn anchor(&self) -> String {
        format!("{SECTION_ANCHOR_PREFIX}{}", self.section_id())
    }

    pub fn nested_items(&self) -> &[TOCItem] {
        match self {
            TOCItem::Link(link) => &link.nested_items,
            _ => &[],
        }
    }

    pub fn maybe_link(&self) -> Option<&Link> {
        match self {
            TOCItem::Link(ref link) => Some(link),
            _ => None,
        }
    }
}

impl From<Link> for TOCItem {
    fn from(link: Link) -> Self {
        TOCItem::Link(link)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wrapper_items_use_fixed_ids() {
        assert_eq!("#sections/summary", TOCItem::Summary.anchor());
        assert_eq!("#sections/call-to-action", TOCItem::CallToAction.anchor());
        assert_eq!(
            "#sections/connected-stories",
            TOCItem::ConnectedStories.anchor()
        );
        assert_eq!("How Can You Help?", TOCItem::CallToAction.label());
    }

    #[test]
    fn links_point_at_their_section() {
        let item = TOCItem::from(
            Link::new("intro", "Introduction").with_nested_items(vec![Link::new("a", "A").into()]),
        );

        assert_eq!("#sections/intro", item.anchor());
        assert_eq!("Introduction", item.label());
        assert_eq!(1, item.nested_items().len());
        assert!(TOCItem::Summary.maybe_link().is_none());
    }
}
