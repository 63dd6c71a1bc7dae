use anyhow::bail;
use pulldown_cmark::{
    escape::{escape_href, escape_html},
    Event, Tag,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Write as _, str::FromStr};

use super::Structure;
use crate::{
    cmark::{push_link, EventIteratorExt as _},
    error::{Error, Result},
    model::{
        toc::{Link, TOCItem, TableOfContents},
        Section,
    },
};

/// Arranges the sections of a structure into table of contents items. The summary, call to
/// action and connected stories items are added around the result by [`table_of_contents`].
pub trait TocLayout {
    fn section_items(&self, structure: &Structure<'_>) -> Vec<TOCItem>;
}

/// Deepest level of nesting in a spider table of contents. Sections nested further down
/// are listed at this level, in reading order.
pub const MAX_TOC_DEPTH: usize = 16;

/// The built-in layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One flat list in reading order.
    Linear,
    /// Nested lists mirroring the section tree.
    Spider,
}

impl TocLayout for Layout {
    fn section_items(&self, structure: &Structure<'_>) -> Vec<TOCItem> {
        match self {
            Layout::Linear => linear_items(structure),
            Layout::Spider => spider_items(structure, structure.roots(), 1),
        }
    }
}

fn linear_items(structure: &Structure<'_>) -> Vec<TOCItem> {
    let mut root_position = 0;
    let mut items = Vec::with_capacity(structure.len());

    for section in structure.sections_flat() {
        // NOTE: Untitled sections are numbered after the root they are read under.
        if structure.is_root(&section.section_id) {
            root_position += 1;
        }

        items.push(Link::new(&section.section_id, label(section, root_position)).into());
    }

    items
}

fn spider_items<'s>(
    structure: &Structure<'s>,
    sections: &[&'s Section],
    depth: usize,
) -> Vec<TOCItem> {
    let mut items = Vec::with_capacity(sections.len());

    for (index, section) in sections.iter().enumerate() {
        let link = Link::new(&section.section_id, label(section, index + 1));
        let children = structure.children(&section.section_id);

        if depth < MAX_TOC_DEPTH {
            let nested_items = spider_items(structure, children, depth + 1);
            items.push(link.with_nested_items(nested_items).into());
        } else {
            items.push(link.into());
            items.extend(subtree_items(structure, children));
        }
    }

    items
}

/// Unnested links to `sections` and all of their descendants, in reading order.
fn subtree_items<'s>(structure: &Structure<'s>, sections: &[&'s Section]) -> Vec<TOCItem> {
    let mut items = Vec::new();
    let mut pending: Vec<(usize, &'s Section)> =
        sections.iter().copied().enumerate().rev().collect();

    while let Some((index, section)) = pending.pop() {
        items.push(Link::new(&section.section_id, label(section, index + 1)).into());
        pending.extend(
            structure
                .children(&section.section_id)
                .iter()
                .copied()
                .enumerate()
                .rev(),
        );
    }

    items
}

fn label(section: &Section, position: usize) -> String {
    if section.title.trim().is_empty() {
        format!("Section {position}")
    } else {
        section.title.clone()
    }
}

/// Lay out the sections of a structure and wrap them in the items the story qualifies for.
pub fn table_of_contents(structure: &Structure<'_>, layout: &dyn TocLayout) -> TableOfContents {
    let story = structure.story();
    let mut items = Vec::new();

    if story.has_summary() {
        items.push(TOCItem::Summary);
    }

    items.extend(layout.section_items(structure));

    if story.has_call_to_action() || story.allow_connected {
        items.push(TOCItem::CallToAction);
    }

    if story.allow_connected && !story.connected_stories(true).is_empty() {
        items.push(TOCItem::ConnectedStories);
    }

    TableOfContents { items }
}

/// Element names and attributes used when rendering a table of contents as HTML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TocOptions {
    /// Element wrapping a list of items.
    pub container_el: String,
    /// Attributes of the outermost container. Nested containers are rendered bare.
    pub container_attrs: BTreeMap<String, String>,
    /// Element wrapping a single item.
    pub item_el: String,
    pub item_attrs: BTreeMap<String, String>,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            container_el: String::from("ul"),
            container_attrs: BTreeMap::from([(String::from("class"), String::from("story-toc"))]),
            item_el: String::from("li"),
            item_attrs: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TocFormat {
    #[default]
    Html,
    Markdown,
}

impl FromStr for TocFormat {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        match source {
            "html" => Ok(TocFormat::Html),
            "markdown" | "md" => Ok(TocFormat::Markdown),
            other => bail!("Unknown table of contents format: {other}"),
        }
    }
}

/// Render the table of contents of a structure in the requested format.
pub fn render_toc(
    structure: &Structure<'_>,
    layout: &dyn TocLayout,
    options: &TocOptions,
    format: TocFormat,
) -> Result<String> {
    let toc = table_of_contents(structure, layout);

    match format {
        TocFormat::Html => render_html(&toc, options),
        TocFormat::Markdown => render_markdown(&toc),
    }
}

pub fn render_html(toc: &TableOfContents, options: &TocOptions) -> Result<String> {
    let mut output = String::new();
    write_html_list(&mut output, &toc.items, options, &options.container_attrs)?;

    Ok(output)
}

fn write_html_list(
    output: &mut String,
    items: &[TOCItem],
    options: &TocOptions,
    container_attrs: &BTreeMap<String, String>,
) -> Result<()> {
    write!(output, "<{}", options.container_el)?;
    write_html_attrs(output, container_attrs)?;
    output.push('>');

    for item in items {
        write!(output, "<{}", options.item_el)?;
        write_html_attrs(output, &options.item_attrs)?;
        output.push_str("><a href=\"");
        escape_href(&mut *output, &item.anchor())?;
        output.push_str("\">");
        escape_html(&mut *output, item.label())?;
        output.push_str("</a>");

        if !item.nested_items().is_empty() {
            write_html_list(output, item.nested_items(), options, &BTreeMap::new())?;
        }

        write!(output, "</{}>", options.item_el)?;
    }

    write!(output, "</{}>", options.container_el)?;

    Ok(())
}

fn write_html_attrs(output: &mut String, attrs: &BTreeMap<String, String>) -> Result<()> {
    for (name, value) in attrs {
        write!(output, " {name}=\"")?;
        escape_html(&mut *output, value)?;
        output.push('"');
    }

    Ok(())
}

/// Render the table of contents as a CommonMark bullet list of links.
pub fn render_markdown(toc: &TableOfContents) -> Result<String> {
    if toc.items.is_empty() {
        return Ok(String::new());
    }

    let mut events = Vec::new();
    push_markdown_list(&mut events, &toc.items);

    events.iter().stringify()
}

fn push_markdown_list<'a>(events: &mut Vec<Event<'a>>, items: &'a [TOCItem]) {
    events.push(Event::Start(Tag::List(None)));

    for item in items {
        events.push(Event::Start(Tag::Item));
        push_link(events, item.label(), item.anchor());

        if !item.nested_items().is_empty() {
            push_markdown_list(events, item.nested_items());
        }

        events.push(Event::End(Tag::Item));
    }

    events.push(Event::End(Tag::List(None)));
}
