//! Reading order, navigation links and presentation of a story's sections.
//!
//! A [`Structure`] is computed from a [`Story`] on demand and never stored. It walks the
//! root sections in weight order and expands each subtree completely before moving on to
//! the next sibling, so every subtree ends up contiguous in the flattened sequence.

mod registry;
mod toc;

pub use registry::*;
pub use toc::*;

use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::{
    error::{Result, StructureError},
    model::{
        toc::{
            CALL_TO_ACTION_SECTION_ID, CALL_TO_ACTION_TITLE, CONNECTED_STORIES_SECTION_ID,
            CONNECTED_STORIES_TITLE, SUMMARY_SECTION_ID, SUMMARY_TITLE,
        },
        ConnectedStory, Section, SimpleSection, Story,
    },
};

/// Which synthetic sections to wrap around the real ones in [`Structure::sections_json`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionsOptions {
    pub include_summary: bool,
    pub include_call_to_action: bool,
}

impl Default for SectionsOptions {
    fn default() -> Self {
        Self {
            include_summary: true,
            include_call_to_action: true,
        }
    }
}

#[derive(Debug)]
pub struct Structure<'s> {
    story: &'s Story,
    /// Every reachable section, each subtree contiguous and in weight order.
    sections_flat: Vec<&'s Section>,
    /// Root sections that were placed, in weight order.
    roots: Vec<&'s Section>,
    /// Children of each placed section, restricted to the edges the traversal followed.
    children: HashMap<&'s str, Vec<&'s Section>>,
    previous: HashMap<&'s str, Option<&'s Section>>,
    next: HashMap<&'s str, Option<&'s Section>>,
}

impl<'s> Structure<'s> {
    pub fn build(story: &'s Story) -> Result<Structure<'s>, StructureError> {
        let mut flattener = Flattener::new(story);
        let mut roots = Vec::new();

        for root in story.root_sections() {
            if flattener.visit(root)? {
                roots.push(root);
            }
        }

        let Flattener {
            sections_flat,
            children,
            previous,
            next,
            ..
        } = flattener;

        debug!(
            story_id = %story.story_id,
            sections = sections_flat.len(),
            roots = roots.len(),
            "built story structure"
        );

        Ok(Structure {
            story,
            sections_flat,
            roots,
            children,
            previous,
            next,
        })
    }

    pub fn story(&self) -> &'s Story {
        self.story
    }

    pub fn sections_flat(&self) -> &[&'s Section] {
        &self.sections_flat
    }

    pub fn len(&self) -> usize {
        self.sections_flat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections_flat.is_empty()
    }

    pub fn contains(&self, section_id: &str) -> bool {
        self.next.contains_key(section_id)
    }

    pub fn roots(&self) -> &[&'s Section] {
        &self.roots
    }

    pub fn is_root(&self, section_id: &str) -> bool {
        self.roots
            .iter()
            .any(|root| root.section_id == section_id)
    }

    /// Children of a section in the order they are read. Sections outside the structure
    /// have none.
    pub fn children(&self, section_id: &str) -> &[&'s Section] {
        self.children
            .get(section_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The section read after `section_id`, or `None` when it is the last one.
    pub fn next_section(&self, section_id: &str) -> Result<Option<&'s Section>, StructureError> {
        self.next
            .get(section_id)
            .copied()
            .ok_or_else(|| not_found(section_id))
    }

    /// The section read before `section_id`, or `None` when it is the first one.
    pub fn previous_section(
        &self,
        section_id: &str,
    ) -> Result<Option<&'s Section>, StructureError> {
        self.previous
            .get(section_id)
            .copied()
            .ok_or_else(|| not_found(section_id))
    }

    /// Simplified list of sections for bootstrapping a client-side story viewer, wrapped in
    /// the summary, call to action and connected stories pseudo-sections where they apply.
    ///
    /// `connected` may carry connected stories fetched by the caller; when it is `None` the
    /// published connected stories of the story are used.
    pub fn sections_json(
        &self,
        options: SectionsOptions,
        connected: Option<&[ConnectedStory]>,
    ) -> Vec<SimpleSection> {
        let story = self.story;
        let mut sections: Vec<SimpleSection> = self
            .sections_flat
            .iter()
            .map(|section| self.simple_section(section))
            .collect();

        if options.include_summary && story.has_summary() {
            let mut summary = SimpleSection::synthetic(SUMMARY_SECTION_ID, SUMMARY_TITLE);

            if let Some(first) = sections.first_mut() {
                first.previous_section_id = Some(summary.section_id.clone());
                summary.next_section_id = Some(first.section_id.clone());
            }

            sections.insert(0, summary);
        }

        if options.include_call_to_action && (story.has_call_to_action() || story.allow_connected) {
            append_section(
                &mut sections,
                SimpleSection::synthetic(CALL_TO_ACTION_SECTION_ID, CALL_TO_ACTION_TITLE),
            );

            let has_connected = match connected {
                Some(connected) => !connected.is_empty(),
                None => !story.connected_stories(true).is_empty(),
            };

            if story.allow_connected && has_connected {
                append_section(
                    &mut sections,
                    SimpleSection::synthetic(CONNECTED_STORIES_SECTION_ID, CONNECTED_STORIES_TITLE),
                );
            }
        }

        sections
    }

    /// [`Structure::sections_json`] serialized to a JSON string.
    pub fn sections_json_string(
        &self,
        options: SectionsOptions,
        connected: Option<&[ConnectedStory]>,
    ) -> Result<String> {
        let sections = self.sections_json(options, connected);

        Ok(serde_json::to_string(&sections)?)
    }

    fn simple_section(&self, section: &Section) -> SimpleSection {
        let section_id = section.section_id.as_str();
        let children = self
            .children(section_id)
            .iter()
            .map(|child| child.section_id.clone())
            .collect();

        let link = |links: &HashMap<&'s str, Option<&'s Section>>| {
            links
                .get(section_id)
                .copied()
                .flatten()
                .map(|section| section.section_id.clone())
        };

        let mut simple = section.to_simple(children);
        simple.previous_section_id = link(&self.previous);
        simple.next_section_id = link(&self.next);

        simple
    }
}

fn not_found(section_id: &str) -> StructureError {
    StructureError::NotFound {
        section_id: section_id.to_owned(),
    }
}

/// Append a synthetic section, linking it to whatever section is currently last.
fn append_section(sections: &mut Vec<SimpleSection>, mut section: SimpleSection) {
    if let Some(last) = sections.last_mut() {
        last.next_section_id = Some(section.section_id.clone());
        section.previous_section_id = Some(last.section_id.clone());
    }

    sections.push(section);
}

/// Depth-first walk over the section graph which records the flattened order and the
/// navigation links as it goes. The walk keeps its own stack of frames, so the depth of a
/// story is only bounded by memory.
struct Flattener<'s> {
    story: &'s Story,
    /// Sections on the path from the current root down to the section being visited.
    path: HashSet<&'s str>,
    sections_flat: Vec<&'s Section>,
    children: HashMap<&'s str, Vec<&'s Section>>,
    previous: HashMap<&'s str, Option<&'s Section>>,
    next: HashMap<&'s str, Option<&'s Section>>,
}

/// A placed section whose children are still being walked.
struct Frame<'s> {
    section: &'s Section,
    pending: std::vec::IntoIter<&'s Section>,
    placed: Vec<&'s Section>,
}

impl<'s> Flattener<'s> {
    fn new(story: &'s Story) -> Self {
        Self {
            story,
            path: HashSet::new(),
            sections_flat: Vec::new(),
            children: HashMap::new(),
            previous: HashMap::new(),
            next: HashMap::new(),
        }
    }

    /// Place `root` and its subtree. Returns false when the section had already been
    /// placed through another parent, in which case nothing is added.
    fn visit(&mut self, root: &'s Section) -> Result<bool, StructureError> {
        if !self.place(root)? {
            return Ok(false);
        }

        let mut stack = vec![self.frame(root)];

        while let Some(frame) = stack.last_mut() {
            if let Some(child) = frame.pending.next() {
                if self.place(child)? {
                    frame.placed.push(child);
                    stack.push(self.frame(child));
                }
                continue;
            }

            let section = frame.section;
            let placed = std::mem::take(&mut frame.placed);
            stack.pop();

            self.path.remove(section.section_id.as_str());
            self.children.insert(section.section_id.as_str(), placed);
        }

        Ok(true)
    }

    fn frame(&self, section: &'s Section) -> Frame<'s> {
        Frame {
            section,
            pending: self.story.children(&section.section_id).into_iter(),
            placed: Vec::new(),
        }
    }

    /// Append `section` to the flattened sequence and put it on the current path.
    fn place(&mut self, section: &'s Section) -> Result<bool, StructureError> {
        let section_id = section.section_id.as_str();

        if self.path.contains(section_id) {
            return Err(StructureError::Cycle {
                section_id: section_id.to_owned(),
            });
        }

        if self.next.contains_key(section_id) {
            warn!(
                story_id = %self.story.story_id,
                section_id,
                "section has more than one parent, keeping its first position only"
            );
            return Ok(false);
        }

        // NOTE: Whatever was placed last is read right before this section, and its next
        // link is backfilled now that the successor is known.
        let previous = self.sections_flat.last().copied();
        if let Some(previous) = previous {
            self.next.insert(previous.section_id.as_str(), Some(section));
        }

        self.previous.insert(section_id, previous);
        self.next.insert(section_id, None);
        self.sections_flat.push(section);
        self.path.insert(section_id);

        Ok(true)
    }
}
