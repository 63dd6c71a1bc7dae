use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{
    collections::{hash_map::Entry, HashMap},
    fs,
    path::Path,
    str::FromStr,
};

use super::{Section, SectionRelation};
use crate::error::{Error, Result, StructureError};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublicationStatus {
    #[default]
    Draft,
    Published,
}

/// Another story linked to this one as a response or continuation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConnectedStory {
    pub story_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: PublicationStatus,
}

impl ConnectedStory {
    pub fn is_published(&self) -> bool {
        self.status == PublicationStatus::Published
    }
}

/// The on-disk shape of a story: plain lists of sections, relations and connected stories.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StoryRecord {
    pub story_id: String,
    pub title: String,
    pub summary: String,
    pub call_to_action: String,
    pub allow_connected: bool,
    pub structure_type: Option<String>,
    pub sections: Vec<Section>,
    pub relations: Vec<SectionRelation>,
    pub connected: Vec<ConnectedStory>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ChildRelation {
    child: usize,
    weight: i32,
}

/// A story and all of its sections. Sections live in a single arena owned by the story;
/// relations between them are kept as per-parent lists of arena slots, sorted by weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StoryRecord", into = "StoryRecord")]
pub struct Story {
    pub story_id: String,
    pub title: String,
    pub summary: String,
    pub call_to_action: String,
    pub allow_connected: bool,
    /// Identifier of the structure type used to present the story, if one was chosen.
    pub structure_type: Option<String>,
    pub connected: Vec<ConnectedStory>,

    sections: Vec<Section>,
    relations: Vec<SectionRelation>,
    index: HashMap<String, usize>,
    children: HashMap<usize, Vec<ChildRelation>>,
}

impl Story {
    /// Load a story from a TOML file, or from JSON when the file has a `.json` extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Story> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to open story file {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));

        let story = if is_json {
            serde_json::from_str(&source).map_err(Error::from)
        } else {
            Story::from_str(&source)
        };

        story.with_context(|| format!("Failed to parse story file {}", path.display()))
    }

    /// Look a section up by id, whether or not it is reachable from a root.
    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.index.get(section_id).map(|&slot| &self.sections[slot])
    }

    /// Every section of the story in declaration order, reachable or not.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn relations(&self) -> &[SectionRelation] {
        &self.relations
    }

    /// Sections flagged as roots, ordered by weight.
    pub fn root_sections(&self) -> Vec<&Section> {
        let mut roots: Vec<&Section> = self.sections.iter().filter(|section| section.root).collect();
        roots.sort_by_key(|section| section.weight);

        roots
    }

    /// Direct children of a section, ordered by relation weight. Unknown sections have none.
    pub fn children(&self, section_id: &str) -> Vec<&Section> {
        self.index
            .get(section_id)
            .and_then(|slot| self.children.get(slot))
            .map(|relations| {
                relations
                    .iter()
                    .map(|relation| &self.sections[relation.child])
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_summary(&self) -> bool {
        !self.summary.trim().is_empty()
    }

    pub fn has_call_to_action(&self) -> bool {
        !self.call_to_action.trim().is_empty()
    }

    /// Connected stories in declaration order, limited to published ones unless
    /// `published_only` is false.
    pub fn connected_stories(&self, published_only: bool) -> Vec<&ConnectedStory> {
        self.connected
            .iter()
            .filter(|story| !published_only || story.is_published())
            .collect()
    }
}

impl TryFrom<StoryRecord> for Story {
    type Error = StructureError;

    fn try_from(record: StoryRecord) -> Result<Self, Self::Error> {
        let mut index = HashMap::with_capacity(record.sections.len());

        for (slot, section) in record.sections.iter().enumerate() {
            match index.entry(section.section_id.clone()) {
                Entry::Occupied(_) => {
                    return Err(StructureError::DuplicateSection {
                        section_id: section.section_id.clone(),
                    })
                }
                Entry::Vacant(entry) => {
                    entry.insert(slot);
                }
            }
        }

        let mut children: HashMap<usize, Vec<ChildRelation>> = HashMap::new();

        for relation in &record.relations {
            let lookup = |section_id: &String| {
                index
                    .get(section_id)
                    .copied()
                    .ok_or_else(|| StructureError::UnknownSection {
                        parent: relation.parent.clone(),
                        child: relation.child.clone(),
                        missing: section_id.clone(),
                    })
            };

            let parent = lookup(&relation.parent)?;
            let child = lookup(&relation.child)?;

            children.entry(parent).or_default().push(ChildRelation {
                child,
                weight: relation.weight,
            });
        }

        // NOTE: Stable sort, so equal weights keep the order the relations were declared in.
        for relations in children.values_mut() {
            relations.sort_by_key(|relation| relation.weight);
        }

        let story = Story {
            story_id: record.story_id,
            title: record.title,
            summary: record.summary,
            call_to_action: record.call_to_action,
            allow_connected: record.allow_connected,
            structure_type: record.structure_type,
            connected: record.connected,
            sections: record.sections,
            relations: record.relations,
            index,
            children,
        };

        Ok(story)
    }
}

impl From<Story> for StoryRecord {
    fn from(story: Story) -> Self {
        StoryRecord {
            story_id: story.story_id,
            title: story.title,
            summary: story.summary,
            call_to_action: story.call_to_action,
            allow_connected: story.allow_connected,
            structure_type: story.structure_type,
            sections: story.sections,
            relations: story.relations,
            connected: story.connected,
        }
    }
}

impl FromStr for Story {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        toml::from_str(source).with_context(|| "Attempted to parse invalid story")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ids<'a>(sections: impl IntoIterator<Item = &'a Section>) -> Vec<&'a str> {
        sections
            .into_iter()
            .map(|section| section.section_id.as_str())
            .collect()
    }

    #[test]
    fn parses_story_from_toml() {
        let input = r#"
story-id = "flood"
title = "After the Flood"
summary = "What happened next."
allow-connected = true
structure-type = "spider"

[[sections]]
section-id = "a"
title = "A"
root = true

[[sections]]
section-id = "b"
title = "B"

[[relations]]
parent = "a"
child = "b"

[[connected]]
story-id = "response"
status = "published"
"#;
        let story: Story = input.parse().expect("story failed to parse");

        assert_eq!("flood", story.story_id);
        assert_eq!(Some("spider"), story.structure_type.as_deref());
        assert!(story.has_summary());
        assert!(!story.has_call_to_action());
        assert_eq!(vec!["a"], ids(story.root_sections()));
        assert_eq!(vec!["b"], ids(story.children("a")));
        assert_eq!(1, story.connected_stories(true).len());
        assert_eq!(Some("B"), story.section("b").map(|section| section.title.as_str()));
        assert!(story.section("c").is_none());
    }

    #[test]
    fn roots_are_ordered_by_weight() {
        let story = Story::try_from(StoryRecord {
            sections: vec![
                Section::new("late", "", 5, true),
                Section::new("not-a-root", "", 0, false),
                Section::new("early", "", -1, true),
                Section::new("middle", "", 2, true),
            ],
            ..Default::default()
        })
        .expect("story is valid");

        assert_eq!(vec!["early", "middle", "late"], ids(story.root_sections()));
    }

    #[test]
    fn children_are_ordered_by_relation_weight() {
        let story = Story::try_from(StoryRecord {
            sections: vec![
                Section::new("a", "", 0, true),
                Section::new("b", "", 0, false),
                Section::new("c", "", 0, false),
                Section::new("d", "", 0, false),
            ],
            relations: vec![
                SectionRelation::new("a", "d", 2),
                SectionRelation::new("a", "b", 0),
                SectionRelation::new("a", "c", 1),
            ],
            ..Default::default()
        })
        .expect("story is valid");

        assert_eq!(vec!["b", "c", "d"], ids(story.children("a")));
        assert!(story.children("missing").is_empty());
    }

    #[test]
    fn rejects_duplicate_section_ids() {
        let result = Story::try_from(StoryRecord {
            sections: vec![Section::new("a", "", 0, true), Section::new("a", "", 1, true)],
            ..Default::default()
        });

        assert_eq!(
            Some(StructureError::DuplicateSection {
                section_id: String::from("a")
            }),
            result.err()
        );
    }

    #[test]
    fn rejects_relations_to_unknown_sections() {
        let result = Story::try_from(StoryRecord {
            sections: vec![Section::new("a", "", 0, true)],
            relations: vec![SectionRelation::new("a", "ghost", 0)],
            ..Default::default()
        });

        assert_eq!(
            Some(StructureError::UnknownSection {
                parent: String::from("a"),
                child: String::from("ghost"),
                missing: String::from("ghost"),
            }),
            result.err()
        );
    }

    #[test]
    fn connected_stories_filter_drafts() {
        let story = Story::try_from(StoryRecord {
            connected: vec![
                ConnectedStory {
                    story_id: String::from("draft"),
                    ..Default::default()
                },
                ConnectedStory {
                    story_id: String::from("live"),
                    status: PublicationStatus::Published,
                    ..Default::default()
                },
            ],
            ..Default::default()
        })
        .expect("story is valid");

        let published: Vec<&str> = story
            .connected_stories(true)
            .into_iter()
            .map(|story| story.story_id.as_str())
            .collect();

        assert_eq!(vec!["live"], published);
        assert_eq!(2, story.connected_stories(false).len());
    }

    #[test]
    fn blank_summary_does_not_count() {
        let story = Story::try_from(StoryRecord {
            summary: String::from("  \n"),
            ..Default::default()
        })
        .expect("story is valid");

        assert!(!story.has_summary());
    }
}
