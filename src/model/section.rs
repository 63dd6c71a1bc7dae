use serde::{Deserialize, Serialize};

/// A `Section` is a single node in the navigational structure of a story. Sections only
/// know their own identity; how they hang together is recorded by `SectionRelation`s.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Section {
    /// Stable identifier, unique within the owning story.
    pub section_id: String,
    /// The title of the section, which may be left blank.
    #[serde(default)]
    pub title: String,
    /// Ordering weight among the root sections of a story.
    #[serde(default)]
    pub weight: i32,
    /// Marks a top-level section where traversal starts.
    #[serde(default)]
    pub root: bool,
}

impl Section {
    pub fn new(section_id: impl Into<String>, title: impl Into<String>, weight: i32, root: bool) -> Self {
        Self {
            section_id: section_id.into(),
            title: title.into(),
            weight,
            root,
        }
    }

    /// Minimal record of this section for client consumption. Navigation links are left
    /// empty; they are only known once the section has been placed in a structure.
    pub fn to_simple(&self, children: Vec<String>) -> SimpleSection {
        SimpleSection {
            section_id: self.section_id.clone(),
            title: self.title.clone(),
            children,
            previous_section_id: None,
            next_section_id: None,
        }
    }
}

/// A weighted parent to child edge between two sections of the same story.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct SectionRelation {
    pub parent: String,
    pub child: String,
    #[serde(default)]
    pub weight: i32,
}

impl SectionRelation {
    pub fn new(parent: impl Into<String>, child: impl Into<String>, weight: i32) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
            weight,
        }
    }
}

/// Serializable view of a section as handed to clients, including the ids of its
/// neighbours in the flattened reading order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimpleSection {
    pub section_id: String,
    pub title: String,
    pub children: Vec<String>,
    pub previous_section_id: Option<String>,
    pub next_section_id: Option<String>,
}

impl SimpleSection {
    /// A section that does not exist in the story graph, such as the summary.
    pub fn synthetic(section_id: &str, title: &str) -> Self {
        Self {
            section_id: section_id.to_owned(),
            title: title.to_owned(),
            children: Vec::new(),
            previous_section_id: None,
            next_section_id: None,
        }
    }
}
