use super::{render_toc, table_of_contents, Layout, Structure, TocFormat, TocLayout, TocOptions};
use crate::{
    config::StructureConfig,
    error::{Result, StructureError},
    model::{toc::TableOfContents, Story},
};

/// Structure type used when a story does not name one.
pub const DEFAULT_STRUCTURE_TYPE: &str = "linear";

/// A named way of presenting a story's sections.
pub struct StructureType {
    id: String,
    name: String,
    layout: Box<dyn TocLayout>,
}

impl StructureType {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human readable name, as shown when picking a structure type.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &dyn TocLayout {
        self.layout.as_ref()
    }

    pub fn table_of_contents(&self, structure: &Structure<'_>) -> TableOfContents {
        table_of_contents(structure, self.layout())
    }

    pub fn render_toc(
        &self,
        structure: &Structure<'_>,
        options: &TocOptions,
        format: TocFormat,
    ) -> Result<String> {
        render_toc(structure, self.layout(), options, format)
    }
}

/// Maps structure type ids to their layouts. Built once and handed to whatever needs to
/// resolve the structure type of a story.
pub struct StructureRegistry {
    types: Vec<StructureType>,
    default_type: String,
}

impl StructureRegistry {
    /// A registry without any structure types.
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            default_type: String::from(DEFAULT_STRUCTURE_TYPE),
        }
    }

    /// A registry holding the built-in linear and spider structure types.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.types.push(StructureType {
            id: String::from("linear"),
            name: String::from("Linear"),
            layout: Box::new(Layout::Linear),
        });
        registry.types.push(StructureType {
            id: String::from("spider"),
            name: String::from("Spider"),
            layout: Box::new(Layout::Spider),
        });

        registry
    }

    /// The built-in structure types with the default type taken from configuration.
    pub fn from_config(config: &StructureConfig) -> Result<Self, StructureError> {
        let mut registry = Self::with_defaults();
        registry.set_default_type(&config.default_type)?;

        Ok(registry)
    }

    pub fn register(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        layout: impl TocLayout + 'static,
    ) -> Result<&mut Self, StructureError> {
        let id = id.into();

        if self.types.iter().any(|structure_type| structure_type.id == id) {
            return Err(StructureError::DuplicateStructureType(id));
        }

        self.types.push(StructureType {
            id,
            name: name.into(),
            layout: Box::new(layout),
        });

        Ok(self)
    }

    pub fn get(&self, id: &str) -> Result<&StructureType, StructureError> {
        self.types
            .iter()
            .find(|structure_type| structure_type.id == id)
            .ok_or_else(|| StructureError::UnknownStructureType(id.to_owned()))
    }

    /// `(id, name)` pairs of every registered structure type, in registration order.
    pub fn types(&self) -> Vec<(&str, &str)> {
        self.types
            .iter()
            .map(|structure_type| (structure_type.id(), structure_type.name()))
            .collect()
    }

    pub fn default_type(&self) -> &str {
        &self.default_type
    }

    pub fn set_default_type(&mut self, id: &str) -> Result<(), StructureError> {
        self.get(id)?;
        self.default_type = id.to_owned();

        Ok(())
    }

    /// The structure type a story asks for, or the default one if it leaves it blank.
    pub fn resolve(&self, story: &Story) -> Result<&StructureType, StructureError> {
        let id = story
            .structure_type
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(self.default_type.as_str());

        self.get(id)
    }
}

impl Default for StructureRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
