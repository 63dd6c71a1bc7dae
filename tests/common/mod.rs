use std::path::PathBuf;
use storybase::{
    model::Story,
    structure::{SectionsOptions, Structure},
};

pub fn test_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
}

pub fn load_story(name: &str) -> Story {
    let path = test_dir().join("stories").join(name);

    Story::load(&path).unwrap_or_else(|err| panic!("failed to load {}: {err:?}", path.display()))
}

#[allow(dead_code)] // Avoid a false positive on the dead code analysis.
pub fn flat_ids(structure: &Structure<'_>) -> Vec<String> {
    structure
        .sections_flat()
        .iter()
        .map(|section| section.section_id.clone())
        .collect()
}

/// `(section, previous, next)` ids for every section of the structure in reading order.
#[allow(dead_code)] // Avoid a false positive on the dead code analysis.
pub fn links(structure: &Structure<'_>) -> Vec<(String, Option<String>, Option<String>)> {
    structure
        .sections_flat()
        .iter()
        .map(|section| {
            let id = |section: Option<&storybase::model::Section>| {
                section.map(|section| section.section_id.clone())
            };

            (
                section.section_id.clone(),
                id(structure
                    .previous_section(&section.section_id)
                    .expect("section is part of the structure")),
                id(structure
                    .next_section(&section.section_id)
                    .expect("section is part of the structure")),
            )
        })
        .collect()
}

#[allow(dead_code)] // Avoid a false positive on the dead code analysis.
pub fn default_sections_json(structure: &Structure<'_>) -> serde_json::Value {
    serde_json::to_value(structure.sections_json(SectionsOptions::default(), None))
        .expect("sections serialize to JSON")
}
