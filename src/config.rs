use anyhow::Context;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    str::FromStr,
};
use toml::{value::Table, Value};

use crate::{
    error::{Error, Result},
    structure::{TocOptions, DEFAULT_STRUCTURE_TYPE},
};

/// Name of the configuration file looked up next to the stories.
pub const CONFIG_FILE_NAME: &str = "storybase.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Configuration for resolving story structure types.
    pub structure: StructureConfig,

    /// Element names and attributes for rendered tables of contents.
    pub toc: TocOptions,

    /// Any remaining configuration tables.
    rest: Value,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let mut buffer = String::new();
        File::open(path)
            .with_context(|| "Failed to open config file")?
            .read_to_string(&mut buffer)
            .with_context(|| "Failed to read config file")?;

        Config::from_str(&buffer)
    }

    /// Load `storybase.toml` from the given directory, falling back to the defaults when
    /// there is no such file.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Config> {
        let location: PathBuf = dir.as_ref().join(CONFIG_FILE_NAME);

        if location.exists() {
            Config::load(location)
        } else {
            Ok(Config::default())
        }
    }

    /// Deserialize one of the remaining configuration tables, if present.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.rest
            .get(key)
            .map(|value| {
                value
                    .clone()
                    .try_into()
                    .with_context(|| format!("Failed to deserialize config table {key}"))
            })
            .transpose()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            structure: StructureConfig::default(),
            toc: TocOptions::default(),
            rest: Value::Table(Table::default()),
        }
    }
}

impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let raw = Value::deserialize(deserializer)?;
        let Value::Table(mut table) = raw else {
            return Err(D::Error::custom("storybase.toml must always be a toml table"));
        };

        let structure: StructureConfig = table
            .remove("structure")
            .map(|structure| structure.try_into().map_err(D::Error::custom))
            .transpose()?
            .unwrap_or_default();

        let toc: TocOptions = table
            .remove("toc")
            .map(|toc| toc.try_into().map_err(D::Error::custom))
            .transpose()?
            .unwrap_or_default();

        let config = Config {
            structure,
            toc,
            rest: Value::Table(table),
        };

        Ok(config)
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        toml::from_str(source).with_context(|| "Attempted to parse invalid configuration file")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct StructureConfig {
    /// Structure type applied to stories that do not name one.
    pub default_type: String,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            default_type: String::from(DEFAULT_STRUCTURE_TYPE),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = "".parse().expect("config failed to parse");

        assert_eq!(Config::default(), config);
        assert_eq!("linear", config.structure.default_type);
        assert_eq!("ul", config.toc.container_el);
    }

    #[test]
    fn parses_structure_and_toc_tables() {
        let input = r#"
[structure]
default-type = "spider"

[toc]
container_el = "ol"
item_el = "li"

[toc.container_attrs]
class = "toc"
"#;
        let config: Config = input.parse().expect("config failed to parse");

        assert_eq!("spider", config.structure.default_type);
        assert_eq!("ol", config.toc.container_el);
        assert_eq!(
            BTreeMap::from([(String::from("class"), String::from("toc"))]),
            config.toc.container_attrs
        );
        assert!(config.toc.item_attrs.is_empty());
    }

    #[test]
    fn keeps_unknown_tables() {
        #[derive(Debug, Deserialize, PartialEq, Eq)]
        #[serde(rename_all = "kebab-case")]
        struct Viewer {
            theme: String,
        }

        let input = r#"
[viewer]
theme = "dark"
"#;
        let config: Config = input.parse().expect("config failed to parse");

        assert_eq!(
            Some(Viewer {
                theme: String::from("dark")
            }),
            config.get::<Viewer>("viewer").expect("viewer table is valid")
        );
        assert_eq!(None, config.get::<Viewer>("missing").expect("missing is fine"));
    }

    #[test]
    fn rejects_non_table_sections() {
        let input = r#"structure = "spider""#;

        assert!(input.parse::<Config>().is_err());
    }
}
