use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::{GameConfigEntry, INHERIT_PROPERTY};

/// Top-level titles in document order, duplicates included
struct TitleList(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for TitleList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TitleVisitor;

        impl<'de> Visitor<'de> for TitleVisitor {
            type Value = TitleList;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of game titles")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<TitleList, A::Error> {
                let mut titles = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(title) = map.next_entry::<String, serde_json::Value>()? {
                    titles.push(title);
                }
                Ok(TitleList(titles))
            }
        }

        deserializer.deserialize_map(TitleVisitor)
    }
}

/// Every title of a loaded configuration document, in document order
#[derive(Debug, Clone, Default)]
pub struct GameConfigStore {
    configs: Vec<GameConfigEntry>,
}

impl GameConfigStore {
    /// Load the configuration document at `path`
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).map_err(|source| Error::CouldNotFindConfig {
            path: path.to_path_buf(),
            source,
        })?;

        let store = Self::from_json_str(&content)?;
        info!(
            "Loaded {} game configs from {}",
            store.configs.len(),
            path.display()
        );
        Ok(store)
    }

    /// Parse a configuration document.
    ///
    /// A title that appears more than once is kept every time; lookups find
    /// the first one. Titles whose value is not an object are skipped.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let titles = match serde_json::from_str::<TitleList>(content) {
            Ok(TitleList(titles)) => titles,
            Err(e) if e.is_data() => return Err(Error::InvalidConfig(e.to_string())),
            Err(e) => return Err(e.into()),
        };

        let mut configs: Vec<GameConfigEntry> = Vec::with_capacity(titles.len());

        for (title, value) in titles {
            let Value::Object(properties) = value else {
                warn!("Config for {} is not an object, skipping", title);
                continue;
            };

            if configs.iter().any(|c| c.title == title) {
                warn!("Duplicate config for {}, the first one is used", title);
            }

            debug!("Config {}: {} properties", title, properties.len());
            configs.push(GameConfigEntry {
                title,
                properties: properties.into_iter().collect(),
            });
        }

        Ok(Self { configs })
    }

    pub fn configs(&self) -> &[GameConfigEntry] {
        &self.configs
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.configs.iter().map(|c| c.title.as_str())
    }

    pub fn find(&self, title: &str) -> Option<&GameConfigEntry> {
        self.configs.iter().find(|c| c.title == title)
    }

    fn position(&self, title: &str) -> Option<usize> {
        self.configs.iter().position(|c| c.title == title)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Resolve the `Inherit` chain of `title` in place and return the merged entry.
    ///
    /// Each step removes the `Inherit` property and appends the parent's
    /// properties that the entry does not define yet, in the parent's order.
    /// The parent's own `Inherit` comes along, so chains resolve transitively.
    /// An `Inherit` value that is not a string stops resolution and stays in
    /// the entry. Reaching the same title twice fails with `CircularInherit`.
    pub fn resolve_inherit(&mut self, title: &str) -> Result<&GameConfigEntry> {
        let index = self
            .position(title)
            .ok_or_else(|| Error::CouldNotFindGame(title.to_string()))?;

        let mut visited = vec![title.to_string()];

        loop {
            let target = &self.configs[index];
            let Some(inherit_pos) = target
                .properties
                .iter()
                .position(|(name, _)| name == INHERIT_PROPERTY)
            else {
                break;
            };

            let Some(parent) = target.properties[inherit_pos].1.as_str() else {
                warn!("{} inherit field not a string", title);
                break;
            };
            let parent = parent.to_string();

            if visited.contains(&parent) {
                warn!("{} inherit chain reaches {} twice", title, parent);
                return Err(Error::CircularInherit {
                    title: title.to_string(),
                    target: parent,
                });
            }

            let Some(parent_index) = self.position(&parent) else {
                warn!("{} inherit target {} not found", title, parent);
                return Err(Error::InheritTargetWrong {
                    title: title.to_string(),
                    target: parent,
                });
            };

            let inherited = self.configs[parent_index].properties.clone();
            let target = &mut self.configs[index];
            target.properties.remove(inherit_pos);

            let mut added = 0usize;
            for (name, value) in inherited {
                if !target.contains(&name) {
                    target.properties.push((name, value));
                    added += 1;
                }
            }

            debug!("{} inherited {} properties from {}", title, added, parent);
            visited.push(parent);
        }

        Ok(&self.configs[index])
    }
}
