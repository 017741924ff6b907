//! Name-ordered registry of the models a viewer can show.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::model::ModelReference;

/// Models as listed in a page or on the command line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ModelList {
    /// Bare locators; names are derived from them
    Locators(Vec<String>),
    /// Explicit `name -> locator` pairs
    Named(IndexMap<String, String>),
}

impl ModelList {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Insertion-ordered `name -> ModelReference` mapping.
///
/// Re-registering a name replaces the reference but keeps its listing slot.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    models: IndexMap<String, ModelReference>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, reference: ModelReference) {
        self.models.insert(reference.name().to_string(), reference);
    }

    pub fn register_many(&mut self, list: ModelList, base: &str) {
        match list {
            ModelList::Locators(locators) => {
                for locator in locators {
                    self.register(ModelReference::from_locator(format!("{base}{locator}")));
                }
            }
            ModelList::Named(entries) => {
                for (name, locator) in entries {
                    self.register(ModelReference::named(name, format!("{base}{locator}")));
                }
            }
        }
        log::info!("catalog now lists {} models", self.models.len());
    }

    pub fn get(&self, name: &str) -> Option<&ModelReference> {
        self.models.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn first_name(&self) -> Option<&str> {
        self.names().next()
    }

    /// Name listed after (or, going backwards, before) `name`, wrapping around.
    pub fn neighbour(&self, name: &str, forward: bool) -> Option<&str> {
        let len = self.models.len();
        let index = self.models.get_index_of(name)?;
        let next = if forward {
            (index + 1) % len
        } else {
            (index + len - 1) % len
        };
        self.models.get_index(next).map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_locators_derives_names() {
        let mut catalog = Catalog::new();
        catalog.register_many(
            ModelList::Locators(vec!["models/cube.wrl".into(), "models/sphere.stl".into()]),
            "",
        );
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["cube", "sphere"]);
        assert_eq!(catalog.get("cube").unwrap().kind(), Some("wrl"));
        assert_eq!(catalog.get("sphere").unwrap().kind(), Some("stl"));
    }

    #[test]
    fn test_register_named_map_registers_every_entry() {
        let mut catalog = Catalog::new();
        let list = ModelList::from_json(r#"{"Bust": "bust.stl", "Head": "scan/head.wrl"}"#).unwrap();
        catalog.register_many(list, "https://example.org/");
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["Bust", "Head"]);
        assert_eq!(
            catalog.get("Head").unwrap().locator(),
            Some("https://example.org/scan/head.wrl")
        );
    }

    #[test]
    fn test_duplicate_name_overwrites_in_place() {
        let mut catalog = Catalog::new();
        catalog.register_many(
            ModelList::Locators(vec!["a/cube.stl".into(), "sphere.stl".into(), "b/cube.wrl".into()]),
            "",
        );
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["cube", "sphere"]);
        assert_eq!(catalog.get("cube").unwrap().locator(), Some("b/cube.wrl"));
    }

    #[test]
    fn test_base_path_prepended() {
        let mut catalog = Catalog::new();
        catalog.register_many(ModelList::Locators(vec!["cube.stl".into()]), "assets/");
        assert_eq!(catalog.get("cube").unwrap().locator(), Some("assets/cube.stl"));
    }

    #[test]
    fn test_model_list_json_array() {
        let list = ModelList::from_json(r#"["x.stl", "y.wrl"]"#).unwrap();
        assert_eq!(list, ModelList::Locators(vec!["x.stl".into(), "y.wrl".into()]));
    }

    #[test]
    fn test_neighbour_wraps() {
        let mut catalog = Catalog::new();
        catalog.register_many(ModelList::Locators(vec!["a.stl".into(), "b.stl".into()]), "");
        assert_eq!(catalog.neighbour("b", true), Some("a"));
        assert_eq!(catalog.neighbour("a", false), Some("b"));
        assert_eq!(catalog.neighbour("zzz", true), None);
    }
}
