//! Model references: the named, loadable entries listed in the catalog.

use crate::node::Renderable;

/// Where a model's geometry comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    /// Fetched and decoded on first request
    Locator(String),
    /// Already materialized; never goes through a loader
    Prebuilt(Renderable),
}

/// One loadable model: a display name, its source and the type tag used to
/// pick a loader.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReference {
    name: String,
    source: ModelSource,
    kind: Option<String>,
}

/// Split a locator into its display name and lowercased extension.
///
/// The name is everything after the last `/` and before the last `.`; without
/// a dot in the final path segment the whole segment is the name and there is
/// no type.
pub fn derive(locator: &str) -> (String, Option<String>) {
    let tail = locator.rsplit('/').next().unwrap_or(locator);
    match tail.rsplit_once('.') {
        Some((name, kind)) => (name.to_string(), Some(kind.to_lowercase())),
        None => (tail.to_string(), None),
    }
}

impl ModelReference {
    /// Reference from a bare locator; name and type are derived from it.
    pub fn from_locator(locator: impl Into<String>) -> Self {
        let locator = locator.into();
        let (name, kind) = derive(&locator);
        Self {
            name,
            source: ModelSource::Locator(locator),
            kind,
        }
    }

    /// Reference with an explicit display name; only the type is derived.
    pub fn named(name: impl Into<String>, locator: impl Into<String>) -> Self {
        let locator = locator.into();
        let (_, kind) = derive(&locator);
        Self {
            name: name.into(),
            source: ModelSource::Locator(locator),
            kind,
        }
    }

    /// Reference wrapping an already-built renderable.
    pub fn prebuilt(name: impl Into<String>, renderable: Renderable) -> Self {
        Self {
            name: name.into(),
            source: ModelSource::Prebuilt(renderable),
            kind: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &ModelSource {
        &self.source
    }

    pub fn locator(&self) -> Option<&str> {
        match &self.source {
            ModelSource::Locator(locator) => Some(locator),
            ModelSource::Prebuilt(_) => None,
        }
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn is_prebuilt(&self) -> bool {
        matches!(self.source, ModelSource::Prebuilt(_))
    }
}
