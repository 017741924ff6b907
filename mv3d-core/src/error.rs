use thiserror::Error;

/// Non-fatal failures reported by the model lifecycle.
///
/// None of these abort the viewer: the lifecycle is left in its last stable
/// state and the controller logs the error before handing it back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewerError {
    #[error("no model named `{name}` in the catalog")]
    UnknownModel { name: String },
    #[error("no loader registered for type {kind:?} (model `{name}`)")]
    NoLoaderForType { name: String, kind: Option<String> },
    #[error("model `{name}` has a zero-size bounding box")]
    DegenerateGeometry { name: String },
    #[error("failed to load model `{name}`: {reason}")]
    LoadFailed { name: String, reason: String },
}

/// Failure to retrieve the bytes behind a locator
#[derive(Error, Debug, Clone, PartialEq)]
#[error("failed to fetch {locator}: {reason}")]
pub struct FetchError {
    pub locator: String,
    pub reason: String,
}

impl FetchError {
    pub fn new(locator: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failure to turn fetched bytes into geometry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error(transparent)]
    Stl(#[from] crate::stl::StlError),
    #[error(transparent)]
    Vrml(#[from] crate::vrml::VrmlError),
}
