//! Loader capability: fetch bytes for a locator, decode them, and report the
//! outcome back to the lifecycle over a channel.

use std::collections::HashMap;
use std::rc::Rc;

use crossbeam_channel::Sender;

use crate::error::FetchError;
use crate::format::GeometryFormat;
use crate::node::LoadedGeometry;

/// Outcome of one load, tagged with the request generation that started it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    pub generation: u64,
    pub name: String,
    pub outcome: Result<LoadedGeometry, String>,
}

/// Single-use handle a loader reports through.
///
/// Both methods consume the handle, so each request completes at most once.
#[derive(Debug)]
pub struct Completion {
    generation: u64,
    name: String,
    results: Sender<LoadResult>,
}

impl Completion {
    pub(crate) fn new(generation: u64, name: String, results: Sender<LoadResult>) -> Self {
        Self {
            generation,
            name,
            results,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn complete(self, geometry: LoadedGeometry) {
        self.send(Ok(geometry));
    }

    pub fn fail(self, reason: impl ToString) {
        self.send(Err(reason.to_string()));
    }

    fn send(self, outcome: Result<LoadedGeometry, String>) {
        let result = LoadResult {
            generation: self.generation,
            name: self.name,
            outcome,
        };
        // The receiver only disappears when the viewer is torn down
        if self.results.send(result).is_err() {
            log::debug!("load finished after the viewer was dropped");
        }
    }
}

/// Starts loading a locator and reports through the completion exactly once.
pub trait Loader {
    fn load(&self, locator: &str, completion: Completion);
}

/// Retrieves the raw bytes behind a locator (filesystem, HTTP, memory).
pub trait ByteSource {
    fn fetch(&self, locator: &str, on_done: Box<dyn FnOnce(Result<Vec<u8>, FetchError>)>);
}

/// A [`Loader`] that fetches with a [`ByteSource`] and decodes one format.
pub struct FormatLoader<S> {
    source: Rc<S>,
    format: GeometryFormat,
}

impl<S: ByteSource> FormatLoader<S> {
    pub fn new(source: Rc<S>, format: GeometryFormat) -> Self {
        Self { source, format }
    }
}

impl<S: ByteSource> Loader for FormatLoader<S> {
    fn load(&self, locator: &str, completion: Completion) {
        let format = self.format;
        log::debug!("fetching {locator} as {format:?}");
        self.source.fetch(
            locator,
            Box::new(move |fetched| match fetched {
                Ok(bytes) => match format.decode(&bytes) {
                    Ok(geometry) => completion.complete(geometry),
                    Err(e) => completion.fail(e),
                },
                Err(e) => completion.fail(e),
            }),
        );
    }
}

/// Type tag to loader mapping, injected into the lifecycle.
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: HashMap<String, Box<dyn Loader>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `stl` and `wrl` loaders sharing one byte source
    pub fn standard<S: ByteSource + 'static>(source: Rc<S>) -> Self {
        let mut registry = Self::new();
        for format in [GeometryFormat::Stl, GeometryFormat::Vrml] {
            registry.register(format.kind(), FormatLoader::new(Rc::clone(&source), format));
        }
        registry
    }

    pub fn register(&mut self, kind: impl Into<String>, loader: impl Loader + 'static) {
        self.loaders.insert(kind.into().to_lowercase(), Box::new(loader));
    }

    pub fn get(&self, kind: &str) -> Option<&dyn Loader> {
        self.loaders.get(kind).map(|loader| loader.as_ref())
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.loaders.keys().map(String::as_str)
    }
}

/// Serves locators from an in-memory table; handy for tests and embedded assets.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locator: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(locator.into(), bytes.into());
    }
}

impl ByteSource for MemorySource {
    fn fetch(&self, locator: &str, on_done: Box<dyn FnOnce(Result<Vec<u8>, FetchError>)>) {
        let fetched = self
            .files
            .get(locator)
            .cloned()
            .ok_or_else(|| FetchError::new(locator, "not found"));
        on_done(fetched);
    }
}
