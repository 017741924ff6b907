//! Viewer controller: wires selection events to the model lifecycle and
//! decides when the render loop needs to redraw.

use crate::catalog::{Catalog, ModelList};
use crate::error::ViewerError;
use crate::fragment::{self, Navigation};
use crate::lifecycle::{LifecycleState, ModelChanged, ModelLifecycle};
use crate::loader::LoaderRegistry;
use crate::material::{Material, MaterialPalette};
use crate::model::ModelReference;
use crate::scene::SceneGraph;
use crate::settings::{ControlScheme, ViewerSettings};

/// Canvas size used when not in fullsize mode
pub const DEFAULT_CANVAS: (u32, u32) = (640, 480);

pub struct Viewer<S, N> {
    catalog: Catalog,
    palette: MaterialPalette,
    lifecycle: ModelLifecycle,
    scene: S,
    navigation: N,
    settings: ViewerSettings,
    viewport: (u32, u32),
    dirty: bool,
    last_error: Option<ViewerError>,
}

impl<S: SceneGraph, N: Navigation> Viewer<S, N> {
    pub fn new(loaders: LoaderRegistry, scene: S, navigation: N) -> Self {
        Self {
            catalog: Catalog::new(),
            palette: MaterialPalette::new(),
            lifecycle: ModelLifecycle::new(loaders),
            scene,
            navigation,
            settings: ViewerSettings::default(),
            viewport: DEFAULT_CANVAS,
            dirty: true,
            last_error: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn palette(&self) -> &MaterialPalette {
        &self.palette
    }

    pub fn lifecycle(&self) -> &ModelLifecycle {
        &self.lifecycle
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn navigation(&self) -> &N {
        &self.navigation
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Most recent lifecycle error, cleared by the next successful attach
    pub fn last_error(&self) -> Option<&ViewerError> {
        self.last_error.as_ref()
    }

    fn report(&mut self, error: ViewerError) {
        log::warn!("{error}");
        self.last_error = Some(error);
        self.dirty = true;
    }

    pub fn add_models(&mut self, list: ModelList, base: &str) {
        let names: Vec<String> = match &list {
            ModelList::Locators(locators) => locators
                .iter()
                .map(|l| crate::model::derive(&format!("{base}{l}")).0)
                .collect(),
            ModelList::Named(entries) => entries.keys().cloned().collect(),
        };
        // A re-registered name may point somewhere new
        for name in &names {
            self.lifecycle.forget(name);
        }
        self.catalog.register_many(list, base);
    }

    /// Register a single reference, e.g. a prebuilt placeholder.
    pub fn add_reference(&mut self, reference: ModelReference) {
        self.lifecycle.forget(reference.name());
        self.catalog.register(reference);
    }

    /// Merge a palette; the first material becomes active if none is.
    pub fn add_materials(&mut self, palette: MaterialPalette) {
        self.palette.extend(palette);
        if self.settings.material.is_empty() {
            if let Some(first) = self.palette.first_name() {
                self.settings.material = first.to_string();
            }
        }
    }

    fn active_material(&self) -> Option<Material> {
        self.palette.get(&self.settings.material).copied()
    }

    /// Pick the initial model: the address fragment if present, else the
    /// first catalog entry.
    pub fn start(&mut self) -> Result<(), ViewerError> {
        let initial = self
            .navigation
            .fragment()
            .and_then(|hash| fragment::decode(&hash))
            .or_else(|| self.catalog.first_name().map(str::to_string));
        match initial {
            Some(name) => self.set_model(&name),
            None => {
                log::warn!("no models registered");
                Ok(())
            }
        }
    }

    pub fn set_model(&mut self, name: &str) -> Result<(), ViewerError> {
        let material = self.active_material();
        let result = self
            .lifecycle
            .request(&self.catalog, name, &mut self.scene, material.as_ref());
        match result {
            Ok(Some(changed)) => {
                self.model_changed(changed);
                Ok(())
            }
            Ok(None) => {
                // Front ends show the pending load
                self.dirty = true;
                Ok(())
            }
            Err(e) => {
                self.report(e.clone());
                Err(e)
            }
        }
    }

    /// Cycle to the next or previous catalog entry.
    pub fn step_model(&mut self, forward: bool) -> Result<(), ViewerError> {
        let anchor = self
            .lifecycle
            .current()
            .map(|reference| reference.name().to_string())
            .or_else(|| self.catalog.first_name().map(str::to_string));
        let Some(next) = anchor.and_then(|name| self.catalog.neighbour(&name, forward)) else {
            return Ok(());
        };
        let next = next.to_string();
        self.set_model(&next)
    }

    /// Switch material by palette name. Unknown names are ignored.
    pub fn update_material(&mut self, name: &str) -> bool {
        let Some(material) = self.palette.get(name).copied() else {
            log::warn!("unknown material {name:?}");
            return false;
        };
        self.settings.material = name.to_string();
        self.lifecycle.apply_material(&mut self.scene, &material);
        self.dirty = true;
        true
    }

    pub fn step_material(&mut self) -> bool {
        let names: Vec<&str> = self.palette.names().collect();
        if names.is_empty() {
            return false;
        }
        let index = names
            .iter()
            .position(|n| *n == self.settings.material)
            .map_or(0, |i| (i + 1) % names.len());
        let next = names[index].to_string();
        self.update_material(&next)
    }

    pub fn set_controls(&mut self, controls: ControlScheme) {
        self.settings.set_controls(controls);
        self.dirty = true;
    }

    pub fn set_damping(&mut self, damping: f32) {
        self.settings.set_damping(damping);
    }

    pub fn set_fullsize(&mut self, fullsize: bool, window: (u32, u32)) {
        self.settings.fullsize = fullsize;
        self.resize(window.0, window.1);
    }

    /// Fit the canvas to the window, capped at the default size unless fullsize.
    pub fn resize(&mut self, window_width: u32, window_height: u32) {
        self.viewport = if self.settings.fullsize {
            (window_width, window_height)
        } else {
            (
                DEFAULT_CANVAS.0.min(window_width),
                DEFAULT_CANVAS.1.min(window_height),
            )
        };
        self.dirty = true;
    }

    /// Mark the view as needing a redraw (camera moved, etc.)
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// One render-loop tick: apply finished loads, then report whether a
    /// redraw is due. Errors are logged and swallowed here.
    pub fn frame(&mut self) -> bool {
        let material = self.active_material();
        for event in self.lifecycle.pump(&mut self.scene, material.as_ref()) {
            match event {
                Ok(changed) => self.model_changed(changed),
                Err(e) => self.report(e),
            }
        }
        let redraw = self.scene.take_redraw();
        std::mem::take(&mut self.dirty) || redraw
    }

    fn model_changed(&mut self, changed: ModelChanged) {
        self.navigation.publish(&fragment::encode(&changed.name));
        self.settings.model = changed.name;
        self.last_error = None;
        self.dirty = true;
    }

    /// Release the attached model and the cache.
    pub fn teardown(&mut self) {
        self.lifecycle.clear(&mut self.scene);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::MemoryNavigation;
    use crate::scene::ObjectContainer;

    fn viewer() -> Viewer<ObjectContainer, MemoryNavigation> {
        Viewer::new(
            LoaderRegistry::new(),
            ObjectContainer::new(),
            MemoryNavigation::default(),
        )
    }

    #[test]
    fn test_first_material_selected() {
        let mut viewer = viewer();
        viewer.add_materials(MaterialPalette::builtin());
        assert_eq!(viewer.settings().material, "Gold");
        assert!(viewer.update_material("Clay"));
        assert!(!viewer.update_material("Unobtainium"));
        assert_eq!(viewer.settings().material, "Clay");
        assert!(viewer.step_material());
        assert_eq!(viewer.settings().material, "Gold");
    }

    #[test]
    fn test_resize_caps_canvas() {
        let mut viewer = viewer();
        viewer.resize(1920, 300);
        assert_eq!(viewer.viewport(), (640, 300));
        viewer.set_fullsize(true, (1920, 1080));
        assert_eq!(viewer.viewport(), (1920, 1080));
    }

    #[test]
    fn test_frame_clears_dirty() {
        let mut viewer = viewer();
        assert!(viewer.frame());
        assert!(!viewer.frame());
        viewer.set_controls(ControlScheme::Object);
        assert!(viewer.frame());
    }

    #[test]
    fn test_frame_consumes_scene_redraw() {
        let mut viewer = viewer();
        viewer.frame();
        viewer.scene.request_redraw();
        assert!(viewer.frame());
        assert!(!viewer.frame());
    }

    #[test]
    fn test_start_without_models() {
        let mut viewer = viewer();
        assert_eq!(viewer.start(), Ok(()));
        assert_eq!(viewer.state(), LifecycleState::Idle);
    }
}
