//! The single "current model" slot: which model is requested, loading,
//! ready or attached to the object container.
//!
//! Loads are asynchronous. Every `request` bumps a generation counter and
//! hands the loader a [`Completion`] tagged with it; results arrive over a
//! channel and are applied by [`ModelLifecycle::pump`]. Anything tagged with
//! an older generation is stale and dropped, which is also how an in-flight
//! load is cancelled.

use std::collections::HashMap;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::catalog::Catalog;
use crate::error::ViewerError;
use crate::loader::{Completion, LoadResult, LoaderRegistry};
use crate::material::Material;
use crate::model::{ModelReference, ModelSource};
use crate::node::{NodeId, Renderable};
use crate::normalize::{compute_fit_scale, normalize, CANONICAL_SIZE};
use crate::scene::SceneGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Requested,
    Loading,
    Ready,
    Attached,
}

/// Emitted once for every model that becomes the attached one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChanged {
    pub name: String,
}

#[derive(Debug)]
struct AttachedModel {
    reference: ModelReference,
    id: NodeId,
}

pub struct ModelLifecycle {
    loaders: LoaderRegistry,
    state: LifecycleState,
    current: Option<ModelReference>,
    attached: Option<AttachedModel>,
    generation: u64,
    /// Materialized renderables that are not currently attached
    cache: HashMap<String, Renderable>,
    results_tx: Sender<LoadResult>,
    results_rx: Receiver<LoadResult>,
}

impl ModelLifecycle {
    pub fn new(loaders: LoaderRegistry) -> Self {
        let (results_tx, results_rx) = unbounded();
        Self {
            loaders,
            state: LifecycleState::Idle,
            current: None,
            attached: None,
            generation: 0,
            cache: HashMap::new(),
            results_tx,
            results_rx,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn current(&self) -> Option<&ModelReference> {
        self.current.as_ref()
    }

    pub fn attached_name(&self) -> Option<&str> {
        self.attached.as_ref().map(|a| a.reference.name())
    }

    pub fn attached_id(&self) -> Option<NodeId> {
        self.attached.as_ref().map(|a| a.id)
    }

    /// Whether `reference` can be attached without loading. An attached
    /// model only counts while the catalog still maps its name to the same
    /// reference.
    fn is_materialized(&self, reference: &ModelReference) -> bool {
        self.cache.contains_key(reference.name())
            || self
                .attached
                .as_ref()
                .is_some_and(|attached| attached.reference == *reference)
    }

    /// Select a catalog entry.
    ///
    /// A materialized model is attached immediately and its notification
    /// returned; otherwise the matching loader is started and `Ok(None)`
    /// comes back while it runs.
    pub fn request<S: SceneGraph>(
        &mut self,
        catalog: &Catalog,
        name: &str,
        scene: &mut S,
        material: Option<&Material>,
    ) -> Result<Option<ModelChanged>, ViewerError> {
        let reference = catalog
            .get(name)
            .cloned()
            .ok_or_else(|| ViewerError::UnknownModel {
                name: name.to_string(),
            })?;

        // Supersedes whatever is in flight
        self.generation += 1;
        self.state = LifecycleState::Requested;
        self.current = Some(reference.clone());

        if let ModelSource::Prebuilt(renderable) = reference.source() {
            if !self.is_materialized(&reference) {
                self.cache.insert(name.to_string(), renderable.clone());
            }
        }

        if self.is_materialized(&reference) {
            log::debug!("{name} already materialized");
            self.state = LifecycleState::Ready;
            return Ok(self.attach(scene, material));
        }

        let loader = reference.kind().and_then(|kind| self.loaders.get(kind));
        let (Some(loader), Some(locator)) = (loader, reference.locator()) else {
            self.restore();
            return Err(ViewerError::NoLoaderForType {
                name: name.to_string(),
                kind: reference.kind().map(str::to_string),
            });
        };

        self.state = LifecycleState::Loading;
        log::info!("loading {name} from {locator}");
        let completion = Completion::new(self.generation, name.to_string(), self.results_tx.clone());
        loader.load(locator, completion);
        Ok(None)
    }

    /// Apply every load result delivered since the last call.
    pub fn pump<S: SceneGraph>(
        &mut self,
        scene: &mut S,
        material: Option<&Material>,
    ) -> Vec<Result<ModelChanged, ViewerError>> {
        let results: Vec<LoadResult> = self.results_rx.try_iter().collect();
        results
            .into_iter()
            .filter_map(|result| self.on_load_complete(result, scene, material).transpose())
            .collect()
    }

    /// Handle one finished load. Stale results are ignored.
    pub fn on_load_complete<S: SceneGraph>(
        &mut self,
        result: LoadResult,
        scene: &mut S,
        material: Option<&Material>,
    ) -> Result<Option<ModelChanged>, ViewerError> {
        let LoadResult {
            generation,
            name,
            outcome,
        } = result;
        if generation != self.generation || self.state != LifecycleState::Loading {
            log::debug!(
                "dropping stale load of {name} (generation {generation}, current {})",
                self.generation
            );
            return Ok(None);
        }

        let geometry = match outcome {
            Ok(geometry) => geometry,
            Err(reason) => {
                self.restore();
                return Err(ViewerError::LoadFailed { name, reason });
            }
        };

        let mut renderable = normalize(geometry, material.copied());
        if let Some(node) = renderable.as_mesh_mut() {
            match compute_fit_scale(node, CANONICAL_SIZE) {
                Ok(scale) => node.scale = scale,
                Err(_) => {
                    self.restore();
                    return Err(ViewerError::DegenerateGeometry { name });
                }
            }
        }

        self.cache.insert(name, renderable);
        self.state = LifecycleState::Ready;
        Ok(self.attach(scene, material))
    }

    /// Attach the ready model, detaching whatever was attached before.
    ///
    /// Returns `None` unless the slot is `Ready`.
    pub fn attach<S: SceneGraph>(
        &mut self,
        scene: &mut S,
        material: Option<&Material>,
    ) -> Option<ModelChanged> {
        if self.state != LifecycleState::Ready {
            return None;
        }
        let reference = self.current.clone()?;
        let name = reference.name().to_string();

        let reattached = self
            .attached
            .as_ref()
            .filter(|attached| attached.reference == reference)
            .map(|attached| attached.id);
        let id = match reattached {
            Some(id) => id,
            None => {
                let mut renderable = self.cache.remove(&name)?;
                if let Some(previous) = self.attached.take() {
                    let previous_name = previous.reference.name().to_string();
                    if previous_name == name {
                        // Re-registered under the same name: the old geometry is obsolete
                        scene.remove_child(previous.id);
                        scene.request_redraw();
                    } else {
                        self.detach(&previous_name, previous.id, scene);
                    }
                }
                if let Some(material) = material {
                    renderable.set_material(*material);
                }
                let id = renderable.id();
                scene.add_child(renderable);
                id
            }
        };

        if let (Some(material), Some(node)) = (material, scene.child_mut(id)) {
            node.set_material(*material);
        }
        scene.request_redraw();
        self.attached = Some(AttachedModel { reference, id });
        self.state = LifecycleState::Attached;
        log::info!("attached {name}");
        Some(ModelChanged { name })
    }

    /// Take a renderable out of the container and back into the cache.
    ///
    /// A no-op when the node is not a child of the container.
    fn detach<S: SceneGraph>(&mut self, name: &str, id: NodeId, scene: &mut S) -> bool {
        if !scene.contains(id) {
            return false;
        }
        match scene.remove_child(id) {
            Some(renderable) => {
                self.cache.insert(name.to_string(), renderable);
                scene.request_redraw();
                log::debug!("detached {name}");
                true
            }
            None => false,
        }
    }

    /// Detach the named model if it is the attached one. Idempotent.
    pub fn detach_model<S: SceneGraph>(&mut self, name: &str, scene: &mut S) -> bool {
        if self.attached_name() != Some(name) {
            return false;
        }
        let Some(attached) = self.attached.take() else {
            return false;
        };
        let detached = self.detach(name, attached.id, scene);
        if self.state == LifecycleState::Attached {
            self.state = LifecycleState::Idle;
            self.current = None;
        }
        detached
    }

    /// Re-apply a material to the attached model.
    pub fn apply_material<S: SceneGraph>(&mut self, scene: &mut S, material: &Material) -> bool {
        let Some(node) = self.attached_id().and_then(|id| scene.child_mut(id)) else {
            return false;
        };
        node.set_material(*material);
        scene.request_redraw();
        true
    }

    /// Drop a cached renderable so the next request reloads it.
    pub fn forget(&mut self, name: &str) {
        self.cache.remove(name);
    }

    /// Detach everything and release cached renderables.
    pub fn clear<S: SceneGraph>(&mut self, scene: &mut S) {
        if let Some(attached) = self.attached.take() {
            scene.remove_child(attached.id);
            scene.request_redraw();
        }
        self.cache.clear();
        self.generation += 1;
        self.current = None;
        self.state = LifecycleState::Idle;
    }

    /// Back to the last stable state after a failed request.
    fn restore(&mut self) {
        match &self.attached {
            Some(attached) => {
                self.current = Some(attached.reference.clone());
                self.state = LifecycleState::Attached;
            }
            None => {
                self.current = None;
                self.state = LifecycleState::Idle;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModelList;
    use crate::geometry::Mesh;
    use crate::loader::Loader;
    use crate::node::LoadedGeometry;
    use crate::scene::ObjectContainer;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Holds completions until the test delivers them.
    #[derive(Clone, Default)]
    struct Deferred(Rc<RefCell<Vec<Completion>>>);

    impl Loader for Deferred {
        fn load(&self, _locator: &str, completion: Completion) {
            self.0.borrow_mut().push(completion);
        }
    }

    impl Deferred {
        fn take(&self, name: &str) -> Completion {
            let mut pending = self.0.borrow_mut();
            let index = pending.iter().position(|c| c.name() == name).unwrap();
            pending.remove(index)
        }
    }

    fn setup() -> (Catalog, ModelLifecycle, Deferred, ObjectContainer) {
        let mut catalog = Catalog::new();
        catalog.register_many(
            ModelList::Locators(vec!["a.stl".into(), "b.stl".into(), "c.obj".into()]),
            "",
        );
        let deferred = Deferred::default();
        let mut loaders = LoaderRegistry::new();
        loaders.register("stl", deferred.clone());
        (catalog, ModelLifecycle::new(loaders), deferred, ObjectContainer::new())
    }

    #[test]
    fn test_request_then_complete_attaches() {
        let (catalog, mut lifecycle, loader, mut scene) = setup();
        assert_eq!(lifecycle.request(&catalog, "a", &mut scene, None), Ok(None));
        assert_eq!(lifecycle.state(), LifecycleState::Loading);

        loader.take("a").complete(LoadedGeometry::Raw(Mesh::cube(4.0)));
        let events = lifecycle.pump(&mut scene, None);
        assert_eq!(events, vec![Ok(ModelChanged { name: "a".into() })]);
        assert_eq!(lifecycle.state(), LifecycleState::Attached);
        assert_eq!(scene.len(), 1);
        assert!((scene.children()[0].scale() - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_unknown_model_leaves_state() {
        let (catalog, mut lifecycle, _, mut scene) = setup();
        let err = lifecycle.request(&catalog, "nonexistent", &mut scene, None);
        assert_eq!(
            err,
            Err(ViewerError::UnknownModel {
                name: "nonexistent".into()
            })
        );
        assert_eq!(lifecycle.state(), LifecycleState::Idle);
        assert!(lifecycle.current().is_none());
    }

    #[test]
    fn test_no_loader_for_type() {
        let (catalog, mut lifecycle, _, mut scene) = setup();
        let err = lifecycle.request(&catalog, "c", &mut scene, None).unwrap_err();
        assert!(matches!(err, ViewerError::NoLoaderForType { ref kind, .. } if kind.as_deref() == Some("obj")));
        assert_eq!(lifecycle.state(), LifecycleState::Idle);
    }

    #[test]
    fn test_superseded_completion_is_dropped() {
        let (catalog, mut lifecycle, loader, mut scene) = setup();
        lifecycle.request(&catalog, "a", &mut scene, None).unwrap();
        lifecycle.request(&catalog, "b", &mut scene, None).unwrap();

        loader.take("a").complete(LoadedGeometry::Raw(Mesh::cube(1.0)));
        assert!(lifecycle.pump(&mut scene, None).is_empty());
        assert!(scene.is_empty());
        assert_eq!(lifecycle.state(), LifecycleState::Loading);

        loader.take("b").complete(LoadedGeometry::Raw(Mesh::cube(1.0)));
        assert_eq!(lifecycle.pump(&mut scene, None).len(), 1);
        assert_eq!(lifecycle.attached_name(), Some("b"));
    }

    #[test]
    fn test_single_attached_and_cache_hit() {
        let (catalog, mut lifecycle, loader, mut scene) = setup();
        for name in ["a", "b"] {
            lifecycle.request(&catalog, name, &mut scene, None).unwrap();
            loader.take(name).complete(LoadedGeometry::Raw(Mesh::cube(1.0)));
            lifecycle.pump(&mut scene, None);
            assert_eq!(scene.len(), 1);
        }
        assert_eq!(lifecycle.attached_name(), Some("b"));

        // "a" was detached into the cache and comes back without a load
        let changed = lifecycle.request(&catalog, "a", &mut scene, None).unwrap();
        assert_eq!(changed, Some(ModelChanged { name: "a".into() }));
        assert_eq!(scene.len(), 1);
        assert!(loader.0.borrow().is_empty());
    }

    #[test]
    fn test_load_failure_restores_previous_model() {
        let (catalog, mut lifecycle, loader, mut scene) = setup();
        lifecycle.request(&catalog, "a", &mut scene, None).unwrap();
        loader.take("a").complete(LoadedGeometry::Raw(Mesh::cube(1.0)));
        lifecycle.pump(&mut scene, None);

        lifecycle.request(&catalog, "b", &mut scene, None).unwrap();
        loader.take("b").fail("404");
        let events = lifecycle.pump(&mut scene, None);
        assert_eq!(
            events,
            vec![Err(ViewerError::LoadFailed {
                name: "b".into(),
                reason: "404".into()
            })]
        );
        assert_eq!(lifecycle.state(), LifecycleState::Attached);
        assert_eq!(lifecycle.current().map(ModelReference::name), Some("a"));

        // Retry works
        lifecycle.request(&catalog, "b", &mut scene, None).unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::Loading);
    }

    #[test]
    fn test_degenerate_geometry_is_not_attached() {
        let (catalog, mut lifecycle, loader, mut scene) = setup();
        lifecycle.request(&catalog, "a", &mut scene, None).unwrap();
        loader.take("a").complete(LoadedGeometry::Raw(Mesh::new()));
        let events = lifecycle.pump(&mut scene, None);
        assert_eq!(
            events,
            vec![Err(ViewerError::DegenerateGeometry { name: "a".into() })]
        );
        assert_eq!(lifecycle.state(), LifecycleState::Idle);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_reregistered_attached_name_is_reloaded() {
        let (mut catalog, mut lifecycle, loader, mut scene) = setup();
        lifecycle.request(&catalog, "a", &mut scene, None).unwrap();
        loader.take("a").complete(LoadedGeometry::Raw(Mesh::cube(1.0)));
        lifecycle.pump(&mut scene, None);
        let old_id = lifecycle.attached_id().unwrap();

        catalog.register(ModelReference::from_locator("moved/a.stl"));
        lifecycle.forget("a");
        assert_eq!(lifecycle.request(&catalog, "a", &mut scene, None), Ok(None));
        // The old geometry stays up until the new load lands
        assert!(scene.contains(old_id));

        loader.take("a").complete(LoadedGeometry::Raw(Mesh::cube(2.0)));
        lifecycle.pump(&mut scene, None);
        assert_eq!(scene.len(), 1);
        assert!(!scene.contains(old_id));
        assert_eq!(lifecycle.current().and_then(ModelReference::locator), Some("moved/a.stl"));

        // Unchanged registration is still a cache hit
        let changed = lifecycle.request(&catalog, "a", &mut scene, None).unwrap();
        assert!(changed.is_some());
        assert!(loader.0.borrow().is_empty());
    }

    #[test]
    fn test_detach_is_idempotent() {
        let (catalog, mut lifecycle, loader, mut scene) = setup();
        lifecycle.request(&catalog, "a", &mut scene, None).unwrap();
        loader.take("a").complete(LoadedGeometry::Raw(Mesh::cube(1.0)));
        lifecycle.pump(&mut scene, None);

        assert!(lifecycle.detach_model("a", &mut scene));
        assert!(!lifecycle.detach_model("a", &mut scene));
        assert!(scene.is_empty());
        assert_eq!(lifecycle.state(), LifecycleState::Idle);
    }

    #[test]
    fn test_material_applied_on_attach() {
        let (catalog, mut lifecycle, loader, mut scene) = setup();
        let gold = Material::with_color(0xd4af37);
        lifecycle.request(&catalog, "a", &mut scene, Some(&gold)).unwrap();
        loader.take("a").complete(LoadedGeometry::Raw(Mesh::cube(1.0)));
        lifecycle.pump(&mut scene, Some(&gold));
        assert_eq!(scene.children()[0].material(), Some(&gold));

        let clay = Material::with_color(0xb5651d);
        assert!(lifecycle.apply_material(&mut scene, &clay));
        assert_eq!(scene.children()[0].material(), Some(&clay));
    }

    #[test]
    fn test_prebuilt_reference_skips_loading() {
        let (mut catalog, mut lifecycle, loader, mut scene) = setup();
        let renderable = normalize(LoadedGeometry::Raw(Mesh::cube(1.0)), None);
        catalog.register(ModelReference::prebuilt("placeholder", renderable));

        let changed = lifecycle
            .request(&catalog, "placeholder", &mut scene, None)
            .unwrap();
        assert_eq!(changed.map(|c| c.name), Some("placeholder".to_string()));
        assert!(loader.0.borrow().is_empty());
        assert_eq!(scene.len(), 1);
    }
}
