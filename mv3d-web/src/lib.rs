/// MV3D Web - WASM bindings for the model viewer
///
/// The page owns the canvas and the draw calls. This module owns the model
/// catalog, the load lifecycle and the camera, and hands the page flat
/// vertex buffers and matrices each frame.

use std::rc::Rc;

use js_sys::{Array, Float32Array, Uint8Array};
use nalgebra::Point3;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Location, Response};

use mv3d_core::{
    ByteSource, Camera, ControlScheme, FetchError, LoaderRegistry, MaterialPalette, ModelList,
    Navigation, ObjectContainer, RotationState, Transform, Viewer,
};

/// Publishes the active model into `location.hash`.
pub struct LocationHash {
    location: Location,
}

impl Navigation for LocationHash {
    fn publish(&mut self, fragment: &str) {
        if let Err(e) = self.location.set_hash(fragment) {
            log::warn!("could not update location hash: {e:?}");
        }
    }

    fn fragment(&self) -> Option<String> {
        self.location.hash().ok().filter(|hash| !hash.is_empty())
    }
}

/// Fetches locators over HTTP with the browser's `fetch`.
pub struct FetchSource;

impl ByteSource for FetchSource {
    fn fetch(&self, locator: &str, on_done: Box<dyn FnOnce(Result<Vec<u8>, FetchError>)>) {
        let locator = locator.to_string();
        wasm_bindgen_futures::spawn_local(async move {
            let result = fetch_bytes(&locator)
                .await
                .map_err(|reason| FetchError::new(locator.as_str(), reason));
            on_done(result);
        });
    }
}

async fn fetch_bytes(locator: &str) -> Result<Vec<u8>, String> {
    let window = web_sys::window().ok_or("no window")?;
    let response = JsFuture::from(window.fetch_with_str(locator))
        .await
        .map_err(js_error)?
        .dyn_into::<Response>()
        .map_err(js_error)?;
    if !response.ok() {
        return Err(format!("HTTP status {}", response.status()));
    }
    let buffer = JsFuture::from(response.array_buffer().map_err(js_error)?)
        .await
        .map_err(js_error)?;
    Ok(Uint8Array::new(&buffer).to_vec())
}

fn js_error(value: JsValue) -> String {
    match js_sys::JSON::stringify(&value) {
        Ok(text) => String::from(text),
        Err(_) => format!("{value:?}"),
    }
}

fn to_js(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

#[wasm_bindgen]
pub struct WebViewer {
    viewer: Viewer<ObjectContainer, LocationHash>,
    rotation: RotationState,
    camera: Camera,
}

#[wasm_bindgen]
impl WebViewer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WebViewer, JsValue> {
        let window = web_sys::window().ok_or_else(|| to_js("no window"))?;
        let navigation = LocationHash {
            location: window.location(),
        };
        let mut viewer = Viewer::new(
            LoaderRegistry::standard(Rc::new(FetchSource)),
            ObjectContainer::new(),
            navigation,
        );
        viewer.add_materials(MaterialPalette::builtin());
        let (width, height) = viewer.viewport();

        Ok(WebViewer {
            viewer,
            rotation: RotationState::zero(),
            camera: Camera::new(width, height),
        })
    }

    /// Register models from a JSON list of locators or a name -> locator map.
    #[wasm_bindgen(js_name = addModels)]
    pub fn add_models(&mut self, json: &str, base: &str) -> Result<(), JsValue> {
        let list = ModelList::from_json(json).map_err(to_js)?;
        self.viewer.add_models(list, base);
        Ok(())
    }

    #[wasm_bindgen(js_name = addMaterials)]
    pub fn add_materials(&mut self, json: &str) -> Result<(), JsValue> {
        let palette = MaterialPalette::from_json(json).map_err(to_js)?;
        self.viewer.add_materials(palette);
        Ok(())
    }

    /// Show the model named by the location hash, or the first one.
    pub fn start(&mut self) -> Result<(), JsValue> {
        self.viewer.start().map_err(to_js)
    }

    #[wasm_bindgen(js_name = setModel)]
    pub fn set_model(&mut self, name: &str) -> Result<(), JsValue> {
        self.viewer.set_model(name).map_err(to_js)
    }

    #[wasm_bindgen(js_name = stepModel)]
    pub fn step_model(&mut self, forward: bool) -> Result<(), JsValue> {
        self.viewer.step_model(forward).map_err(to_js)
    }

    #[wasm_bindgen(js_name = setMaterial)]
    pub fn set_material(&mut self, name: &str) -> bool {
        self.viewer.update_material(name)
    }

    #[wasm_bindgen(js_name = setControls)]
    pub fn set_controls(&mut self, name: &str) -> Result<(), JsValue> {
        let scheme = ControlScheme::parse(name)
            .ok_or_else(|| to_js(format!("unknown control scheme `{name}`")))?;
        self.viewer.set_controls(scheme);
        Ok(())
    }

    #[wasm_bindgen(js_name = setDamping)]
    pub fn set_damping(&mut self, damping: f32) {
        self.viewer.set_damping(damping);
    }

    #[wasm_bindgen(js_name = setFullsize)]
    pub fn set_fullsize(&mut self, fullsize: bool, window_width: u32, window_height: u32) {
        self.viewer.set_fullsize(fullsize, (window_width, window_height));
        self.sync_viewport();
    }

    pub fn resize(&mut self, window_width: u32, window_height: u32) {
        self.viewer.resize(window_width, window_height);
        self.sync_viewport();
    }

    fn sync_viewport(&mut self) {
        let (width, height) = self.viewer.viewport();
        self.camera.set_viewport(width, height);
    }

    /// Pointer drag: orbits the camera or spins the object.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        match self.viewer.settings().controls {
            ControlScheme::View => self.camera.orbit(-dx, dy),
            ControlScheme::Object => self.rotation.spin(dy, dx),
        }
        self.viewer.mark_dirty();
    }

    pub fn zoom(&mut self, factor: f32) {
        self.camera.zoom(factor);
        self.viewer.mark_dirty();
    }

    /// Call once per animation frame; true when the page should redraw.
    pub fn frame(&mut self) -> bool {
        if self.viewer.settings().controls == ControlScheme::Object
            && self.rotation.step(self.viewer.settings().damping)
        {
            self.viewer.mark_dirty();
        }
        self.viewer.frame()
    }

    pub fn teardown(&mut self) {
        self.viewer.teardown();
    }

    #[wasm_bindgen(js_name = modelNames)]
    pub fn model_names(&self) -> Array {
        self.viewer
            .catalog()
            .names()
            .map(JsValue::from_str)
            .collect()
    }

    #[wasm_bindgen(js_name = materialNames)]
    pub fn material_names(&self) -> Array {
        self.viewer
            .palette()
            .names()
            .map(JsValue::from_str)
            .collect()
    }

    pub fn state(&self) -> String {
        format!("{:?}", self.viewer.state())
    }

    #[wasm_bindgen(js_name = lastError)]
    pub fn last_error(&self) -> Option<String> {
        self.viewer.last_error().map(ToString::to_string)
    }

    #[wasm_bindgen(js_name = settingsJson)]
    pub fn settings_json(&self) -> Result<String, JsValue> {
        self.viewer.settings().to_json().map_err(to_js)
    }

    /// World-space triangle positions of everything attached, xyz per vertex.
    pub fn positions(&self) -> Float32Array {
        let mut flat = Vec::new();
        for renderable in self.viewer.scene().children() {
            let model = Transform::model_matrix(&self.rotation, renderable.scale());
            for (mesh, _) in renderable.parts() {
                for triangle in &mesh.triangles {
                    for vertex in &triangle.vertices {
                        let p: Point3<f32> = model.transform_point(&vertex.position);
                        flat.extend_from_slice(&[p.x, p.y, p.z]);
                    }
                }
            }
        }
        Float32Array::from(flat.as_slice())
    }

    /// Packed 0xRRGGBB colour per triangle, parallel to `positions`.
    pub fn colors(&self) -> Vec<u32> {
        let mut colors = Vec::new();
        for renderable in self.viewer.scene().children() {
            for (mesh, material) in renderable.parts() {
                colors.extend(std::iter::repeat(material.color).take(mesh.triangles.len()));
            }
        }
        colors
    }

    /// Column-major projection * view matrix for the current camera.
    #[wasm_bindgen(js_name = viewProjection)]
    pub fn view_projection(&self) -> Float32Array {
        let matrix = self.camera.projection_matrix() * self.camera.view_matrix();
        Float32Array::from(matrix.as_slice())
    }
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        // A logger is already installed
        return Ok(());
    }
    log::info!("mv3d-web ready");
    Ok(())
}
