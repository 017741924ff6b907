/// MV3D Core Library - model catalog, lifecycle and geometry normalization
///
/// This library holds everything the viewer front ends share: model
/// references and the catalog, STL/VRML decoding, centering and fit-to-size
/// normalization, the single-slot model lifecycle and the viewer controller.

pub mod catalog;
pub mod error;
pub mod format;
pub mod fragment;
pub mod geometry;
pub mod lifecycle;
pub mod loader;
pub mod material;
pub mod model;
pub mod node;
pub mod normalize;
pub mod projection;
pub mod scene;
pub mod settings;
pub mod stl;
pub mod transform;
pub mod viewer;
pub mod vrml;

// Re-export commonly used types
pub use catalog::{Catalog, ModelList};
pub use error::{DecodeError, FetchError, ViewerError};
pub use format::GeometryFormat;
pub use fragment::{MemoryNavigation, Navigation};
pub use geometry::{Aabb, BoundingSphere, Mesh, Triangle, Vertex};
pub use lifecycle::{LifecycleState, ModelChanged, ModelLifecycle};
pub use loader::{ByteSource, Completion, FormatLoader, LoadResult, Loader, LoaderRegistry, MemorySource};
pub use material::{Material, MaterialPalette, FALLBACK_MATERIAL};
pub use model::{ModelReference, ModelSource};
pub use node::{LoadedGeometry, MeshNode, NodeId, NodeKind, Part, Renderable, SceneNode};
pub use normalize::{compute_fit_scale, material_or_fallback, normalize, CANONICAL_SIZE};
pub use projection::Camera;
pub use scene::{ObjectContainer, SceneGraph};
pub use settings::{ControlScheme, ViewerSettings};
pub use transform::{RotationState, Transform};
pub use viewer::Viewer;
