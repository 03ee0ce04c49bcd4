//! Craft model loading.
//!
//! Decoding the model file is the host's business; the scene only needs a
//! handle to the model's scene object and its reflective material. When the
//! provider fails, a placeholder stands in so the scene still mounts.

use renderer::{ReflectiveMaterial, SceneObjectId};
use thiserror::Error;

/// Object id used for the stand-in model.
pub const PLACEHOLDER_OBJECT: SceneObjectId = SceneObjectId(u32::MAX);

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("model not found: {0}")]
    NotFound(String),
    #[error("model could not be decoded: {0}")]
    Decode(String),
    #[error("model has no reflective material: {0}")]
    MissingMaterial(String),
}

/// A loaded craft model as seen by the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct CraftModel {
    pub name: String,
    /// Scene object the model lives under. Left out of reflection captures.
    pub object: SceneObjectId,
    pub mesh_count: usize,
    pub material: ReflectiveMaterial,
    /// True when this is the stand-in for a model that failed to load.
    pub placeholder: bool,
}

impl CraftModel {
    pub fn new(name: impl Into<String>, object: SceneObjectId, mesh_count: usize) -> Self {
        Self {
            name: name.into(),
            object,
            mesh_count,
            material: ReflectiveMaterial::default(),
            placeholder: false,
        }
    }

    /// Single-mesh stand-in.
    pub fn placeholder() -> Self {
        Self {
            placeholder: true,
            ..Self::new("placeholder", PLACEHOLDER_OBJECT, 1)
        }
    }
}

/// Source of the craft model.
pub trait ModelAssetProvider {
    fn load_craft(&mut self) -> Result<CraftModel, AssetError>;
}

impl<F> ModelAssetProvider for F
where
    F: FnMut() -> Result<CraftModel, AssetError>,
{
    fn load_craft(&mut self) -> Result<CraftModel, AssetError> {
        self()
    }
}

/// Load the craft model, falling back to the placeholder on any error.
pub fn load_or_placeholder(provider: &mut dyn ModelAssetProvider) -> CraftModel {
    match provider.load_craft() {
        Ok(model) if model.mesh_count == 0 => {
            log::error!("Craft model '{}' has no meshes, using placeholder", model.name);
            CraftModel::placeholder()
        }
        Ok(model) => {
            log::info!("Loaded craft model '{}' ({} meshes)", model.name, model.mesh_count);
            model
        }
        Err(e) => {
            log::error!("Failed to load craft model: {e}, using placeholder");
            CraftModel::placeholder()
        }
    }
}
