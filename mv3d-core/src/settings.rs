/// Flat settings shown in the viewer's settings panel
use serde::{Deserialize, Serialize};

pub const DEFAULT_DAMPING: f32 = 0.001;
/// Damping applied when switching to the object (trackball) scheme
pub const OBJECT_DAMPING: f32 = 0.1;
pub const MAX_DAMPING: f32 = 0.2;

/// Which camera control drives the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlScheme {
    /// Orbit the camera around the model
    #[default]
    View,
    /// Spin the model itself
    Object,
}

impl ControlScheme {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "view" => Some(Self::View),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Object => "object",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::View => Self::Object,
            Self::Object => Self::View,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub model: String,
    pub material: String,
    pub controls: ControlScheme,
    pub fullsize: bool,
    pub damping: f32,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            material: String::new(),
            controls: ControlScheme::View,
            fullsize: false,
            damping: DEFAULT_DAMPING,
        }
    }
}

impl ViewerSettings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.set_damping(settings.damping);
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn set_damping(&mut self, damping: f32) {
        self.damping = if damping.is_finite() {
            damping.clamp(0.0, MAX_DAMPING)
        } else {
            DEFAULT_DAMPING
        };
    }

    /// Switching to the object scheme also raises damping.
    pub fn set_controls(&mut self, controls: ControlScheme) {
        self.controls = controls;
        if controls == ControlScheme::Object {
            self.damping = OBJECT_DAMPING;
        }
    }
}
