//! Static registry of try-on model variants

use serde::Serialize;
use tracing::debug;

/// Selector key of the model used when none (or an unknown one) is requested
pub const DEFAULT_MODEL_KEY: &str = "IDM_VTON";

/// One hosted model variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelDescriptor {
    /// Stable selector key sent by the UI
    pub key: &'static str,
    /// Display name reported back in results
    pub name: &'static str,
    /// Versioned external reference: `owner/name:version`
    pub reference: &'static str,
    pub description: &'static str,
    pub max_resolution: u32,
    /// Typical processing time, as shown to users
    pub processing_time: &'static str,
    pub features: &'static [&'static str],
}

static MODELS: [ModelDescriptor; 3] = [
    ModelDescriptor {
        key: "IDM_VTON",
        name: "IDM-VTON",
        reference: "cuuupid/idm-vton:c871bb9b046607b680449ecbae55fd8c6d945e0a1948644bf2361b3d021d3ff4",
        description: "High quality virtual try-on with accurate garment fitting",
        max_resolution: 1024,
        processing_time: "30-60s",
        features: &["High quality output", "Precise fit", "Natural lighting"],
    },
    ModelDescriptor {
        key: "OUTFIT_ANYONE",
        name: "Outfit Anyone",
        reference: "viktorfa/outfit_anyone:581ac8d6af59580a9c73dc0103b7532c8c2b06c19b422d3d5b3e2c2040a8c2c6",
        description: "General purpose try-on for a wide range of garment types",
        max_resolution: 768,
        processing_time: "20-40s",
        features: &["Fast processing", "Many garment types", "Stable output"],
    },
    ModelDescriptor {
        key: "VIRTUAL_TRYON",
        name: "Virtual Try-On",
        reference: "aleksa-codes/virtual-try-on:5b85cd1e00e7a1b4b2d8ad9dcbb4b893e4ba81a6b5a7373b3f46f8b26b48a5cb",
        description: "Lightweight try-on for quick previews",
        max_resolution: 512,
        processing_time: "15-30s",
        features: &["Quick preview", "Lightweight", "Near real-time"],
    },
];

/// Read-only lookup over the model table
#[derive(Debug, Clone, Copy)]
pub struct ModelRegistry {
    models: &'static [ModelDescriptor],
    default_index: usize,
}

impl ModelRegistry {
    /// Registry over the built-in model table
    pub fn new() -> Self {
        let default_index = MODELS
            .iter()
            .position(|m| m.key == DEFAULT_MODEL_KEY)
            .unwrap_or(0);

        Self {
            models: &MODELS,
            default_index,
        }
    }

    /// Exact lookup. Keys are matched case-insensitively and `-` is treated as `_`.
    pub fn get(&self, key: &str) -> Option<&'static ModelDescriptor> {
        let normalized = key.trim().replace('-', "_");
        self.models
            .iter()
            .find(|m| m.key.eq_ignore_ascii_case(&normalized))
    }

    /// Resolve a selector token, degrading to the default model on a miss
    pub fn select(&self, selector: Option<&str>) -> &'static ModelDescriptor {
        match selector.filter(|s| !s.trim().is_empty()) {
            Some(token) => self.get(token).unwrap_or_else(|| {
                debug!(selector = %token, "Unknown model selector, using default");
                self.default_model()
            }),
            None => self.default_model(),
        }
    }

    pub fn default_model(&self) -> &'static ModelDescriptor {
        &self.models[self.default_index]
    }

    pub fn list(&self) -> &'static [ModelDescriptor] {
        self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
