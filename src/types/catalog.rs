//! Model and aspect-ratio catalogs.
//!
//! Each identifier maps to an immutable descriptor record. Parsing an
//! identifier is a membership check against the table.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Image generation models accepted by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Model {
    #[default]
    FluxPro,
    Flux11Pro,
    Flux11ProUltra,
    FluxDev,
    FluxDevSingleLora,
    QwenImage,
    WanImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub model: Model,
    pub id: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
}

pub static MODELS: [ModelInfo; 7] = [
    ModelInfo {
        model: Model::FluxPro,
        id: "flux-pro",
        display_name: "Flux Pro",
        description: "High-quality professional image generation",
    },
    ModelInfo {
        model: Model::Flux11Pro,
        id: "flux-1.1-pro",
        display_name: "Flux 1.1 Pro",
        description: "Enhanced Flux Pro with improved quality",
    },
    ModelInfo {
        model: Model::Flux11ProUltra,
        id: "flux-1.1-pro-ultra",
        display_name: "Flux 1.1 Pro Ultra",
        description: "Maximum quality Flux model",
    },
    ModelInfo {
        model: Model::FluxDev,
        id: "flux-dev",
        display_name: "Flux Dev",
        description: "Development/testing Flux model",
    },
    ModelInfo {
        model: Model::FluxDevSingleLora,
        id: "flux-dev-single-lora",
        display_name: "Flux Dev (Single LoRA)",
        description: "Flux Dev with single LoRA support",
    },
    ModelInfo {
        model: Model::QwenImage,
        id: "qwen-image",
        display_name: "Qwen Image (Text Rendering)",
        description: "Optimized for text rendering in images",
    },
    ModelInfo {
        model: Model::WanImage,
        id: "wan-image",
        display_name: "WAN Image (Fast Cinematic)",
        description: "Fast generation with cinematic style",
    },
];

impl Model {
    pub fn info(&self) -> &'static ModelInfo {
        let row = match self {
            Model::FluxPro => 0,
            Model::Flux11Pro => 1,
            Model::Flux11ProUltra => 2,
            Model::FluxDev => 3,
            Model::FluxDevSingleLora => 4,
            Model::QwenImage => 5,
            Model::WanImage => 6,
        };
        &MODELS[row]
    }

    pub fn id(&self) -> &'static str {
        self.info().id
    }

    pub fn display_name(&self) -> &'static str {
        self.info().display_name
    }

    pub fn description(&self) -> &'static str {
        self.info().description
    }

    pub fn all() -> impl Iterator<Item = &'static ModelInfo> {
        MODELS.iter()
    }
}

impl FromStr for Model {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MODELS
            .iter()
            .find(|m| m.id == s)
            .map(|m| m.model)
            .ok_or_else(|| Error::validation(format!("Unknown model: {}", s), Some("model")))
    }
}

impl TryFrom<String> for Model {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Model> for String {
    fn from(m: Model) -> Self {
        m.id().to_string()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Output aspect ratios accepted by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AspectRatio {
    #[default]
    Square,
    Landscape16x9,
    Portrait9x16,
    Landscape4x3,
    Portrait3x4,
    Landscape3x2,
    Portrait2x3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatioInfo {
    pub ratio: AspectRatio,
    pub id: &'static str,
    pub display_name: &'static str,
    /// Approximate output size at a 1024px base
    pub approx_dimensions: (u32, u32),
}

pub static ASPECT_RATIOS: [AspectRatioInfo; 7] = [
    AspectRatioInfo {
        ratio: AspectRatio::Square,
        id: "1:1",
        display_name: "Square (1:1)",
        approx_dimensions: (1024, 1024),
    },
    AspectRatioInfo {
        ratio: AspectRatio::Landscape16x9,
        id: "16:9",
        display_name: "Landscape 16:9",
        approx_dimensions: (1365, 768),
    },
    AspectRatioInfo {
        ratio: AspectRatio::Portrait9x16,
        id: "9:16",
        display_name: "Portrait 9:16",
        approx_dimensions: (768, 1365),
    },
    AspectRatioInfo {
        ratio: AspectRatio::Landscape4x3,
        id: "4:3",
        display_name: "Landscape 4:3",
        approx_dimensions: (1182, 886),
    },
    AspectRatioInfo {
        ratio: AspectRatio::Portrait3x4,
        id: "3:4",
        display_name: "Portrait 3:4",
        approx_dimensions: (886, 1182),
    },
    AspectRatioInfo {
        ratio: AspectRatio::Landscape3x2,
        id: "3:2",
        display_name: "Landscape 3:2",
        approx_dimensions: (1254, 836),
    },
    AspectRatioInfo {
        ratio: AspectRatio::Portrait2x3,
        id: "2:3",
        display_name: "Portrait 2:3",
        approx_dimensions: (836, 1254),
    },
];

impl AspectRatio {
    pub fn info(&self) -> &'static AspectRatioInfo {
        let row = match self {
            AspectRatio::Square => 0,
            AspectRatio::Landscape16x9 => 1,
            AspectRatio::Portrait9x16 => 2,
            AspectRatio::Landscape4x3 => 3,
            AspectRatio::Portrait3x4 => 4,
            AspectRatio::Landscape3x2 => 5,
            AspectRatio::Portrait2x3 => 6,
        };
        &ASPECT_RATIOS[row]
    }

    pub fn id(&self) -> &'static str {
        self.info().id
    }

    pub fn display_name(&self) -> &'static str {
        self.info().display_name
    }

    pub fn approx_dimensions(&self) -> (u32, u32) {
        self.info().approx_dimensions
    }

    pub fn all() -> impl Iterator<Item = &'static AspectRatioInfo> {
        ASPECT_RATIOS.iter()
    }
}

impl FromStr for AspectRatio {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ASPECT_RATIOS
            .iter()
            .find(|a| a.id == s)
            .map(|a| a.ratio)
            .ok_or_else(|| {
                Error::validation(format!("Unknown aspect ratio: {}", s), Some("aspect_ratio"))
            })
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(a: AspectRatio) -> Self {
        a.id().to_string()
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
