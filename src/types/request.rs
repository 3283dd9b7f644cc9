//! Generation request model.

use super::catalog::{AspectRatio, Model};
use crate::{Error, Result};
use serde_json::{json, Value};

pub const MAX_PROMPT_CHARS: usize = 4000;
pub const MIN_OUTPUTS: u8 = 1;
pub const MAX_OUTPUTS: u8 = 4;

/// Tunable generation parameters. Everything except the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    pub model: Model,
    pub aspect_ratio: AspectRatio,
    pub num_outputs: u8,
    pub seed: Option<i64>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            model: Model::default(),
            aspect_ratio: AspectRatio::default(),
            num_outputs: 1,
            seed: None,
        }
    }
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_num_outputs(mut self, n: u8) -> Self {
        self.num_outputs = n;
        self
    }

    pub fn with_seed(mut self, seed: Option<i64>) -> Self {
        self.seed = seed;
        self
    }

    /// Build options from raw identifiers, e.g. CLI or config values.
    pub fn parse(
        model: &str,
        aspect_ratio: &str,
        num_outputs: u8,
        seed: Option<i64>,
    ) -> Result<Self> {
        Ok(Self {
            model: model.parse()?,
            aspect_ratio: aspect_ratio.parse()?,
            num_outputs,
            seed,
        })
    }
}

/// A validated, immutable generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    prompt: String,
    model: Model,
    aspect_ratio: AspectRatio,
    num_outputs: u8,
    seed: Option<i64>,
}

impl GenerateRequest {
    /// Validate and normalize. The prompt is trimmed before length checks.
    pub fn new(prompt: &str, options: &GenerateOptions) -> Result<Self> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(Error::validation(
                "Prompt cannot be empty or whitespace only",
                Some("prompt"),
            ));
        }
        let len = prompt.chars().count();
        if len > MAX_PROMPT_CHARS {
            return Err(Error::validation(
                format!(
                    "Prompt is {} characters; the maximum is {}",
                    len, MAX_PROMPT_CHARS
                ),
                Some("prompt"),
            ));
        }
        if !(MIN_OUTPUTS..=MAX_OUTPUTS).contains(&options.num_outputs) {
            return Err(Error::validation(
                format!(
                    "num_outputs must be between {} and {}, got {}",
                    MIN_OUTPUTS, MAX_OUTPUTS, options.num_outputs
                ),
                Some("num_outputs"),
            ));
        }

        Ok(Self {
            prompt: prompt.to_string(),
            model: options.model,
            aspect_ratio: options.aspect_ratio,
            num_outputs: options.num_outputs,
            seed: options.seed,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn num_outputs(&self) -> u8 {
        self.num_outputs
    }

    pub fn seed(&self) -> Option<i64> {
        self.seed
    }

    /// JSON body for `POST /generate`. `seed` is present only when set.
    pub fn to_wire_payload(&self) -> Value {
        let mut body = json!({
            "prompt": self.prompt,
            "model": self.model.id(),
            "aspect_ratio": self.aspect_ratio.id(),
            "num_outputs": self.num_outputs,
        });
        if let Some(seed) = self.seed {
            body["seed"] = json!(seed);
        }
        body
    }

    /// First 50 characters, for log lines.
    pub(crate) fn prompt_preview(&self) -> String {
        self.prompt.chars().take(50).collect()
    }
}
