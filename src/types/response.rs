//! Generation response model.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Index;
use url::Url;

/// One generated image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawImage", into = "RawImage")]
pub struct ImageResult {
    url: Url,
    seed: Option<i64>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Serialize, Deserialize)]
struct RawImage {
    url: String,
    #[serde(default)]
    seed: Option<i64>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

impl TryFrom<RawImage> for ImageResult {
    type Error = String;

    fn try_from(raw: RawImage) -> std::result::Result<Self, String> {
        let url = Url::parse(&raw.url).map_err(|e| format!("invalid image url {:?}: {}", raw.url, e))?;
        if url.cannot_be_a_base() {
            return Err(format!("image url is not absolute: {}", raw.url));
        }
        if raw.width == Some(0) || raw.height == Some(0) {
            return Err("image dimensions must be positive".to_string());
        }
        Ok(Self {
            url,
            seed: raw.seed,
            width: raw.width,
            height: raw.height,
        })
    }
}

impl From<ImageResult> for RawImage {
    fn from(img: ImageResult) -> Self {
        Self {
            url: img.url.into(),
            seed: img.seed,
            width: img.width,
            height: img.height,
        }
    }
}

impl ImageResult {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn seed(&self) -> Option<i64> {
        self.seed
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }

    /// `"{width}x{height}"`, or `"Unknown"` when either side is missing.
    pub fn dimensions(&self) -> String {
        match (self.width, self.height) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            _ => "Unknown".to_string(),
        }
    }
}

/// Parsed result of one generation call. Images keep server order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    images: Vec<ImageResult>,
    #[serde(default, deserialize_with = "non_negative")]
    credits_used: f64,
    #[serde(default, deserialize_with = "non_negative")]
    credits_remaining: f64,
}

fn non_negative<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    if v < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "credit values must be non-negative, got {}",
            v
        )));
    }
    Ok(v)
}

impl GenerateResponse {
    pub fn new(images: Vec<ImageResult>, credits_used: f64, credits_remaining: f64) -> Self {
        Self {
            images,
            credits_used,
            credits_remaining,
        }
    }

    /// Parse a success body. Unknown keys are ignored; missing fields default.
    pub fn from_json(value: Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(|e| {
            Error::api(
                format!("Invalid response body: {}", e),
                ErrorContext::new()
                    .with_response_body(value)
                    .with_source("response_model"),
            )
        })
    }

    pub fn images(&self) -> &[ImageResult] {
        &self.images
    }

    pub fn credits_used(&self) -> f64 {
        self.credits_used
    }

    pub fn credits_remaining(&self) -> f64 {
        self.credits_remaining
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageResult> {
        self.images.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ImageResult> {
        self.images.get(index)
    }

    pub fn first_image(&self) -> Option<&ImageResult> {
        self.images.first()
    }

    pub fn image_urls(&self) -> Vec<String> {
        self.images.iter().map(|i| i.url.to_string()).collect()
    }
}

impl Index<usize> for GenerateResponse {
    type Output = ImageResult;

    fn index(&self, index: usize) -> &ImageResult {
        &self.images[index]
    }
}

impl<'a> IntoIterator for &'a GenerateResponse {
    type Item = &'a ImageResult;
    type IntoIter = std::slice::Iter<'a, ImageResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.iter()
    }
}
