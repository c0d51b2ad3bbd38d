use std::fmt;
use std::path::PathBuf;

use base64::Engine as _;
use image::RgbaImage;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::ImageError;

/// Decoded RGBA8 pixels, row 0 at the top.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    image: RgbaImage,
}

impl ImageData {
    /// Wraps tightly packed RGBA8 pixels.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ImageError> {
        let expected = width as usize * height as usize * 4;
        let actual = pixels.len();
        RgbaImage::from_raw(width, height, pixels)
            .map(|image| Self { image })
            .ok_or(ImageError::PixelCount {
                width,
                height,
                expected,
                actual,
            })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Copy with the row order reversed.
    pub fn flipped_vertically(&self) -> Self {
        Self {
            image: image::imageops::flip_vertical(&self.image),
        }
    }

    pub fn as_rgba_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba_image(self) -> RgbaImage {
        self.image
    }
}

impl From<RgbaImage> for ImageData {
    fn from(image: RgbaImage) -> Self {
        Self { image }
    }
}

impl From<image::DynamicImage> for ImageData {
    fn from(image: image::DynamicImage) -> Self {
        Self {
            image: image.to_rgba8(),
        }
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}

/// Where texture pixels come from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    /// `http://` or `https://` resource.
    Url(String),
    /// `data:<mime>;base64,<payload>`.
    DataUri(String),
    /// Encoded file contents (PNG, JPEG, BMP, GIF).
    Bytes(Vec<u8>),
    /// An image that is already decoded and is reused as-is.
    Decoded(ImageData),
}

impl ImageSource {
    /// Classifies a user-supplied string by its scheme.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.starts_with("data:") {
            Self::DataUri(trimmed.to_owned())
        } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Url(trimmed.to_owned())
        } else {
            Self::Path(PathBuf::from(trimmed))
        }
    }
}

/// Resolves `source` into decoded pixels.
///
/// URLs are fetched with a blocking request; on `wasm32` use
/// `web::fetch_image` instead.
pub fn load_image(source: ImageSource) -> Result<ImageData, ImageError> {
    match source {
        ImageSource::Decoded(image) => Ok(image),
        ImageSource::Bytes(bytes) => decode_image_bytes(&bytes),
        ImageSource::DataUri(uri) => decode_data_uri(&uri),
        ImageSource::Path(path) => {
            let bytes = std::fs::read(&path)?;
            tracing::debug!(path = %path.display(), bytes = bytes.len(), "read image file");
            decode_image_bytes(&bytes)
        }
        ImageSource::Url(url) => fetch_url(&url),
    }
}

pub fn decode_image_bytes(bytes: &[u8]) -> Result<ImageData, ImageError> {
    let decoded = image::load_from_memory(bytes)?;
    Ok(ImageData::from(decoded))
}

/// Decodes a base64 `data:` URI holding an encoded image.
pub fn decode_data_uri(uri: &str) -> Result<ImageData, ImageError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ImageError::DataUri("missing `data:` scheme".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::DataUri("missing `,` before payload".into()))?;
    if !meta.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        return Err(ImageError::DataUri(
            "only base64-encoded payloads are supported".into(),
        ));
    }
    let compact: String = payload.chars().filter(|ch| !ch.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| ImageError::DataUri(err.to_string()))?;
    decode_image_bytes(&bytes)
}

/// Deterministic RGBA noise, every channel uniformly distributed.
pub fn noise_image(width: u32, height: u32, seed: u64) -> ImageData {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pixels = vec![0u8; width as usize * height as usize * 4];
    rng.fill_bytes(&mut pixels);
    let image = RgbaImage::from_raw(width, height, pixels)
        .unwrap_or_else(|| RgbaImage::new(width, height));
    ImageData { image }
}

#[cfg(not(target_arch = "wasm32"))]
fn fetch_url(url: &str) -> Result<ImageData, ImageError> {
    let response = reqwest::blocking::get(url)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ImageError::Status(status.as_u16()));
    }
    let bytes = response.bytes()?;
    tracing::debug!(url, bytes = bytes.len(), "fetched image");
    decode_image_bytes(&bytes)
}

#[cfg(target_arch = "wasm32")]
fn fetch_url(url: &str) -> Result<ImageData, ImageError> {
    Err(ImageError::Fetch(format!(
        "blocking fetch of {url} is unavailable in the browser; use web::fetch_image"
    )))
}
