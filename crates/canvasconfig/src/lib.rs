use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;
use shadercanvas::{
    noise_image, BlendMode, ImageSource, SessionOptions, ShaderDialect, TextureOptions,
    DEFAULT_FPS, MAX_TEXTURE_UNITS,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A demo described in TOML.
///
/// ```toml
/// version = 1
/// fps = 30                # or frame_interval = "33ms"
/// auto_play = true
/// dialect = "gles300"
/// blend = "normal"
///
/// [shader]
/// main = "shaders/plasma.frag"
///
/// [[textures]]
/// name = "u_noise"
/// unit = 0
/// noise = { size = 256, seed = 7 }
/// mipmap = true
/// wrap_s = "repeat"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CanvasConfig {
    pub version: u32,
    #[serde(default)]
    pub fps: Option<f32>,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub frame_interval: Option<Duration>,
    #[serde(default)]
    pub ratio: Option<f32>,
    #[serde(default)]
    pub auto_play: bool,
    #[serde(default)]
    pub dialect: ShaderDialect,
    #[serde(default)]
    pub blend: BlendMode,
    #[serde(default)]
    pub shader: ShaderFiles,
    #[serde(default)]
    pub textures: Vec<TextureEntry>,
    /// Directory relative paths resolve against; set by [`CanvasConfig::from_path`].
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Shader source files. `frag` wins over `main` when both are given.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShaderFiles {
    pub vert: Option<PathBuf>,
    pub frag: Option<PathBuf>,
    pub main: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextureEntry {
    pub name: String,
    pub unit: u32,
    /// Path, `http(s)` URL or data URI.
    #[serde(default)]
    pub source: Option<String>,
    /// Procedural noise instead of an image file.
    #[serde(default)]
    pub noise: Option<NoiseTexture>,
    #[serde(flatten)]
    pub options: TextureOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NoiseTexture {
    #[serde(default = "default_noise_size")]
    pub size: u32,
    #[serde(default)]
    pub seed: u64,
}

fn default_noise_size() -> u32 {
    256
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be a non-negative number"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl CanvasConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: CanvasConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads and validates `path`; relative paths inside resolve against
    /// its directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = read_file(path)?;
        let mut config = Self::from_toml_str(&input)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        tracing::debug!(
            path = %path.display(),
            textures = config.textures.len(),
            "loaded canvas config"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.fps.is_some() && self.frame_interval.is_some() {
            return Err(ConfigError::Invalid(
                "set either fps or frame_interval, not both".into(),
            ));
        }

        if let Some(fps) = self.fps {
            if !(fps.is_finite() && fps > 0.0) {
                return Err(ConfigError::Invalid("fps must be > 0".into()));
            }
        }

        if let Some(interval) = self.frame_interval {
            if interval.is_zero() {
                return Err(ConfigError::Invalid(
                    "frame_interval must be greater than zero".into(),
                ));
            }
        }

        if let Some(ratio) = self.ratio {
            if !(ratio.is_finite() && ratio > 0.0) {
                return Err(ConfigError::Invalid("ratio must be > 0".into()));
            }
        }

        let mut units = BTreeSet::new();
        for texture in &self.textures {
            let name = texture.name.trim();
            if name.is_empty() {
                return Err(ConfigError::Invalid(
                    "texture entry has an empty name".into(),
                ));
            }

            if texture.unit >= MAX_TEXTURE_UNITS {
                return Err(ConfigError::Invalid(format!(
                    "texture '{name}' unit {} must be below {MAX_TEXTURE_UNITS}",
                    texture.unit
                )));
            }

            if !units.insert(texture.unit) {
                return Err(ConfigError::Invalid(format!(
                    "texture '{name}' reuses unit {}",
                    texture.unit
                )));
            }

            match (&texture.source, &texture.noise) {
                (Some(_), Some(_)) => {
                    return Err(ConfigError::Invalid(format!(
                        "texture '{name}' sets both source and noise"
                    )))
                }
                (None, None) => {
                    return Err(ConfigError::Invalid(format!(
                        "texture '{name}' needs a source or noise"
                    )))
                }
                (Some(source), None) if source.trim().is_empty() => {
                    return Err(ConfigError::Invalid(format!(
                        "texture '{name}' has an empty source"
                    )))
                }
                (None, Some(noise)) if noise.size == 0 => {
                    return Err(ConfigError::Invalid(format!(
                        "texture '{name}' noise size must be > 0"
                    )))
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Frames per second after resolving `frame_interval`.
    pub fn fps(&self) -> f32 {
        match (self.fps, self.frame_interval) {
            (Some(fps), _) => fps,
            (None, Some(interval)) if !interval.is_zero() => 1.0 / interval.as_secs_f32(),
            _ => DEFAULT_FPS,
        }
    }

    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Reads the shader files and builds the session options.
    pub fn into_session_options(&self) -> Result<SessionOptions, ConfigError> {
        let read = |path: &Option<PathBuf>| -> Result<Option<String>, ConfigError> {
            path.as_deref()
                .map(|path| read_file(&self.resolve_path(path)))
                .transpose()
        };

        Ok(SessionOptions {
            fps: self.fps(),
            frame_interval: self.frame_interval,
            vert: read(&self.shader.vert)?,
            frag: read(&self.shader.frag)?,
            main: read(&self.shader.main)?,
            ratio: self.ratio,
            auto_play: self.auto_play,
            dialect: self.dialect,
            blend: self.blend,
        })
    }

    /// Where the pixels of `texture` come from.
    pub fn texture_source(&self, texture: &TextureEntry) -> ImageSource {
        if let Some(noise) = texture.noise {
            return ImageSource::Decoded(noise_image(noise.size, noise.size, noise.seed));
        }
        match ImageSource::parse(texture.source.as_deref().unwrap_or_default()) {
            ImageSource::Path(path) => ImageSource::Path(self.resolve_path(&path)),
            other => other,
        }
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
