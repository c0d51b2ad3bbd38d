use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Frame rate used when the caller does not pick one.
pub const DEFAULT_FPS: f32 = 40.0;

/// Pixel ratio used when the caller does not pick one.
pub const DEFAULT_RATIO: f32 = 1.0;

/// Upper bound on device pixel ratios taken from the host display.
pub const MAX_HOST_RATIO: f32 = 2.0;

/// GL exposes `TEXTURE0..=TEXTURE31`.
pub const MAX_TEXTURE_UNITS: u32 = 32;

/// GLSL flavour used for the built-in sources and the main-body header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderDialect {
    /// GLSL ES 1.00 (WebGL1): `attribute`/`varying`, `gl_FragColor`.
    Gles100,
    /// GLSL ES 3.00 (WebGL2): `in`/`out`, explicit `fragColor` output.
    #[default]
    Gles300,
}

/// Blend equations applied to the fragment output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Classic source-over alpha blending.
    #[default]
    Normal,
    /// Source is added on top of the destination.
    Add,
    /// Destination colour multiplies the source.
    Multiply,
}

/// Value written to a shader uniform.
///
/// Each variant maps onto one `glUniform*` entry point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Int(i32),
    IVec2([i32; 2]),
    IVec3([i32; 3]),
    IVec4([i32; 4]),
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(value: [f32; 2]) -> Self {
        Self::Vec2(value)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(value: [f32; 3]) -> Self {
        Self::Vec3(value)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(value: [f32; 4]) -> Self {
        Self::Vec4(value)
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

/// Texture minification/magnification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl TextureFilter {
    pub fn gl_enum(self) -> u32 {
        match self {
            TextureFilter::Nearest => glow::NEAREST,
            TextureFilter::Linear => glow::LINEAR,
            TextureFilter::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
            TextureFilter::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
            TextureFilter::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
            TextureFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
        }
    }
}

/// Texture coordinate wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureWrap {
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

impl TextureWrap {
    pub fn gl_enum(self) -> u32 {
        match self {
            TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE,
            TextureWrap::Repeat => glow::REPEAT,
            TextureWrap::MirroredRepeat => glow::MIRRORED_REPEAT,
        }
    }
}

/// Options for [`RenderSession::inject_texture`](crate::RenderSession::inject_texture).
///
/// | field        | default                                             |
/// |--------------|-----------------------------------------------------|
/// | `flip_y`     | `true` (row 0 of the image lands at `v = 1`)        |
/// | `mipmap`     | `false`                                             |
/// | `min_filter` | `Linear`, or `LinearMipmapLinear` with `mipmap`     |
/// | `mag_filter` | `Linear`                                            |
/// | `wrap_s`     | `ClampToEdge`                                       |
/// | `wrap_t`     | `ClampToEdge`                                       |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureOptions {
    pub flip_y: bool,
    pub mipmap: bool,
    pub min_filter: Option<TextureFilter>,
    pub mag_filter: Option<TextureFilter>,
    pub wrap_s: Option<TextureWrap>,
    pub wrap_t: Option<TextureWrap>,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            flip_y: true,
            mipmap: false,
            min_filter: None,
            mag_filter: None,
            wrap_s: None,
            wrap_t: None,
        }
    }
}

/// Sampling state after defaults have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingParams {
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub wrap_s: TextureWrap,
    pub wrap_t: TextureWrap,
    pub generate_mipmap: bool,
}

impl TextureOptions {
    pub fn sampling(&self) -> SamplingParams {
        let default_min = if self.mipmap {
            TextureFilter::LinearMipmapLinear
        } else {
            TextureFilter::Linear
        };
        SamplingParams {
            min_filter: self.min_filter.unwrap_or(default_min),
            mag_filter: self.mag_filter.unwrap_or(TextureFilter::Linear),
            wrap_s: self.wrap_s.unwrap_or(TextureWrap::ClampToEdge),
            wrap_t: self.wrap_t.unwrap_or(TextureWrap::ClampToEdge),
            generate_mipmap: self.mipmap,
        }
    }
}

/// Immutable configuration passed to a render session at start-up.
///
/// Shader sources resolve in this order: `frag` verbatim, then `main`
/// appended to the dialect header, then the dialect's built-in fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Upper bound on drawn frames per second.
    pub fps: f32,
    /// Exact minimum time between drawn frames; wins over `fps` when non-zero.
    pub frame_interval: Option<Duration>,
    /// Custom vertex shader; the dialect default when `None`.
    pub vert: Option<String>,
    /// Complete custom fragment shader.
    pub frag: Option<String>,
    /// Fragment body appended to the standard uniform header.
    pub main: Option<String>,
    /// Backing-store pixels per client pixel; [`DEFAULT_RATIO`] when `None`.
    pub ratio: Option<f32>,
    /// Start the tick loop as soon as the session is built.
    pub auto_play: bool,
    pub dialect: ShaderDialect,
    pub blend: BlendMode,
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum time between two drawn frames.
    pub fn frame_interval(&self) -> Duration {
        if let Some(interval) = self.frame_interval.filter(|interval| !interval.is_zero()) {
            interval
        } else if self.fps.is_finite() && self.fps > 0.0 {
            Duration::from_secs_f64(1.0 / f64::from(self.fps))
        } else {
            Duration::from_secs_f64(1.0 / f64::from(DEFAULT_FPS))
        }
    }

    /// Ratio to use, falling back to `host_default` and then [`DEFAULT_RATIO`].
    pub fn resolve_ratio(&self, host_default: Option<f32>) -> f32 {
        self.ratio
            .or(host_default)
            .filter(|ratio| ratio.is_finite() && *ratio > 0.0)
            .unwrap_or(DEFAULT_RATIO)
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            frame_interval: None,
            vert: None,
            frag: None,
            main: None,
            ratio: None,
            auto_play: false,
            dialect: ShaderDialect::default(),
            blend: BlendMode::default(),
        }
    }
}

/// Clamps a host-reported device pixel ratio into `(0, MAX_HOST_RATIO]`.
pub fn host_ratio(device_pixel_ratio: f64) -> f32 {
    if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        (device_pixel_ratio as f32).min(MAX_HOST_RATIO)
    } else {
        DEFAULT_RATIO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sampling_is_single_level_linear_clamp() {
        let params = TextureOptions::default().sampling();
        assert_eq!(params.min_filter, TextureFilter::Linear);
        assert_eq!(params.mag_filter, TextureFilter::Linear);
        assert_eq!(params.wrap_s, TextureWrap::ClampToEdge);
        assert_eq!(params.wrap_t, TextureWrap::ClampToEdge);
        assert!(!params.generate_mipmap);
    }

    #[test]
    fn mipmap_switches_min_filter_only() {
        let options = TextureOptions {
            mipmap: true,
            ..TextureOptions::default()
        };
        let params = options.sampling();
        assert_eq!(params.min_filter, TextureFilter::LinearMipmapLinear);
        assert_eq!(params.mag_filter, TextureFilter::Linear);
        assert!(params.generate_mipmap);
    }

    #[test]
    fn overrides_win_over_defaults() {
        let options = TextureOptions {
            mipmap: true,
            min_filter: Some(TextureFilter::NearestMipmapNearest),
            wrap_s: Some(TextureWrap::Repeat),
            wrap_t: Some(TextureWrap::MirroredRepeat),
            ..TextureOptions::default()
        };
        let params = options.sampling();
        assert_eq!(params.min_filter, TextureFilter::NearestMipmapNearest);
        assert_eq!(params.wrap_s, TextureWrap::Repeat);
        assert_eq!(params.wrap_t, TextureWrap::MirroredRepeat);
    }

    #[test]
    fn frame_interval_follows_fps() {
        let options = SessionOptions::default();
        assert_eq!(options.frame_interval(), Duration::from_millis(25));

        let options = SessionOptions {
            fps: 0.0,
            ..SessionOptions::default()
        };
        assert_eq!(options.frame_interval(), Duration::from_millis(25));
    }

    #[test]
    fn explicit_interval_wins_over_fps() {
        let options = SessionOptions {
            fps: 10.0,
            frame_interval: Some(Duration::from_millis(16)),
            ..SessionOptions::default()
        };
        assert_eq!(options.frame_interval(), Duration::from_millis(16));

        let options = SessionOptions {
            fps: 10.0,
            frame_interval: Some(Duration::ZERO),
            ..SessionOptions::default()
        };
        assert_eq!(options.frame_interval(), Duration::from_millis(100));
    }

    #[test]
    fn ratio_prefers_explicit_then_host() {
        let mut options = SessionOptions::default();
        assert_eq!(options.resolve_ratio(None), 1.0);
        assert_eq!(options.resolve_ratio(Some(1.5)), 1.5);
        options.ratio = Some(3.0);
        assert_eq!(options.resolve_ratio(Some(1.5)), 3.0);
        options.ratio = Some(-1.0);
        assert_eq!(options.resolve_ratio(Some(1.5)), 1.0);
    }

    #[test]
    fn host_ratio_is_capped() {
        assert_eq!(host_ratio(1.0), 1.0);
        assert_eq!(host_ratio(3.5), 2.0);
        assert_eq!(host_ratio(f64::NAN), 1.0);
    }
}
