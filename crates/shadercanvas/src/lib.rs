//! Full-screen fragment shader sessions.
//!
//! A [`RenderSession`] owns one linked program and one full-screen quad. Every
//! tick it refreshes a fixed set of uniforms and draws the quad:
//!
//! ```text
//!   host frame callback ──▶ RenderSession::on_frame(now)
//!                                 │ interval elapsed?
//!                                 ├─ no ──▶ request next frame
//!                                 └─ yes ─▶ clear ─▶ u_time/u_mouse/u_resolution/u_date/iResolution
//!                                                 ─▶ draw TRIANGLE_STRIP (4) ─▶ request next frame
//! ```
//!
//! The session is generic over three host seams so the same code runs in a
//! browser, against a desktop GL context, or headless:
//! - [`GlApi`]: graphics calls; [`GlowBackend`] forwards to `glow`.
//! - [`Surface`]: client size and backing-store resize.
//! - [`FrameScheduler`]: one-shot frame requests and cancellation.
//!
//! [`headless`] implements all three without a GPU. On `wasm32` the `web`
//! module wires a canvas, WebGL and `requestAnimationFrame` together.

mod compile;
pub mod gl;
pub mod headless;
mod images;
mod pointer;
mod session;
mod textures;
mod types;
mod uniforms;
#[cfg(target_arch = "wasm32")]
pub mod web;

mod error;

pub use compile::{
    compose_fragment, default_fragment, default_vertex, fragment_header, ProgramSources,
    POSITION_ATTRIBUTE,
};
pub use error::{ImageError, SessionError};
pub use gl::{GlApi, GlowBackend, ShaderStage};
pub use images::{
    decode_data_uri, decode_image_bytes, load_image, noise_image, ImageData, ImageSource,
};
pub use pointer::PointerState;
pub use session::{
    FrameHandle, FrameScheduler, RenderSession, Surface, TickOutcome, FULLSCREEN_QUAD,
};
pub use textures::TextureBinding;
pub use types::{
    host_ratio, BlendMode, SamplingParams, SessionOptions, ShaderDialect, TextureFilter,
    TextureOptions, TextureWrap, UniformValue, DEFAULT_FPS, DEFAULT_RATIO, MAX_HOST_RATIO,
    MAX_TEXTURE_UNITS,
};
pub use uniforms::{
    date_components, StandardUniforms, DATE_UNIFORM, LEGACY_RESOLUTION_UNIFORM, MOUSE_UNIFORM,
    RESOLUTION_UNIFORM, TIME_UNIFORM,
};

/// Re-exported so callers can build [`RenderSession`] timestamps on every target.
pub use instant::Instant;
