use crate::gl::ShaderStage;

/// Failures while building or driving a render session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("graphics context creation failed: {0}")]
    ContextCreation(String),
    #[error("program creation failed: {0}")]
    ProgramCreation(String),
    #[error("{stage} shader creation failed: {reason}")]
    ShaderCreation { stage: ShaderStage, reason: String },
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("program failed to link:\n{log}")]
    Link { log: String },
    #[error("vertex buffer creation failed: {0}")]
    BufferCreation(String),
    #[error("texture creation failed: {0}")]
    TextureCreation(String),
    #[error("host integration failed: {0}")]
    Host(String),
    #[error("texture unit {unit} exceeds the supported range (0..{max})")]
    TextureUnit { unit: u32, max: u32 },
}

/// Failures while resolving an image for texture upload.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("failed to read image file: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(not(target_arch = "wasm32"))]
    #[error("failed to fetch image: {0}")]
    Http(#[from] reqwest::Error),
    #[error("image request returned status {0}")]
    Status(u16),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("malformed data URI: {0}")]
    DataUri(String),
    #[error("pixel buffer holds {actual} bytes; {width}x{height} RGBA needs {expected}")]
    PixelCount {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("image fetch failed: {0}")]
    Fetch(String),
}
