use anyhow::{Context, Result};
use canvasconfig::CanvasConfig;
use shadercanvas::{
    load_image, noise_image, FrameScheduler, GlApi, ImageData, RenderSession, SessionOptions,
    ShaderDialect, Surface, TextureOptions, TextureWrap,
};

/// Fragment body played when no config names a shader.
pub const DEMO_SHADER: &str = include_str!("../shaders/demo.frag");

const NOISE_UNIFORM: &str = "u_noise";
const NOISE_SIZE: u32 = 256;
const NOISE_SEED: u64 = 7;

/// A texture resolved and ready for upload.
pub struct PreparedTexture {
    pub name: String,
    pub unit: u32,
    pub image: ImageData,
    pub options: TextureOptions,
}

/// Session options for the bundled demo shader.
pub fn bundled_options() -> SessionOptions {
    SessionOptions {
        main: Some(DEMO_SHADER.to_owned()),
        ..SessionOptions::default()
    }
}

/// The noise texture the bundled shader samples.
pub fn bundled_textures() -> Vec<PreparedTexture> {
    vec![PreparedTexture {
        name: NOISE_UNIFORM.to_owned(),
        unit: 0,
        image: noise_image(NOISE_SIZE, NOISE_SIZE, NOISE_SEED),
        options: TextureOptions {
            mipmap: true,
            wrap_s: Some(TextureWrap::Repeat),
            wrap_t: Some(TextureWrap::Repeat),
            ..TextureOptions::default()
        },
    }]
}

/// Options from `config`, or the bundled demo. `dialect` overrides both.
pub fn session_options(
    config: Option<&CanvasConfig>,
    dialect: Option<ShaderDialect>,
) -> Result<SessionOptions> {
    let mut options = match config {
        Some(config) => config
            .into_session_options()
            .context("failed to build session options from config")?,
        None => bundled_options(),
    };
    if let Some(dialect) = dialect {
        options.dialect = dialect;
    }
    Ok(options)
}

/// Loads every texture `config` lists; the bundled noise without a config.
pub fn prepare_textures(config: Option<&CanvasConfig>) -> Result<Vec<PreparedTexture>> {
    let Some(config) = config else {
        return Ok(bundled_textures());
    };

    config
        .textures
        .iter()
        .map(|entry| {
            let image = load_image(config.texture_source(entry))
                .with_context(|| format!("failed to load texture '{}'", entry.name))?;
            Ok(PreparedTexture {
                name: entry.name.clone(),
                unit: entry.unit,
                image,
                options: entry.options,
            })
        })
        .collect()
}

pub fn inject_textures<G, S, F>(
    session: &mut RenderSession<G, S, F>,
    textures: &[PreparedTexture],
) -> Result<()>
where
    G: GlApi,
    S: Surface,
    F: FrameScheduler,
{
    for texture in textures {
        let binding = session
            .inject_texture(&texture.name, texture.unit, &texture.image, &texture.options)
            .with_context(|| format!("failed to bind texture '{}'", texture.name))?;
        tracing::debug!(
            name = %binding.name,
            unit = binding.unit,
            width = binding.width,
            height = binding.height,
            "bound texture"
        );
    }
    Ok(())
}
