use crate::error::SessionError;
use crate::gl::GlApi;
use crate::images::ImageData;
use crate::types::{SamplingParams, TextureOptions, UniformValue, MAX_TEXTURE_UNITS};
use crate::uniforms::UniformCache;

/// Texture injected into a session and the sampler it feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBinding {
    pub name: String,
    pub unit: u32,
    pub width: u32,
    pub height: u32,
    pub sampling: SamplingParams,
}

/// Creates a texture on `unit`, uploads `image` and points `name` at it.
pub(crate) fn upload_texture<G: GlApi>(
    gl: &G,
    uniforms: &mut UniformCache<G::UniformLocation>,
    program: G::Program,
    name: &str,
    unit: u32,
    image: &ImageData,
    options: &TextureOptions,
) -> Result<(G::Texture, TextureBinding), SessionError> {
    if unit >= MAX_TEXTURE_UNITS {
        return Err(SessionError::TextureUnit {
            unit,
            max: MAX_TEXTURE_UNITS,
        });
    }

    let texture = gl.create_texture().map_err(SessionError::TextureCreation)?;
    let sampling = options.sampling();

    gl.active_texture(glow::TEXTURE0 + unit);
    gl.bind_texture_2d(texture);
    gl.tex_parameter_2d(glow::TEXTURE_MIN_FILTER, sampling.min_filter.gl_enum());
    gl.tex_parameter_2d(glow::TEXTURE_MAG_FILTER, sampling.mag_filter.gl_enum());
    gl.tex_parameter_2d(glow::TEXTURE_WRAP_S, sampling.wrap_s.gl_enum());
    gl.tex_parameter_2d(glow::TEXTURE_WRAP_T, sampling.wrap_t.gl_enum());

    uniforms.write(gl, program, name, UniformValue::Int(unit as i32));

    // GL reads row 0 as the bottom of the texture.
    if options.flip_y {
        let flipped = image.flipped_vertically();
        gl.tex_image_2d_rgba(flipped.width(), flipped.height(), flipped.pixels());
    } else {
        gl.tex_image_2d_rgba(image.width(), image.height(), image.pixels());
    }

    if sampling.generate_mipmap {
        gl.generate_mipmap_2d();
    }

    tracing::debug!(
        name,
        unit,
        width = image.width(),
        height = image.height(),
        mipmap = sampling.generate_mipmap,
        "uploaded texture"
    );

    Ok((
        texture,
        TextureBinding {
            name: name.to_owned(),
            unit,
            width: image.width(),
            height: image.height(),
            sampling,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{GlCall, HeadlessProgram, RecordingGl};
    use crate::types::{TextureFilter, TextureWrap};

    fn two_rows() -> ImageData {
        ImageData::from_rgba8(1, 2, vec![10, 10, 10, 255, 20, 20, 20, 255]).expect("image")
    }

    fn tex_parameters(gl: &RecordingGl) -> Vec<(u32, u32)> {
        gl.calls()
            .into_iter()
            .filter_map(|call| match call {
                GlCall::TexParameter { parameter, value } => Some((parameter, value)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn default_upload_is_linear_clamp_without_mipmaps() {
        let gl = RecordingGl::new();
        let mut cache = UniformCache::new();
        let (_, binding) = upload_texture(
            &gl,
            &mut cache,
            HeadlessProgram(1),
            "u_tex",
            2,
            &two_rows(),
            &TextureOptions::default(),
        )
        .expect("upload");

        assert_eq!(binding.unit, 2);
        assert!(gl.calls().contains(&GlCall::ActiveTexture(glow::TEXTURE2)));
        assert_eq!(
            tex_parameters(&gl),
            vec![
                (glow::TEXTURE_MIN_FILTER, glow::LINEAR),
                (glow::TEXTURE_MAG_FILTER, glow::LINEAR),
                (glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE),
                (glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE),
            ]
        );
        assert_eq!(gl.last_uniform("u_tex"), Some(UniformValue::Int(2)));
        assert_eq!(gl.count(|call| matches!(call, GlCall::GenerateMipmap)), 0);
    }

    #[test]
    fn mipmap_upload_selects_mipmap_filter_and_generates_chain() {
        let gl = RecordingGl::new();
        let mut cache = UniformCache::new();
        let options = TextureOptions {
            mipmap: true,
            ..TextureOptions::default()
        };
        upload_texture(&gl, &mut cache, HeadlessProgram(1), "u_tex", 0, &two_rows(), &options)
            .expect("upload");

        assert!(tex_parameters(&gl)
            .contains(&(glow::TEXTURE_MIN_FILTER, glow::LINEAR_MIPMAP_LINEAR)));
        let calls = gl.calls();
        let image_at = calls
            .iter()
            .position(|call| matches!(call, GlCall::TexImage { .. }))
            .expect("tex image");
        let mipmap_at = calls
            .iter()
            .position(|call| matches!(call, GlCall::GenerateMipmap))
            .expect("mipmap");
        assert!(mipmap_at > image_at);
    }

    #[test]
    fn overrides_reach_the_driver() {
        let gl = RecordingGl::new();
        let mut cache = UniformCache::new();
        let options = TextureOptions {
            mag_filter: Some(TextureFilter::Nearest),
            wrap_s: Some(TextureWrap::Repeat),
            ..TextureOptions::default()
        };
        upload_texture(&gl, &mut cache, HeadlessProgram(1), "u_tex", 0, &two_rows(), &options)
            .expect("upload");
        let params = tex_parameters(&gl);
        assert!(params.contains(&(glow::TEXTURE_MAG_FILTER, glow::NEAREST)));
        assert!(params.contains(&(glow::TEXTURE_WRAP_S, glow::REPEAT)));
    }

    #[test]
    fn flip_controls_row_order() {
        let gl = RecordingGl::new();
        let mut cache = UniformCache::new();
        upload_texture(
            &gl,
            &mut cache,
            HeadlessProgram(1),
            "u_tex",
            0,
            &two_rows(),
            &TextureOptions::default(),
        )
        .expect("upload");
        upload_texture(
            &gl,
            &mut cache,
            HeadlessProgram(1),
            "u_tex",
            0,
            &two_rows(),
            &TextureOptions {
                flip_y: false,
                ..TextureOptions::default()
            },
        )
        .expect("upload");

        let uploads: Vec<Vec<u8>> = gl
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                GlCall::TexImage { pixels, .. } => Some(pixels),
                _ => None,
            })
            .collect();
        assert_eq!(uploads[0][0], 20);
        assert_eq!(uploads[1][0], 10);
    }

    #[test]
    fn unit_out_of_range_is_rejected() {
        let gl = RecordingGl::new();
        let mut cache = UniformCache::new();
        let err = upload_texture(
            &gl,
            &mut cache,
            HeadlessProgram(1),
            "u_tex",
            MAX_TEXTURE_UNITS,
            &two_rows(),
            &TextureOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::TextureUnit { unit: 32, .. }));
        assert_eq!(gl.call_count(), 0);
    }
}
