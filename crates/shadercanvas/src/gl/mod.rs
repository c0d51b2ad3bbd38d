//! Narrow view of the graphics API used by a render session.
//!
//! A session only needs a few dozen GL entry points: shader/program objects,
//! one static vertex buffer, uniforms, 2D textures, blending and the clear/draw
//! pair. [`GlApi`] lists exactly those so the same session code drives:
//! - `glow`: a real OpenGL or WebGL context (see [`GlowBackend`]).
//! - `headless`: a recording backend for tests and dry runs.
//!
//! Enum arguments are the raw GL constants re-exported by `glow`, which keeps
//! recorded call traces comparable with what a driver would receive.

mod glow_backend;

use std::fmt;

pub use glow_backend::GlowBackend;

use crate::types::UniformValue;

/// Pipeline stage a shader object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Graphics calls issued by a render session.
///
/// Object creation returns the driver message on failure, mirroring `glow`.
pub trait GlApi {
    type Program: Copy + fmt::Debug;
    type Shader: Copy + fmt::Debug;
    type Buffer: Copy + fmt::Debug;
    type Texture: Copy + fmt::Debug;
    type UniformLocation: Clone + fmt::Debug;

    fn create_program(&self) -> Result<Self::Program, String>;
    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn delete_shader(&self, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn use_program(&self, program: Self::Program);
    fn delete_program(&self, program: Self::Program);

    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn bind_array_buffer(&self, buffer: Self::Buffer);
    /// Uploads `data` into the bound `ARRAY_BUFFER` with `STATIC_DRAW` usage.
    fn array_buffer_data(&self, data: &[u8]);
    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    fn enable_vertex_attrib_array(&self, index: u32);
    /// Describes tightly packed `f32` components at offset zero.
    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32);

    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;
    /// Writes `value` through the matching `glUniform*` entry point.
    ///
    /// A `None` location is accepted and ignored, as GL does.
    fn set_uniform(&self, location: Option<&Self::UniformLocation>, value: UniformValue);

    fn create_texture(&self) -> Result<Self::Texture, String>;
    fn active_texture(&self, unit: u32);
    fn bind_texture_2d(&self, texture: Self::Texture);
    fn tex_parameter_2d(&self, parameter: u32, value: u32);
    /// Uploads tightly packed RGBA8 pixels to level 0 of the bound 2D texture.
    fn tex_image_2d_rgba(&self, width: u32, height: u32, pixels: &[u8]);
    fn generate_mipmap_2d(&self);

    fn enable(&self, capability: u32);
    fn blend_equation_separate(&self, mode_rgb: u32, mode_alpha: u32);
    fn blend_func_separate(&self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32);
    fn viewport(&self, width: i32, height: i32);
    fn clear_color(&self, rgba: [f32; 4]);
    fn clear(&self, mask: u32);
    fn draw_arrays(&self, mode: u32, first: i32, count: i32);
}
