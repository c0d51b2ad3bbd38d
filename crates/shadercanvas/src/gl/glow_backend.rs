use glow::HasContext;

use super::{GlApi, ShaderStage};
use crate::types::UniformValue;

type Ctx = glow::Context;

/// [`GlApi`] over a `glow` context (desktop OpenGL or WebGL).
pub struct GlowBackend {
    context: Ctx,
}

impl GlowBackend {
    /// Wraps a `glow` context.
    ///
    /// # Safety
    ///
    /// The context must stay current on the calling thread for as long as the
    /// backend is used. WebGL contexts always satisfy this.
    pub unsafe fn new(context: Ctx) -> Self {
        Self { context }
    }

    /// Raw context, for callers that need GL features beyond the session API.
    pub fn context(&self) -> &Ctx {
        &self.context
    }

    pub fn into_inner(self) -> Ctx {
        self.context
    }
}

// Every call below forwards to `glow`; the construction contract of
// `GlowBackend::new` is what makes them sound.
impl GlApi for GlowBackend {
    type Program = <Ctx as HasContext>::Program;
    type Shader = <Ctx as HasContext>::Shader;
    type Buffer = <Ctx as HasContext>::Buffer;
    type Texture = <Ctx as HasContext>::Texture;
    type UniformLocation = <Ctx as HasContext>::UniformLocation;

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { self.context.create_program() }
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { self.context.create_shader(stage.gl_enum()) }
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe { self.context.shader_source(shader, source) }
    }

    fn compile_shader(&self, shader: Self::Shader) {
        unsafe { self.context.compile_shader(shader) }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.context.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.context.get_shader_info_log(shader) }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.context.attach_shader(program, shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.context.delete_shader(shader) }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe { self.context.link_program(program) }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.context.get_program_link_status(program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.context.get_program_info_log(program) }
    }

    fn use_program(&self, program: Self::Program) {
        unsafe { self.context.use_program(Some(program)) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.context.delete_program(program) }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { self.context.create_buffer() }
    }

    fn bind_array_buffer(&self, buffer: Self::Buffer) {
        unsafe { self.context.bind_buffer(glow::ARRAY_BUFFER, Some(buffer)) }
    }

    fn array_buffer_data(&self, data: &[u8]) {
        unsafe {
            self.context
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW)
        }
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.context.get_attrib_location(program, name) }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.context.enable_vertex_attrib_array(index) }
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32) {
        unsafe {
            self.context
                .vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, 0, 0)
        }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.context.get_uniform_location(program, name) }
    }

    fn set_uniform(&self, location: Option<&Self::UniformLocation>, value: UniformValue) {
        let gl = &self.context;
        unsafe {
            match value {
                UniformValue::Float(x) => gl.uniform_1_f32(location, x),
                UniformValue::Vec2([x, y]) => gl.uniform_2_f32(location, x, y),
                UniformValue::Vec3([x, y, z]) => gl.uniform_3_f32(location, x, y, z),
                UniformValue::Vec4([x, y, z, w]) => gl.uniform_4_f32(location, x, y, z, w),
                UniformValue::Int(x) => gl.uniform_1_i32(location, x),
                UniformValue::IVec2([x, y]) => gl.uniform_2_i32(location, x, y),
                UniformValue::IVec3([x, y, z]) => gl.uniform_3_i32(location, x, y, z),
                UniformValue::IVec4([x, y, z, w]) => gl.uniform_4_i32(location, x, y, z, w),
            }
        }
    }

    fn create_texture(&self) -> Result<Self::Texture, String> {
        unsafe { self.context.create_texture() }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.context.active_texture(unit) }
    }

    fn bind_texture_2d(&self, texture: Self::Texture) {
        unsafe { self.context.bind_texture(glow::TEXTURE_2D, Some(texture)) }
    }

    fn tex_parameter_2d(&self, parameter: u32, value: u32) {
        unsafe {
            self.context
                .tex_parameter_i32(glow::TEXTURE_2D, parameter, value as i32)
        }
    }

    fn tex_image_2d_rgba(&self, width: u32, height: u32, pixels: &[u8]) {
        unsafe {
            self.context.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(pixels),
            )
        }
    }

    fn generate_mipmap_2d(&self) {
        unsafe { self.context.generate_mipmap(glow::TEXTURE_2D) }
    }

    fn enable(&self, capability: u32) {
        unsafe { self.context.enable(capability) }
    }

    fn blend_equation_separate(&self, mode_rgb: u32, mode_alpha: u32) {
        unsafe { self.context.blend_equation_separate(mode_rgb, mode_alpha) }
    }

    fn blend_func_separate(&self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32) {
        unsafe {
            self.context
                .blend_func_separate(src_rgb, dst_rgb, src_alpha, dst_alpha)
        }
    }

    fn viewport(&self, width: i32, height: i32) {
        unsafe { self.context.viewport(0, 0, width, height) }
    }

    fn clear_color(&self, [r, g, b, a]: [f32; 4]) {
        unsafe { self.context.clear_color(r, g, b, a) }
    }

    fn clear(&self, mask: u32) {
        unsafe { self.context.clear(mask) }
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        unsafe { self.context.draw_arrays(mode, first, count) }
    }
}
