//! Host pieces that need no window or GPU.
//!
//! [`RecordingGl`] accepts every call and records it, [`ManualScheduler`]
//! only fires frames when asked and [`FixedSurface`] reports a fixed client
//! size. Together they drive a full [`RenderSession`](crate::RenderSession)
//! for tests and dry runs.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use crate::gl::{GlApi, ShaderStage};
use crate::session::{FrameHandle, FrameScheduler, Surface};
use crate::types::UniformValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessProgram(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessShader {
    pub id: u32,
    pub stage: ShaderStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessBuffer(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessTexture(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessLocation(pub String);

/// One recorded graphics call.
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateProgram,
    CreateShader(ShaderStage),
    ShaderSource(ShaderStage, String),
    CompileShader(ShaderStage),
    AttachShader(ShaderStage),
    DeleteShader(ShaderStage),
    LinkProgram,
    UseProgram,
    DeleteProgram,
    CreateBuffer,
    BindArrayBuffer,
    ArrayBufferData(Vec<u8>),
    EnableVertexAttribArray(u32),
    VertexAttribPointer { index: u32, components: i32 },
    /// `name` is `None` when the location was not found.
    Uniform {
        name: Option<String>,
        value: UniformValue,
    },
    CreateTexture,
    ActiveTexture(u32),
    BindTexture(u32),
    TexParameter { parameter: u32, value: u32 },
    TexImage {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
    GenerateMipmap,
    Enable(u32),
    BlendEquation(u32, u32),
    BlendFunc([u32; 4]),
    Viewport(i32, i32),
    ClearColor([f32; 4]),
    Clear(u32),
    DrawArrays { mode: u32, first: i32, count: i32 },
}

/// Graphics backend that records calls instead of rendering.
#[derive(Debug, Default)]
pub struct RecordingGl {
    calls: RefCell<Vec<GlCall>>,
    next_id: Cell<u32>,
    active_uniforms: Option<HashSet<String>>,
    attributes_missing: bool,
    compile_failure: RefCell<Option<(ShaderStage, String)>>,
    link_failure: RefCell<Option<String>>,
}

impl RecordingGl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts uniform lookups to `names`; every other name resolves to no
    /// location, like a uniform the linker optimised away.
    pub fn with_active_uniforms<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_uniforms = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Reports every vertex attribute as absent from the program.
    pub fn without_attributes(mut self) -> Self {
        self.attributes_missing = true;
        self
    }

    /// Makes every later compile of `stage` fail with `log`.
    pub fn fail_compile(&self, stage: ShaderStage, log: impl Into<String>) {
        *self.compile_failure.borrow_mut() = Some((stage, log.into()));
    }

    /// Makes every later link fail with `log`.
    pub fn fail_link(&self, log: impl Into<String>) {
        *self.link_failure.borrow_mut() = Some(log.into());
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn count(&self, predicate: impl Fn(&GlCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| predicate(call)).count()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Values written to `name`, oldest first.
    pub fn uniform_values(&self, name: &str) -> Vec<UniformValue> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                GlCall::Uniform {
                    name: Some(written),
                    value,
                } if written == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn last_uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniform_values(name).pop()
    }

    fn record(&self, call: GlCall) {
        self.calls.borrow_mut().push(call);
    }

    fn next_id(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn stage_fails(&self, stage: ShaderStage) -> bool {
        matches!(&*self.compile_failure.borrow(), Some((failing, _)) if *failing == stage)
    }
}

impl GlApi for RecordingGl {
    type Program = HeadlessProgram;
    type Shader = HeadlessShader;
    type Buffer = HeadlessBuffer;
    type Texture = HeadlessTexture;
    type UniformLocation = HeadlessLocation;

    fn create_program(&self) -> Result<Self::Program, String> {
        self.record(GlCall::CreateProgram);
        Ok(HeadlessProgram(self.next_id()))
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        self.record(GlCall::CreateShader(stage));
        Ok(HeadlessShader {
            id: self.next_id(),
            stage,
        })
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        self.record(GlCall::ShaderSource(shader.stage, source.to_owned()));
    }

    fn compile_shader(&self, shader: Self::Shader) {
        self.record(GlCall::CompileShader(shader.stage));
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        !self.stage_fails(shader.stage)
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        match &*self.compile_failure.borrow() {
            Some((stage, log)) if *stage == shader.stage => log.clone(),
            _ => String::new(),
        }
    }

    fn attach_shader(&self, _program: Self::Program, shader: Self::Shader) {
        self.record(GlCall::AttachShader(shader.stage));
    }

    fn delete_shader(&self, shader: Self::Shader) {
        self.record(GlCall::DeleteShader(shader.stage));
    }

    fn link_program(&self, _program: Self::Program) {
        self.record(GlCall::LinkProgram);
    }

    fn program_link_status(&self, _program: Self::Program) -> bool {
        self.link_failure.borrow().is_none()
    }

    fn program_info_log(&self, _program: Self::Program) -> String {
        self.link_failure.borrow().clone().unwrap_or_default()
    }

    fn use_program(&self, _program: Self::Program) {
        self.record(GlCall::UseProgram);
    }

    fn delete_program(&self, _program: Self::Program) {
        self.record(GlCall::DeleteProgram);
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        self.record(GlCall::CreateBuffer);
        Ok(HeadlessBuffer(self.next_id()))
    }

    fn bind_array_buffer(&self, _buffer: Self::Buffer) {
        self.record(GlCall::BindArrayBuffer);
    }

    fn array_buffer_data(&self, data: &[u8]) {
        self.record(GlCall::ArrayBufferData(data.to_vec()));
    }

    fn attrib_location(&self, _program: Self::Program, _name: &str) -> Option<u32> {
        (!self.attributes_missing).then_some(0)
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record(GlCall::EnableVertexAttribArray(index));
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32) {
        self.record(GlCall::VertexAttribPointer { index, components });
    }

    fn uniform_location(
        &self,
        _program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        match &self.active_uniforms {
            Some(active) if !active.contains(name) => None,
            _ => Some(HeadlessLocation(name.to_owned())),
        }
    }

    fn set_uniform(&self, location: Option<&Self::UniformLocation>, value: UniformValue) {
        self.record(GlCall::Uniform {
            name: location.map(|location| location.0.clone()),
            value,
        });
    }

    fn create_texture(&self) -> Result<Self::Texture, String> {
        self.record(GlCall::CreateTexture);
        Ok(HeadlessTexture(self.next_id()))
    }

    fn active_texture(&self, unit: u32) {
        self.record(GlCall::ActiveTexture(unit));
    }

    fn bind_texture_2d(&self, texture: Self::Texture) {
        self.record(GlCall::BindTexture(texture.0));
    }

    fn tex_parameter_2d(&self, parameter: u32, value: u32) {
        self.record(GlCall::TexParameter { parameter, value });
    }

    fn tex_image_2d_rgba(&self, width: u32, height: u32, pixels: &[u8]) {
        self.record(GlCall::TexImage {
            width,
            height,
            pixels: pixels.to_vec(),
        });
    }

    fn generate_mipmap_2d(&self) {
        self.record(GlCall::GenerateMipmap);
    }

    fn enable(&self, capability: u32) {
        self.record(GlCall::Enable(capability));
    }

    fn blend_equation_separate(&self, mode_rgb: u32, mode_alpha: u32) {
        self.record(GlCall::BlendEquation(mode_rgb, mode_alpha));
    }

    fn blend_func_separate(&self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32) {
        self.record(GlCall::BlendFunc([src_rgb, dst_rgb, src_alpha, dst_alpha]));
    }

    fn viewport(&self, width: i32, height: i32) {
        self.record(GlCall::Viewport(width, height));
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        self.record(GlCall::ClearColor(rgba));
    }

    fn clear(&self, mask: u32) {
        self.record(GlCall::Clear(mask));
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        self.record(GlCall::DrawArrays { mode, first, count });
    }
}

/// Frame scheduler that fires only when the caller says so.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next: u64,
    pending: Option<FrameHandle>,
    requested: usize,
    cancelled: Vec<FrameHandle>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The outstanding request, if any.
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Consumes the outstanding request as if the host fired it.
    pub fn fire(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn cancelled(&self) -> &[FrameHandle] {
        &self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        let handle = FrameHandle(self.next);
        if let Some(previous) = self.pending.replace(handle) {
            tracing::warn!(?previous, "frame requested while another was pending");
        }
        self.requested += 1;
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
        self.cancelled.push(handle);
    }
}

/// Surface with a caller-controlled client size.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSurface {
    client: (f32, f32),
    backing: Option<(u32, u32)>,
}

impl FixedSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            client: (width, height),
            backing: None,
        }
    }

    pub fn backing_size(&self) -> Option<(u32, u32)> {
        self.backing
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.client = (width, height);
    }
}

impl Surface for FixedSurface {
    fn client_size(&self) -> (f32, f32) {
        self.client
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.backing = Some((width, height));
    }
}
