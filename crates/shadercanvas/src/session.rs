use std::time::Duration;

use instant::Instant;

use crate::compile::{create_program, ProgramSources, POSITION_ATTRIBUTE};
use crate::error::SessionError;
use crate::gl::GlApi;
use crate::images::ImageData;
use crate::pointer::PointerState;
use crate::textures::{upload_texture, TextureBinding};
use crate::types::{BlendMode, SessionOptions, TextureOptions, UniformValue};
use crate::uniforms::{StandardUniforms, UniformCache};

/// Corners of the full-screen triangle strip in clip space.
pub const FULLSCREEN_QUAD: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];

const QUAD_VERTEX_COUNT: i32 = 4;

/// Drawable area the session renders into.
pub trait Surface {
    /// Size in client (layout) pixels.
    fn client_size(&self) -> (f32, f32);
    /// Resizes the backing store in device pixels.
    fn set_backing_size(&mut self, width: u32, height: u32);
}

/// Identifies one outstanding frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Host facility that calls back once per display frame.
///
/// A request is one-shot; the session asks again from every tick.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Cleared, refreshed uniforms and drew the quad.
    Drawn,
    /// The frame interval had not elapsed; only rescheduled.
    Skipped,
    /// No frame was pending, so nothing ran.
    Idle,
}

/// A linked full-screen shader program plus its tick loop.
///
/// Time enters through the `now` arguments; `u_time` counts from the `now`
/// given to [`RenderSession::new`].
pub struct RenderSession<G: GlApi, S, F> {
    gl: G,
    surface: S,
    scheduler: F,
    program: G::Program,
    quad: G::Buffer,
    uniforms: UniformCache<G::UniformLocation>,
    textures: Vec<(G::Texture, TextureBinding)>,
    ratio: f32,
    frame_interval: Duration,
    blend: BlendMode,
    pointer: PointerState,
    started: Instant,
    last_render: Instant,
    pending: Option<FrameHandle>,
}

impl<G, S, F> RenderSession<G, S, F>
where
    G: GlApi,
    S: Surface,
    F: FrameScheduler,
{
    /// Sizes the surface, builds the program and quad, and writes the
    /// standard uniforms once. Starts the tick loop when `auto_play` is set.
    pub fn new(
        gl: G,
        mut surface: S,
        scheduler: F,
        options: &SessionOptions,
        now: Instant,
    ) -> Result<Self, SessionError> {
        let ratio = options.resolve_ratio(None);
        let backing = ensure_backing(&mut surface, ratio);
        apply_blend(&gl, options.blend);
        gl.viewport(backing.0 as i32, backing.1 as i32);

        let sources = ProgramSources::from_options(options);
        let program = create_program(&gl, &sources)?;
        let quad = upload_quad(&gl, program)?;

        let mut session = Self {
            gl,
            surface,
            scheduler,
            program,
            quad,
            uniforms: UniformCache::new(),
            textures: Vec::new(),
            ratio,
            frame_interval: options.frame_interval(),
            blend: options.blend,
            pointer: PointerState::default(),
            started: now,
            last_render: now,
            pending: None,
        };
        session.inject_standard(now);

        tracing::info!(
            width = backing.0,
            height = backing.1,
            ratio,
            interval_ms = session.frame_interval.as_secs_f64() * 1000.0,
            dialect = ?options.dialect,
            "render session ready"
        );

        if options.auto_play {
            session.play(now);
        }
        Ok(session)
    }

    /// (Re)starts the loop: drops any pending frame and ticks right away.
    pub fn play(&mut self, now: Instant) -> TickOutcome {
        self.cancel_pending();
        self.run_tick(now)
    }

    /// Cancels the pending frame. Returns whether one was cancelled.
    pub fn stop(&mut self) -> bool {
        let cancelled = self.cancel_pending();
        if cancelled {
            tracing::debug!("render loop stopped");
        }
        cancelled
    }

    /// Host callback for a fired frame request.
    pub fn on_frame(&mut self, now: Instant) -> TickOutcome {
        if self.pending.take().is_none() {
            return TickOutcome::Idle;
        }
        self.run_tick(now)
    }

    pub fn is_playing(&self) -> bool {
        self.pending.is_some()
    }

    /// Writes `value` to the uniform `name`. Names the program does not use
    /// are ignored.
    pub fn inject(&mut self, name: &str, value: impl Into<UniformValue>) {
        self.uniforms
            .write(&self.gl, self.program, name, value.into());
    }

    /// Uploads `image` to a new texture on `unit` and binds sampler `name`.
    pub fn inject_texture(
        &mut self,
        name: &str,
        unit: u32,
        image: &ImageData,
        options: &TextureOptions,
    ) -> Result<&TextureBinding, SessionError> {
        let (texture, binding) = upload_texture(
            &self.gl,
            &mut self.uniforms,
            self.program,
            name,
            unit,
            image,
            options,
        )?;
        self.textures.push((texture, binding));
        Ok(&self.textures[self.textures.len() - 1].1)
    }

    /// Records a pointer move at `(x, y)` client pixels from the top-left.
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        let (width, height) = self.surface.client_size();
        self.pointer.handle_moved(x, y, width, height);
    }

    pub fn set_blend(&mut self, mode: BlendMode) {
        apply_blend(&self.gl, mode);
        self.blend = mode;
    }

    /// Re-reads the client size and resizes the backing store and viewport.
    pub fn resize(&mut self) {
        let (width, height) = ensure_backing(&mut self.surface, self.ratio);
        self.gl.viewport(width as i32, height as i32);
        tracing::debug!(width, height, "surface resized");
    }

    /// The graphics backend, for calls beyond the session API.
    pub fn gl(&self) -> &G {
        &self.gl
    }

    pub fn program(&self) -> G::Program {
        self.program
    }

    pub fn quad_buffer(&self) -> G::Buffer {
        self.quad
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn scheduler(&self) -> &F {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut F {
        &mut self.scheduler
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn blend(&self) -> BlendMode {
        self.blend
    }

    pub fn pointer(&self) -> [f32; 2] {
        self.pointer.as_uniform()
    }

    pub fn textures(&self) -> impl Iterator<Item = &TextureBinding> {
        self.textures.iter().map(|(_, binding)| binding)
    }

    fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                self.scheduler.cancel_frame(handle);
                true
            }
            None => false,
        }
    }

    fn run_tick(&mut self, now: Instant) -> TickOutcome {
        self.pending = Some(self.scheduler.request_frame());

        if elapsed_between(self.last_render, now) < self.frame_interval {
            return TickOutcome::Skipped;
        }
        self.last_render = now;

        self.gl.clear_color([0.0, 0.0, 0.0, 0.0]);
        self.gl.clear(glow::COLOR_BUFFER_BIT);
        self.inject_standard(now);
        self.gl
            .draw_arrays(glow::TRIANGLE_STRIP, 0, QUAD_VERTEX_COUNT);
        TickOutcome::Drawn
    }

    fn inject_standard(&mut self, now: Instant) {
        let date = chrono::Local::now().naive_local();
        let standard = StandardUniforms::new(
            elapsed_between(self.started, now),
            self.pointer.as_uniform(),
            self.surface.client_size(),
            self.ratio,
            &date,
        );
        for (name, value) in standard.entries() {
            self.uniforms.write(&self.gl, self.program, name, value);
        }
    }
}

fn elapsed_between(earlier: Instant, later: Instant) -> Duration {
    if later > earlier {
        later - earlier
    } else {
        Duration::ZERO
    }
}

/// Sizes the backing store to `client × ratio` and returns it.
fn ensure_backing<S: Surface>(surface: &mut S, ratio: f32) -> (u32, u32) {
    let (width, height) = surface.client_size();
    let backing = ((width * ratio) as u32, (height * ratio) as u32);
    surface.set_backing_size(backing.0, backing.1);
    backing
}

pub(crate) fn apply_blend<G: GlApi>(gl: &G, mode: BlendMode) {
    gl.enable(glow::BLEND);
    gl.blend_equation_separate(glow::FUNC_ADD, glow::FUNC_ADD);
    match mode {
        BlendMode::Normal => gl.blend_func_separate(
            glow::SRC_ALPHA,
            glow::ONE_MINUS_SRC_ALPHA,
            glow::ONE,
            glow::ONE_MINUS_SRC_ALPHA,
        ),
        BlendMode::Add => gl.blend_func_separate(
            glow::SRC_ALPHA,
            glow::ONE,
            glow::ONE,
            glow::ONE_MINUS_SRC_ALPHA,
        ),
        BlendMode::Multiply => gl.blend_func_separate(
            glow::DST_COLOR,
            glow::ONE_MINUS_SRC_ALPHA,
            glow::ONE,
            glow::ONE_MINUS_SRC_ALPHA,
        ),
    }
}

fn upload_quad<G: GlApi>(gl: &G, program: G::Program) -> Result<G::Buffer, SessionError> {
    let buffer = gl.create_buffer().map_err(SessionError::BufferCreation)?;
    gl.bind_array_buffer(buffer);
    match gl.attrib_location(program, POSITION_ATTRIBUTE) {
        Some(index) => {
            gl.enable_vertex_attrib_array(index);
            gl.vertex_attrib_pointer_f32(index, 2);
        }
        None => tracing::warn!(
            attribute = POSITION_ATTRIBUTE,
            "vertex shader does not read the quad position"
        ),
    }
    gl.array_buffer_data(bytemuck::cast_slice(&FULLSCREEN_QUAD));
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{FixedSurface, GlCall, ManualScheduler, RecordingGl};

    type HeadlessSession = RenderSession<RecordingGl, FixedSurface, ManualScheduler>;

    fn session(options: &SessionOptions, now: Instant) -> HeadlessSession {
        RenderSession::new(
            RecordingGl::new(),
            FixedSurface::new(800.0, 600.0),
            ManualScheduler::new(),
            options,
            now,
        )
        .expect("session")
    }

    #[test]
    fn quad_is_uploaded_once_as_two_floats_per_vertex() {
        let s = session(&SessionOptions::default(), Instant::now());
        let gl = s.gl();
        assert_eq!(gl.count(|call| matches!(call, GlCall::CreateBuffer)), 1);
        assert!(gl
            .calls()
            .contains(&GlCall::VertexAttribPointer { index: 0, components: 2 }));
        let data = gl
            .calls()
            .into_iter()
            .find_map(|call| match call {
                GlCall::ArrayBufferData(data) => Some(data),
                _ => None,
            })
            .expect("buffer data");
        assert_eq!(data, bytemuck::cast_slice::<f32, u8>(&FULLSCREEN_QUAD).to_vec());
    }

    #[test]
    fn normal_blend_is_applied_at_start() {
        let s = session(&SessionOptions::default(), Instant::now());
        let calls = s.gl().calls();
        assert!(calls.contains(&GlCall::Enable(glow::BLEND)));
        assert!(calls.contains(&GlCall::BlendFunc([
            glow::SRC_ALPHA,
            glow::ONE_MINUS_SRC_ALPHA,
            glow::ONE,
            glow::ONE_MINUS_SRC_ALPHA,
        ])));
    }

    #[test]
    fn blend_modes_switch_factors() {
        let mut s = session(&SessionOptions::default(), Instant::now());
        s.set_blend(BlendMode::Add);
        assert_eq!(
            s.gl().calls().last(),
            Some(&GlCall::BlendFunc([
                glow::SRC_ALPHA,
                glow::ONE,
                glow::ONE,
                glow::ONE_MINUS_SRC_ALPHA,
            ]))
        );
        s.set_blend(BlendMode::Multiply);
        assert_eq!(
            s.gl().calls().last(),
            Some(&GlCall::BlendFunc([
                glow::DST_COLOR,
                glow::ONE_MINUS_SRC_ALPHA,
                glow::ONE,
                glow::ONE_MINUS_SRC_ALPHA,
            ]))
        );
        assert_eq!(s.blend(), BlendMode::Multiply);
    }

    #[test]
    fn ratio_scales_backing_store_and_viewport() {
        let options = SessionOptions {
            ratio: Some(2.0),
            ..SessionOptions::default()
        };
        let s = session(&options, Instant::now());
        assert_eq!(s.surface().backing_size(), Some((1600, 1200)));
        assert!(s.gl().calls().contains(&GlCall::Viewport(1600, 1200)));
        assert_eq!(
            s.gl().last_uniform("u_resolution"),
            Some(UniformValue::Vec2([1600.0, 1200.0]))
        );
        assert_eq!(
            s.gl().last_uniform("iResolution"),
            Some(UniformValue::Vec3([800.0, 600.0, 2.0]))
        );
    }

    #[test]
    fn resize_follows_the_client_size() {
        let mut s = session(&SessionOptions::default(), Instant::now());
        s.surface_mut().resize(1024.0, 768.0);
        s.resize();
        assert_eq!(s.surface().backing_size(), Some((1024, 768)));
        assert_eq!(s.gl().calls().last(), Some(&GlCall::Viewport(1024, 768)));
    }

    #[test]
    fn missing_position_attribute_does_not_fail() {
        let s = RenderSession::new(
            RecordingGl::new().without_attributes(),
            FixedSurface::new(10.0, 10.0),
            ManualScheduler::new(),
            &SessionOptions::default(),
            Instant::now(),
        )
        .expect("session");
        let calls = s.gl().calls();
        assert!(!calls.iter().any(|call| matches!(call, GlCall::EnableVertexAttribArray(_))));
        assert!(calls.iter().any(|call| matches!(call, GlCall::ArrayBufferData(_))));
    }
}
