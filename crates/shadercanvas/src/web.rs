//! Browser host: canvas surface, WebGL context, `requestAnimationFrame`
//! scheduling and the pointer listener.
//!
//! The session lives behind `Rc<RefCell<_>>`; the frame callback and the
//! listeners only hold weak references, so dropping the [`WebSession`]
//! tears everything down.

use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlCanvasElement, PointerEvent, WebGl2RenderingContext, WebGlRenderingContext};

use crate::error::{ImageError, SessionError};
use crate::gl::GlowBackend;
use crate::images::{decode_image_bytes, load_image, ImageData, ImageSource};
use crate::session::{FrameHandle, FrameScheduler, RenderSession, Surface};
use crate::textures::TextureBinding;
use crate::types::{host_ratio, SessionOptions, ShaderDialect, TextureOptions, UniformValue};

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;
type CanvasSession = RenderSession<GlowBackend, CanvasSurface, AnimationFrameScheduler>;

/// `<canvas>` element as a [`Surface`].
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas }
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl Surface for CanvasSurface {
    fn client_size(&self) -> (f32, f32) {
        (
            self.canvas.client_width() as f32,
            self.canvas.client_height() as f32,
        )
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }
}

/// [`FrameScheduler`] over `window.requestAnimationFrame`.
pub struct AnimationFrameScheduler {
    window: web_sys::Window,
    callback: FrameCallback,
}

impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let callback = self.callback.borrow();
        let Some(callback) = callback.as_ref() else {
            tracing::warn!("frame requested before the callback was installed");
            return FrameHandle(0);
        };
        match self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(id) => FrameHandle(id as u64),
            Err(err) => {
                tracing::error!(error = %describe(&err), "requestAnimationFrame failed");
                FrameHandle(0)
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Err(err) = self.window.cancel_animation_frame(handle.0 as i32) {
            tracing::warn!(error = %describe(&err), "cancelAnimationFrame failed");
        }
    }
}

/// A render session bound to a canvas.
///
/// Dropping it (or calling [`WebSession::destroy`]) stops the loop and
/// detaches every listener it installed.
pub struct WebSession {
    session: Rc<RefCell<CanvasSession>>,
    canvas: HtmlCanvasElement,
    window: web_sys::Window,
    frame_callback: FrameCallback,
    pointer_listener: Option<Closure<dyn FnMut(PointerEvent)>>,
    resize_listener: Option<Closure<dyn FnMut()>>,
}

impl WebSession {
    /// Creates the WebGL context, builds the session and starts listening
    /// for pointer moves. The ratio defaults to the display's device pixel
    /// ratio capped at 2.
    pub fn init(canvas: HtmlCanvasElement, options: SessionOptions) -> Result<Self, SessionError> {
        let window = web_sys::window()
            .ok_or_else(|| SessionError::Host("no global window".into()))?;
        let mut options = options;
        options.ratio = Some(options.resolve_ratio(Some(host_ratio(window.device_pixel_ratio()))));
        // Playing needs the frame callback, which needs the session first.
        let auto_play = std::mem::replace(&mut options.auto_play, false);

        let context = create_context(&canvas, options.dialect)?;
        // SAFETY: a WebGL context is current for its whole lifetime.
        let gl = unsafe { GlowBackend::new(context) };

        let frame_callback: FrameCallback = Rc::new(RefCell::new(None));
        let scheduler = AnimationFrameScheduler {
            window: window.clone(),
            callback: frame_callback.clone(),
        };
        let session = RenderSession::new(
            gl,
            CanvasSurface::new(canvas.clone()),
            scheduler,
            &options,
            instant::Instant::now(),
        )?;
        let session = Rc::new(RefCell::new(session));

        let weak = Rc::downgrade(&session);
        *frame_callback.borrow_mut() = Some(Closure::wrap(Box::new(move |_timestamp: f64| {
            if let Some(session) = weak.upgrade() {
                session.borrow_mut().on_frame(instant::Instant::now());
            }
        }) as Box<dyn FnMut(f64)>));

        let pointer_listener = pointer_listener(Rc::downgrade(&session));
        canvas
            .add_event_listener_with_callback("pointermove", pointer_listener.as_ref().unchecked_ref())
            .map_err(|err| SessionError::Host(describe(&err)))?;

        let web = Self {
            session,
            canvas,
            window,
            frame_callback,
            pointer_listener: Some(pointer_listener),
            resize_listener: None,
        };
        if auto_play {
            web.play();
        }
        Ok(web)
    }

    pub fn play(&self) {
        self.session.borrow_mut().play(instant::Instant::now());
    }

    pub fn stop(&self) {
        self.session.borrow_mut().stop();
    }

    pub fn is_playing(&self) -> bool {
        self.session.borrow().is_playing()
    }

    pub fn inject(&self, name: &str, value: impl Into<UniformValue>) {
        self.session.borrow_mut().inject(name, value);
    }

    pub fn inject_texture(
        &self,
        name: &str,
        unit: u32,
        image: &ImageData,
        options: &TextureOptions,
    ) -> Result<TextureBinding, SessionError> {
        self.session
            .borrow_mut()
            .inject_texture(name, unit, image, options)
            .cloned()
    }

    /// Raw `glow` context of the session.
    pub fn gl(&self) -> Ref<'_, glow::Context> {
        Ref::map(self.session.borrow(), |session| session.gl().context())
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Resizes the backing store whenever the window resizes.
    pub fn listen_resize(&mut self) -> Result<(), SessionError> {
        if self.resize_listener.is_some() {
            return Ok(());
        }
        let weak = Rc::downgrade(&self.session);
        let listener = Closure::wrap(Box::new(move || {
            if let Some(session) = weak.upgrade() {
                session.borrow_mut().resize();
            }
        }) as Box<dyn FnMut()>);
        self.window
            .add_event_listener_with_callback("resize", listener.as_ref().unchecked_ref())
            .map_err(|err| SessionError::Host(describe(&err)))?;
        self.resize_listener = Some(listener);
        Ok(())
    }

    /// Stops the loop and removes the listeners. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        if let Ok(mut session) = self.session.try_borrow_mut() {
            session.stop();
        }
        if let Some(listener) = self.pointer_listener.take() {
            if let Err(err) = self
                .canvas
                .remove_event_listener_with_callback("pointermove", listener.as_ref().unchecked_ref())
            {
                tracing::warn!(error = %describe(&err), "removing pointermove listener failed");
            }
        }
        if let Some(listener) = self.resize_listener.take() {
            if let Err(err) = self
                .window
                .remove_event_listener_with_callback("resize", listener.as_ref().unchecked_ref())
            {
                tracing::warn!(error = %describe(&err), "removing resize listener failed");
            }
        }
        self.frame_callback.borrow_mut().take();
    }
}

impl Drop for WebSession {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Appends a viewport-filling canvas to `<body>` and starts a session on it.
pub fn render_full_screen_canvas(options: SessionOptions) -> Result<WebSession, SessionError> {
    let window = web_sys::window().ok_or_else(|| SessionError::Host("no global window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| SessionError::Host("no document".into()))?;
    let body = document
        .body()
        .ok_or_else(|| SessionError::Host("document has no body".into()))?;

    let canvas: HtmlCanvasElement = document
        .create_element("canvas")
        .map_err(|err| SessionError::Host(describe(&err)))?
        .dyn_into()
        .map_err(|_| SessionError::Host("created element is not a canvas".into()))?;

    let body_style = body.style();
    body_style.set_css_text(&format!("{}margin:0;padding:0;", body_style.css_text()));
    canvas
        .style()
        .set_css_text("display:block;width:100vw;height:100vh;background:transparent;");
    body.append_child(&canvas)
        .map_err(|err| SessionError::Host(describe(&err)))?;

    let mut session = WebSession::init(canvas, options)?;
    session.listen_resize()?;
    Ok(session)
}

/// Fetches and decodes an image over HTTP.
pub async fn fetch_image(url: &str) -> Result<ImageData, ImageError> {
    let window = web_sys::window().ok_or_else(|| ImageError::Fetch("no global window".into()))?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|err| ImageError::Fetch(describe(&err)))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|_| ImageError::Fetch("fetch did not resolve to a Response".into()))?;
    if !response.ok() {
        return Err(ImageError::Status(response.status()));
    }
    let buffer = response
        .array_buffer()
        .map_err(|err| ImageError::Fetch(describe(&err)))?;
    let buffer = JsFuture::from(buffer)
        .await
        .map_err(|err| ImageError::Fetch(describe(&err)))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    tracing::debug!(url, bytes = bytes.len(), "fetched image");
    decode_image_bytes(&bytes)
}

/// Browser counterpart of [`load_image`]: URLs go through `fetch`.
pub async fn load_image_async(source: ImageSource) -> Result<ImageData, ImageError> {
    match source {
        ImageSource::Url(url) => fetch_image(&url).await,
        other => load_image(other),
    }
}

fn pointer_listener(session: Weak<RefCell<CanvasSession>>) -> Closure<dyn FnMut(PointerEvent)> {
    Closure::wrap(Box::new(move |event: PointerEvent| {
        let Some(session) = session.upgrade() else {
            return;
        };
        // A move dispatched while a tick holds the session is dropped.
        if let Ok(mut session) = session.try_borrow_mut() {
            session.pointer_moved(event.offset_x() as f32, event.offset_y() as f32);
        };
    }) as Box<dyn FnMut(PointerEvent)>)
}

fn create_context(
    canvas: &HtmlCanvasElement,
    dialect: ShaderDialect,
) -> Result<glow::Context, SessionError> {
    let attributes = js_sys::Object::new();
    for (key, value) in [("alpha", true), ("depth", true), ("premultipliedAlpha", true)] {
        js_sys::Reflect::set(&attributes, &JsValue::from_str(key), &JsValue::from_bool(value))
            .map_err(|err| SessionError::ContextCreation(describe(&err)))?;
    }

    let kind = match dialect {
        ShaderDialect::Gles100 => "webgl",
        ShaderDialect::Gles300 => "webgl2",
    };
    let context = canvas
        .get_context_with_context_options(kind, &attributes)
        .map_err(|err| SessionError::ContextCreation(describe(&err)))?
        .ok_or_else(|| SessionError::ContextCreation(format!("{kind} is not available")))?;

    let context = match dialect {
        ShaderDialect::Gles100 => context
            .dyn_into::<WebGlRenderingContext>()
            .map(glow::Context::from_webgl1_context),
        ShaderDialect::Gles300 => context
            .dyn_into::<WebGl2RenderingContext>()
            .map(glow::Context::from_webgl2_context),
    }
    .map_err(|_| SessionError::ContextCreation(format!("unexpected {kind} context type")))?;
    tracing::debug!(kind, "created graphics context");
    Ok(context)
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
