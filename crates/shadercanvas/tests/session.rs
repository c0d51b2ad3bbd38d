use std::time::Duration;

use shadercanvas::headless::{FixedSurface, GlCall, ManualScheduler, RecordingGl};
use shadercanvas::{
    default_fragment, ImageData, Instant, RenderSession, SessionError, SessionOptions,
    ShaderDialect, ShaderStage, TextureOptions, TickOutcome, UniformValue,
};

type HeadlessSession = RenderSession<RecordingGl, FixedSurface, ManualScheduler>;

fn start(options: SessionOptions, now: Instant) -> HeadlessSession {
    RenderSession::new(
        RecordingGl::new(),
        FixedSurface::new(800.0, 600.0),
        ManualScheduler::new(),
        &options,
        now,
    )
    .expect("session")
}

fn draws(session: &HeadlessSession) -> usize {
    session
        .gl()
        .count(|call| matches!(call, GlCall::DrawArrays { .. }))
}

fn fragment_source(session: &HeadlessSession) -> String {
    session
        .gl()
        .calls()
        .into_iter()
        .find_map(|call| match call {
            GlCall::ShaderSource(ShaderStage::Fragment, source) => Some(source),
            _ => None,
        })
        .expect("fragment source")
}

#[test]
fn defaults_use_the_builtin_fragment_and_client_resolution() {
    let session = start(SessionOptions::default(), Instant::now());

    assert_eq!(fragment_source(&session), default_fragment(ShaderDialect::Gles300));
    assert_eq!(
        session.gl().last_uniform("u_resolution"),
        Some(UniformValue::Vec2([800.0, 600.0]))
    );
    assert_eq!(session.frame_interval(), Duration::from_millis(25));
    assert_eq!(session.surface().backing_size(), Some((800, 600)));
    assert!(!session.is_playing());
    assert_eq!(draws(&session), 0);
}

#[test]
fn main_body_gets_the_dialect_header() {
    let options = SessionOptions {
        dialect: ShaderDialect::Gles100,
        main: Some("void main() { gl_FragColor = vec4(u_mouse, 0.0, 1.0); }".into()),
        ..SessionOptions::default()
    };
    let session = start(options, Instant::now());
    let source = fragment_source(&session);
    assert!(source.starts_with("#ifdef GL_FRAGMENT_PRECISION_HIGH"));
    assert!(source.contains("precision mediump float;"));
    assert!(source.contains("uniform vec2 u_mouse;"));
    assert!(source.ends_with("void main() { gl_FragColor = vec4(u_mouse, 0.0, 1.0); }"));
}

#[test]
fn compile_failure_carries_the_log() {
    let gl = RecordingGl::new();
    gl.fail_compile(ShaderStage::Fragment, "ERROR: 0:3: 'foo' : undeclared identifier");
    let result = RenderSession::new(
        gl,
        FixedSurface::new(10.0, 10.0),
        ManualScheduler::new(),
        &SessionOptions::default(),
        Instant::now(),
    );
    match result {
        Err(SessionError::Compile { stage, log }) => {
            assert_eq!(stage, ShaderStage::Fragment);
            assert!(log.contains("undeclared identifier"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("session should not build"),
    }
}

#[test]
fn auto_play_schedules_the_first_frame() {
    let options = SessionOptions {
        auto_play: true,
        ..SessionOptions::default()
    };
    let session = start(options, Instant::now());
    assert!(session.is_playing());
    assert_eq!(session.scheduler().requested(), 1);
    assert!(session.scheduler().pending().is_some());
}

#[test]
fn ticks_draw_once_the_interval_has_elapsed() {
    let t0 = Instant::now();
    let mut session = start(SessionOptions::default(), t0);

    assert_eq!(session.play(t0), TickOutcome::Skipped);
    assert_eq!(draws(&session), 0);

    session.scheduler_mut().fire();
    assert_eq!(session.on_frame(t0 + Duration::from_millis(10)), TickOutcome::Skipped);
    assert_eq!(draws(&session), 0);
    assert!(session.scheduler().pending().is_some());

    session.scheduler_mut().fire();
    assert_eq!(session.on_frame(t0 + Duration::from_millis(30)), TickOutcome::Drawn);
    assert_eq!(draws(&session), 1);
    assert!(session.gl().calls().contains(&GlCall::DrawArrays {
        mode: glow::TRIANGLE_STRIP,
        first: 0,
        count: 4,
    }));
    match session.gl().last_uniform("u_time") {
        Some(UniformValue::Float(time)) => assert!((time - 0.03).abs() < 1e-6),
        other => panic!("unexpected u_time: {other:?}"),
    }
    assert_eq!(session.gl().uniform_values("u_date").len(), 1);
    match session.gl().last_uniform("u_date") {
        Some(UniformValue::Vec4([year, month, day, hours])) => {
            assert!(year >= 2000.0);
            assert!((1.0..=12.0).contains(&month));
            assert!((1.0..=31.0).contains(&day));
            assert!((0.0..24.0).contains(&hours));
        }
        other => panic!("unexpected u_date: {other:?}"),
    }
    assert!(matches!(
        session.gl().last_uniform("u_resolution"),
        Some(UniformValue::Vec2(_))
    ));
    assert_eq!(session.scheduler().requested(), 3);
}

#[test]
fn each_draw_clears_to_transparent_black_first() {
    let t0 = Instant::now();
    let mut session = start(SessionOptions::default(), t0);
    session.gl().clear_calls();

    session.play(t0 + Duration::from_millis(100));
    let calls = session.gl().calls();
    let clear = calls
        .iter()
        .position(|call| *call == GlCall::Clear(glow::COLOR_BUFFER_BIT))
        .expect("clear");
    let draw = calls
        .iter()
        .position(|call| matches!(call, GlCall::DrawArrays { .. }))
        .expect("draw");
    assert!(clear < draw);
    assert!(calls.contains(&GlCall::ClearColor([0.0, 0.0, 0.0, 0.0])));
}

#[test]
fn stop_is_idempotent() {
    let t0 = Instant::now();
    let mut session = start(SessionOptions::default(), t0);
    session.play(t0);

    assert!(session.stop());
    assert!(!session.stop());
    assert!(!session.is_playing());
    assert_eq!(session.scheduler().cancelled().len(), 1);
    assert!(session.scheduler().pending().is_none());
}

#[test]
fn stop_before_play_does_nothing() {
    let mut session = start(SessionOptions::default(), Instant::now());
    assert!(!session.stop());
    assert!(session.scheduler().cancelled().is_empty());
}

#[test]
fn playing_twice_keeps_a_single_pending_frame() {
    let t0 = Instant::now();
    let mut session = start(SessionOptions::default(), t0);
    session.play(t0);
    let first = session.scheduler().pending().expect("first request");
    session.play(t0);

    assert_eq!(session.scheduler().requested(), 2);
    assert_eq!(session.scheduler().cancelled(), &[first]);
    assert!(session.scheduler().pending().is_some());
    assert_ne!(session.scheduler().pending(), Some(first));
}

#[test]
fn frames_after_stop_are_idle() {
    let t0 = Instant::now();
    let mut session = start(SessionOptions::default(), t0);
    session.play(t0);
    session.stop();

    assert_eq!(session.on_frame(t0 + Duration::from_secs(1)), TickOutcome::Idle);
    assert_eq!(draws(&session), 0);
    assert_eq!(session.scheduler().requested(), 1);
}

#[test]
fn pointer_is_normalized_to_the_client_size() {
    let t0 = Instant::now();
    let mut session = start(SessionOptions::default(), t0);
    session.pointer_moved(800.0, 600.0);
    session.play(t0 + Duration::from_millis(50));
    assert_eq!(
        session.gl().last_uniform("u_mouse"),
        Some(UniformValue::Vec2([1.0, 1.0]))
    );

    session.pointer_moved(200.0, 450.0);
    assert_eq!(session.pointer(), [0.25, 0.75]);
}

#[test]
fn injected_values_reach_only_active_uniforms() {
    let gl = RecordingGl::new().with_active_uniforms(["u_time", "u_speed"]);
    let mut session = RenderSession::new(
        gl,
        FixedSurface::new(100.0, 100.0),
        ManualScheduler::new(),
        &SessionOptions::default(),
        Instant::now(),
    )
    .expect("session");

    session.inject("u_speed", 2.5_f32);
    assert_eq!(
        session.gl().last_uniform("u_speed"),
        Some(UniformValue::Float(2.5))
    );

    session.gl().clear_calls();
    session.inject("u_missing", [1.0_f32, 2.0]);
    assert_eq!(session.gl().uniform_values("u_missing"), Vec::new());
}

#[test]
fn textures_bind_their_unit_and_sampler() {
    let mut session = start(SessionOptions::default(), Instant::now());
    let image = ImageData::from_rgba8(1, 2, vec![255, 0, 0, 255, 0, 0, 255, 255]).expect("image");
    let options = TextureOptions {
        mipmap: true,
        ..TextureOptions::default()
    };

    let binding = session
        .inject_texture("u_noise", 3, &image, &options)
        .expect("texture")
        .clone();
    assert_eq!(binding.unit, 3);
    assert_eq!((binding.width, binding.height), (1, 2));

    let gl = session.gl();
    assert!(gl.calls().contains(&GlCall::ActiveTexture(glow::TEXTURE0 + 3)));
    assert!(gl.calls().contains(&GlCall::GenerateMipmap));
    assert!(gl.calls().contains(&GlCall::TexParameter {
        parameter: glow::TEXTURE_MIN_FILTER,
        value: glow::LINEAR_MIPMAP_LINEAR,
    }));
    assert_eq!(gl.last_uniform("u_noise"), Some(UniformValue::Int(3)));
    // Flipped so row 0 of the upload is the bottom of the image.
    assert!(gl.calls().contains(&GlCall::TexImage {
        width: 1,
        height: 2,
        pixels: vec![0, 0, 255, 255, 255, 0, 0, 255],
    }));
    assert_eq!(session.textures().count(), 1);
}

#[test]
fn out_of_range_texture_units_are_rejected() {
    let mut session = start(SessionOptions::default(), Instant::now());
    let image = ImageData::from_rgba8(1, 1, vec![0; 4]).expect("image");
    let err = session
        .inject_texture("u_tex", 32, &image, &TextureOptions::default())
        .expect_err("unit 32");
    assert!(matches!(err, SessionError::TextureUnit { unit: 32, max: 32 }));
    assert_eq!(session.textures().count(), 0);
}
