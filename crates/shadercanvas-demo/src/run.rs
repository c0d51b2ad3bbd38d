use std::time::Duration;

use anyhow::{Context, Result};
use canvasconfig::CanvasConfig;
use serde::Serialize;
use shadercanvas::headless::{FixedSurface, GlCall, ManualScheduler, RecordingGl};
use shadercanvas::{noise_image, Instant, ProgramSources, RenderSession, TickOutcome};
use tracing_subscriber::EnvFilter;

use crate::bindings::{inject_textures, prepare_textures, session_options};
use crate::cli::{Cli, Command, ComposeArgs, DryRunArgs, NoiseArgs};

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    match cli.command {
        Command::Compose(args) => compose(args),
        Command::DryRun(args) => dry_run(args),
        Command::Noise(args) => noise(args),
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&std::path::Path>) -> Result<Option<CanvasConfig>> {
    path.map(|path| {
        CanvasConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))
    })
    .transpose()
}

fn compose(args: ComposeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let options = session_options(config.as_ref(), args.dialect)?;
    let sources = ProgramSources::from_options(&options);
    tracing::debug!(dialect = ?options.dialect, "composed program sources");

    println!("// vertex");
    println!("{}", sources.vertex.trim_end());
    println!();
    println!("// fragment");
    println!("{}", sources.fragment.trim_end());
    Ok(())
}

/// Outcome of a dry run.
#[derive(Debug, Default, Serialize)]
pub struct DryRunReport {
    pub frames: u32,
    pub drawn: u32,
    pub skipped: u32,
    pub idle: u32,
    pub frame_interval_ms: f64,
    pub elapsed_ms: u64,
    pub gl_calls: usize,
    pub uniform_writes: usize,
    pub frame_requests: usize,
    pub textures: Vec<String>,
}

impl DryRunReport {
    fn record(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Drawn => self.drawn += 1,
            TickOutcome::Skipped => self.skipped += 1,
            TickOutcome::Idle => self.idle += 1,
        }
    }
}

fn dry_run(args: DryRunArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut options = session_options(config.as_ref(), None)?;
    // Playing is driven below so every tick is counted.
    options.auto_play = false;
    let textures = prepare_textures(config.as_ref())?;

    let (width, height) = args.size;
    let started = Instant::now();
    let mut session = RenderSession::new(
        RecordingGl::new(),
        FixedSurface::new(width as f32, height as f32),
        ManualScheduler::new(),
        &options,
        started,
    )
    .context("failed to start render session")?;
    inject_textures(&mut session, &textures)?;

    let step = Duration::from_millis(args.step_ms);
    let mut report = DryRunReport {
        frames: args.frames,
        frame_interval_ms: session.frame_interval().as_secs_f64() * 1000.0,
        ..DryRunReport::default()
    };

    let mut now = started;
    report.record(session.play(now));
    for _ in 0..args.frames {
        now = now
            .checked_add(step)
            .context("virtual clock overflowed; use a smaller --step-ms")?;
        session.scheduler_mut().fire();
        report.record(session.on_frame(now));
    }
    session.stop();

    let elapsed = step.saturating_mul(args.frames);
    report.elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    report.gl_calls = session.gl().call_count();
    report.uniform_writes = session
        .gl()
        .count(|call| matches!(call, GlCall::Uniform { .. }));
    report.frame_requests = session.scheduler().requested();
    report.textures = session.textures().map(|binding| binding.name.clone()).collect();

    tracing::info!(
        drawn = report.drawn,
        skipped = report.skipped,
        elapsed_ms = report.elapsed_ms,
        "dry run finished"
    );

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
        println!("{json}");
    } else {
        println!("frames:          {}", report.frames);
        println!("drawn:           {}", report.drawn);
        println!("skipped:         {}", report.skipped);
        println!("frame interval:  {:.2} ms", report.frame_interval_ms);
        println!("gl calls:        {}", report.gl_calls);
        println!("uniform writes:  {}", report.uniform_writes);
        println!("frame requests:  {}", report.frame_requests);
        if !report.textures.is_empty() {
            println!("textures:        {}", report.textures.join(", "));
        }
    }
    Ok(())
}

fn noise(args: NoiseArgs) -> Result<()> {
    anyhow::ensure!(args.size > 0, "noise size must be greater than zero");
    let texture = noise_image(args.size, args.size, args.seed).into_rgba_image();
    if let Some(parent) = args.out.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    texture
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    tracing::info!(path = %args.out.display(), size = args.size, seed = args.seed, "wrote noise texture");
    Ok(())
}
