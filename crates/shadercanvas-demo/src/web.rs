use std::cell::RefCell;

use anyhow::{Context, Result};
use shadercanvas::web::{render_full_screen_canvas, WebSession};

use crate::bindings::{bundled_options, bundled_textures};

thread_local! {
    // Dropping the session tears the canvas loop down, so it lives here.
    static SESSION: RefCell<Option<WebSession>> = const { RefCell::new(None) };
}

pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        tracing::debug!("console logger already installed");
    }

    match mount() {
        Ok(session) => SESSION.with(|slot| *slot.borrow_mut() = Some(session)),
        Err(err) => tracing::error!(error = %format!("{err:#}"), "failed to start demo"),
    }
}

fn mount() -> Result<WebSession> {
    let mut options = bundled_options();
    options.auto_play = false;
    let session = render_full_screen_canvas(options).context("failed to mount canvas")?;

    for texture in bundled_textures() {
        session
            .inject_texture(&texture.name, texture.unit, &texture.image, &texture.options)
            .with_context(|| format!("failed to bind texture '{}'", texture.name))?;
    }
    session.play();
    tracing::info!("demo playing");
    Ok(session)
}

