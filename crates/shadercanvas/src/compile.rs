use crate::error::SessionError;
use crate::gl::{GlApi, ShaderStage};
use crate::types::{SessionOptions, ShaderDialect};

/// Vertex attribute carrying the full-screen quad corners.
pub const POSITION_ATTRIBUTE: &str = "a_position";

/// Vertex and fragment sources handed to the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSources {
    pub vertex: String,
    pub fragment: String,
}

impl ProgramSources {
    /// Resolves the sources a session compiles for `options`.
    ///
    /// An explicit `frag` wins over a `main` body; both fall back to the
    /// dialect's built-in fragment, which renders transparent black.
    pub fn from_options(options: &SessionOptions) -> Self {
        let dialect = options.dialect;
        let vertex = options
            .vert
            .clone()
            .unwrap_or_else(|| default_vertex(dialect).to_owned());
        let fragment = match (&options.frag, &options.main) {
            (Some(frag), _) => frag.clone(),
            (None, Some(body)) => compose_fragment(dialect, body),
            (None, None) => default_fragment(dialect).to_owned(),
        };
        Self { vertex, fragment }
    }
}

pub fn default_vertex(dialect: ShaderDialect) -> &'static str {
    match dialect {
        ShaderDialect::Gles100 => GLES100_VERTEX,
        ShaderDialect::Gles300 => GLES300_VERTEX,
    }
}

pub fn default_fragment(dialect: ShaderDialect) -> &'static str {
    match dialect {
        ShaderDialect::Gles100 => GLES100_FRAGMENT,
        ShaderDialect::Gles300 => GLES300_FRAGMENT,
    }
}

/// Declarations shared by every main-body fragment: precision, the
/// interpolated texture coordinate and the standard uniforms.
pub fn fragment_header(dialect: ShaderDialect) -> &'static str {
    match dialect {
        ShaderDialect::Gles100 => GLES100_HEADER,
        ShaderDialect::Gles300 => GLES300_HEADER,
    }
}

/// Prepends the dialect header to a fragment body that defines `main`.
pub fn compose_fragment(dialect: ShaderDialect, body: &str) -> String {
    format!("{}\n{}", fragment_header(dialect), body)
}

/// Compiles both stages and links them into a program made current.
///
/// Compile and link failures carry the driver's info log. A non-empty log
/// from a stage that did compile is only logged.
pub(crate) fn create_program<G: GlApi>(
    gl: &G,
    sources: &ProgramSources,
) -> Result<G::Program, SessionError> {
    let program = gl.create_program().map_err(SessionError::ProgramCreation)?;
    let vertex = match compile_stage(gl, ShaderStage::Vertex, &sources.vertex) {
        Ok(shader) => shader,
        Err(err) => {
            gl.delete_program(program);
            return Err(err);
        }
    };
    let fragment = match compile_stage(gl, ShaderStage::Fragment, &sources.fragment) {
        Ok(shader) => shader,
        Err(err) => {
            gl.delete_shader(vertex);
            gl.delete_program(program);
            return Err(err);
        }
    };

    gl.attach_shader(program, vertex);
    gl.attach_shader(program, fragment);
    gl.link_program(program);

    // Attached shaders stay alive with the program.
    gl.delete_shader(vertex);
    gl.delete_shader(fragment);

    if !gl.program_link_status(program) {
        let log = gl.program_info_log(program);
        tracing::error!(%log, "shader program failed to link");
        gl.delete_program(program);
        return Err(SessionError::Link { log });
    }

    gl.use_program(program);
    tracing::debug!(?program, "linked shader program");
    Ok(program)
}

fn compile_stage<G: GlApi>(
    gl: &G,
    stage: ShaderStage,
    source: &str,
) -> Result<G::Shader, SessionError> {
    let shader = gl
        .create_shader(stage)
        .map_err(|reason| SessionError::ShaderCreation { stage, reason })?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);

    let log = gl.shader_info_log(shader);
    if !gl.shader_compile_status(shader) {
        gl.delete_shader(shader);
        tracing::error!(%stage, %log, "shader compile error");
        return Err(SessionError::Compile { stage, log });
    }
    if !log.trim().is_empty() {
        tracing::warn!(%stage, %log, "shader compiled with warnings");
    }
    Ok(shader)
}

const GLES100_VERTEX: &str = r"attribute vec2 a_position;
varying vec2 v_texCoord;

void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
    v_texCoord = (a_position + 1.0) * 0.5;
}
";

const GLES100_FRAGMENT: &str = r"precision mediump float;

void main() {
    gl_FragColor = vec4(0.0);
}
";

const GLES100_HEADER: &str = r"#ifdef GL_FRAGMENT_PRECISION_HIGH
precision highp float;
#else
precision mediump float;
#endif

varying vec2 v_texCoord;

uniform vec2 u_resolution;
uniform vec2 u_mouse;
uniform vec4 u_date;
uniform float u_time;
";

const GLES300_VERTEX: &str = r"#version 300 es

layout(location = 0) in vec2 a_position;
out vec2 v_texCoord;

void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
    v_texCoord = (a_position + 1.0) * 0.5;
}
";

const GLES300_HEADER: &str = r"#version 300 es

precision highp float;
precision highp sampler2D;

in vec2 v_texCoord;
out vec4 fragColor;

uniform vec2 u_resolution;
uniform vec2 u_mouse;
uniform vec4 u_date;
uniform float u_time;
";

const GLES300_FRAGMENT: &str = r"#version 300 es

precision mediump float;

out vec4 fragColor;

void main() {
    fragColor = vec4(0.0);
}
";
