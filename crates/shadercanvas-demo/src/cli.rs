use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shadercanvas::ShaderDialect;

#[derive(Parser, Debug)]
#[command(
    name = "shadercanvas-demo",
    author,
    version,
    about = "Full-screen fragment shader demo tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the final vertex and fragment sources.
    Compose(ComposeArgs),
    /// Drive a session over the recording backend with a virtual clock.
    DryRun(DryRunArgs),
    /// Write the procedural noise texture as PNG.
    Noise(NoiseArgs),
}

#[derive(Parser, Debug)]
pub struct ComposeArgs {
    /// Canvas config TOML; the bundled demo shader when omitted.
    #[arg(long, value_name = "PATH", env = "SHADERCANVAS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Shader dialect override: `gles100` or `gles300`.
    #[arg(long, value_name = "DIALECT", value_parser = parse_dialect)]
    pub dialect: Option<ShaderDialect>,
}

#[derive(Parser, Debug)]
pub struct DryRunArgs {
    /// Canvas config TOML; the bundled demo shader when omitted.
    #[arg(long, value_name = "PATH", env = "SHADERCANVAS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of frame callbacks to deliver after the initial play.
    #[arg(long, value_name = "N", default_value_t = 60)]
    pub frames: u32,

    /// Virtual time between frame callbacks.
    #[arg(long, value_name = "MILLISECONDS", default_value_t = 16)]
    pub step_ms: u64,

    /// Client size of the virtual surface (e.g. `800x600`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "800x600")]
    pub size: (u32, u32),

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct NoiseArgs {
    /// Output PNG path.
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,

    /// Width and height in pixels.
    #[arg(long, value_name = "PIXELS", default_value_t = 256)]
    pub size: u32,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_dialect(value: &str) -> Result<ShaderDialect, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("shader dialect must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "gles100" | "webgl" | "webgl1" | "100" => Ok(ShaderDialect::Gles100),
        "gles300" | "webgl2" | "300" => Ok(ShaderDialect::Gles300),
        other => Err(format!(
            "unknown shader dialect '{other}'; expected gles100 or gles300"
        )),
    }
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{value}'; expected WIDTHxHEIGHT"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in '{value}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in '{value}'"))?;
    if width == 0 || height == 0 {
        return Err(format!("size '{value}' must be non-zero"));
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_aliases() {
        assert_eq!(parse_dialect("WebGL"), Ok(ShaderDialect::Gles100));
        assert_eq!(parse_dialect(" gles300 "), Ok(ShaderDialect::Gles300));
        assert!(parse_dialect("glsl450").is_err());
        assert!(parse_dialect("").is_err());
    }

    #[test]
    fn sizes_need_two_positive_parts() {
        assert_eq!(parse_size("1280x720"), Ok((1280, 720)));
        assert_eq!(parse_size("64X32"), Ok((64, 32)));
        assert!(parse_size("1280").is_err());
        assert!(parse_size("0x720").is_err());
        assert!(parse_size("axb").is_err());
    }
}
