use std::collections::HashMap;
use std::time::Duration;

use chrono::{Datelike, Timelike};

use crate::gl::GlApi;
use crate::types::UniformValue;

pub const TIME_UNIFORM: &str = "u_time";
pub const MOUSE_UNIFORM: &str = "u_mouse";
pub const RESOLUTION_UNIFORM: &str = "u_resolution";
pub const DATE_UNIFORM: &str = "u_date";
/// Older shaders read the client size and ratio under this name.
pub const LEGACY_RESOLUTION_UNIFORM: &str = "iResolution";

/// Values a session writes before every draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardUniforms {
    /// Seconds since the session started.
    pub time: f32,
    /// Last normalized pointer position.
    pub mouse: [f32; 2],
    /// Client size scaled by the pixel ratio.
    pub resolution: [f32; 2],
    /// Year, month (1-12), day, hour with fractional minutes.
    pub date: [f32; 4],
    /// Client width, client height, pixel ratio.
    pub legacy_resolution: [f32; 3],
}

impl StandardUniforms {
    pub fn new<D>(elapsed: Duration, mouse: [f32; 2], client: (f32, f32), ratio: f32, now: &D) -> Self
    where
        D: Datelike + Timelike,
    {
        let (width, height) = client;
        Self {
            time: elapsed.as_secs_f32(),
            mouse,
            resolution: [width * ratio, height * ratio],
            date: date_components(now),
            legacy_resolution: [width, height, ratio],
        }
    }

    pub fn entries(&self) -> [(&'static str, UniformValue); 5] {
        [
            (TIME_UNIFORM, UniformValue::Float(self.time)),
            (MOUSE_UNIFORM, UniformValue::Vec2(self.mouse)),
            (RESOLUTION_UNIFORM, UniformValue::Vec2(self.resolution)),
            (DATE_UNIFORM, UniformValue::Vec4(self.date)),
            (
                LEGACY_RESOLUTION_UNIFORM,
                UniformValue::Vec3(self.legacy_resolution),
            ),
        ]
    }
}

pub fn date_components<D: Datelike + Timelike>(now: &D) -> [f32; 4] {
    [
        now.year() as f32,
        now.month() as f32,
        now.day() as f32,
        now.hour() as f32 + now.minute() as f32 / 60.0,
    ]
}

/// Uniform locations looked up once per name.
///
/// The program never relinks, so a location (or its absence) stays valid for
/// the whole session.
#[derive(Debug)]
pub(crate) struct UniformCache<L> {
    locations: HashMap<String, Option<L>>,
}

impl<L: Clone> UniformCache<L> {
    pub fn new() -> Self {
        Self {
            locations: HashMap::new(),
        }
    }

    pub fn write<G>(&mut self, gl: &G, program: G::Program, name: &str, value: UniformValue)
    where
        G: GlApi<UniformLocation = L>,
    {
        if !self.locations.contains_key(name) {
            let location = gl.uniform_location(program, name);
            if location.is_none() {
                tracing::trace!(name, "uniform not active in program");
            }
            self.locations.insert(name.to_owned(), location);
        }
        let location = self.locations.get(name).and_then(Option::as_ref);
        gl.set_uniform(location, value);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::headless::{GlCall, HeadlessProgram, RecordingGl};

    fn noon_and_a_half() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|date| date.and_hms_opt(12, 30, 15))
            .expect("valid date")
    }

    #[test]
    fn date_packs_fractional_hours() {
        assert_eq!(date_components(&noon_and_a_half()), [2024.0, 3.0, 9.0, 12.5]);
    }

    #[test]
    fn resolution_scales_by_ratio() {
        let uniforms = StandardUniforms::new(
            Duration::from_millis(1500),
            [0.25, 0.75],
            (400.0, 300.0),
            2.0,
            &noon_and_a_half(),
        );
        assert_eq!(uniforms.time, 1.5);
        assert_eq!(uniforms.resolution, [800.0, 600.0]);
        assert_eq!(uniforms.legacy_resolution, [400.0, 300.0, 2.0]);
        assert_eq!(uniforms.entries()[1], (MOUSE_UNIFORM, UniformValue::Vec2([0.25, 0.75])));
    }

    #[test]
    fn cache_resolves_each_name_once_and_tolerates_missing() {
        let gl = RecordingGl::new().with_active_uniforms(["u_time"]);
        let mut cache = UniformCache::new();
        let program = HeadlessProgram(1);

        cache.write(&gl, program, "u_time", UniformValue::Float(1.0));
        cache.write(&gl, program, "u_time", UniformValue::Float(2.0));
        cache.write(&gl, program, "u_missing", UniformValue::Int(3));

        assert_eq!(
            gl.uniform_values("u_time"),
            vec![UniformValue::Float(1.0), UniformValue::Float(2.0)]
        );
        assert!(gl.calls().contains(&GlCall::Uniform {
            name: None,
            value: UniformValue::Int(3),
        }));
        assert_eq!(cache.locations.len(), 2);
    }
}
