use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::{self, Deserializer, Visitor};
use serde_yaml::{Mapping, Value};
use tracing::warn;

use crate::processing::layout::{FitMode, Size};
use crate::processing::thumbnails::{ThumbnailStyle, parse_hex_color};
use crate::tasks::presenter::rotation::MIN_CYCLE_INTERVAL;

const DEFAULT_HIGHLIGHT_COLOR: &str = "#0077CC";
const DEFAULT_BACKGROUND_COLOR: &str = "#FFFFFF";
const MIN_ZOOM_STEP: f32 = 0.01;

/// What the mouse wheel does without the modifier held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WheelMode {
    #[default]
    Navigate,
    Zoom,
}

impl WheelMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Navigate => Self::Zoom,
            Self::Zoom => Self::Navigate,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CarouselOptions {
    /// Thumbnails visible at once; the selection is kept near the middle.
    pub visible_slots: usize,
    /// Height of the normal thumbnail variant, in pixels.
    pub thumbnail_height: u32,
    /// Scale of the enlarged variants used for the selection and its neighbours.
    pub enlarge_factor: f32,
    /// Horizontal gap added to the widest thumbnail to get the slot stride.
    pub item_padding: u32,
    /// Animate scrolling between selections instead of jumping.
    pub scroll_animation: bool,
}

impl Default for CarouselOptions {
    fn default() -> Self {
        Self {
            visible_slots: 4,
            thumbnail_height: 150,
            enlarge_factor: 1.2,
            item_padding: 10,
            scroll_animation: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Root directory scanned recursively for documents.
    pub library_path: PathBuf,
    /// Time each page stays up before the rotation advances.
    #[serde(deserialize_with = "deserialize_duration")]
    pub cycle_interval: Duration,
    /// Zoom change per zoom-in/zoom-out.
    pub zoom_step: f32,
    /// Fit mode at startup.
    pub fit_mode: FitMode,
    /// Inactivity before the screensaver shows; zero disables it.
    #[serde(deserialize_with = "deserialize_duration")]
    pub idle_timeout: Duration,
    /// Text shown on the screensaver overlay.
    pub idle_overlay_text: String,
    /// Pixels moved per pan command.
    pub pan_step: i64,
    pub shuffle_files: bool,
    pub shuffle_pages: bool,
    /// Optional deterministic seed for the load-time shuffles.
    pub shuffle_seed: Option<u64>,
    pub wheel_mode: WheelMode,
    pub carousel: CarouselOptions,
    pub highlight_color: String,
    pub background_color: String,
    /// Strength of the highlight tint on the selected thumbnail (0..=1).
    pub tint_alpha: f32,
    /// Drawable size used when no window reports one.
    pub viewport: [u32; 2],
}

/// Accepts plain seconds (`30`, `2.5`) or a humantime string (`"30s"`).
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a number of seconds or a duration string such as \"30s\"")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(value))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(value)
                .map(Duration::from_secs)
                .map_err(|_| E::custom(format!("duration must not be negative, got {value}")))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Duration::try_from_secs_f64(value)
                .map_err(|err| E::custom(format!("invalid duration {value}: {err}")))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(value.trim()).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(DurationVisitor)
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            library_path: PathBuf::from("notices"),
            cycle_interval: Duration::from_secs(10),
            zoom_step: 0.1,
            fit_mode: FitMode::FitPage,
            idle_timeout: Duration::ZERO,
            idle_overlay_text: "Idle".to_string(),
            pan_step: 50,
            shuffle_files: false,
            shuffle_pages: false,
            shuffle_seed: None,
            wheel_mode: WheelMode::Navigate,
            carousel: CarouselOptions::default(),
            highlight_color: DEFAULT_HIGHLIGHT_COLOR.to_string(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            tint_alpha: 0.3,
            viewport: [1920, 1080],
        }
    }
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_yaml_str(&s)
    }

    /// Parses strictly first; on failure keeps every setting that
    /// deserializes on its own and drops the rest with a warning. Nested
    /// blocks such as `carousel` are merged field by field.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        match serde_yaml::from_str::<Self>(s) {
            Ok(cfg) => Ok(cfg),
            Err(strict_err) => {
                let value: Value = serde_yaml::from_str(s).context("configuration is not valid YAML")?;
                match value {
                    Value::Mapping(mapping) => Ok(Self::from_mapping_lenient(mapping)),
                    Value::Null => Ok(Self::default()),
                    _ => Err(strict_err).context("configuration must be a mapping"),
                }
            }
        }
    }

    fn from_mapping_lenient(mapping: Mapping) -> Self {
        let mut accepted = Mapping::new();
        let mut path = Vec::new();
        for (key, value) in mapping {
            merge_lenient(&mut accepted, &mut path, key, value);
        }
        serde_yaml::from_value(Value::Mapping(accepted)).unwrap_or_default()
    }

    /// Replaces out-of-range values with the nearest usable one (or the
    /// default), logging each correction. Never fails.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if self.cycle_interval < MIN_CYCLE_INTERVAL {
            warn!(
                requested = ?self.cycle_interval,
                floor = ?MIN_CYCLE_INTERVAL,
                "cycle-interval below floor"
            );
            self.cycle_interval = MIN_CYCLE_INTERVAL;
        }
        if !self.zoom_step.is_finite() || self.zoom_step < MIN_ZOOM_STEP {
            warn!(requested = self.zoom_step, "zoom-step too small; clamping");
            self.zoom_step = if self.zoom_step.is_finite() {
                MIN_ZOOM_STEP
            } else {
                defaults.zoom_step
            };
        }
        if self.pan_step <= 0 {
            warn!(requested = self.pan_step, "pan-step must be positive; using default");
            self.pan_step = defaults.pan_step;
        }
        if !(0.0..=1.0).contains(&self.tint_alpha) {
            warn!(requested = self.tint_alpha, "tint-alpha outside 0..=1; clamping");
            self.tint_alpha = if self.tint_alpha.is_nan() {
                defaults.tint_alpha
            } else {
                self.tint_alpha.clamp(0.0, 1.0)
            };
        }
        if parse_hex_color(&self.highlight_color).is_none() {
            warn!(value = %self.highlight_color, "invalid highlight-color; using default");
            self.highlight_color = defaults.highlight_color;
        }
        if parse_hex_color(&self.background_color).is_none() {
            warn!(value = %self.background_color, "invalid background-color; using default");
            self.background_color = defaults.background_color;
        }
        if self.viewport.contains(&0) {
            warn!(requested = ?self.viewport, "viewport has no area; using default");
            self.viewport = defaults.viewport;
        }

        let carousel = &mut self.carousel;
        if carousel.visible_slots == 0 {
            warn!("carousel.visible-slots must be at least 1");
            carousel.visible_slots = 1;
        }
        if carousel.thumbnail_height == 0 {
            warn!("carousel.thumbnail-height must be at least 1");
            carousel.thumbnail_height = 1;
        }
        if !(carousel.enlarge_factor >= 1.0) {
            warn!(
                requested = carousel.enlarge_factor,
                "carousel.enlarge-factor below 1.0; clamping"
            );
            carousel.enlarge_factor = 1.0;
        }
        self
    }

    pub fn highlight_rgb(&self) -> [u8; 3] {
        parse_hex_color(&self.highlight_color)
            .or_else(|| parse_hex_color(DEFAULT_HIGHLIGHT_COLOR))
            .unwrap_or([0, 0x77, 0xcc])
    }

    pub fn background_rgb(&self) -> [u8; 3] {
        parse_hex_color(&self.background_color).unwrap_or([0xff, 0xff, 0xff])
    }

    pub fn thumbnail_style(&self) -> ThumbnailStyle {
        ThumbnailStyle {
            tint: self.highlight_rgb(),
            tint_alpha: self.tint_alpha,
            enlarge_factor: self.carousel.enlarge_factor,
        }
    }

    pub fn viewport_size(&self) -> Size {
        Size::new(self.viewport[0], self.viewport[1])
    }
}

fn parses_as_configuration(root: &Mapping) -> bool {
    serde_yaml::from_value::<Configuration>(Value::Mapping(root.clone())).is_ok()
}

/// The mapping reached by following `path` from `root`.
fn nested_mut<'a>(mut map: &'a mut Mapping, path: &[Value]) -> Option<&'a mut Mapping> {
    for key in path {
        map = map.get_mut(key)?.as_mapping_mut()?;
    }
    Some(map)
}

fn dotted(path: &[Value], key: &Value) -> String {
    path.iter()
        .chain(std::iter::once(key))
        .map(|part| match part {
            Value::String(name) => name.clone(),
            other => format!("{other:?}"),
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Adds `key: value` under `path` in `root` if the result still parses.
/// A rejected mapping value is retried one child at a time.
fn merge_lenient(root: &mut Mapping, path: &mut Vec<Value>, key: Value, value: Value) {
    let mut candidate = root.clone();
    if let Some(slot) = nested_mut(&mut candidate, path) {
        slot.insert(key.clone(), value.clone());
        if parses_as_configuration(&candidate) {
            *root = candidate;
            return;
        }
    }

    if let Value::Mapping(children) = value {
        let mut candidate = root.clone();
        if let Some(slot) = nested_mut(&mut candidate, path) {
            slot.insert(key.clone(), Value::Mapping(Mapping::new()));
            if parses_as_configuration(&candidate) {
                *root = candidate;
                path.push(key);
                for (child_key, child_value) in children {
                    merge_lenient(root, path, child_key, child_value);
                }
                path.pop();
                return;
            }
        }
    }

    warn!(
        key = %dotted(path, &key),
        "ignoring malformed setting; using default"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = Configuration::from_yaml_str("").unwrap();
        assert_eq!(cfg.cycle_interval, Duration::from_secs(10));
        assert_eq!(cfg.library_path, PathBuf::from("notices"));
    }

    #[test]
    fn malformed_key_falls_back_alone() {
        let yaml = r#"
cycle-interval: "not a duration"
pan-step: 80
"#;
        let cfg = Configuration::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.cycle_interval, Duration::from_secs(10));
        assert_eq!(cfg.pan_step, 80);
    }

    #[test]
    fn sanitize_floors_interval_and_fixes_colours() {
        let cfg = Configuration {
            cycle_interval: Duration::from_secs(1),
            highlight_color: "nope".into(),
            zoom_step: 0.0,
            tint_alpha: 3.0,
            ..Configuration::default()
        }
        .sanitized();
        assert_eq!(cfg.cycle_interval, MIN_CYCLE_INTERVAL);
        assert_eq!(cfg.highlight_color, DEFAULT_HIGHLIGHT_COLOR);
        assert_eq!(cfg.zoom_step, MIN_ZOOM_STEP);
        assert_eq!(cfg.tint_alpha, 1.0);
    }

    #[test]
    fn wheel_mode_toggles() {
        assert_eq!(WheelMode::Navigate.toggled(), WheelMode::Zoom);
        assert_eq!(WheelMode::Zoom.toggled(), WheelMode::Navigate);
    }

    #[test]
    fn durations_accept_seconds_and_text() {
        let cfg = Configuration::from_yaml_str("cycle-interval: 30\nidle-timeout: \"2m\"\n").unwrap();
        assert_eq!(cfg.cycle_interval, Duration::from_secs(30));
        assert_eq!(cfg.idle_timeout, Duration::from_secs(120));

        let cfg = Configuration::from_yaml_str("cycle-interval: 2.5\n").unwrap();
        assert_eq!(cfg.cycle_interval, Duration::from_millis(2500));
    }

    #[test]
    fn negative_seconds_fall_back() {
        let cfg = Configuration::from_yaml_str("cycle-interval: -4\npan-step: 7\n").unwrap();
        assert_eq!(cfg.cycle_interval, Duration::from_secs(10));
        assert_eq!(cfg.pan_step, 7);
    }

    #[test]
    fn dotted_names_nested_keys() {
        let path = vec![Value::from("carousel")];
        assert_eq!(dotted(&path, &Value::from("visible-slots")), "carousel.visible-slots");
        assert_eq!(dotted(&[], &Value::from("pan-step")), "pan-step");
    }
}
