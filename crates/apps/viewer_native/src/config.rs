use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use foundation::math::ProjectorConfig;
use foundation::viewport::Viewport;
use gpu::{CameraConfig, OrbitConfig, TextStyle};
use layers::{LabelLayoutConfig, LabelPriority, SpriteConfig};
use scene::extrude::ExtrudeSettings;
use scene::mesh::{Color, Palette, REGION_PALETTE};
use scene::SceneConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse {
                path: Some(path),
                source,
            } => write!(f, "invalid config {}: {source}", path.display()),
            ConfigError::Parse { path: None, source } => write!(f, "invalid config: {source}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid(_) => None,
        }
    }
}

/// Viewer settings. Every field has a default, so `{}` is a valid file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub projection: ProjectionSection,
    pub extrude: ExtrudeSection,
    /// `#rrggbb` strings; empty means the built-in palette.
    pub palette: Vec<String>,
    pub camera: CameraSection,
    pub orbit: OrbitSection,
    pub labels: LabelsSection,
    pub fps: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionSection::default(),
            extrude: ExtrudeSection::default(),
            palette: Vec::new(),
            camera: CameraSection::default(),
            orbit: OrbitSection::default(),
            labels: LabelsSection::default(),
            fps: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectionSection {
    pub center: [f64; 2],
    pub scale: f64,
    pub translate: [f64; 2],
}

impl Default for ProjectionSection {
    fn default() -> Self {
        let p = ProjectorConfig::default();
        Self {
            center: p.center,
            scale: p.scale,
            translate: p.translate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtrudeSection {
    pub depth: f64,
    pub bevel_enabled: bool,
    pub bevel_thickness: f64,
    pub bevel_size: f64,
    pub bevel_segments: u32,
    pub border_lift: f64,
}

impl Default for ExtrudeSection {
    fn default() -> Self {
        let e = ExtrudeSettings::default();
        Self {
            depth: e.depth,
            bevel_enabled: e.bevel_enabled,
            bevel_thickness: e.bevel_thickness,
            bevel_size: e.bevel_size,
            bevel_segments: e.bevel_segments,
            border_lift: e.border_lift,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraSection {
    pub fov_y_deg: f64,
    pub near: f64,
    pub far: f64,
    pub position: [f64; 3],
    pub target: [f64; 3],
    pub up: [f64; 3],
}

impl Default for CameraSection {
    fn default() -> Self {
        let c = CameraConfig::default();
        Self {
            fov_y_deg: c.fov_y_deg,
            near: c.near,
            far: c.far,
            position: c.position,
            target: c.target,
            up: c.up,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrbitSection {
    pub damping: f64,
    pub rotate_speed: f64,
}

impl Default for OrbitSection {
    fn default() -> Self {
        let o = OrbitConfig::default();
        Self {
            damping: o.damping,
            rotate_speed: o.rotate_speed,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrioritySetting {
    #[default]
    InputOrder,
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelsSection {
    pub font_px: f32,
    pub halo_px: f32,
    pub hovered_font_px: f32,
    pub hovered_halo_px: f32,
    pub priority: PrioritySetting,
    /// Region name → priority, used with `priority: "explicit"`.
    pub priorities: BTreeMap<String, f32>,
    pub sprites: bool,
}

impl Default for LabelsSection {
    fn default() -> Self {
        let l = LabelLayoutConfig::default();
        Self {
            font_px: l.style.font_px,
            halo_px: l.style.halo_px,
            hovered_font_px: l.hovered_style.font_px,
            hovered_halo_px: l.hovered_style.halo_px,
            priority: PrioritySetting::InputOrder,
            priorities: BTreeMap::new(),
            sprites: true,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })?;
        config.validate()?;
        tracing::info!(path = %path.display(), "loaded viewer config");
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|source| ConfigError::Parse { path: None, source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.projection;
        if !(p.scale.is_finite() && p.scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "projection.scale must be positive, got {}",
                p.scale
            )));
        }
        if !self.extrude.depth.is_finite() || self.extrude.depth <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "extrude.depth must be positive, got {}",
                self.extrude.depth
            )));
        }
        let e = &self.extrude;
        for (field, value) in [
            ("extrude.bevel_thickness", e.bevel_thickness),
            ("extrude.bevel_size", e.bevel_size),
            ("extrude.border_lift", e.border_lift),
            ("orbit.rotate_speed", self.orbit.rotate_speed),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be finite and non-negative, got {value}"
                )));
            }
        }
        let c = &self.camera;
        if !(c.near > 0.0 && c.far > c.near) {
            return Err(ConfigError::Invalid(format!(
                "camera clip range must satisfy 0 < near < far, got {}..{}",
                c.near, c.far
            )));
        }
        if !(c.fov_y_deg > 0.0 && c.fov_y_deg < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov_y_deg must be in (0, 180), got {}",
                c.fov_y_deg
            )));
        }
        if !(0.0..=1.0).contains(&self.orbit.damping) {
            return Err(ConfigError::Invalid(format!(
                "orbit.damping must be in [0, 1], got {}",
                self.orbit.damping
            )));
        }
        if !(self.labels.font_px > 0.0 && self.labels.hovered_font_px > 0.0) {
            return Err(ConfigError::Invalid("label font sizes must be positive".into()));
        }
        self.parsed_palette().map(|_| ())
    }

    fn parsed_palette(&self) -> Result<Palette, ConfigError> {
        if self.palette.is_empty() {
            return Ok(Palette::new(REGION_PALETTE.to_vec()));
        }
        let colors = self
            .palette
            .iter()
            .map(|s| parse_hex_color(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Palette::new(colors))
    }

    pub fn scene_config(&self) -> Result<SceneConfig, ConfigError> {
        let e = &self.extrude;
        Ok(SceneConfig {
            projector: ProjectorConfig {
                center: self.projection.center,
                scale: self.projection.scale,
                translate: self.projection.translate,
            },
            extrude: ExtrudeSettings {
                depth: e.depth,
                bevel_enabled: e.bevel_enabled,
                bevel_thickness: e.bevel_thickness,
                bevel_size: e.bevel_size,
                bevel_segments: e.bevel_segments,
                border_lift: e.border_lift,
            },
            palette: self.parsed_palette()?,
            ..SceneConfig::default()
        })
    }

    pub fn camera_config(&self) -> CameraConfig {
        let c = &self.camera;
        CameraConfig {
            fov_y_deg: c.fov_y_deg,
            near: c.near,
            far: c.far,
            position: c.position,
            target: c.target,
            up: c.up,
        }
    }

    pub fn orbit_config(&self) -> OrbitConfig {
        OrbitConfig {
            damping: self.orbit.damping,
            rotate_speed: self.orbit.rotate_speed,
            ..OrbitConfig::default()
        }
    }

    pub fn label_config(&self, viewport: Viewport) -> LabelLayoutConfig {
        let l = &self.labels;
        let style = TextStyle {
            font_px: l.font_px,
            halo_px: l.halo_px,
            ..TextStyle::default()
        };
        LabelLayoutConfig {
            viewport,
            style,
            hovered_style: TextStyle {
                font_px: l.hovered_font_px,
                halo_px: l.hovered_halo_px,
                ..style
            },
            priority: match l.priority {
                PrioritySetting::InputOrder => LabelPriority::InputOrder,
                PrioritySetting::Explicit => LabelPriority::Explicit,
            },
        }
    }

    pub fn sprite_config(&self) -> Option<SpriteConfig> {
        self.labels.sprites.then(SpriteConfig::default)
    }
}

fn parse_hex_color(s: &str) -> Result<Color, ConfigError> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfigError::Invalid(format!("palette color {s:?} is not #rrggbb")));
    }
    u32::from_str_radix(hex, 16)
        .map(Color)
        .map_err(|_| ConfigError::Invalid(format!("palette color {s:?} is not #rrggbb")))
}
