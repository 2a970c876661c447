use foundation::ids::{RegionId, SolidId};
use foundation::math::Vec3;
use scene::highlight::HighlightState;
use scene::mesh::{Color, LineMaterial, Material};
use scene::MapScene;

use crate::camera::Camera3D;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Light {
    Directional {
        color: Color,
        intensity: f32,
        position: Vec3,
    },
    Ambient {
        color: Color,
        intensity: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lighting {
    pub background: Color,
    pub lights: Vec<Light>,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            background: Color(0xf0f0f0),
            lights: vec![
                Light::Directional {
                    color: Color::WHITE,
                    intensity: 1.1,
                    position: Vec3::new(300.0, 1000.0, 500.0),
                },
                Light::Ambient {
                    color: Color::WHITE,
                    intensity: 0.6,
                },
            ],
        }
    }
}

/// Screen text with an outline halo.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextStyle {
    pub font_px: f32,
    pub bold: bool,
    pub fill: Color,
    pub halo: Color,
    pub halo_px: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_px: 18.0,
            bold: true,
            fill: Color::BLACK,
            halo: Color::WHITE,
            halo_px: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    Solid {
        region: RegionId,
        solid: SolidId,
        material: Material,
    },
    Border {
        region: RegionId,
        ring: usize,
        material: LineMaterial,
    },
    /// Screen-space text; `left_px`/`top_px` is the text origin.
    Label {
        text: String,
        left_px: f64,
        top_px: f64,
        style: TextStyle,
    },
    /// World-space billboard.
    Sprite {
        text: String,
        position: Vec3,
        size: [f64; 2],
        background: [f32; 4],
    },
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub index: u64,
    pub camera: Camera3D,
    pub background: Color,
    pub lights: Vec<Light>,
    pub commands: Vec<RenderCommand>,
}

impl RenderFrame {
    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, &TextStyle)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            RenderCommand::Label { text, style, .. } => Some((text.as_str(), style)),
            _ => None,
        })
    }

    pub fn solid_material(&self, solid: SolidId) -> Option<Material> {
        self.commands.iter().find_map(|c| match c {
            RenderCommand::Solid {
                solid: s, material, ..
            } if *s == solid => Some(*material),
            _ => None,
        })
    }
}

/// Solids with their current materials plus border lines, in region order.
pub fn collect_scene(
    index: u64,
    scene: &MapScene,
    highlight: &HighlightState,
    camera: Camera3D,
    lighting: &Lighting,
) -> RenderFrame {
    let mut frame = RenderFrame {
        index,
        camera,
        background: lighting.background,
        lights: lighting.lights.clone(),
        commands: Vec::with_capacity(scene.solids().len() * 2),
    };
    let border = scene.config().border;

    for region in scene.regions() {
        let material = highlight.material(region.id).unwrap_or(region.material);
        for solid in &region.solids {
            frame.push(RenderCommand::Solid {
                region: region.id,
                solid: *solid,
                material,
            });
        }
        for ring in 0..region.borders.len() {
            frame.push(RenderCommand::Border {
                region: region.id,
                ring,
                material: border,
            });
        }
    }
    frame
}
