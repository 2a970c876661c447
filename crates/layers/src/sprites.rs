use foundation::ids::RegionId;
use foundation::math::Vec3;
use gpu::{RenderCommand, RenderFrame};
use scene::MapScene;

use crate::layer::{Layer, LayerId};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpriteConfig {
    /// Height of the billboard above the map plane.
    pub z: f64,
    pub size: [f64; 2],
    pub background: [f32; 4],
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            z: 5.0,
            size: [8.0, 2.0],
            background: [1.0, 1.0, 1.0, 0.8],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpriteLabel {
    pub region: RegionId,
    pub text: String,
    pub position: Vec3,
}

/// World-space name billboards, one per named region with a centroid.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteLayer {
    id: LayerId,
    pub config: SpriteConfig,
    sprites: Vec<SpriteLabel>,
    generation: u64,
}

impl SpriteLayer {
    pub fn new(id: u64, config: SpriteConfig) -> Self {
        Self {
            id: LayerId(id),
            config,
            sprites: Vec::new(),
            generation: 0,
        }
    }

    /// Drops every sprite and builds a fresh set from `scene`.
    pub fn regenerate(&mut self, scene: &MapScene) {
        self.sprites.clear();
        for region in scene.regions() {
            let (Some(name), Some(c)) = (region.name.as_deref(), region.centroid) else {
                continue;
            };
            self.sprites.push(SpriteLabel {
                region: region.id,
                text: name.to_string(),
                position: c.extend(self.config.z),
            });
        }
        self.generation += 1;
    }

    pub fn sprites(&self) -> &[SpriteLabel] {
        &self.sprites
    }

    /// How many times the set has been rebuilt.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Layer for SpriteLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn emit(&self, frame: &mut RenderFrame) {
        for sprite in &self.sprites {
            frame.push(RenderCommand::Sprite {
                text: sprite.text.clone(),
                position: sprite.position,
                size: self.config.size,
                background: self.config.background,
            });
        }
    }
}
