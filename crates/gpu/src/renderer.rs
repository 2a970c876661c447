use std::collections::VecDeque;
use std::fmt;

use foundation::viewport::Viewport;
use scene::MapScene;

use crate::frame::{RenderCommand, RenderFrame};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    NotUploaded,
    Released,
    Backend(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NotUploaded => write!(f, "render called before scene upload"),
            RenderError::Released => write!(f, "renderer resources already released"),
            RenderError::Backend(msg) => write!(f, "renderer backend error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}

/// The drawing backend the map hands its geometry and frames to.
pub trait SceneRenderer {
    /// Makes scene geometry resident. Called once per scene.
    fn upload(&mut self, scene: &MapScene) -> Result<(), RenderError>;

    fn resize(&mut self, viewport: Viewport);

    fn render(&mut self, frame: &RenderFrame) -> Result<(), RenderError>;

    /// Frees everything `upload` made resident. Idempotent.
    fn release(&mut self);
}

/// What a `RecordingRenderer` saw of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub index: u64,
    pub clear_color: [f32; 4],
    pub solids: usize,
    pub borders: usize,
    pub labels: Vec<String>,
    pub sprites: usize,
}

impl FrameRecord {
    fn from_frame(frame: &RenderFrame) -> Self {
        let mut record = Self {
            index: frame.index,
            clear_color: frame.background.to_rgba_f32(1.0),
            solids: 0,
            borders: 0,
            labels: Vec::new(),
            sprites: 0,
        };
        for command in &frame.commands {
            match command {
                RenderCommand::Solid { .. } => record.solids += 1,
                RenderCommand::Border { .. } => record.borders += 1,
                RenderCommand::Label { text, .. } => record.labels.push(text.clone()),
                RenderCommand::Sprite { .. } => record.sprites += 1,
            }
        }
        record
    }
}

/// Frame records a `RecordingRenderer` keeps unless told otherwise.
pub const DEFAULT_FRAME_HISTORY: usize = 256;

/// Headless renderer that keeps a bounded log of what it was asked to draw.
///
/// Only the most recent `history` frames are retained; older records are
/// dropped as new frames arrive.
#[derive(Debug, Clone)]
pub struct RecordingRenderer {
    resident_solids: Option<usize>,
    resident_vertices: usize,
    released: bool,
    viewport: Option<Viewport>,
    history: usize,
    frames: VecDeque<FrameRecord>,
    frames_rendered: u64,
    last_frame: Option<RenderFrame>,
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self::with_history(DEFAULT_FRAME_HISTORY)
    }
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `history` frame records (at least one).
    pub fn with_history(history: usize) -> Self {
        let history = history.max(1);
        Self {
            resident_solids: None,
            resident_vertices: 0,
            released: false,
            viewport: None,
            history,
            frames: VecDeque::with_capacity(history.min(DEFAULT_FRAME_HISTORY)),
            frames_rendered: 0,
            last_frame: None,
        }
    }

    pub fn resident_solids(&self) -> Option<usize> {
        self.resident_solids
    }

    /// Vertices (with normals) made resident by the last upload.
    pub fn resident_vertices(&self) -> usize {
        self.resident_vertices
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Retained frame records, oldest first.
    pub fn frames(&self) -> &VecDeque<FrameRecord> {
        &self.frames
    }

    pub fn last_record(&self) -> Option<&FrameRecord> {
        self.frames.back()
    }

    /// Every frame rendered so far, including records no longer retained.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn last_frame(&self) -> Option<&RenderFrame> {
        self.last_frame.as_ref()
    }
}

impl SceneRenderer for RecordingRenderer {
    fn upload(&mut self, scene: &MapScene) -> Result<(), RenderError> {
        if self.released {
            return Err(RenderError::Released);
        }
        let mut vertices = 0;
        for solid in scene.solids() {
            vertices += solid.mesh.vertex_normals().len();
        }
        self.resident_solids = Some(scene.solids().len());
        self.resident_vertices = vertices;
        tracing::debug!(solids = scene.solids().len(), vertices, "uploaded scene geometry");
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    fn render(&mut self, frame: &RenderFrame) -> Result<(), RenderError> {
        if self.released {
            return Err(RenderError::Released);
        }
        if self.resident_solids.is_none() {
            return Err(RenderError::NotUploaded);
        }
        if self.frames.len() == self.history {
            self.frames.pop_front();
        }
        self.frames.push_back(FrameRecord::from_frame(frame));
        self.frames_rendered += 1;
        self.last_frame = Some(frame.clone());
        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.resident_solids = None;
        self.resident_vertices = 0;
        self.last_frame = None;
        tracing::debug!(frames = self.frames_rendered, "released renderer resources");
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordingRenderer, RenderError, SceneRenderer};
    use crate::camera::{Camera3D, CameraConfig};
    use crate::frame::{Lighting, RenderCommand, TextStyle, collect_scene};
    use foundation::viewport::Viewport;
    use scene::highlight::HighlightState;
    use scene::{MapScene, SceneConfig};

    fn empty_frame(scene: &MapScene, index: u64) -> crate::frame::RenderFrame {
        let highlight = HighlightState::new(scene);
        let camera = Camera3D::from_config(&CameraConfig::default(), Viewport::new(100, 100));
        collect_scene(index, scene, &highlight, camera, &Lighting::default())
    }

    #[test]
    fn render_requires_upload() {
        let scene = MapScene::from_features(&[], SceneConfig::default());
        let mut r = RecordingRenderer::new();
        assert_eq!(r.render(&empty_frame(&scene, 0)), Err(RenderError::NotUploaded));

        r.upload(&scene).expect("upload");
        let mut frame = empty_frame(&scene, 1);
        frame.push(RenderCommand::Label {
            text: "A".into(),
            left_px: 1.0,
            top_px: 2.0,
            style: TextStyle::default(),
        });
        r.render(&frame).expect("render");
        assert_eq!(r.frames().len(), 1);
        let record = r.last_record().expect("record");
        assert_eq!(record.labels, vec!["A".to_string()]);
        assert_eq!(record.clear_color[3], 1.0);
    }

    #[test]
    fn frame_log_keeps_only_recent_history() {
        let scene = MapScene::from_features(&[], SceneConfig::default());
        let mut r = RecordingRenderer::with_history(3);
        r.upload(&scene).expect("upload");
        for index in 0..10 {
            r.render(&empty_frame(&scene, index)).expect("render");
        }
        assert_eq!(r.frames_rendered(), 10);
        let kept: Vec<u64> = r.frames().iter().map(|f| f.index).collect();
        assert_eq!(kept, vec![7, 8, 9]);
    }

    #[test]
    fn release_is_idempotent_and_final() {
        let scene = MapScene::from_features(&[], SceneConfig::default());
        let mut r = RecordingRenderer::new();
        r.upload(&scene).expect("upload");
        r.release();
        r.release();
        assert!(r.is_released());
        assert_eq!(r.resident_solids(), None);
        assert_eq!(r.render(&empty_frame(&scene, 0)), Err(RenderError::Released));
        assert_eq!(r.upload(&scene), Err(RenderError::Released));
    }
}
