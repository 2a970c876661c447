use std::fmt;
use std::ops::ControlFlow;
use std::path::Path;

use foundation::viewport::Viewport;
use formats::{DatasetError, RegionDataset, load_regions};
use gpu::{Camera3D, Lighting, OrbitController, RenderError, SceneRenderer, collect_scene};
use layers::{Layer, LabelsLayer, SpriteLayer};
use runtime::{EventBus, Frame, FrameClock, MapEvent, MapEventKind, RepeatingTask, TaskHandle};
use scene::highlight::{HighlightState, HoverTransition};
use scene::picking::{PickOptions, pick_screen};
use scene::MapScene;

use crate::config::{ConfigError, ViewerConfig};

const LABELS_LAYER: u64 = 1;
const SPRITES_LAYER: u64 = 2;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Loading,
    Ready,
    Disposed,
}

#[derive(Debug)]
pub enum SessionError {
    Disposed,
    /// A session shows one dataset for its whole lifetime.
    AlreadyLoaded,
    Config(ConfigError),
    Dataset(DatasetError),
    Render(RenderError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Disposed => write!(f, "map session has been torn down"),
            SessionError::AlreadyLoaded => write!(f, "map session already has a dataset loaded"),
            SessionError::Config(err) => write!(f, "{err}"),
            SessionError::Dataset(err) => write!(f, "{err}"),
            SessionError::Render(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Disposed | SessionError::AlreadyLoaded => None,
            SessionError::Config(err) => Some(err),
            SessionError::Dataset(err) => Some(err),
            SessionError::Render(err) => Some(err),
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        SessionError::Config(err)
    }
}

impl From<DatasetError> for SessionError {
    fn from(err: DatasetError) -> Self {
        SessionError::Dataset(err)
    }
}

impl From<RenderError> for SessionError {
    fn from(err: RenderError) -> Self {
        SessionError::Render(err)
    }
}

/// State that exists once a dataset has been assembled.
#[derive(Debug)]
struct LoadedMap {
    scene: MapScene,
    highlight: HighlightState,
    labels: LabelsLayer,
    sprites: Option<SpriteLayer>,
}

/// One interactive map view: owns the scene, hover state, camera and the
/// render loop, and forwards draw work to a `SceneRenderer`.
///
/// Input handlers run to completion before the next `tick`, so a frame
/// always observes the hover state of the last pointer event.
#[derive(Debug)]
pub struct MapSession<R: SceneRenderer> {
    config: ViewerConfig,
    status: SessionStatus,
    viewport: Viewport,
    camera: Camera3D,
    orbit: OrbitController,
    lighting: Lighting,
    renderer: R,
    events: EventBus,
    render_task: RepeatingTask,
    map: Option<LoadedMap>,
}

impl<R: SceneRenderer> MapSession<R> {
    pub fn new(config: ViewerConfig, mut renderer: R, viewport: Viewport) -> Result<Self, SessionError> {
        config.validate()?;
        renderer.resize(viewport);
        let camera = Camera3D::from_config(&config.camera_config(), viewport);
        let orbit = OrbitController::new(config.orbit_config());
        let render_task = RepeatingTask::new("render", FrameClock::new(config.fps));
        Ok(Self {
            config,
            status: SessionStatus::Loading,
            viewport,
            camera,
            orbit,
            lighting: Lighting::default(),
            renderer,
            events: EventBus::new(),
            render_task,
            map: None,
        })
    }

    pub fn load_file(&mut self, path: &Path) -> Result<(), SessionError> {
        self.ensure_unloaded()?;
        let dataset = load_regions(path)?;
        self.load_dataset(&dataset)
    }

    /// Builds the scene, uploads it and signals loading complete.
    ///
    /// Only the first successful load is accepted; later calls fail with
    /// `AlreadyLoaded` and leave the uploaded scene and hover state intact.
    pub fn load_dataset(&mut self, dataset: &RegionDataset) -> Result<(), SessionError> {
        self.ensure_unloaded()?;
        let scene = MapScene::build(dataset, self.config.scene_config()?);
        self.renderer.upload(&scene)?;

        let highlight = HighlightState::new(&scene);
        let mut labels = LabelsLayer::new(
            LABELS_LAYER,
            &scene,
            self.config.label_config(self.viewport),
        );
        let priorities = &self.config.labels.priorities;
        labels.set_priorities(|name| priorities.get(name).copied());

        let sprites = self.config.sprite_config().map(|cfg| {
            let mut layer = SpriteLayer::new(SPRITES_LAYER, cfg);
            layer.regenerate(&scene);
            layer
        });

        let regions = scene.regions().len();
        tracing::info!(
            digest = dataset.short_digest(),
            regions,
            solids = scene.solids().len(),
            "map ready"
        );
        self.map = Some(LoadedMap {
            scene,
            highlight,
            labels,
            sprites,
        });
        self.status = SessionStatus::Ready;
        self.emit(MapEventKind::LoadingComplete { regions });
        Ok(())
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn scene(&self) -> Option<&MapScene> {
        self.map.as_ref().map(|m| &m.scene)
    }

    pub fn highlight(&self) -> Option<&HighlightState> {
        self.map.as_ref().map(|m| &m.highlight)
    }

    /// Tooltip text: name of the hovered region.
    pub fn hovered_name(&self) -> Option<&str> {
        let map = self.map.as_ref()?;
        map.highlight.hovered_name(&map.scene)
    }

    pub fn camera(&self) -> &Camera3D {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn render_handle(&self) -> TaskHandle {
        self.render_task.handle()
    }

    pub fn events(&self) -> &[MapEvent] {
        self.events.events()
    }

    /// Takes the pending events. Hosts call this once per frame; undrained
    /// events accumulate for the lifetime of the session.
    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        self.events.drain()
    }

    /// Picks under the pointer and updates the highlight.
    pub fn pointer_move(&mut self, x_px: f64, y_px: f64) -> Result<HoverTransition, SessionError> {
        self.ensure_live()?;
        let Some(map) = self.map.as_mut() else {
            return Ok(HoverTransition::Unchanged);
        };
        let camera = self.camera;
        let viewport = self.viewport;
        let hit = pick_screen(
            &map.scene,
            x_px,
            y_px,
            |x, y| camera.ray_through_pixel(x, y, viewport),
            PickOptions::default(),
        );
        let transition = map.highlight.update(hit.map(|h| h.region));
        self.report(transition);
        Ok(transition)
    }

    /// Pointer left the surface: clears any highlight.
    pub fn pointer_leave(&mut self) -> Result<HoverTransition, SessionError> {
        self.ensure_live()?;
        let Some(map) = self.map.as_mut() else {
            return Ok(HoverTransition::Unchanged);
        };
        let transition = map.highlight.update(None);
        self.report(transition);
        Ok(transition)
    }

    pub fn drag(&mut self, dx_px: f64, dy_px: f64) -> Result<(), SessionError> {
        self.ensure_live()?;
        self.orbit.drag(dx_px, dy_px, self.viewport);
        Ok(())
    }

    /// Applies a new surface size before the next label pass.
    pub fn resize(&mut self, viewport: Viewport) -> Result<(), SessionError> {
        self.ensure_live()?;
        self.viewport = viewport;
        self.camera.set_viewport(viewport);
        self.renderer.resize(viewport);
        if let Some(map) = self.map.as_mut() {
            map.labels.set_viewport(viewport);
        }
        self.emit(MapEventKind::Resized {
            width: viewport.width,
            height: viewport.height,
        });
        Ok(())
    }

    /// Runs one iteration of the render loop. `Ok(None)` once the loop has
    /// been cancelled through its handle.
    pub fn tick(&mut self) -> Result<Option<Frame>, SessionError> {
        self.ensure_live()?;
        let Some(frame) = self.render_task.tick(|_| ControlFlow::Continue(())) else {
            return Ok(None);
        };
        if let Err(err) = self.draw(frame) {
            self.render_task.handle().cancel();
            return Err(err);
        }
        Ok(Some(frame))
    }

    fn draw(&mut self, frame: Frame) -> Result<(), SessionError> {
        let camera_moved = self.orbit.update(&mut self.camera);
        let Some(map) = self.map.as_mut() else {
            return Ok(());
        };

        if camera_moved && let Some(sprites) = map.sprites.as_mut() {
            sprites.regenerate(&map.scene);
        }
        map.labels.update(&self.camera, map.highlight.hovered());

        let mut render = collect_scene(
            frame.index,
            &map.scene,
            &map.highlight,
            self.camera,
            &self.lighting,
        );
        map.labels.emit(&mut render);
        if let Some(sprites) = &map.sprites {
            sprites.emit(&mut render);
        }
        tracing::trace!(
            frame = frame.index,
            commands = render.commands.len(),
            labels = map.labels.placed().len(),
            "render frame"
        );
        self.renderer.render(&render)?;
        Ok(())
    }

    /// Stops the render loop and frees renderer resources. Safe to call
    /// more than once.
    pub fn teardown(&mut self) {
        if self.status == SessionStatus::Disposed {
            return;
        }
        self.render_task.handle().cancel();
        self.renderer.release();
        self.map = None;
        self.status = SessionStatus::Disposed;
        self.emit(MapEventKind::TornDown);
        tracing::info!(frames = self.render_task.frames_run(), "map session torn down");
    }

    fn ensure_live(&self) -> Result<(), SessionError> {
        if self.status == SessionStatus::Disposed {
            return Err(SessionError::Disposed);
        }
        Ok(())
    }

    fn ensure_unloaded(&self) -> Result<(), SessionError> {
        self.ensure_live()?;
        if self.map.is_some() {
            return Err(SessionError::AlreadyLoaded);
        }
        Ok(())
    }

    fn emit(&mut self, kind: MapEventKind) {
        self.events.emit(self.render_task.frames_run(), kind);
    }

    fn report(&mut self, transition: HoverTransition) {
        let Some(map) = self.map.as_ref() else {
            return;
        };
        let name = |id| map.scene.region_name(id).unwrap_or_default().to_string();
        let kind = match transition {
            HoverTransition::Unchanged => return,
            HoverTransition::Entered(to) => MapEventKind::HoverEntered { region: name(to) },
            HoverTransition::Changed { from, to } => MapEventKind::HoverChanged {
                from: name(from),
                to: name(to),
            },
            HoverTransition::Left(from) => MapEventKind::HoverLeft { region: name(from) },
        };
        tracing::debug!(?kind, "hover changed");
        self.emit(kind);
    }
}

#[cfg(test)]
mod tests {
    use super::{MapSession, SessionError, SessionStatus};
    use crate::config::ViewerConfig;
    use foundation::ids::RegionId;
    use foundation::viewport::Viewport;
    use formats::RegionDataset;
    use gpu::{RecordingRenderer, RenderCommand};
    use runtime::MapEventKind;
    use scene::highlight::HoverTransition;
    use scene::mesh::{BASELINE_OPACITY, EMPHASIS_OPACITY};

    const TWO_SQUARES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "name": "A", "centroid": [104.5, 37.5] },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[104, 37], [105, 37], [105, 38], [104, 38], [104, 37]]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "B", "centroid": [114.5, 47.5] },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[114, 47], [115, 47], [115, 48], [114, 48], [114, 47]]]]
                }
            }
        ]
    }"#;

    fn viewport() -> Viewport {
        Viewport::new(1280, 720)
    }

    fn ready_session() -> MapSession<RecordingRenderer> {
        let mut session =
            MapSession::new(ViewerConfig::default(), RecordingRenderer::new(), viewport())
                .expect("session");
        let dataset = RegionDataset::from_geojson_str(TWO_SQUARES).expect("dataset");
        session.load_dataset(&dataset).expect("load");
        session
    }

    /// Pixel position of a region's label anchor.
    fn screen_point(session: &MapSession<RecordingRenderer>, name: &str) -> (f64, f64) {
        let scene = session.scene().expect("scene");
        let region = scene.region_by_name(name).expect("region");
        let anchor = region.label_anchor(scene.label_depth()).expect("anchor");
        let [x, y, _] = session.camera().project_to_ndc(anchor).expect("visible");
        let [px, py] = session.viewport().ndc_to_px(x, y);
        (px, py)
    }

    #[test]
    fn load_signals_ready_and_uploads() {
        let mut session =
            MapSession::new(ViewerConfig::default(), RecordingRenderer::new(), viewport())
                .expect("session");
        assert_eq!(session.status(), SessionStatus::Loading);

        let dataset = RegionDataset::from_geojson_str(TWO_SQUARES).expect("dataset");
        session.load_dataset(&dataset).expect("load");

        assert_eq!(session.status(), SessionStatus::Ready);
        assert_eq!(session.renderer().resident_solids(), Some(2));
        assert!(session.renderer().resident_vertices() > 0);
        assert!(session
            .events()
            .iter()
            .any(|e| e.kind == MapEventKind::LoadingComplete { regions: 2 }));
    }

    #[test]
    fn frames_before_load_draw_nothing() {
        let mut session =
            MapSession::new(ViewerConfig::default(), RecordingRenderer::new(), viewport())
                .expect("session");
        let frame = session.tick().expect("tick").expect("frame");
        assert_eq!(frame.index, 0);
        assert!(session.renderer().frames().is_empty());
        assert_eq!(session.pointer_move(10.0, 10.0).expect("move"), HoverTransition::Unchanged);
    }

    #[test]
    fn hover_a_then_move_off_restores_baseline() {
        let mut session = ready_session();
        let (ax, ay) = screen_point(&session, "A");

        let t = session.pointer_move(ax, ay).expect("move");
        assert_eq!(t, HoverTransition::Entered(RegionId(0)));
        assert_eq!(session.hovered_name(), Some("A"));

        session.tick().expect("tick");
        let frame = session.renderer().last_frame().expect("frame");
        let emphasized: Vec<_> = frame
            .commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::Solid { region, material, .. } => Some((*region, material.opacity)),
                _ => None,
            })
            .collect();
        assert_eq!(
            emphasized,
            vec![(RegionId(0), EMPHASIS_OPACITY), (RegionId(1), BASELINE_OPACITY)]
        );
        let hovered_label = frame
            .labels()
            .find(|(text, _)| *text == "A")
            .map(|(_, style)| style.font_px);
        assert_eq!(hovered_label, Some(22.0));

        // Top-left corner is empty sky.
        let t = session.pointer_move(1.0, 1.0).expect("move");
        assert_eq!(t, HoverTransition::Left(RegionId(0)));
        assert_eq!(session.hovered_name(), None);
        let highlight = session.highlight().expect("highlight");
        assert_eq!(highlight.emphasized().count(), 0);

        let kinds: Vec<_> = session.drain_events().into_iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&MapEventKind::HoverEntered { region: "A".into() }));
        assert!(kinds.contains(&MapEventKind::HoverLeft { region: "A".into() }));
    }

    #[test]
    fn moving_between_regions_reports_a_change() {
        let mut session = ready_session();
        let (ax, ay) = screen_point(&session, "A");
        let (bx, by) = screen_point(&session, "B");

        session.pointer_move(ax, ay).expect("move");
        let t = session.pointer_move(bx, by).expect("move");
        assert_eq!(
            t,
            HoverTransition::Changed {
                from: RegionId(0),
                to: RegionId(1)
            }
        );
        assert_eq!(session.hovered_name(), Some("B"));
    }

    #[test]
    fn both_labels_render_without_overlap() {
        let mut session = ready_session();
        session.tick().expect("tick");
        let record = session.renderer().last_record().expect("frame");
        assert_eq!(record.labels, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(record.sprites, 2);
        assert_eq!(record.solids, 2);
        assert_eq!(record.borders, 2);
    }

    #[test]
    fn resize_applies_before_next_frame() {
        let mut session = ready_session();
        session.resize(Viewport::new(400, 400)).expect("resize");
        assert!((session.camera().aspect - 1.0).abs() < 1e-12);
        assert_eq!(session.renderer().viewport(), Some(Viewport::new(400, 400)));
        assert!(session
            .events()
            .iter()
            .any(|e| e.kind == MapEventKind::Resized { width: 400, height: 400 }));
    }

    #[test]
    fn drag_orbits_the_camera_on_following_frames() {
        let mut session = ready_session();
        let before = session.camera().position;
        session.drag(80.0, 0.0).expect("drag");
        session.tick().expect("tick");
        assert_ne!(session.camera().position, before);
    }

    #[test]
    fn teardown_cancels_loop_and_rejects_input() {
        let mut session = ready_session();
        let handle = session.render_handle();
        session.tick().expect("tick");

        session.teardown();
        session.teardown();

        assert!(handle.is_cancelled());
        assert!(session.renderer().is_released());
        assert_eq!(session.status(), SessionStatus::Disposed);
        assert!(matches!(session.pointer_move(0.0, 0.0), Err(SessionError::Disposed)));
        assert!(matches!(session.tick(), Err(SessionError::Disposed)));
        assert_eq!(
            session
                .events()
                .iter()
                .filter(|e| e.kind == MapEventKind::TornDown)
                .count(),
            1
        );
    }

    #[test]
    fn second_load_is_rejected_and_keeps_the_scene() {
        let mut session = ready_session();
        let (x, y) = screen_point(&session, "A");
        session.pointer_move(x, y).expect("move");
        session.drain_events();

        let dataset = RegionDataset::from_geojson_str(TWO_SQUARES).expect("dataset");
        let err = session.load_dataset(&dataset).expect_err("second load");
        assert!(matches!(err, SessionError::AlreadyLoaded));
        assert_eq!(session.status(), SessionStatus::Ready);
        assert_eq!(session.hovered_name(), Some("A"));
        assert_eq!(session.renderer().resident_solids(), Some(2));
        assert!(!session.renderer().is_released());
        assert!(session.events().is_empty());
    }

    #[test]
    fn cancelled_handle_stops_the_loop() {
        let mut session = ready_session();
        session.render_handle().cancel();
        assert_eq!(session.tick().expect("tick"), None);
    }

    #[test]
    fn missing_dataset_file_is_reported() {
        let mut session =
            MapSession::new(ViewerConfig::default(), RecordingRenderer::new(), viewport())
                .expect("session");
        let err = session
            .load_file(std::path::Path::new("/no/such/regions.geojson"))
            .expect_err("missing");
        assert!(matches!(err, SessionError::Dataset(_)));
        assert_eq!(session.status(), SessionStatus::Loading);
    }
}
