/// Events the map core reports to the surrounding UI shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapEventKind {
    /// The scene finished building; the loading overlay can go away.
    LoadingComplete { regions: usize },
    HoverEntered { region: String },
    HoverChanged { from: String, to: String },
    HoverLeft { region: String },
    Resized { width: u32, height: u32 },
    TornDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEvent {
    pub frame_index: u64,
    pub kind: MapEventKind,
}

/// Append-only event log drained by the host once per frame.
///
/// The bus never discards events on its own; a host that stops calling
/// [`EventBus::drain`] keeps every event in memory.
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<MapEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, frame_index: u64, kind: MapEventKind) {
        tracing::trace!(frame_index, ?kind, "map event");
        self.events.push(MapEvent { frame_index, kind });
    }

    pub fn events(&self) -> &[MapEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }
}
