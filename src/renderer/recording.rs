//! Collaborators that remember every call, for tests and diagnostics

use std::collections::BTreeMap;

use glam::Vec3;

use super::{Frame, Hud, Renderer, VisualHandle, VisualKind};

/// A visual as the recording renderer last saw it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedVisual {
    pub kind: VisualKind,
    pub pose: Vec3,
    pub size: Vec3,
    pub opacity: f32,
}

/// Renderer that keeps a copy of every live visual and every frame
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    next_handle: u64,
    pub visuals: BTreeMap<VisualHandle, RecordedVisual>,
    /// Handles disposed so far, in order
    pub disposed: Vec<VisualHandle>,
    pub frames: Vec<Frame>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self, kind: VisualKind) -> usize {
        self.visuals.values().filter(|v| v.kind == kind).count()
    }

    pub fn visual(&self, handle: VisualHandle) -> Option<&RecordedVisual> {
        self.visuals.get(&handle)
    }
}

impl Renderer for RecordingRenderer {
    fn create_visual(&mut self, kind: VisualKind, pose: Vec3, size: Vec3) -> VisualHandle {
        self.next_handle += 1;
        let handle = VisualHandle(self.next_handle);
        self.visuals.insert(
            handle,
            RecordedVisual {
                kind,
                pose,
                size,
                opacity: 1.0,
            },
        );
        handle
    }

    fn update_visual_opacity(&mut self, handle: VisualHandle, opacity: f32) {
        if let Some(visual) = self.visuals.get_mut(&handle) {
            visual.opacity = opacity;
        }
    }

    fn dispose_visual(&mut self, handle: VisualHandle) {
        if self.visuals.remove(&handle).is_some() {
            self.disposed.push(handle);
        }
    }

    fn render(&mut self, frame: &Frame) {
        self.frames.push(*frame);
    }
}

/// HUD that keeps every report
#[derive(Debug, Default, Clone)]
pub struct RecordingHud {
    pub reports: Vec<(u32, u64)>,
}

impl Hud for RecordingHud {
    fn report(&mut self, speed: u32, distance: u64) {
        self.reports.push((speed, distance));
    }
}
