// --- Test helper ---
//! Surface that records every call, for asserting overlay lifecycles.

use std::collections::BTreeMap;

use super::{BoundingBox, MapSurface, Overlay, OverlayId, OverlayKind};

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Attached(OverlayId, Overlay),
    Detached(OverlayId),
    Fitted(BoundingBox),
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    next_id: u64,
    live: BTreeMap<OverlayId, Overlay>,
    peak: BTreeMap<OverlayKind, usize>,
    pub events: Vec<SurfaceEvent>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently attached overlays of one kind.
    pub fn attached(&self, kind: OverlayKind) -> Vec<&Overlay> {
        self.live.values().filter(|o| o.kind() == kind).collect()
    }

    /// Highest number of overlays of `kind` ever attached at the same time.
    pub fn peak(&self, kind: OverlayKind) -> usize {
        self.peak.get(&kind).copied().unwrap_or(0)
    }

    pub fn last_fit(&self) -> Option<BoundingBox> {
        self.events.iter().rev().find_map(|e| match e {
            SurfaceEvent::Fitted(b) => Some(*b),
            _ => None,
        })
    }

    fn count(&self, kind: OverlayKind) -> usize {
        self.live.values().filter(|o| o.kind() == kind).count()
    }
}

impl MapSurface for RecordingSurface {
    fn attach(&mut self, overlay: Overlay) -> OverlayId {
        self.next_id += 1;
        let id = OverlayId(self.next_id);
        let kind = overlay.kind();
        self.events.push(SurfaceEvent::Attached(id, overlay.clone()));
        self.live.insert(id, overlay);
        let now = self.count(kind);
        let peak = self.peak.entry(kind).or_insert(0);
        *peak = (*peak).max(now);
        id
    }

    fn detach(&mut self, id: OverlayId) {
        self.events.push(SurfaceEvent::Detached(id));
        self.live.remove(&id);
    }

    fn fit_bounds(&mut self, bounds: BoundingBox) {
        self.events.push(SurfaceEvent::Fitted(bounds));
    }
}
