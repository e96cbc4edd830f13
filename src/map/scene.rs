//! Headless map surface: keeps the attached overlays and the last viewport
//! request so a browser front-end can poll and paint them.

use serde::Serialize;

use super::{BoundingBox, MapSurface, Overlay, OverlayId};
use crate::record::Coordinates;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Viewport {
    Centered { center: Coordinates, zoom: u8 },
    Fitted { bounds: BoundingBox },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachedOverlay {
    pub id: OverlayId,
    #[serde(flatten)]
    pub overlay: Overlay,
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneSurface {
    #[serde(skip)]
    next_id: u64,
    overlays: Vec<AttachedOverlay>,
    viewport: Viewport,
}

impl SceneSurface {
    pub fn new(center: Coordinates, zoom: u8) -> Self {
        Self {
            next_id: 1,
            overlays: Vec::new(),
            viewport: Viewport::Centered { center, zoom },
        }
    }

    pub fn overlays(&self) -> &[AttachedOverlay] {
        &self.overlays
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }
}

impl MapSurface for SceneSurface {
    fn attach(&mut self, overlay: Overlay) -> OverlayId {
        let id = OverlayId(self.next_id);
        self.next_id += 1;
        self.overlays.push(AttachedOverlay { id, overlay });
        id
    }

    fn detach(&mut self, id: OverlayId) {
        let before = self.overlays.len();
        self.overlays.retain(|o| o.id != id);
        if self.overlays.len() == before {
            tracing::debug!(target: "map", id = id.0, "detach of unknown overlay ignored");
        }
    }

    fn fit_bounds(&mut self, bounds: BoundingBox) {
        self.viewport = Viewport::Fitted { bounds };
    }
}
