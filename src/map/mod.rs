//! Map rendering collaborator: the capability interface the layer
//! synchronizer draws through, and the overlay values it hands over.

pub mod recording;
pub mod scene;

use serde::{Deserialize, Serialize};

use crate::record::{Coordinates, RecordKey};

pub use recording::{RecordingSurface, SurfaceEvent};
pub use scene::SceneSurface;

/// Opaque handle returned by [`MapSurface::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OverlayId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    Heatmap,
    Markers,
}

/// Heat layer tuning, passed through to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapOptions {
    pub radius: f64,
    pub blur: f64,
    pub max: f64,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            radius: 25.0,
            blur: 15.0,
            max: 1.0,
        }
    }
}

/// Circle marker paint. Applied uniformly to every marker of an overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerPaint {
    pub color: String,
    pub weight: u32,
    pub radius: u32,
}

impl MarkerPaint {
    pub fn visible() -> Self {
        Self {
            color: "#ff4d4d".to_string(),
            weight: 1,
            radius: 5,
        }
    }

    /// Still clickable, just not drawn.
    pub fn transparent() -> Self {
        Self {
            color: "transparent".to_string(),
            ..Self::visible()
        }
    }

    pub fn for_shown(shown: bool) -> Self {
        if shown {
            Self::visible()
        } else {
            Self::transparent()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub key: RecordKey,
    pub center: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    Heatmap {
        points: Vec<Coordinates>,
        options: HeatmapOptions,
    },
    Markers {
        markers: Vec<Marker>,
        paint: MarkerPaint,
    },
}

impl Overlay {
    pub fn kind(&self) -> OverlayKind {
        match self {
            Overlay::Heatmap { .. } => OverlayKind::Heatmap,
            Overlay::Markers { .. } => OverlayKind::Markers,
        }
    }
}

/// South-west / north-east corners of a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// `None` for an empty slice.
    pub fn around(points: &[Coordinates]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            south: first.lat,
            west: first.lon,
            north: first.lat,
            east: first.lon,
        };
        Some(points.iter().skip(1).fold(init, |b, p| Self {
            south: b.south.min(p.lat),
            west: b.west.min(p.lon),
            north: b.north.max(p.lat),
            east: b.east.max(p.lon),
        }))
    }
}

/// What the layer synchronizer needs from a map view. It is the only writer.
pub trait MapSurface: Send {
    fn attach(&mut self, overlay: Overlay) -> OverlayId;
    fn detach(&mut self, id: OverlayId);
    fn fit_bounds(&mut self, bounds: BoundingBox);
}
