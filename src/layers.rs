//! # Layer Synchronizer
//! Keeps one heatmap overlay and one marker overlay on the map surface in
//! step with the current filtered view.
//!
//! Overlays are never mutated in place: any change detaches the old instance
//! first, then attaches a fresh one, so at most one overlay of each kind is on
//! the surface at any time. An empty view leaves the kind detached.

use std::collections::HashMap;

use crate::filter::FilteredView;
use crate::map::{
    BoundingBox, HeatmapOptions, MapSurface, Marker, MarkerPaint, Overlay, OverlayId, OverlayKind,
};
use crate::record::{Coordinates, GeoRecord, RecordKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    Detached,
    Attached(OverlayId),
}

pub struct LayerSync<S: MapSurface> {
    surface: S,
    heat_options: HeatmapOptions,
    markers_shown: bool,
    heat: Option<(OverlayId, Vec<Coordinates>)>,
    markers: Option<(OverlayId, Vec<Marker>)>,
    records: Vec<GeoRecord>,
    by_key: HashMap<RecordKey, usize>,
}

impl<S: MapSurface> LayerSync<S> {
    pub fn new(surface: S, heat_options: HeatmapOptions, markers_shown: bool) -> Self {
        Self {
            surface,
            heat_options,
            markers_shown,
            heat: None,
            markers: None,
            records: Vec::new(),
            by_key: HashMap::new(),
        }
    }

    /// Bring both overlays in line with `view`. Unchanged content causes no surface calls.
    pub fn sync(&mut self, view: &FilteredView) {
        self.sync_heatmap(&view.coordinates);

        let markers: Vec<Marker> = view
            .records
            .iter()
            .map(|r| Marker {
                key: r.key.clone(),
                center: r.coordinates,
            })
            .collect();
        self.sync_markers(markers);

        self.by_key.clear();
        for (idx, r) in view.records.iter().enumerate() {
            self.by_key.entry(r.key.clone()).or_insert(idx);
        }
        self.records = view.records.clone();
    }

    fn sync_heatmap(&mut self, points: &[Coordinates]) {
        let current = self.heat.as_ref().map(|(_, p)| p.as_slice()).unwrap_or(&[]);
        if current == points {
            return;
        }
        if let Some((id, _)) = self.heat.take() {
            self.surface.detach(id);
        }
        if !points.is_empty() {
            let id = self.surface.attach(Overlay::Heatmap {
                points: points.to_vec(),
                options: self.heat_options,
            });
            self.heat = Some((id, points.to_vec()));
        }
        tracing::debug!(target: "layers", points = points.len(), "heatmap replaced");
    }

    fn sync_markers(&mut self, markers: Vec<Marker>) {
        let current = self.markers.as_ref().map(|(_, m)| m.as_slice()).unwrap_or(&[]);
        if current == markers.as_slice() {
            return;
        }
        self.reattach_markers(markers);
    }

    fn reattach_markers(&mut self, markers: Vec<Marker>) {
        if let Some((id, _)) = self.markers.take() {
            self.surface.detach(id);
        }
        if markers.is_empty() {
            return;
        }
        let id = self.surface.attach(Overlay::Markers {
            markers: markers.clone(),
            paint: MarkerPaint::for_shown(self.markers_shown),
        });
        self.markers = Some((id, markers));
    }

    /// Repaint markers; the set of markers stays the same.
    pub fn set_markers_shown(&mut self, shown: bool) {
        if self.markers_shown == shown {
            return;
        }
        self.markers_shown = shown;
        if let Some((_, markers)) = self.markers.as_ref() {
            let markers = markers.clone();
            self.reattach_markers(markers);
        }
    }

    pub fn toggle_markers(&mut self) -> bool {
        self.set_markers_shown(!self.markers_shown);
        self.markers_shown
    }

    pub fn markers_shown(&self) -> bool {
        self.markers_shown
    }

    /// Fit the map to the current points. No-op (and `None`) when there are none.
    pub fn recenter(&mut self) -> Option<BoundingBox> {
        let points: Vec<Coordinates> = self.records.iter().map(|r| r.coordinates).collect();
        let bounds = BoundingBox::around(&points)?;
        self.surface.fit_bounds(bounds);
        Some(bounds)
    }

    /// Resolve a marker click to its record.
    pub fn marker(&self, key: &RecordKey) -> Option<&GeoRecord> {
        self.by_key.get(key).and_then(|&i| self.records.get(i))
    }

    pub fn state(&self, kind: OverlayKind) -> LayerState {
        let id = match kind {
            OverlayKind::Heatmap => self.heat.as_ref().map(|(id, _)| *id),
            OverlayKind::Markers => self.markers.as_ref().map(|(id, _)| *id),
        };
        id.map(LayerState::Attached).unwrap_or(LayerState::Detached)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{RecordingSurface, SurfaceEvent};

    fn view(points: &[(f64, f64)]) -> FilteredView {
        let records: Vec<GeoRecord> = points
            .iter()
            .map(|&(lat, lon)| GeoRecord::new(Coordinates::new(lat, lon), "2023-01-01 12:00:00"))
            .collect();
        let coordinates = records.iter().map(|r| r.coordinates).collect();
        FilteredView {
            records,
            coordinates,
            skipped: 0,
        }
    }

    fn sync() -> LayerSync<RecordingSurface> {
        LayerSync::new(RecordingSurface::new(), HeatmapOptions::default(), false)
    }

    #[test]
    fn replacing_points_never_stacks_heatmaps() {
        let mut l = sync();
        l.sync(&view(&[(1.0, 1.0)]));
        l.sync(&view(&[(2.0, 2.0)]));

        let s = l.surface();
        assert_eq!(s.peak(OverlayKind::Heatmap), 1);
        let attached = s.attached(OverlayKind::Heatmap);
        assert_eq!(attached.len(), 1);
        match attached[0] {
            Overlay::Heatmap { points, .. } => {
                assert_eq!(points, &vec![Coordinates::new(2.0, 2.0)])
            }
            other => panic!("unexpected overlay {other:?}"),
        }
    }

    #[test]
    fn old_overlay_detached_before_new_attached() {
        let mut l = sync();
        l.sync(&view(&[(1.0, 1.0)]));
        let LayerState::Attached(first) = l.state(OverlayKind::Heatmap) else {
            panic!("heatmap should be attached");
        };
        l.sync(&view(&[(2.0, 2.0)]));

        let events = &l.surface().events;
        let detach_at = events
            .iter()
            .position(|e| *e == SurfaceEvent::Detached(first))
            .unwrap();
        let reattach_at = events
            .iter()
            .rposition(|e| matches!(e, SurfaceEvent::Attached(_, Overlay::Heatmap { .. })))
            .unwrap();
        assert!(detach_at < reattach_at);
    }

    #[test]
    fn empty_view_detaches_everything() {
        let mut l = sync();
        assert_eq!(l.state(OverlayKind::Heatmap), LayerState::Detached);
        l.sync(&view(&[]));
        assert!(l.surface().events.is_empty());

        l.sync(&view(&[(1.0, 1.0), (2.0, 2.0)]));
        l.sync(&view(&[]));
        assert_eq!(l.state(OverlayKind::Heatmap), LayerState::Detached);
        assert_eq!(l.state(OverlayKind::Markers), LayerState::Detached);
        assert!(l.surface().attached(OverlayKind::Heatmap).is_empty());
        assert!(l.surface().attached(OverlayKind::Markers).is_empty());
    }

    #[test]
    fn unchanged_view_is_quiet() {
        let mut l = sync();
        let v = view(&[(1.0, 1.0)]);
        l.sync(&v);
        let n = l.surface().events.len();
        l.sync(&v);
        assert_eq!(l.surface().events.len(), n);
    }

    #[test]
    fn toggling_paint_keeps_marker_set() {
        let mut l = sync();
        l.sync(&view(&[(1.0, 1.0), (2.0, 2.0)]));
        let before = match l.surface().attached(OverlayKind::Markers)[0] {
            Overlay::Markers { markers, paint } => {
                assert_eq!(paint.color, "transparent");
                markers.clone()
            }
            _ => unreachable!(),
        };

        assert!(l.toggle_markers());
        let attached = l.surface().attached(OverlayKind::Markers);
        assert_eq!(attached.len(), 1);
        match attached[0] {
            Overlay::Markers { markers, paint } => {
                assert_eq!(markers, &before);
                assert_eq!(paint, &MarkerPaint::visible());
            }
            _ => unreachable!(),
        }
        // heatmap untouched by the toggle
        assert_eq!(l.surface().peak(OverlayKind::Heatmap), 1);
        assert_eq!(l.surface().attached(OverlayKind::Heatmap).len(), 1);
    }

    #[test]
    fn toggle_without_markers_only_flips_flag() {
        let mut l = sync();
        assert!(l.toggle_markers());
        assert!(l.surface().events.is_empty());
    }

    #[test]
    fn recenter_fits_bounds_or_does_nothing() {
        let mut l = sync();
        assert_eq!(l.recenter(), None);
        assert!(l.surface().last_fit().is_none());

        l.sync(&view(&[(51.5, -0.1), (48.8, 2.3)]));
        let b = l.recenter().unwrap();
        assert_eq!(l.surface().last_fit(), Some(b));
        assert_eq!(b.north, 51.5);
        assert_eq!(b.west, -0.1);
    }

    #[test]
    fn marker_lookup_by_key() {
        let mut l = sync();
        let v = view(&[(1.0, 1.0), (2.0, 2.0)]);
        l.sync(&v);
        let key = v.records[1].key.clone();
        assert_eq!(l.marker(&key), Some(&v.records[1]));
        assert_eq!(l.marker(&RecordKey::from("000000000000")), None);
    }
}
