//! # Session
//! Wires loader → store → filter → layers, and marker clicks → selection.
//!
//! The session owns the map surface (through the layer synchronizer) and is
//! the only place that recomputes the filtered view. Startup waits on a
//! one-shot readiness future yielding the surface, then loads the default
//! document once; a failed load leaves the session waiting for an import.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use crate::config::MapConfig;
use crate::errors::ImportError;
use crate::filter::{filter, DateRange, FilteredView};
use crate::geocode::SharedGeocoder;
use crate::layers::LayerSync;
use crate::loader::{self, sources::DataSource, ImportFile};
use crate::map::{BoundingBox, MapSurface};
use crate::record::{RecordCollection, RecordKey};
use crate::selection::{Selection, SelectionController};
use crate::store::{Origin, RecordStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DataStatus {
    Loading,
    Loaded { origin: Origin, records: usize },
    /// Default data unavailable; the user has to import a file.
    NeedsImport { reason: String },
}

pub struct Session<S: MapSurface> {
    store: RecordStore,
    range: Option<DateRange>,
    view: Arc<FilteredView>,
    view_inputs: Option<(u64, Option<DateRange>)>,
    layers: LayerSync<S>,
    selection: Arc<SelectionController>,
    status: DataStatus,
}

impl<S: MapSurface> Session<S> {
    pub fn new(surface: S, map: &MapConfig, geocoder: SharedGeocoder) -> Self {
        Self {
            store: RecordStore::new(),
            range: None,
            view: Arc::new(FilteredView::default()),
            view_inputs: None,
            layers: LayerSync::new(surface, map.heatmap, map.markers_shown),
            selection: Arc::new(SelectionController::new(geocoder)),
            status: DataStatus::Loading,
        }
    }

    /// Wait for the map surface, then try the default data source once.
    pub async fn bootstrap<F>(
        ready: F,
        map: &MapConfig,
        geocoder: SharedGeocoder,
        source: &dyn DataSource,
    ) -> Self
    where
        F: Future<Output = S>,
    {
        let surface = ready.await;
        tracing::debug!(target: "session", "map surface ready");
        let mut session = Self::new(surface, map, geocoder);
        session.load_default(source).await;
        session
    }

    /// Returns `true` when data was loaded. On failure the status asks for an
    /// import, unless a collection is already loaded; that one stays in place.
    pub async fn load_default(&mut self, source: &dyn DataSource) -> bool {
        let previous = std::mem::replace(&mut self.status, DataStatus::Loading);
        match loader::load(source).await {
            Ok(collection) => {
                self.replace_collection(collection, Origin::Default(source.location()));
                true
            }
            Err(e) if self.store.is_loaded() => {
                tracing::warn!(target: "session", error = %e, "reload failed, keeping current data");
                self.status = previous;
                false
            }
            Err(e) => {
                self.status = DataStatus::NeedsImport {
                    reason: e.to_string(),
                };
                false
            }
        }
    }

    /// Replace the dataset with an imported file. On error nothing changes.
    pub fn import(&mut self, file: &ImportFile) -> Result<usize, ImportError> {
        let collection = loader::import_file(file)?;
        let n = collection.len();
        self.selection.clear();
        self.replace_collection(collection, Origin::Import(file.name.clone()));
        Ok(n)
    }

    fn replace_collection(&mut self, collection: RecordCollection, origin: Origin) {
        let records = collection.len();
        self.store.replace(collection, origin.clone());
        self.status = DataStatus::Loaded { origin, records };
        // fresh data is shown unfiltered
        self.range = None;
        self.refresh();
    }

    /// Change the date range (`None` shows everything) and refresh the overlays.
    pub fn set_range(&mut self, range: Option<DateRange>) -> Arc<FilteredView> {
        self.range = range;
        self.refresh();
        self.view()
    }

    fn refresh(&mut self) {
        let inputs = (self.store.generation(), self.range);
        if self.view_inputs == Some(inputs) {
            return;
        }
        let view = filter(&self.store.snapshot(), self.range.as_ref());
        tracing::info!(
            target: "session",
            records = view.len(),
            skipped = view.skipped,
            filtered = self.range.is_some(),
            "view recomputed"
        );
        self.layers.sync(&view);
        self.view = Arc::new(view);
        self.view_inputs = Some(inputs);
    }

    /// Marker click. Unknown keys (e.g. from a stale front-end) select nothing.
    pub fn select_marker(&mut self, key: &RecordKey) -> Option<Selection> {
        let record = self.layers.marker(key)?.clone();
        Some(self.selection.select(record))
    }

    pub fn dismiss_selection(&self) {
        self.selection.clear();
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection.current()
    }

    pub fn selection_controller(&self) -> Arc<SelectionController> {
        Arc::clone(&self.selection)
    }

    pub fn toggle_markers(&mut self) -> bool {
        self.layers.toggle_markers()
    }

    pub fn markers_shown(&self) -> bool {
        self.layers.markers_shown()
    }

    pub fn recenter(&mut self) -> Option<BoundingBox> {
        self.layers.recenter()
    }

    pub fn view(&self) -> Arc<FilteredView> {
        Arc::clone(&self.view)
    }

    pub fn range(&self) -> Option<DateRange> {
        self.range
    }

    pub fn status(&self) -> &DataStatus {
        &self.status
    }

    pub fn collection(&self) -> RecordCollection {
        self.store.snapshot()
    }

    pub fn surface(&self) -> &S {
        self.layers.surface()
    }
}
