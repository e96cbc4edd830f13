//! # Selection / Detail Controller
//! Tracks the one record picked on the map and its best-effort place name.
//!
//! Every selection gets a new generation number. Enrichment runs as a
//! spawned task carrying a ticket `(generation, coordinates)`; its result is
//! applied only while the ticket still matches the active selection, so a
//! late answer for a superseded or dismissed selection is dropped.

use std::sync::{Arc, Mutex};

use metrics::counter;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::errors::EnrichmentError;
use crate::geocode::{PlaceInfo, SharedGeocoder};
use crate::metrics::{ENRICHMENT_FAILURES, ENRICHMENT_REQUESTS, ENRICHMENT_STALE};
use crate::record::{Coordinates, GeoRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "info", rename_all = "snake_case")]
pub enum Place {
    Pending,
    Known(PlaceInfo),
    /// Lookup failed or is unavailable; render a neutral placeholder.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub record: GeoRecord,
    pub place: Place,
}

/// Identifies one enrichment request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnrichmentTicket {
    pub generation: u64,
    pub coordinates: Coordinates,
}

#[derive(Default)]
struct Inner {
    generation: u64,
    active: Option<Selection>,
    task: Option<JoinHandle<()>>,
}

pub struct SelectionController {
    geocoder: SharedGeocoder,
    inner: Mutex<Inner>,
}

impl SelectionController {
    pub fn new(geocoder: SharedGeocoder) -> Self {
        Self {
            geocoder,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Make `record` the active selection with a pending place. Any in-flight
    /// enrichment is aborted. Does not start a lookup; see [`Self::select`].
    pub fn begin(&self, record: GeoRecord) -> (Selection, EnrichmentTicket) {
        let mut g = self.inner.lock().expect("selection mutex poisoned");
        if let Some(task) = g.task.take() {
            task.abort();
        }
        g.generation = g.generation.wrapping_add(1);
        let ticket = EnrichmentTicket {
            generation: g.generation,
            coordinates: record.coordinates,
        };
        let selection = Selection {
            record,
            place: Place::Pending,
        };
        g.active = Some(selection.clone());
        (selection, ticket)
    }

    /// Select `record` and start reverse geocoding in the background.
    /// Must be called from within a tokio runtime.
    pub fn select(self: &Arc<Self>, record: GeoRecord) -> Selection {
        let (selection, ticket) = self.begin(record);
        counter!(ENRICHMENT_REQUESTS).increment(1);

        let this = Arc::clone(self);
        let geocoder = Arc::clone(&self.geocoder);
        let task = tokio::spawn(async move {
            let result = geocoder.reverse(ticket.coordinates).await;
            this.resolve_enrichment(ticket, result);
        });

        let mut g = self.inner.lock().expect("selection mutex poisoned");
        if g.generation == ticket.generation {
            g.task = Some(task);
        } else {
            task.abort();
        }
        selection
    }

    /// Apply an enrichment result. Returns `false` when the ticket is stale and
    /// the result was discarded.
    pub fn resolve_enrichment(
        &self,
        ticket: EnrichmentTicket,
        result: Result<PlaceInfo, EnrichmentError>,
    ) -> bool {
        let mut g = self.inner.lock().expect("selection mutex poisoned");
        let generation = g.generation;
        let Some(active) = g.active.as_mut() else {
            counter!(ENRICHMENT_STALE).increment(1);
            return false;
        };
        if generation != ticket.generation || active.record.coordinates != ticket.coordinates {
            counter!(ENRICHMENT_STALE).increment(1);
            tracing::debug!(target: "selection", ticket = ticket.generation, generation, "stale enrichment discarded");
            return false;
        }

        active.place = match result {
            Ok(place) => Place::Known(place),
            Err(e) => {
                counter!(ENRICHMENT_FAILURES).increment(1);
                tracing::debug!(target: "selection", error = %e, "enrichment failed");
                Place::Unknown
            }
        };
        g.task = None;
        true
    }

    /// Dismiss the detail view. A late enrichment result will be discarded.
    pub fn clear(&self) {
        let mut g = self.inner.lock().expect("selection mutex poisoned");
        if let Some(task) = g.task.take() {
            task.abort();
        }
        g.generation = g.generation.wrapping_add(1);
        g.active = None;
    }

    pub fn current(&self) -> Option<Selection> {
        self.inner
            .lock()
            .expect("selection mutex poisoned")
            .active
            .clone()
    }
}
