// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod errors;
pub mod filter;
pub mod geocode;
pub mod layers;
pub mod loader;
pub mod map;
pub mod metrics;
pub mod record;
pub mod selection;
pub mod session;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::filter::{filter, DateRange, FilteredView};
pub use crate::record::{Coordinates, GeoRecord, RecordCollection, RecordKey};
pub use crate::session::{DataStatus, Session};

use axum::Router;

use crate::config::AppConfig;
use crate::geocode::build_geocoder;
use crate::loader::sources::source_for;
use crate::map::SceneSurface;

/// Build the full in-process app: geocoder, session (default data loaded or
/// waiting for import) and router. Does not install the metrics recorder.
pub async fn app(config: &AppConfig) -> Router {
    let geocoder = build_geocoder(&config.geocoder);
    let source = source_for(&config.data.default_source);
    let surface = SceneSurface::new(config.map.center, config.map.zoom);

    let session = Session::bootstrap(
        std::future::ready(surface),
        &config.map,
        geocoder,
        source.as_ref(),
    )
    .await;

    router(api::AppState::new(session))
}
