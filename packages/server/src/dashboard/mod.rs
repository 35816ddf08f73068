//! The shelter dashboard: query building, fetching, and derived outputs.
//!
//! [`Dashboard`] ties a [`RecordSource`] to per-client sessions. A one-shot
//! [`Dashboard::render`] runs the whole pipeline for a given state; sessions
//! keep state across events and publish outputs last-write-wins.

pub mod config;
pub mod fetch;
pub mod session;
pub mod slot;
pub mod view;

use std::sync::Arc;

use shelter_core::RecordSource;
use tracing::{info, instrument};

pub use config::DashboardConfig;
pub use session::{DashboardSession, SessionRegistry};
pub use slot::{OutputSlot, Versioned};
pub use view::{derive_outputs, fetch_filtered, DashboardEvent, DashboardState, DashboardView, DerivedOutputs};

/// Dashboard service shared by every HTTP handler.
#[derive(Clone)]
pub struct Dashboard {
    source: Arc<dyn RecordSource>,
    config: Arc<DashboardConfig>,
    sessions: Arc<SessionRegistry>,
}

impl Dashboard {
    #[must_use]
    pub fn new(source: Arc<dyn RecordSource>, config: DashboardConfig) -> Self {
        Self {
            source,
            config: Arc::new(config),
            sessions: Arc::new(SessionRegistry::new()),
        }
    }

    /// Runs fetch, text filter and derive for `state` without a session.
    #[instrument(skip(self, state), fields(filter = state.filter.ui_value()))]
    pub async fn render(&self, state: DashboardState) -> DashboardView {
        let rows = fetch_filtered(self.source.as_ref(), &state, &self.config).await;
        let outputs = derive_outputs(&rows, &state, &self.config);
        DashboardView {
            generation: 0,
            state,
            table: outputs.table,
            chart: outputs.chart,
            map: outputs.map,
        }
    }

    /// Opens a session and loads its initial (reset filter) view.
    pub async fn open_session(&self) -> (String, DashboardView) {
        let session = self.sessions.open(&self.config);
        info!(session = session.id(), open = self.sessions.count(), "dashboard session opened");
        let view = session
            .apply(DashboardEvent::Refresh, self.source.as_ref(), &self.config)
            .await;
        (session.id().to_string(), view)
    }

    /// Applies `event` to a session. Returns `None` for an unknown id.
    pub async fn apply_event(&self, id: &str, event: DashboardEvent) -> Option<DashboardView> {
        let session = self.sessions.get(id)?;
        Some(
            session
                .apply(event, self.source.as_ref(), &self.config)
                .await,
        )
    }

    #[must_use]
    pub fn current_view(&self, id: &str) -> Option<DashboardView> {
        self.sessions.get(id).map(|session| session.view())
    }

    pub fn close_session(&self, id: &str) -> bool {
        let closed = self.sessions.close(id);
        if closed {
            info!(session = id, "dashboard session closed");
        }
        closed
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.count()
    }
}

#[cfg(test)]
mod tests {
    use shelter_core::{FilterSelection, Record};

    use super::*;
    use crate::dashboard::fetch::tests::UnavailableStore;
    use crate::shelter::AnimalShelter;
    use crate::storage::MemoryDocumentStore;

    async fn seeded_dashboard() -> Dashboard {
        let shelter = AnimalShelter::new(Arc::new(MemoryDocumentStore::new("animals")));
        let rows = [
            ("A1", "Labrador Retriever Mix", "Intact Female", 52, "Bella"),
            ("A2", "Labrador Retriever Mix", "Intact Female", 10, "Puppy"),
            ("A3", "Newfoundland", "Intact Female", 100, "Nana"),
            ("A4", "Beagle", "Neutered Male", 80, "Snoopy"),
        ];
        for (id, breed, sex, age, name) in rows {
            shelter
                .create(
                    Record::new()
                        .with("animal_id", id)
                        .with("animal_type", "Dog")
                        .with("breed", breed)
                        .with("sex_upon_outcome", sex)
                        .with("age_upon_outcome_in_weeks", i64::from(age))
                        .with("name", name)
                        .with("location_lat", 30.5)
                        .with("location_long", -97.5),
                )
                .await
                .unwrap();
        }
        Dashboard::new(Arc::new(shelter), DashboardConfig::default())
    }

    #[tokio::test]
    async fn render_water_rescue_keeps_only_matching_dogs() {
        let dashboard = seeded_dashboard().await;
        let view = dashboard
            .render(DashboardState {
                filter: FilterSelection::WaterRescue,
                ..DashboardState::default()
            })
            .await;
        assert_eq!(view.table.total_rows, 2);
        let bars = view.chart.bars();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].label, "Labrador Retriever Mix");
        assert_eq!(bars[1].label, "Newfoundland");
    }

    #[tokio::test]
    async fn render_reset_with_search_text() {
        let dashboard = seeded_dashboard().await;
        let view = dashboard
            .render(DashboardState {
                search: Some("  SNOOPY ".to_string()),
                ..DashboardState::default()
            })
            .await;
        assert_eq!(view.table.total_rows, 1);
        assert_eq!(view.map.marker.unwrap().popup_body, "Snoopy");
    }

    #[tokio::test]
    async fn unavailable_backend_renders_empty_outputs() {
        let shelter = AnimalShelter::new(Arc::new(UnavailableStore));
        let dashboard = Dashboard::new(Arc::new(shelter), DashboardConfig::default());
        let view = dashboard.render(DashboardState::default()).await;
        assert_eq!(view.table.total_rows, 0);
        assert!(view.chart.is_no_data());
        assert!(view.map.marker.is_none());
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let dashboard = seeded_dashboard().await;
        let (id, initial) = dashboard.open_session().await;
        assert_eq!(initial.table.total_rows, 4);
        assert_eq!(dashboard.session_count(), 1);

        let view = dashboard
            .apply_event(
                &id,
                DashboardEvent::FilterChanged {
                    filter: FilterSelection::WaterRescue,
                },
            )
            .await
            .unwrap();
        assert_eq!(view.table.total_rows, 2);
        assert_eq!(dashboard.current_view(&id).unwrap(), view);

        assert!(dashboard.close_session(&id));
        assert!(dashboard.current_view(&id).is_none());
        assert!(dashboard
            .apply_event(&id, DashboardEvent::Refresh)
            .await
            .is_none());
    }
}
