//! Per-client dashboard sessions with last-write-wins outputs.
//!
//! A [`DashboardSession`] owns the UI state and four [`OutputSlot`]s: the
//! fetched rows, the table page, the chart, and the map. Every event takes
//! the next generation number. Fetches run concurrently; a fetch result is
//! published only if no newer fetch has landed first. The derive step runs
//! under a short synchronous lock and always reads the latest state and rows.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use shelter_core::{paginate, BreedChart, MapView, Record, RecordSource, TablePage};
use tracing::{debug, info, info_span, Instrument};

use super::config::DashboardConfig;
use super::slot::OutputSlot;
use super::view::{derive_outputs, fetch_filtered, DashboardEvent, DashboardState, DashboardView};

/// One client's dashboard.
pub struct DashboardSession {
    id: String,
    state: Mutex<DashboardState>,
    generation: AtomicU64,
    derive_lock: Mutex<()>,
    rows: OutputSlot<Vec<Record>>,
    table: OutputSlot<TablePage>,
    chart: OutputSlot<BreedChart>,
    map: OutputSlot<MapView>,
    last_access: Mutex<Instant>,
}

impl DashboardSession {
    /// Creates a session with default state and empty outputs.
    #[must_use]
    pub fn new(id: impl Into<String>, config: &DashboardConfig) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(DashboardState::default()),
            generation: AtomicU64::new(0),
            derive_lock: Mutex::new(()),
            rows: OutputSlot::new(Vec::new()),
            table: OutputSlot::new(paginate(&[], 0, config.page_size)),
            chart: OutputSlot::new(BreedChart::NoData),
            map: OutputSlot::new(MapView::overview()),
            last_access: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self.last_access.lock() = Instant::now();
    }

    fn last_access(&self) -> Instant {
        *self.last_access.lock()
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn state(&self) -> DashboardState {
        self.state.lock().clone()
    }

    /// Applies an event, refetching if it changes the row set, and returns
    /// the view as published afterwards.
    ///
    /// If a newer event's fetch has already landed, this event's rows are
    /// discarded and the returned view reflects the newer result.
    pub async fn apply(
        &self,
        event: DashboardEvent,
        source: &dyn RecordSource,
        config: &DashboardConfig,
    ) -> DashboardView {
        let span = info_span!(
            "dashboard_event",
            session = %self.id,
            event = event.kind(),
            generation = tracing::field::Empty,
            outcome = tracing::field::Empty,
            elapsed_ms = tracing::field::Empty,
        );
        let started = Instant::now();

        async move {
            let (generation, snapshot) = {
                let mut state = self.state.lock();
                state.apply(&event);
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                (generation, state.clone())
            };
            tracing::Span::current().record("generation", generation);

            if event.requires_refetch() {
                let rows = fetch_filtered(source, &snapshot, config).await;
                if !self.rows.publish(generation, rows) {
                    debug!(generation, "stale fetch discarded");
                    record_outcome("stale", started);
                    return self.view();
                }
            }

            self.derive(config);
            record_outcome("published", started);
            self.view()
        }
        .instrument(span)
        .await
    }

    /// Re-derives table, chart and map from the latest state and rows.
    fn derive(&self, config: &DashboardConfig) {
        let _guard = self.derive_lock.lock();
        let (generation, state) = {
            let state = self.state.lock();
            (self.generation.load(Ordering::SeqCst), state.clone())
        };
        let rows = self.rows.latest();
        let outputs = derive_outputs(&rows, &state, config);

        self.table.publish(generation, outputs.table);
        self.chart.publish(generation, outputs.chart);
        self.map.publish(generation, outputs.map);
    }

    /// The currently published outputs.
    #[must_use]
    pub fn view(&self) -> DashboardView {
        let table = self.table.load();
        DashboardView {
            generation: table.generation,
            state: self.state(),
            table: (*table.value).clone(),
            chart: (*self.chart.latest()).clone(),
            map: (*self.map.latest()).clone(),
        }
    }
}

fn record_outcome(outcome: &'static str, started: Instant) {
    let span = tracing::Span::current();
    span.record("outcome", outcome);
    span.record(
        "elapsed_ms",
        u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    );
}

/// Registry of open sessions, keyed by session id.
///
/// Idle sessions are reaped and the size cap enforced whenever a session
/// opens.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<DashboardSession>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and registers a session with a fresh UUID v4 id.
    pub fn open(&self, config: &DashboardConfig) -> Arc<DashboardSession> {
        self.reap_idle(Instant::now(), config.session_idle_timeout);
        self.evict_to(config.max_sessions.saturating_sub(1));

        let session = Arc::new(DashboardSession::new(
            uuid::Uuid::new_v4().to_string(),
            config,
        ));
        self.sessions
            .insert(session.id().to_string(), Arc::clone(&session));
        session
    }

    /// Looks up a session and marks it as used.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<DashboardSession>> {
        let session = self.sessions.get(id).map(|s| Arc::clone(s.value()))?;
        session.touch();
        Some(session)
    }

    pub fn close(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Drops sessions last used more than `idle` before `now`.
    pub fn reap_idle(&self, now: Instant, idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| now.saturating_duration_since(session.last_access()) <= idle);
        let reaped = before.saturating_sub(self.sessions.len());
        if reaped > 0 {
            info!(reaped, open = self.sessions.len(), "idle dashboard sessions reaped");
        }
        reaped
    }

    /// Evicts least recently used sessions until at most `max` remain.
    fn evict_to(&self, max: usize) {
        while self.sessions.len() > max {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|entry| entry.value().last_access())
                .map(|entry| entry.key().clone());
            let Some(id) = oldest else { break };
            self.sessions.remove(&id);
            debug!(session = %id, "dashboard session evicted at capacity");
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use shelter_core::{FilterSelection, Query};
    use tokio::sync::Notify;

    use super::*;

    /// Source that returns one row tagged with the query's filter and can be
    /// held back until released, to force out-of-order completion.
    struct GatedSource {
        gate: Notify,
        hold_water: bool,
    }

    #[async_trait]
    impl RecordSource for GatedSource {
        async fn fetch_records(&self, query: &Query, _limit: usize) -> Vec<Record> {
            let water = query.to_document().to_string().contains("Chesapeake");
            if water && self.hold_water {
                self.gate.notified().await;
            }
            let breed = if water { "Labrador Retriever" } else { "Pug" };
            vec![Record::new().with("breed", breed).with("name", "Rex")]
        }
    }

    fn source(hold_water: bool) -> Arc<GatedSource> {
        Arc::new(GatedSource {
            gate: Notify::new(),
            hold_water,
        })
    }

    #[tokio::test]
    async fn refresh_populates_every_output() {
        let config = DashboardConfig::default();
        let session = DashboardSession::new("s1", &config);
        let view = session
            .apply(DashboardEvent::Refresh, source(false).as_ref(), &config)
            .await;
        assert_eq!(view.generation, 1);
        assert_eq!(view.table.total_rows, 1);
        assert_eq!(view.chart.bars()[0].label, "Pug");
        assert_eq!(view.map.marker.unwrap().label, "Pug");
    }

    #[tokio::test]
    async fn selection_change_does_not_refetch_rows() {
        let config = DashboardConfig::default();
        let session = DashboardSession::new("s1", &config);
        let src = source(false);
        session.apply(DashboardEvent::Refresh, src.as_ref(), &config).await;
        let rows_generation = session.rows.generation();

        let view = session
            .apply(DashboardEvent::SelectionChanged { row: Some(9) }, src.as_ref(), &config)
            .await;
        assert_eq!(session.rows.generation(), rows_generation);
        assert_eq!(view.generation, 2);
        assert_eq!(view.state.selected_row, Some(9));
        assert!(view.map.marker.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stale_fetch_does_not_overwrite_newer_result() {
        let config = Arc::new(DashboardConfig::default());
        let session = Arc::new(DashboardSession::new("s1", &config));
        let src = source(true);

        // Older event: water filter, held at the backend.
        let slow = {
            let (session, src, config) = (Arc::clone(&session), Arc::clone(&src), Arc::clone(&config));
            tokio::spawn(async move {
                session
                    .apply(
                        DashboardEvent::FilterChanged { filter: FilterSelection::WaterRescue },
                        src.as_ref(),
                        &config,
                    )
                    .await
            })
        };
        while session.generation.load(Ordering::SeqCst) < 1 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        // Newer event: reset filter, completes immediately.
        let fast = session
            .apply(
                DashboardEvent::FilterChanged { filter: FilterSelection::Reset },
                src.as_ref(),
                &config,
            )
            .await;
        assert_eq!(fast.chart.bars()[0].label, "Pug");

        src.gate.notify_one();
        let slow_view = slow.await.unwrap();

        assert_eq!(slow_view.chart.bars()[0].label, "Pug");
        let current = session.view();
        assert_eq!(current.generation, 2);
        assert_eq!(current.state.filter, FilterSelection::Reset);
        assert_eq!(current.chart.bars()[0].label, "Pug");
    }

    #[test]
    fn registry_caps_open_sessions() {
        let registry = SessionRegistry::new();
        let config = DashboardConfig {
            max_sessions: 3,
            ..DashboardConfig::default()
        };
        let first = registry.open(&config);
        std::thread::sleep(Duration::from_millis(5));
        for _ in 0..10 {
            registry.open(&config);
        }
        assert_eq!(registry.count(), 3);
        assert!(registry.get(first.id()).is_none());
    }

    #[test]
    fn recently_used_session_survives_eviction() {
        let registry = SessionRegistry::new();
        let config = DashboardConfig {
            max_sessions: 2,
            ..DashboardConfig::default()
        };
        let kept = registry.open(&config);
        let dropped = registry.open(&config);
        std::thread::sleep(Duration::from_millis(5));
        assert!(registry.get(kept.id()).is_some());
        registry.open(&config);
        assert!(registry.get(kept.id()).is_some());
        assert!(registry.get(dropped.id()).is_none());
    }

    #[test]
    fn idle_sessions_are_reaped() {
        let registry = SessionRegistry::new();
        let config = DashboardConfig::default();
        let session = registry.open(&config);
        registry.open(&config);

        assert_eq!(registry.reap_idle(Instant::now(), config.session_idle_timeout), 0);
        let later = Instant::now() + config.session_idle_timeout + Duration::from_secs(1);
        assert_eq!(registry.reap_idle(later, config.session_idle_timeout), 2);
        assert_eq!(registry.count(), 0);
        assert!(registry.get(session.id()).is_none());
    }

    #[test]
    fn registry_open_get_close() {
        let registry = SessionRegistry::new();
        let config = DashboardConfig::default();
        let session = registry.open(&config);
        assert_eq!(registry.count(), 1);
        assert!(Arc::ptr_eq(&registry.get(session.id()).unwrap(), &session));
        assert!(registry.close(session.id()));
        assert!(!registry.close(session.id()));
        assert!(registry.get(session.id()).is_none());
    }
}
