//! Repeated fetch → classify → persist cycles.
//!
//! Cycle state is an explicit [`MonitorState`] value: each call to
//! [`Monitor::run_cycle`] takes the previous state and returns the next one
//! together with that cycle's [`CycleStats`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::{Database, ThreatDistribution};
use crate::error::{PipelineError, Result};
use crate::fetcher::{fetch_all, Candidate, FetchTally, HttpPageSource, PageSource};
use crate::ingest::{has_new_files, load_raw_articles, modified_time, save_candidates, ImportWindow};
use crate::pipeline::{BatchStats, Pipeline};
use crate::TARGET_MONITOR;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorState {
    pub cycle_count: u64,
    /// End of the last cycle that reached the store.
    pub last_update: Option<DateTime<Utc>>,
    /// Raw files the next cycle imports: those modified since the start of
    /// the last check, minus files already imported or archived.
    pub raw_files: ImportWindow,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleStats {
    pub cycle: u64,
    pub fetched: usize,
    pub processed: usize,
    /// Includes pages dropped at fetch time.
    pub skipped: usize,
    /// Includes pages that could not be fetched.
    pub errored: usize,
    pub fetch: FetchTally,
    /// Articles stored from raw files in the data directory.
    pub imported: usize,
    pub threat_distribution: ThreatDistribution,
    /// Set when the store could not be opened and the cycle was abandoned.
    pub aborted: Option<String>,
    pub elapsed_ms: u64,
}

pub struct Monitor {
    config: Config,
    pipeline: Pipeline,
    pages: Arc<dyn PageSource>,
}

impl Monitor {
    pub fn new(config: Config, pipeline: Pipeline, pages: Arc<dyn PageSource>) -> Self {
        Monitor {
            config,
            pipeline,
            pages,
        }
    }

    /// Monitor fetching over HTTP with the configured timeout.
    pub fn from_config(config: Config) -> std::result::Result<Self, reqwest::Error> {
        let pages = Arc::new(HttpPageSource::new(config.fetch.request_timeout)?);
        let pipeline = Pipeline::new(
            config.scoring,
            Arc::new(crate::entity::PatternEntityExtractor),
            config.fetch.min_content_length,
        );
        Ok(Self::new(config, pipeline, pages))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn open_store(&self) -> Result<Database> {
        let db = Database::new(&self.config.database_path)
            .await
            .map_err(PipelineError::StoreUnavailable)?;
        db.ping().await.map_err(PipelineError::StoreUnavailable)?;
        Ok(db)
    }

    /// Imports raw files that appeared since the last check, then archives
    /// this cycle's candidates.
    async fn sync_data_dir(
        &self,
        db: &Database,
        dir: &Path,
        candidates: &[Candidate],
        state: &mut MonitorState,
    ) -> BatchStats {
        let check_started = SystemTime::now();
        let mut handled = BTreeMap::new();

        let mut imported = BatchStats::default();
        if dir.is_dir() && has_new_files(dir, &state.raw_files) {
            match load_raw_articles(dir, &state.raw_files) {
                Ok(raw) => {
                    imported = self.pipeline.process_raw_batch(db, &raw).await;
                    info!(
                        target: TARGET_MONITOR,
                        "Imported {} raw files from {}",
                        imported.processed,
                        dir.display()
                    );
                    handled.extend(raw.seen);
                }
                Err(err) => {
                    warn!(target: TARGET_MONITOR, "Import from {} failed: {}", dir.display(), err)
                }
            }
        }

        if !candidates.is_empty() {
            match save_candidates(dir, candidates, &Utc::now()) {
                Ok(written) => handled.extend(
                    written
                        .into_iter()
                        .filter_map(|path| modified_time(&path).map(|modified| (path, modified))),
                ),
                Err(err) => warn!(target: TARGET_MONITOR, "Could not archive candidates: {}", err),
            }
        }

        state.raw_files.advance(check_started, handled);
        imported
    }

    /// One full pass. Never fails: problems end up in the returned stats.
    pub async fn run_cycle(&self, mut state: MonitorState) -> (MonitorState, CycleStats) {
        let started = Instant::now();
        state.cycle_count += 1;
        let mut stats = CycleStats {
            cycle: state.cycle_count,
            ..CycleStats::default()
        };

        info!(target: TARGET_MONITOR, "Starting cycle {}", state.cycle_count);

        let db = match self.open_store().await {
            Ok(db) => db,
            Err(err) => {
                error!(target: TARGET_MONITOR, "Cycle {} aborted: {}", state.cycle_count, err);
                stats.aborted = Some(err.to_string());
                stats.elapsed_ms = started.elapsed().as_millis() as u64;
                return (state, stats);
            }
        };

        let outcome = fetch_all(
            &self.config.sources,
            &self.config.fetch,
            Arc::clone(&self.pages),
        )
        .await;
        stats.fetched = outcome.candidates.len();
        stats.fetch = outcome.tally;

        let mut batch = BatchStats::default();
        for candidate in &outcome.candidates {
            let result = self.pipeline.process_candidate(&db, candidate).await;
            if let Err(err) = &result {
                warn!(target: TARGET_MONITOR, "Failed to store {}: {}", candidate.url, err);
            }
            batch.record(&result);
        }

        if let Some(dir) = &self.config.data_dir {
            let imported = self.sync_data_dir(&db, dir, &outcome.candidates, &mut state).await;
            stats.imported = imported.processed;
            batch.merge(imported);
        }

        stats.processed = batch.processed;
        stats.skipped = batch.skipped + outcome.tally.dropped();
        stats.errored = batch.errored + outcome.tally.fetch_failures;

        match db.threat_distribution().await {
            Ok(distribution) => stats.threat_distribution = distribution,
            Err(err) => warn!(target: TARGET_MONITOR, "Could not read threat distribution: {}", err),
        }
        db.pool().close().await;

        state.last_update = Some(Utc::now());
        stats.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            target: TARGET_MONITOR,
            "Cycle {} done in {}ms: {} fetched, {} stored ({} imported), {} skipped, {} errors; threats HIGH {} MEDIUM {} LOW {}",
            stats.cycle,
            stats.elapsed_ms,
            stats.fetched,
            stats.processed,
            stats.imported,
            stats.skipped,
            stats.errored,
            stats.threat_distribution.high,
            stats.threat_distribution.medium,
            stats.threat_distribution.low
        );

        (state, stats)
    }

    /// Runs cycles every `interval` until `cancel` turns true or its sender
    /// is dropped. A cycle in progress always completes.
    pub async fn run(&self, interval: Duration, mut cancel: watch::Receiver<bool>) -> MonitorState {
        let mut state = MonitorState::default();
        info!(
            target: TARGET_MONITOR,
            "Monitoring {} sources every {}s",
            self.config.sources.len(),
            interval.as_secs()
        );

        loop {
            if *cancel.borrow() {
                break;
            }

            let (next, _stats) = self.run_cycle(state).await;
            state = next;

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
            }
        }

        info!(target: TARGET_MONITOR, "Monitoring stopped after {} cycles", state.cycle_count);
        state
    }
}
