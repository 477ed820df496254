//! In-memory top SQL reporter for tests.
//!
//! [`MockTopSqlReporter`] stands in for the network reporter. Producer code
//! registers statement and plan text and hands over CPU-time batches through
//! [`TopSqlCollector`]; test code reads the aggregated stats back and uses the
//! wait helpers to line up with asynchronous producers before asserting.
//!
//! # Locking
//!
//! Both text registries and the stats map sit behind one state mutex. The
//! collect counter lives outside it (see [`CollectProgress`]), so waiting for
//! progress never blocks producers.

use std::fmt;
use std::time::Instant;

use ahash::AHashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::collector::TopSqlCollector;
use crate::config::ReporterConfig;
use crate::digest::{PlanDigest, SqlDigest};
use crate::errors::{Result, TopSqlError};
use crate::normalizer::{DefaultNormalizer, SqlNormalizer};
use crate::progress::CollectProgress;
use crate::record::{CpuTimeRecord, StatKey};
use crate::registry::TextRegistry;
use crate::snapshot::ReporterSnapshot;

#[derive(Default)]
struct ReporterState {
    sqls: TextRegistry<SqlDigest>,
    plans: TextRegistry<PlanDigest>,
    stats: AHashMap<StatKey, CpuTimeRecord>,
    last_collect_ts: Option<u64>,
}

pub struct MockTopSqlReporter {
    state: Mutex<ReporterState>,
    progress: CollectProgress,
    config: ReporterConfig,
    normalizer: Box<dyn SqlNormalizer>,
}

impl MockTopSqlReporter {
    pub fn new() -> Self {
        Self::build(ReporterConfig::default(), Box::new(DefaultNormalizer))
    }

    pub fn with_config(config: ReporterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, Box::new(DefaultNormalizer)))
    }

    /// Reporter whose SQL queries are digested by `normalizer`.
    ///
    /// Use this when the producer under test digests SQL with its own
    /// algorithm; lookups by SQL text only match if both sides agree.
    pub fn with_normalizer<N>(config: ReporterConfig, normalizer: N) -> Result<Self>
    where
        N: SqlNormalizer + 'static,
    {
        config.validate()?;
        Ok(Self::build(config, Box::new(normalizer)))
    }

    fn build(config: ReporterConfig, normalizer: Box<dyn SqlNormalizer>) -> Self {
        let state = ReporterState {
            stats: AHashMap::with_capacity(config.expected_statements),
            ..ReporterState::default()
        };
        Self {
            state: Mutex::new(state),
            progress: CollectProgress::new(),
            config,
            normalizer,
        }
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &dyn SqlNormalizer {
        self.normalizer.as_ref()
    }

    /// Add every sample's CPU time to its (sql digest, plan digest) record.
    ///
    /// `timestamp` does not affect aggregation. Every call advances the
    /// collect counter by one, including calls with an empty batch, which
    /// return without touching the state lock.
    pub fn collect(&self, timestamp: u64, records: &[CpuTimeRecord]) {
        let _advance = self.progress.advance_on_drop();
        if records.is_empty() {
            trace!(timestamp, "empty collect batch");
            return;
        }

        let mut state = self.state.lock();
        for record in records {
            let stat = state.stats.entry(record.key()).or_insert_with(|| {
                debug!(
                    sql_digest = %record.sql_digest,
                    plan_digest = %record.plan_digest,
                    "new statement stat record"
                );
                CpuTimeRecord::new(record.sql_digest.clone(), record.plan_digest.clone(), 0)
            });
            stat.cpu_time_ms = stat.cpu_time_ms.saturating_add(record.cpu_time_ms);
        }
        state.last_collect_ts = Some(timestamp);
        trace!(timestamp, samples = records.len(), "collected batch");
    }

    pub fn register_sql(&self, sql_digest: &SqlDigest, normalized_sql: &str) {
        let stored = self
            .state
            .lock()
            .sqls
            .register(sql_digest.clone(), normalized_sql);
        if !stored {
            debug!(sql_digest = %sql_digest, "sql already registered");
        }
    }

    pub fn register_plan(&self, plan_digest: &PlanDigest, normalized_plan: &str) {
        let stored = self
            .state
            .lock()
            .plans
            .register(plan_digest.clone(), normalized_plan);
        if !stored {
            debug!(plan_digest = %plan_digest, "plan already registered");
        }
    }

    /// Registered SQL text, or an empty string.
    pub fn get_sql(&self, sql_digest: &SqlDigest) -> String {
        self.state.lock().sqls.resolve(sql_digest)
    }

    /// Registered plan text, or an empty string.
    pub fn get_plan(&self, plan_digest: &PlanDigest) -> String {
        self.state.lock().plans.resolve(plan_digest)
    }

    /// Stat records whose SQL digest matches the digest of `sql`.
    ///
    /// With `plan_must_be_resolved`, records whose plan digest has no
    /// non-empty registered text are dropped. The plan check runs in a second
    /// critical section after the stats scan, so a plan registered in between
    /// counts as resolved. Order is unspecified.
    pub fn get_sql_stats_by_sql(&self, sql: &str, plan_must_be_resolved: bool) -> Vec<CpuTimeRecord> {
        let sql_digest = self.normalizer.digest(sql);
        let matched: Vec<CpuTimeRecord> = {
            let state = self.state.lock();
            state
                .stats
                .values()
                .filter(|record| record.sql_digest == sql_digest)
                .cloned()
                .collect()
        };
        if !plan_must_be_resolved || matched.is_empty() {
            return matched;
        }

        let state = self.state.lock();
        matched
            .into_iter()
            .filter(|record| state.plans.is_resolved(&record.plan_digest))
            .collect()
    }

    /// [`get_sql_stats_by_sql`](Self::get_sql_stats_by_sql), retried after
    /// every further collect until it yields records or the wait deadline
    /// passes.
    ///
    /// Returns a non-empty vector, or [`TopSqlError::Timeout`].
    pub fn get_sql_stats_by_sql_with_retry(
        &self,
        sql: &str,
        plan_must_be_resolved: bool,
    ) -> Result<Vec<CpuTimeRecord>> {
        let started = Instant::now();
        let deadline = started + self.config.wait_timeout;
        loop {
            let stats = self.get_sql_stats_by_sql(sql, plan_must_be_resolved);
            if !stats.is_empty() {
                return Ok(stats);
            }

            // Busy producers keep the wait below succeeding; the deadline still holds.
            let now = Instant::now();
            if now >= deadline {
                let observed = self.progress.load();
                debug!(sql, plan_must_be_resolved, "no stats before deadline");
                return Err(TopSqlError::timeout(
                    now.duration_since(started),
                    observed.saturating_add(1),
                    observed,
                ));
            }

            let remaining = deadline.saturating_duration_since(now);
            if let Err(err) =
                self.progress
                    .wait_for_advance(1, remaining, self.config.poll_interval)
            {
                let stats = self.get_sql_stats_by_sql(sql, plan_must_be_resolved);
                if !stats.is_empty() {
                    return Ok(stats);
                }
                debug!(sql, plan_must_be_resolved, "no stats before deadline");
                return Err(err);
            }
        }
    }

    /// Block until `count` more collects have happened since the call, or the
    /// configured deadline passes.
    ///
    /// Returns the counter value observed on success.
    pub fn wait_collect_cnt(&self, count: u64) -> Result<u64> {
        self.progress
            .wait_for_advance(count, self.config.wait_timeout, self.config.poll_interval)
    }

    /// Number of `collect` calls so far.
    pub fn collect_cnt(&self) -> u64 {
        self.progress.load()
    }

    /// Timestamp of the latest non-empty batch.
    pub fn last_collect_ts(&self) -> Option<u64> {
        self.state.lock().last_collect_ts
    }

    pub fn sql_count(&self) -> usize {
        self.state.lock().sqls.len()
    }

    pub fn plan_count(&self) -> usize {
        self.state.lock().plans.len()
    }

    pub fn stat_count(&self) -> usize {
        self.state.lock().stats.len()
    }

    /// Every stat record, ordered by (sql digest, plan digest).
    pub fn all_stats(&self) -> Vec<CpuTimeRecord> {
        let mut stats: Vec<CpuTimeRecord> = self.state.lock().stats.values().cloned().collect();
        sort_records(&mut stats);
        stats
    }

    pub fn snapshot(&self) -> ReporterSnapshot {
        let collect_count = self.progress.load();
        let state = self.state.lock();
        let mut stats: Vec<CpuTimeRecord> = state.stats.values().cloned().collect();
        sort_records(&mut stats);
        ReporterSnapshot {
            collect_count,
            last_collect_ts: state.last_collect_ts,
            sqls: state
                .sqls
                .iter()
                .map(|(digest, text)| (digest.to_hex(), text.to_string()))
                .collect(),
            plans: state
                .plans
                .iter()
                .map(|(digest, text)| (digest.to_hex(), text.to_string()))
                .collect(),
            stats,
        }
    }
}

fn sort_records(records: &mut [CpuTimeRecord]) {
    records.sort_by(|a, b| {
        a.sql_digest
            .cmp(&b.sql_digest)
            .then_with(|| a.plan_digest.cmp(&b.plan_digest))
    });
}

impl Default for MockTopSqlReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockTopSqlReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTopSqlReporter")
            .field("collect_cnt", &self.collect_cnt())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TopSqlCollector for MockTopSqlReporter {
    fn collect(&self, timestamp: u64, records: &[CpuTimeRecord]) {
        MockTopSqlReporter::collect(self, timestamp, records);
    }

    fn register_sql(&self, sql_digest: &SqlDigest, normalized_sql: &str) {
        MockTopSqlReporter::register_sql(self, sql_digest, normalized_sql);
    }

    fn register_plan(&self, plan_digest: &PlanDigest, normalized_plan: &str) {
        MockTopSqlReporter::register_plan(self, plan_digest, normalized_plan);
    }
}
