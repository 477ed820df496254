//! In-memory top SQL reporter double.
//!
//! Production code attributes CPU time to statements by SQL digest and plan
//! digest and ships it to a remote collector. This crate replaces that
//! reporter in tests with [`MockTopSqlReporter`], which aggregates samples in
//! memory, resolves digests back to text, and lets tests wait for an
//! asynchronous producer to catch up.
//!
//! # Quick Start
//!
//! ```rust
//! use topsql_mock::{CpuTimeRecord, MockTopSqlReporter, PlanDigest, gen_sql_digest};
//!
//! let reporter = MockTopSqlReporter::new();
//! let sql_digest = gen_sql_digest("SELECT 1");
//! let plan_digest = PlanDigest::new(b"p1".to_vec());
//! reporter.register_sql(&sql_digest, "select ?");
//!
//! reporter.collect(1, &[CpuTimeRecord::new(sql_digest.clone(), plan_digest.clone(), 5)]);
//! reporter.collect(2, &[CpuTimeRecord::new(sql_digest, plan_digest, 7)]);
//!
//! let stats = reporter.get_sql_stats_by_sql("SELECT 1", false);
//! assert_eq!(stats.len(), 1);
//! assert_eq!(stats[0].cpu_time_ms, 12);
//! ```
//!
//! # Public API Organization
//!
//! - [`TopSqlCollector`] - producer-side seam (`collect`, `register_sql`, `register_plan`)
//! - [`MockTopSqlReporter`] - the aggregator plus query and wait helpers
//! - [`SqlNormalizer`], [`DefaultNormalizer`] - SQL text to digest
//! - [`ReporterConfig`] - deadlines and capacity hints
//! - [`TopSqlError`] - timeouts and input errors
//! - [`ReporterSnapshot`] - serializable copy of the reporter state

pub mod collector;
pub mod config;
pub mod digest;
pub mod errors;
pub mod normalizer;
pub mod progress;
pub mod record;
pub mod registry;
pub mod reporter;
pub mod snapshot;
pub mod workload; // Public for benches

pub use collector::TopSqlCollector;
pub use config::{DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT, ReporterConfig};
pub use digest::{PlanDigest, SqlDigest};
pub use errors::{Result, TopSqlError};
pub use normalizer::{DefaultNormalizer, SqlNormalizer, gen_sql_digest, normalize_sql, plan_digest};
pub use record::{CpuTimeRecord, StatKey};
pub use reporter::MockTopSqlReporter;
pub use snapshot::ReporterSnapshot;
