#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use topsql_mock::{CpuTimeRecord, MockTopSqlReporter, PlanDigest, ReporterConfig, gen_sql_digest};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Route reporter events to the test output; filter with `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn reporter() -> MockTopSqlReporter {
    init_tracing();
    MockTopSqlReporter::new()
}

/// Reporter with a short deadline so timeout paths finish quickly.
pub fn impatient_reporter(timeout: Duration) -> MockTopSqlReporter {
    init_tracing();
    let config = ReporterConfig::default()
        .with_wait_timeout(timeout)
        .with_poll_interval(Duration::from_millis(5));
    MockTopSqlReporter::with_config(config).expect("valid config")
}

pub fn plan(name: &str) -> PlanDigest {
    PlanDigest::new(name.as_bytes().to_vec())
}

pub fn sample(sql: &str, plan_name: &str, cpu_time_ms: u64) -> CpuTimeRecord {
    CpuTimeRecord::new(gen_sql_digest(sql), plan(plan_name), cpu_time_ms)
}
