mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use common::{impatient_reporter, plan, reporter, sample};
use topsql_mock::{
    CpuTimeRecord, MockTopSqlReporter, ReporterConfig, SqlDigest, SqlNormalizer, TopSqlError,
};

#[test]
fn test_plan_filter_excludes_unresolved_plans() {
    let reporter = reporter();
    reporter.collect(1, &[sample("select 1", "unregistered", 5)]);

    assert!(reporter.get_sql_stats_by_sql("select 1", true).is_empty());
    assert_eq!(reporter.get_sql_stats_by_sql("select 1", false).len(), 1);
}

#[test]
fn test_plan_filter_keeps_resolved_plans_only() {
    let reporter = reporter();
    reporter.register_plan(&plan("known"), "TableReader");
    reporter.collect(1, &[sample("select 1", "known", 5), sample("select 1", "unknown", 7)]);

    let stats = reporter.get_sql_stats_by_sql("select 1", true);
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].plan_digest, plan("known"));
    assert_eq!(stats[0].cpu_time_ms, 5);
}

#[test]
fn test_plan_registered_with_empty_text_is_unresolved() {
    let reporter = reporter();
    reporter.register_plan(&plan("blank"), "");
    reporter.collect(1, &[sample("select 1", "blank", 5)]);

    assert!(reporter.get_sql_stats_by_sql("select 1", true).is_empty());
}

#[test]
fn test_query_matches_normalized_sql() {
    let reporter = reporter();
    reporter.collect(1, &[sample("SELECT * FROM t WHERE id = 1", "p", 5)]);

    let stats = reporter.get_sql_stats_by_sql("select *  from t where id = 99", false);
    assert_eq!(stats.len(), 1);
    assert!(reporter.get_sql_stats_by_sql("select * from u", false).is_empty());
}

#[test]
fn test_query_without_records_is_empty() {
    let reporter = reporter();
    assert!(reporter.get_sql_stats_by_sql("select 1", false).is_empty());
    assert!(reporter.get_sql_stats_by_sql("select 1", true).is_empty());
}

#[test]
fn test_retry_returns_existing_stats_immediately() {
    let reporter = reporter();
    reporter.collect(1, &[sample("select 1", "p", 5)]);

    let started = Instant::now();
    let stats = reporter
        .get_sql_stats_by_sql_with_retry("select 1", false)
        .expect("stats");
    assert_eq!(stats.len(), 1);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_retry_waits_for_async_producer() {
    let reporter = Arc::new(reporter());
    let producer = Arc::clone(&reporter);

    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        producer.collect(1, &[]);
        thread::sleep(Duration::from_millis(20));
        producer.register_plan(&plan("p"), "TableReader");
        producer.collect(2, &[sample("select 1", "p", 5)]);
    });

    let stats = reporter
        .get_sql_stats_by_sql_with_retry("select 1", true)
        .expect("stats before deadline");
    handle.join().expect("producer");
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].cpu_time_ms, 5);
}

#[test]
fn test_retry_times_out_with_explicit_error() {
    let reporter = impatient_reporter(Duration::from_millis(100));
    reporter.collect(1, &[sample("select 1", "unregistered", 5)]);

    let started = Instant::now();
    let err = reporter
        .get_sql_stats_by_sql_with_retry("select 1", true)
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_retry_keeps_going_through_unrelated_collects() {
    let reporter = Arc::new(impatient_reporter(Duration::from_secs(5)));
    let producer = Arc::clone(&reporter);

    let handle = thread::spawn(move || {
        for ts in 0..5 {
            thread::sleep(Duration::from_millis(10));
            producer.collect(ts, &[sample("select * from other", "p", 1)]);
        }
        producer.collect(5, &[sample("select 1", "p", 3)]);
    });

    let stats = reporter
        .get_sql_stats_by_sql_with_retry("select 1", false)
        .expect("stats");
    handle.join().expect("producer");
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].cpu_time_ms, 3);
    assert!(reporter.collect_cnt() >= 6);
}

#[test]
fn test_retry_deadline_holds_under_busy_producers() {
    let reporter = Arc::new(impatient_reporter(Duration::from_millis(100)));
    let stop = Arc::new(AtomicBool::new(false));

    let producers: Vec<_> = (0..2)
        .map(|_| {
            let reporter = Arc::clone(&reporter);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut ts = 0;
                while !stop.load(Ordering::Relaxed) {
                    reporter.collect(ts, &[]);
                    ts += 1;
                }
            })
        })
        .collect();

    let started = Instant::now();
    let result = reporter.get_sql_stats_by_sql_with_retry("select 1", false);
    let elapsed = started.elapsed();
    stop.store(true, Ordering::Relaxed);
    for producer in producers {
        producer.join().expect("producer");
    }

    assert!(result.unwrap_err().is_timeout());
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_secs(2));
}

/// Digest is the raw SQL bytes, no normalization.
struct RawNormalizer;

impl SqlNormalizer for RawNormalizer {
    fn normalize_digest(&self, sql: &str) -> (String, SqlDigest) {
        (sql.to_string(), SqlDigest::new(sql.as_bytes().to_vec()))
    }
}

#[test]
fn test_custom_normalizer_drives_lookup() -> Result<(), TopSqlError> {
    let reporter = MockTopSqlReporter::with_normalizer(ReporterConfig::default(), RawNormalizer)?;
    let digest = SqlDigest::new(b"SELECT 1".to_vec());
    reporter.collect(1, &[CpuTimeRecord::new(digest, plan("p"), 4)]);

    assert_eq!(reporter.get_sql_stats_by_sql("SELECT 1", false).len(), 1);
    assert!(reporter.get_sql_stats_by_sql("select 1", false).is_empty());
    assert_eq!(reporter.normalizer().digest("x").as_bytes(), b"x");
    Ok(())
}
