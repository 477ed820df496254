use crate::digest::{PlanDigest, SqlDigest};
use crate::record::CpuTimeRecord;

/// Producer-side seam for top SQL data.
///
/// Statement execution code announces normalized SQL and plan text once per
/// digest and periodically hands over batches of CPU-time samples. The real
/// reporter ships these to a remote collector;
/// [`MockTopSqlReporter`](crate::MockTopSqlReporter) aggregates them in memory.
///
/// Implementations must tolerate calls from any thread and must never fail:
/// repeated registrations of a known digest are ignored.
pub trait TopSqlCollector: Send + Sync {
    /// Ingest one batch of samples taken at `timestamp` (seconds since epoch).
    fn collect(&self, timestamp: u64, records: &[CpuTimeRecord]);

    fn register_sql(&self, sql_digest: &SqlDigest, normalized_sql: &str);

    fn register_plan(&self, plan_digest: &PlanDigest, normalized_plan: &str);
}
