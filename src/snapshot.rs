//! Point-in-time copy of the reporter, for diagnostics.
//!
//! A snapshot owns cloned data and is unaffected by later collects. Maps are
//! ordered by hex digest and stats by (sql digest, plan digest), so two
//! snapshots of the same state serialize identically.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TopSqlError};
use crate::record::CpuTimeRecord;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReporterSnapshot {
    pub collect_count: u64,
    pub last_collect_ts: Option<u64>,
    /// Hex SQL digest -> normalized SQL.
    pub sqls: BTreeMap<String, String>,
    /// Hex plan digest -> normalized plan.
    pub plans: BTreeMap<String, String>,
    pub stats: Vec<CpuTimeRecord>,
}

impl ReporterSnapshot {
    pub fn total_cpu_time_ms(&self) -> u64 {
        self.stats
            .iter()
            .fold(0u64, |acc, record| acc.saturating_add(record.cpu_time_ms))
    }

    /// Stats for `sql_digest` (hex), in snapshot order.
    pub fn stats_for_sql_hex<'a>(&'a self, sql_digest: &'a str) -> impl Iterator<Item = &'a CpuTimeRecord> {
        self.stats
            .iter()
            .filter(move |record| record.sql_digest.to_hex() == sql_digest)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(TopSqlError::from)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(TopSqlError::from)
    }
}
