use serde::{Deserialize, Serialize};

use crate::digest::{PlanDigest, SqlDigest};

/// CPU time attributed to one (statement, plan) pair.
///
/// Used both as an ingested sample and as the accumulated stat record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuTimeRecord {
    pub sql_digest: SqlDigest,
    pub plan_digest: PlanDigest,
    pub cpu_time_ms: u64,
}

impl CpuTimeRecord {
    pub fn new(sql_digest: SqlDigest, plan_digest: PlanDigest, cpu_time_ms: u64) -> Self {
        Self {
            sql_digest,
            plan_digest,
            cpu_time_ms,
        }
    }

    pub fn key(&self) -> StatKey {
        StatKey {
            sql_digest: self.sql_digest.clone(),
            plan_digest: self.plan_digest.clone(),
        }
    }
}

/// Identity of a stat record.
///
/// The two digests stay separate fields, so a plan digest overlapping the
/// tail of another statement's SQL digest cannot alias a different record.
// Unlike a key built by concatenating the digest bytes, ("ab", "c") and
// ("a", "bc") are distinct records here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatKey {
    pub sql_digest: SqlDigest,
    pub plan_digest: PlanDigest,
}
