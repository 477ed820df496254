//! Seeded synthetic producer workloads for benches and concurrency tests.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::collector::TopSqlCollector;
use crate::digest::{PlanDigest, SqlDigest};
use crate::normalizer::{DefaultNormalizer, SqlNormalizer, plan_digest};
use crate::record::{CpuTimeRecord, StatKey};

#[derive(Clone, Debug)]
pub struct WorkloadStatement {
    pub sql: String,
    pub normalized_sql: String,
    pub sql_digest: SqlDigest,
    pub plans: Vec<(PlanDigest, String)>,
}

#[derive(Clone, Debug)]
pub struct Workload {
    pub statements: Vec<WorkloadStatement>,
    pub batches: Vec<Vec<CpuTimeRecord>>,
}

#[derive(Clone, Copy, Debug)]
pub struct WorkloadShape {
    pub statements: usize,
    pub plans_per_statement: usize,
    pub batches: usize,
    pub batch_size: usize,
    pub max_cpu_time_ms: u64,
}

impl Default for WorkloadShape {
    fn default() -> Self {
        Self {
            statements: 16,
            plans_per_statement: 2,
            batches: 32,
            batch_size: 8,
            max_cpu_time_ms: 50,
        }
    }
}

pub fn generate_workload(shape: WorkloadShape, seed: u64) -> Workload {
    assert!(shape.statements > 0, "statements must be positive");
    assert!(shape.plans_per_statement > 0, "plans_per_statement must be positive");
    assert!(shape.max_cpu_time_ms > 0, "max_cpu_time_ms must be positive");

    let statements: Vec<WorkloadStatement> = (0..shape.statements)
        .map(|idx| build_statement(idx, shape.plans_per_statement))
        .collect();

    let mut rng = StdRng::seed_from_u64(seed);
    let batches: Vec<Vec<CpuTimeRecord>> = (0..shape.batches)
        .map(|_| {
            (0..shape.batch_size)
                .map(|_| {
                    let stmt = &statements[rng.gen_range(0..statements.len())];
                    let (plan, _) = &stmt.plans[rng.gen_range(0..stmt.plans.len())];
                    CpuTimeRecord::new(
                        stmt.sql_digest.clone(),
                        plan.clone(),
                        rng.gen_range(1..=shape.max_cpu_time_ms),
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect();

    Workload {
        statements,
        batches,
    }
}

fn build_statement(idx: usize, plans: usize) -> WorkloadStatement {
    let sql = format!("SELECT c{idx}, c{} FROM t{idx} WHERE id = {}", idx + 1, idx * 7);
    let (normalized_sql, sql_digest) = DefaultNormalizer.normalize_digest(&sql);
    let plans = (0..plans)
        .map(|plan_idx| {
            let text = format!("Projection_{plan_idx}\n└─TableReader_{idx}\n  └─TableFullScan t{idx}");
            (plan_digest(&text), text)
        })
        .collect();
    WorkloadStatement {
        sql,
        normalized_sql,
        sql_digest,
        plans,
    }
}

impl Workload {
    pub fn sample_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    /// CPU time per (sql digest, plan digest) after every batch is collected.
    pub fn expected_totals(&self) -> BTreeMap<StatKey, u64> {
        let mut totals = BTreeMap::new();
        for record in self.batches.iter().flatten() {
            *totals.entry(record.key()).or_insert(0u64) += record.cpu_time_ms;
        }
        totals
    }

    /// Announce every statement and plan text to `collector`.
    pub fn register_all<C: TopSqlCollector + ?Sized>(&self, collector: &C) {
        for stmt in &self.statements {
            collector.register_sql(&stmt.sql_digest, &stmt.normalized_sql);
            for (digest, text) in &stmt.plans {
                collector.register_plan(digest, text);
            }
        }
    }

    /// Collect every batch in order, numbering timestamps from `start_ts`.
    pub fn replay<C: TopSqlCollector + ?Sized>(&self, collector: &C, start_ts: u64) {
        for (offset, batch) in self.batches.iter().enumerate() {
            collector.collect(start_ts + offset as u64, batch);
        }
    }
}
