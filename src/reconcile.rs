//! Reconciliation of two trade datasets.
//!
//! Trades are grouped by transaction hash. For every transaction present in
//! both datasets, the groups agree on a dimension if *any* value overlaps:
//! a common side, a common outcome, or a pair of prices within
//! [`PRICE_TOLERANCE`] of the reference price.
//!
//! This is a loose diagnostic: a transaction containing several trades
//! matches as soon as one of them does, so real mismatches can be hidden.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use itertools::Itertools;

use crate::csv_io::TradeRecord;

/// Relative price tolerance.
pub const PRICE_TOLERANCE: f64 = 0.01;

/// Number of mismatching groups kept in the report by default.
pub const DEFAULT_MAX_MISMATCHES: usize = 10;

/// Number of prices shown per mismatching group.
const SHOWN_PRICES: usize = 3;

/// Comparison of the trades of a single transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupComparison {
    pub tx_hash: String,
    pub reference_rows: usize,
    pub candidate_rows: usize,
    pub reference_sides: BTreeSet<String>,
    pub candidate_sides: BTreeSet<String>,
    pub reference_outcomes: BTreeSet<String>,
    pub candidate_outcomes: BTreeSet<String>,
    pub reference_prices: Vec<f64>,
    pub candidate_prices: Vec<f64>,
}

impl GroupComparison {
    pub fn sides_match(&self) -> bool {
        !self.reference_sides.is_disjoint(&self.candidate_sides)
    }

    pub fn outcomes_match(&self) -> bool {
        !self.reference_outcomes.is_disjoint(&self.candidate_outcomes)
    }

    pub fn price_match(&self) -> bool {
        self.reference_prices
            .iter()
            .cartesian_product(&self.candidate_prices)
            .any(|(r, c)| *r != 0.0 && ((r - c) / r).abs() < PRICE_TOLERANCE)
    }

    fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !self.sides_match() {
            issues.push(format!(
                "sides: ref={:?}, cleaned={:?}",
                self.reference_sides, self.candidate_sides
            ));
        }
        if !self.outcomes_match() {
            issues.push(format!(
                "outcomes: ref={:?}, cleaned={:?}",
                self.reference_outcomes, self.candidate_outcomes
            ));
        }
        if !self.price_match() {
            issues.push(format!(
                "prices: ref={:?}, cleaned={:?}",
                &self.reference_prices[..self.reference_prices.len().min(SHOWN_PRICES)],
                &self.candidate_prices[..self.candidate_prices.len().min(SHOWN_PRICES)],
            ));
        }
        issues
    }
}

/// Transaction group disagreeing in at least one dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct Mismatch {
    pub tx_hash: String,
    pub reference_rows: usize,
    pub candidate_rows: usize,
    pub issues: Vec<String>,
}

/// Aggregate agreement statistics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReconciliationReport {
    pub groups: usize,
    pub sides_correct: usize,
    pub outcomes_correct: usize,
    pub prices_correct: usize,
    pub reference_rows: usize,
    pub candidate_rows: usize,
    pub total_mismatches: usize,
    /// First mismatching groups, bounded.
    pub mismatches: Vec<Mismatch>,
}

impl ReconciliationReport {
    pub fn side_accuracy(&self) -> Option<f64> {
        self.accuracy(self.sides_correct)
    }

    pub fn outcome_accuracy(&self) -> Option<f64> {
        self.accuracy(self.outcomes_correct)
    }

    pub fn price_accuracy(&self) -> Option<f64> {
        self.accuracy(self.prices_correct)
    }

    fn accuracy(&self, correct: usize) -> Option<f64> {
        (self.groups > 0).then(|| correct as f64 / self.groups as f64 * 100.0)
    }
}

fn group_by_tx(records: &[TradeRecord]) -> BTreeMap<&str, Vec<&TradeRecord>> {
    records.iter().fold(BTreeMap::new(), |mut groups, r| {
        groups.entry(r.transaction_hash.as_str()).or_default().push(r);
        groups
    })
}

fn labels<'a>(
    rows: &[&'a TradeRecord],
    field: impl Fn(&'a TradeRecord) -> &'a str,
) -> BTreeSet<String> {
    rows.iter()
        .map(|&r| field(r).trim())
        .filter(|v| !v.is_empty())
        .map(str::to_uppercase)
        .collect()
}

fn prices(rows: &[&TradeRecord]) -> Vec<f64> {
    rows.iter()
        .filter_map(|r| r.price.trim().parse::<f64>().ok())
        .filter(|p| p.is_finite())
        .collect()
}

/// Compares transaction groups present in both datasets, in hash order.
pub fn compare_groups(reference: &[TradeRecord], candidate: &[TradeRecord]) -> Vec<GroupComparison> {
    let candidate = group_by_tx(candidate);
    group_by_tx(reference)
        .into_iter()
        .filter_map(|(tx_hash, ref_rows)| {
            let cand_rows = candidate.get(tx_hash)?;
            Some(GroupComparison {
                tx_hash: tx_hash.to_string(),
                reference_rows: ref_rows.len(),
                candidate_rows: cand_rows.len(),
                reference_sides: labels(&ref_rows, |r| &r.side),
                candidate_sides: labels(cand_rows, |r| &r.side),
                reference_outcomes: labels(&ref_rows, |r| &r.outcome),
                candidate_outcomes: labels(cand_rows, |r| &r.outcome),
                reference_prices: prices(&ref_rows),
                candidate_prices: prices(cand_rows),
            })
        })
        .collect()
}

/// Reconciles candidate trades against the reference dataset.
pub fn reconcile(
    reference: &[TradeRecord],
    candidate: &[TradeRecord],
    max_mismatches: usize,
) -> ReconciliationReport {
    let groups = compare_groups(reference, candidate);
    let mismatches = groups
        .iter()
        .filter_map(|g| {
            let issues = g.issues();
            (!issues.is_empty()).then(|| Mismatch {
                tx_hash: g.tx_hash.clone(),
                reference_rows: g.reference_rows,
                candidate_rows: g.candidate_rows,
                issues,
            })
        })
        .collect_vec();

    ReconciliationReport {
        groups: groups.len(),
        sides_correct: groups.iter().filter(|g| g.sides_match()).count(),
        outcomes_correct: groups.iter().filter(|g| g.outcomes_match()).count(),
        prices_correct: groups.iter().filter(|g| g.price_match()).count(),
        reference_rows: groups.iter().map(|g| g.reference_rows).sum(),
        candidate_rows: groups.iter().map(|g| g.candidate_rows).sum(),
        total_mismatches: mismatches.len(),
        mismatches: mismatches.into_iter().take(max_mismatches).collect(),
    }
}

impl fmt::Display for ReconciliationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.groups == 0 {
            return writeln!(f, "No matching transaction groups found!");
        }

        writeln!(f, "=== TRANSACTION GROUP ACCURACY ===")?;
        writeln!(f, "Total transaction groups: {}", self.groups)?;

        let sections = [
            ("SIDE (Buy/Sell)", self.sides_correct, self.side_accuracy()),
            ("OUTCOME (Yes/No)", self.outcomes_correct, self.outcome_accuracy()),
            ("PRICE (within 1%)", self.prices_correct, self.price_accuracy()),
        ];
        for (name, correct, accuracy) in sections {
            writeln!(f, "\n=== {name} ACCURACY ===")?;
            writeln!(f, "Correct groups: {correct}")?;
            writeln!(f, "Incorrect groups: {}", self.groups - correct)?;
            if let Some(accuracy) = accuracy {
                writeln!(f, "Accuracy: {accuracy:.1}%")?;
            }
        }

        if !self.mismatches.is_empty() {
            writeln!(f, "\n=== INCORRECT TRANSACTION GROUPS ===")?;
            for (i, m) in self.mismatches.iter().enumerate() {
                writeln!(
                    f,
                    "{}. TX: {}... (ref: {} rows, cleaned: {} rows)",
                    i + 1,
                    m.tx_hash.chars().take(20).collect::<String>(),
                    m.reference_rows,
                    m.candidate_rows
                )?;
                for issue in &m.issues {
                    writeln!(f, "   - {issue}")?;
                }
            }
            if self.total_mismatches > self.mismatches.len() {
                writeln!(
                    f,
                    "... and {} more incorrect groups",
                    self.total_mismatches - self.mismatches.len()
                )?;
            }
        }

        writeln!(f, "\n=== SUMMARY STATS ===")?;
        writeln!(f, "Total reference rows: {}", self.reference_rows)?;
        writeln!(f, "Total cleaned rows: {}", self.candidate_rows)?;
        writeln!(
            f,
            "Row count difference: {}",
            self.candidate_rows as i64 - self.reference_rows as i64
        )
    }
}
