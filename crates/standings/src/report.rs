//! Operator-facing reports. Every skipped item appears here by id with its
//! message; there is no silent failure path.

use std::time::Duration;

use uuid::Uuid;

use crate::orchestrator::RecalcStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Event,
    Result,
    Rider,
    Series,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ItemKind::Event => "event",
            ItemKind::Result => "result",
            ItemKind::Rider => "rider",
            ItemKind::Series => "series",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemError {
    pub kind: ItemKind,
    pub id: Uuid,
    pub message: String,
}

impl ItemError {
    pub fn new(kind: ItemKind, id: Uuid, message: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.id, self.message)
    }
}

/// Outcome of one orchestrator stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub stage: RecalcStage,
    pub processed: u64,
    pub updated: u64,
    pub errors: Vec<ItemError>,
    pub elapsed: Duration,
}

impl StageReport {
    pub fn empty(stage: RecalcStage) -> Self {
        Self {
            stage,
            processed: 0,
            updated: 0,
            errors: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }
}

impl std::fmt::Display for StageReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: processed {}, updated {}, {} errors in {:.1?}",
            self.stage,
            self.processed,
            self.updated,
            self.errors.len(),
            self.elapsed
        )
    }
}

/// Collection counts shown before any stage runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecalcSummary {
    pub events: u64,
    pub riders: u64,
    pub active_series: u64,
}

impl std::fmt::Display for RecalcSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} events, {} riders, {} active series",
            self.events, self.riders, self.active_series
        )
    }
}
