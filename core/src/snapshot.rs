//! Persisted outcome of a completed questionnaire.
//!
//! The engine does no I/O. It builds [`AssessmentSnapshot`] values and talks
//! to persistence through [`RecordStore`]; [`InMemoryRecordStore`] backs tests
//! and embedders that keep their own durability.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculator::{ProtectionLevel, RiskLevel};
use crate::composer;
use crate::error::AssessmentError;
use crate::path::{self, AssessmentType};
use crate::responses::ResponseMap;
use crate::service::ServiceTier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentSnapshot {
    /// UUIDv7, time-sortable
    pub id: Uuid,
    pub completed_at: DateTime<Utc>,
    /// Tier of the path actually used (after escalation)
    pub risk_level: RiskLevel,
    /// Tier implied by the score alone
    pub computed_level: RiskLevel,
    pub score: u8,
    pub assessment_type: AssessmentType,
    pub protection_level: ProtectionLevel,
    pub service_tier: ServiceTier,
    pub confidence: u8,
    pub presented_steps: usize,
    pub answered_steps: usize,
}

impl AssessmentSnapshot {
    pub fn capture(responses: &ResponseMap) -> Self {
        Self::capture_at(responses, Utc::now())
    }

    pub fn capture_at(responses: &ResponseMap, now: DateTime<Utc>) -> Self {
        let resolution = path::resolve_assessment_path_at(responses, now);
        let steps = composer::compose_for_path(&resolution.path, responses);
        let answered_steps = steps
            .iter()
            .filter(|step| responses.is_answered(&step.response_key()))
            .count();

        Self {
            id: Uuid::now_v7(),
            completed_at: now,
            risk_level: resolution.path.risk_level,
            computed_level: resolution.computed_level,
            score: resolution.assessment.matrix.score,
            assessment_type: resolution.path.assessment_type,
            protection_level: resolution.path.protection_level,
            service_tier: ServiceTier::for_path(&resolution.path),
            confidence: resolution.assessment.confidence,
            presented_steps: steps.len(),
            answered_steps,
        }
    }
}

/// Query-by-filter criteria. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_tier: Option<ServiceTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_after: Option<DateTime<Utc>>,
}

impl SnapshotFilter {
    pub fn matches(&self, snapshot: &AssessmentSnapshot) -> bool {
        self.risk_level.is_none_or(|level| snapshot.risk_level == level)
            && self.service_tier.is_none_or(|tier| snapshot.service_tier == tier)
            && self
                .completed_after
                .is_none_or(|after| snapshot.completed_at > after)
    }
}

/// Create / read / update / query-by-filter persistence for snapshots.
pub trait RecordStore {
    fn create(&mut self, snapshot: AssessmentSnapshot) -> Result<AssessmentSnapshot, AssessmentError>;
    fn get(&self, id: Uuid) -> Result<Option<AssessmentSnapshot>, AssessmentError>;
    fn update(&mut self, snapshot: AssessmentSnapshot) -> Result<AssessmentSnapshot, AssessmentError>;
    /// Matching snapshots, oldest first.
    fn query(&self, filter: &SnapshotFilter) -> Result<Vec<AssessmentSnapshot>, AssessmentError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    records: BTreeMap<Uuid, AssessmentSnapshot>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = AssessmentSnapshot>) -> Self {
        Self {
            records: records.into_iter().map(|s| (s.id, s)).collect(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &AssessmentSnapshot> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn create(&mut self, snapshot: AssessmentSnapshot) -> Result<AssessmentSnapshot, AssessmentError> {
        if self.records.contains_key(&snapshot.id) {
            return Err(AssessmentError::Store(format!(
                "snapshot {} already exists",
                snapshot.id
            )));
        }
        self.records.insert(snapshot.id, snapshot.clone());
        Ok(snapshot)
    }

    fn get(&self, id: Uuid) -> Result<Option<AssessmentSnapshot>, AssessmentError> {
        Ok(self.records.get(&id).cloned())
    }

    fn update(&mut self, snapshot: AssessmentSnapshot) -> Result<AssessmentSnapshot, AssessmentError> {
        match self.records.get_mut(&snapshot.id) {
            Some(existing) => {
                *existing = snapshot.clone();
                Ok(snapshot)
            }
            None => Err(AssessmentError::Store(format!(
                "snapshot {} not found",
                snapshot.id
            ))),
        }
    }

    fn query(&self, filter: &SnapshotFilter) -> Result<Vec<AssessmentSnapshot>, AssessmentError> {
        let mut matches: Vec<AssessmentSnapshot> = self
            .records
            .values()
            .filter(|snapshot| filter.matches(snapshot))
            .cloned()
            .collect();
        matches.sort_by_key(|snapshot| (snapshot.completed_at, snapshot.id));
        Ok(matches)
    }
}
