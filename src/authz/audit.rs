/*!
 * Decision Audit Trail
 * Records authorization decisions for security monitoring
 */

use super::types::AuthorizationOutcome;
use crate::core::limits::{MAX_AUDIT_EVENTS, MAX_AUDIT_EVENTS_PER_SUBJECT};
use crate::core::{AccessType, Decision, PolicyId, ResourceId, SubjectId};
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::collections::VecDeque;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Info,
    Warning,
    Critical,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuditEvent {
    pub subject: SubjectId,
    pub access_type: AccessType,
    pub resource: Option<ResourceId>,
    pub decision: Decision,
    pub fired: Vec<PolicyId>,
    pub reason: String,
    pub cached: bool,
    pub severity: AuditSeverity,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub logged_at: SystemTime,
}

impl AuditEvent {
    pub fn new(outcome: &AuthorizationOutcome, resource: Option<ResourceId>) -> Self {
        let severity = match (outcome.decision, outcome.access_type) {
            (Decision::Permitted, _) => AuditSeverity::Info,
            // Denied destructive operations are more severe
            (Decision::Denied, AccessType::Delete | AccessType::Execute) => AuditSeverity::Critical,
            (Decision::Denied, _) => AuditSeverity::Warning,
        };

        Self {
            subject: outcome.subject.clone(),
            access_type: outcome.access_type,
            resource,
            decision: outcome.decision,
            fired: outcome.fired.clone(),
            reason: outcome.reason.clone(),
            cached: outcome.cached,
            severity,
            logged_at: SystemTime::now(),
        }
    }

    pub fn is_denied(&self) -> bool {
        !self.decision.is_permitted()
    }
}

/// Audit logger for authorization decisions
pub struct AuditLogger {
    /// Global event log (ring buffer)
    events: RwLock<VecDeque<AuditEvent>>,
    subject_events: DashMap<SubjectId, VecDeque<AuditEvent>, RandomState>,
    denial_counts: DashMap<SubjectId, u64, RandomState>,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(VecDeque::with_capacity(1024)),
            subject_events: DashMap::with_hasher(RandomState::new()),
            denial_counts: DashMap::with_hasher(RandomState::new()),
        }
    }

    pub fn log(&self, event: AuditEvent) {
        let subject = event.subject.clone();
        let is_denied = event.is_denied();

        {
            let mut events = self.events.write();
            if events.len() >= MAX_AUDIT_EVENTS {
                events.pop_front();
            }
            events.push_back(event.clone());
        }

        {
            let mut entry = self.subject_events.entry(subject.clone()).or_default();
            if entry.len() >= MAX_AUDIT_EVENTS_PER_SUBJECT {
                entry.pop_front();
            }
            entry.push_back(event);
        }

        if is_denied {
            *self.denial_counts.entry(subject).or_insert(0) += 1;
        }
    }

    /// Most recent events first
    pub fn recent(&self, limit: usize) -> Vec<AuditEvent> {
        let events = self.events.read();
        events.iter().rev().take(limit).cloned().collect()
    }

    pub fn for_subject(&self, subject: &SubjectId, limit: usize) -> Vec<AuditEvent> {
        self.subject_events
            .get(subject)
            .map(|entry| entry.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn denial_count(&self, subject: &SubjectId) -> u64 {
        self.denial_counts.get(subject).map(|e| *e).unwrap_or(0)
    }

    pub fn subjects_with_denials(&self) -> Vec<(SubjectId, u64)> {
        let mut denials: Vec<_> = self
            .denial_counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        denials.sort();
        denials
    }

    pub fn clear_subject(&self, subject: &SubjectId) {
        self.subject_events.remove(subject);
        self.denial_counts.remove(subject);
    }

    pub fn clear_all(&self) {
        self.events.write().clear();
        self.subject_events.clear();
        self.denial_counts.clear();
    }

    pub fn stats(&self) -> AuditStats {
        AuditStats {
            total_events: self.events.read().len(),
            total_denials: self.denial_counts.iter().map(|e| *e.value()).sum(),
            subjects_tracked: self.subject_events.len(),
        }
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub total_events: usize,
    pub total_denials: u64,
    pub subjects_tracked: usize,
}
