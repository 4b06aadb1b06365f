use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::access::{authorize, Action};
use super::domain::{Application, Principal, VacancyId};
use super::error::{BoardError, ConflictReason};
use super::repository::{
    read_with_retry, ApplicationRepository, NewApplication, SlotLimits, VacancyRepository,
};
use super::slots::{SlotLedger, CANDIDATE_APPLICATION_QUOTA};

/// Decides whether a candidate may claim a seat on a vacancy and records the claim.
///
/// The checks run against a snapshot and can race with concurrent callers, so the store
/// re-validates activity, capacity, and quota inside `insert_application`.
pub struct EligibilityEngine<S> {
    store: Arc<S>,
    ledger: SlotLedger<S>,
}

impl<S> EligibilityEngine<S>
where
    S: VacancyRepository + ApplicationRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        let ledger = SlotLedger::new(store.clone());
        Self { store, ledger }
    }

    /// Apply `principal` to `vacancy_id`, returning the persisted application.
    pub fn apply(
        &self,
        principal: &Principal,
        vacancy_id: &VacancyId,
    ) -> Result<Application, BoardError> {
        let application = self.try_apply(principal, vacancy_id).inspect_err(|err| {
            debug!(candidate = %principal.id, vacancy = %vacancy_id, kind = err.kind(), %err, "application rejected");
        })?;

        info!(
            application = %application.id,
            candidate = %application.user_id,
            vacancy = %application.vacancy_id,
            "application accepted"
        );
        Ok(application)
    }

    fn try_apply(
        &self,
        principal: &Principal,
        vacancy_id: &VacancyId,
    ) -> Result<Application, BoardError> {
        authorize(principal, Action::Apply)?;

        let vacancy = read_with_retry("find_vacancy", || self.store.find_vacancy(vacancy_id))?
            .ok_or_else(|| BoardError::not_found("vacancy", vacancy_id))?;
        if !vacancy.is_active {
            return Err(BoardError::InvalidState("vacancy not active"));
        }

        let existing = read_with_retry("find_application", || {
            self.store.find_application(&principal.id, vacancy_id)
        })?;
        if existing.is_some() {
            return Err(BoardError::Conflict(ConflictReason::AlreadyApplied));
        }

        if self.ledger.vacancy_usage(&vacancy)?.is_exhausted() {
            return Err(BoardError::Conflict(ConflictReason::VacancyFull));
        }

        if self.ledger.candidate_usage(&principal.id)?.is_exhausted() {
            return Err(BoardError::Conflict(ConflictReason::QuotaExceeded));
        }

        let draft = NewApplication {
            user_id: principal.id,
            vacancy_id: vacancy.id,
            applied_at: Utc::now(),
        };
        let limits = SlotLimits {
            candidate_quota: CANDIDATE_APPLICATION_QUOTA,
        };

        // Writes are never retried here: the first attempt may have committed.
        Ok(self.store.insert_application(draft, limits)?)
    }
}
