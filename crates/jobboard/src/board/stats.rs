//! Read-only aggregate views over the application records.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;

use super::domain::{Application, UserId, Vacancy, VacancyId};
use super::error::BoardError;
use super::repository::{
    read_with_retry, ApplicationColumn, ApplicationFilter, ApplicationOrder,
    ApplicationRepository, VacancyRepository,
};
use super::slots::SlotLedger;

pub const CANDIDATE_RECENT_LIMIT: usize = 5;
pub const DASHBOARD_RECENT_LIMIT: usize = 10;
pub const DASHBOARD_POPULAR_LIMIT: usize = 5;
pub const DEFAULT_POPULAR_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VacancyStatsView {
    pub vacancy_id: VacancyId,
    pub max_applicants: u32,
    pub current_applications: u64,
    pub available_slots: u64,
    pub is_fully_booked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VacancyApplicationCountView {
    pub vacancy_id: VacancyId,
    pub applications_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateStatsView {
    pub candidate_id: UserId,
    pub total_applications: u64,
    /// Equal to `total_applications`: applications have no withdrawn state.
    pub active_applications: u64,
    pub recent_applications: Vec<Application>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularVacancyView {
    pub vacancy_id: VacancyId,
    pub title: String,
    pub company: String,
    pub applications_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub total_applications: u64,
    pub vacancies_with_applications: u64,
    pub users_with_applications: u64,
    pub recent_applications: Vec<Application>,
    pub most_popular_vacancies: Vec<PopularVacancyView>,
}

/// Recomputes every view from committed state on each call.
pub struct StatisticsAggregator<S> {
    store: Arc<S>,
    ledger: SlotLedger<S>,
}

impl<S> StatisticsAggregator<S>
where
    S: VacancyRepository + ApplicationRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        let ledger = SlotLedger::new(store.clone());
        Self { store, ledger }
    }

    pub fn vacancy_stats(&self, vacancy_id: &VacancyId) -> Result<VacancyStatsView, BoardError> {
        let vacancy = self.vacancy(vacancy_id)?;
        let usage = self.ledger.vacancy_usage(&vacancy)?;

        Ok(VacancyStatsView {
            vacancy_id: vacancy.id,
            max_applicants: vacancy.max_applicants,
            current_applications: usage.taken,
            available_slots: usage.available(),
            is_fully_booked: usage.is_exhausted(),
        })
    }

    pub fn vacancy_application_count(
        &self,
        vacancy_id: &VacancyId,
    ) -> Result<VacancyApplicationCountView, BoardError> {
        let filter = ApplicationFilter::for_vacancy(*vacancy_id);
        let applications_count =
            read_with_retry("count_applications", || self.store.count_applications(&filter))?;
        Ok(VacancyApplicationCountView {
            vacancy_id: *vacancy_id,
            applications_count,
        })
    }

    pub fn candidate_stats(&self, candidate_id: &UserId) -> Result<CandidateStatsView, BoardError> {
        let usage = self.ledger.candidate_usage(candidate_id)?;
        let filter = ApplicationFilter::for_user(*candidate_id);
        let recent_applications = read_with_retry("list_applications", || {
            self.store.list_applications(
                &filter,
                ApplicationOrder::AppliedAtDesc,
                Some(CANDIDATE_RECENT_LIMIT),
            )
        })?;

        Ok(CandidateStatsView {
            candidate_id: *candidate_id,
            total_applications: usage.taken,
            active_applications: usage.taken,
            recent_applications,
        })
    }

    /// Vacancies ranked by application count, then newest vacancy, then id.
    pub fn popular_vacancies(&self, limit: usize) -> Result<Vec<PopularVacancyView>, BoardError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let counts = read_with_retry("applications_per_vacancy", || {
            self.store.applications_per_vacancy()
        })?;

        let mut ranked = Vec::with_capacity(counts.len());
        for row in counts {
            // A vacancy deleted between the two reads simply drops out of the ranking.
            if let Some(vacancy) =
                read_with_retry("find_vacancy", || self.store.find_vacancy(&row.vacancy_id))?
            {
                ranked.push((vacancy, row.applications_count));
            }
        }

        ranked.sort_by(|(left, left_count), (right, right_count)| {
            compare_popularity(left, *left_count, right, *right_count)
        });
        ranked.truncate(limit);

        Ok(ranked
            .into_iter()
            .map(|(vacancy, applications_count)| PopularVacancyView {
                vacancy_id: vacancy.id,
                title: vacancy.title,
                company: vacancy.company,
                applications_count,
            })
            .collect())
    }

    pub fn dashboard(&self) -> Result<DashboardView, BoardError> {
        let all = ApplicationFilter::all();
        let total_applications =
            read_with_retry("count_applications", || self.store.count_applications(&all))?;
        let vacancies_with_applications = read_with_retry("count_distinct", || {
            self.store.count_distinct(ApplicationColumn::VacancyId)
        })?;
        let users_with_applications = read_with_retry("count_distinct", || {
            self.store.count_distinct(ApplicationColumn::UserId)
        })?;
        let recent_applications = read_with_retry("list_applications", || {
            self.store.list_applications(
                &all,
                ApplicationOrder::AppliedAtDesc,
                Some(DASHBOARD_RECENT_LIMIT),
            )
        })?;
        let most_popular_vacancies = self.popular_vacancies(DASHBOARD_POPULAR_LIMIT)?;

        Ok(DashboardView {
            total_applications,
            vacancies_with_applications,
            users_with_applications,
            recent_applications,
            most_popular_vacancies,
        })
    }

    fn vacancy(&self, vacancy_id: &VacancyId) -> Result<Vacancy, BoardError> {
        read_with_retry("find_vacancy", || self.store.find_vacancy(vacancy_id))?
            .ok_or_else(|| BoardError::not_found("vacancy", vacancy_id))
    }
}

fn compare_popularity(left: &Vacancy, left_count: u64, right: &Vacancy, right_count: u64) -> Ordering {
    right_count
        .cmp(&left_count)
        .then_with(|| right.created_at.cmp(&left.created_at))
        .then_with(|| left.id.cmp(&right.id))
}
