use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::access::{authorize, Action};
use super::domain::{
    Application, ApplicationId, ApplicationStatus, Modality, NewUser, Principal, Role, User,
    UserId, Vacancy, VacancyDraft, VacancyId, VacancyPatch,
};
use super::eligibility::EligibilityEngine;
use super::error::{BoardError, ConflictReason};
use super::repository::{
    read_with_retry, ApplicationFilter, ApplicationOrder, JobBoardStore,
};
use super::stats::{
    CandidateStatsView, DashboardView, PopularVacancyView, StatisticsAggregator,
    VacancyApplicationCountView, VacancyStatsView,
};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;
const RECENT_USERS_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacancySort {
    #[default]
    CreatedAt,
    Title,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Public vacancy search parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacancyQuery {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub modality: Option<Modality>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub has_available_slots: Option<bool>,
    #[serde(default)]
    pub order_by: Option<VacancySort>,
    #[serde(default)]
    pub order: Option<SortDirection>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStatsView {
    pub total_users: usize,
    pub users_by_role: BTreeMap<Role, u64>,
    pub recent_users: Vec<User>,
}

/// Facade the transport layer talks to: eligibility, statistics, and management operations.
pub struct JobBoardService<S> {
    store: Arc<S>,
    eligibility: EligibilityEngine<S>,
    statistics: StatisticsAggregator<S>,
}

impl<S> JobBoardService<S>
where
    S: JobBoardStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            eligibility: EligibilityEngine::new(store.clone()),
            statistics: StatisticsAggregator::new(store.clone()),
            store,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn apply(
        &self,
        principal: &Principal,
        vacancy_id: &VacancyId,
    ) -> Result<Application, BoardError> {
        self.eligibility.apply(principal, vacancy_id)
    }

    pub fn vacancy_stats(
        &self,
        principal: &Principal,
        vacancy_id: &VacancyId,
    ) -> Result<VacancyStatsView, BoardError> {
        authorize(principal, Action::ViewStatistics)?;
        self.statistics.vacancy_stats(vacancy_id)
    }

    pub fn vacancy_application_count(
        &self,
        principal: &Principal,
        vacancy_id: &VacancyId,
    ) -> Result<VacancyApplicationCountView, BoardError> {
        authorize(principal, Action::ViewStatistics)?;
        self.statistics.vacancy_application_count(vacancy_id)
    }

    pub fn candidate_stats(
        &self,
        principal: &Principal,
        candidate_id: &UserId,
    ) -> Result<CandidateStatsView, BoardError> {
        authorize(principal, Action::ViewStatistics)?;
        self.statistics.candidate_stats(candidate_id)
    }

    pub fn popular_vacancies(
        &self,
        principal: &Principal,
        limit: usize,
    ) -> Result<Vec<PopularVacancyView>, BoardError> {
        authorize(principal, Action::ViewStatistics)?;
        self.statistics.popular_vacancies(limit)
    }

    pub fn dashboard(&self, principal: &Principal) -> Result<DashboardView, BoardError> {
        authorize(principal, Action::ViewStatistics)?;
        self.statistics.dashboard()
    }

    // Applications

    /// Candidates see their own applications; reviewers see all of them.
    pub fn list_applications(&self, principal: &Principal) -> Result<Vec<Application>, BoardError> {
        let filter = if principal.role.permits(Action::ListAllApplications) {
            ApplicationFilter::all()
        } else {
            ApplicationFilter::for_user(principal.id)
        };
        Ok(read_with_retry("list_applications", || {
            self.store
                .list_applications(&filter, ApplicationOrder::AppliedAtDesc, None)
        })?)
    }

    pub fn get_application(
        &self,
        principal: &Principal,
        id: &ApplicationId,
    ) -> Result<Application, BoardError> {
        let application = self.application(id)?;
        if application.user_id != principal.id {
            authorize(principal, Action::ListAllApplications)?;
        }
        Ok(application)
    }

    pub fn update_application_status(
        &self,
        principal: &Principal,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Application, BoardError> {
        authorize(principal, Action::ReviewApplications)?;
        let mut application = self.application(id)?;
        application.status = status;
        self.store.update_application(application.clone())?;
        info!(application = %id, status = status.label(), reviewer = %principal.id, "application status updated");
        Ok(application)
    }

    pub fn remove_application(
        &self,
        principal: &Principal,
        id: &ApplicationId,
    ) -> Result<(), BoardError> {
        authorize(principal, Action::RemoveApplication)?;
        self.application(id)?;
        self.store.remove_application(id)?;
        info!(application = %id, "application removed");
        Ok(())
    }

    // Vacancies

    pub fn create_vacancy(
        &self,
        principal: &Principal,
        draft: VacancyDraft,
    ) -> Result<Vacancy, BoardError> {
        authorize(principal, Action::ManageVacancies)?;
        let vacancy = draft.into_vacancy(Utc::now());
        validate_vacancy(&vacancy)?;
        let stored = self.store.insert_vacancy(vacancy)?;
        info!(vacancy = %stored.id, company = %stored.company, "vacancy created");
        Ok(stored)
    }

    pub fn get_vacancy(&self, id: &VacancyId) -> Result<Vacancy, BoardError> {
        read_with_retry("find_vacancy", || self.store.find_vacancy(id))?
            .ok_or_else(|| BoardError::not_found("vacancy", id))
    }

    pub fn list_vacancies(&self, query: &VacancyQuery) -> Result<Page<Vacancy>, BoardError> {
        let page = query.page.unwrap_or(1);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if page == 0 {
            return Err(BoardError::Validation("page must be at least 1".to_string()));
        }
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(BoardError::Validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let vacancies = read_with_retry("list_vacancies", || self.store.list_vacancies())?;
        let counts: HashMap<VacancyId, u64> = if query.has_available_slots.is_some() {
            read_with_retry("applications_per_vacancy", || {
                self.store.applications_per_vacancy()
            })?
            .into_iter()
            .map(|row| (row.vacancy_id, row.applications_count))
            .collect()
        } else {
            HashMap::new()
        };

        let mut matching: Vec<Vacancy> = vacancies
            .into_iter()
            .filter(|vacancy| matches_query(vacancy, query, &counts))
            .collect();

        let direction = query.order.unwrap_or_default();
        match query.order_by.unwrap_or_default() {
            VacancySort::CreatedAt => matching.sort_by(|left, right| left.created_at.cmp(&right.created_at)),
            VacancySort::Title => matching.sort_by(|left, right| {
                left.title
                    .to_lowercase()
                    .cmp(&right.title.to_lowercase())
            }),
        }
        if direction == SortDirection::Desc {
            matching.reverse();
        }

        let total = matching.len();
        let items = matching
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();

        Ok(Page {
            items,
            total,
            page,
            limit,
        })
    }

    pub fn update_vacancy(
        &self,
        principal: &Principal,
        id: &VacancyId,
        patch: VacancyPatch,
    ) -> Result<Vacancy, BoardError> {
        authorize(principal, Action::ManageVacancies)?;
        // Stored vacancies are always valid, so validating the patch against any snapshot
        // validates the committed result.
        let mut preview = self.get_vacancy(id)?;
        patch.clone().apply_to(&mut preview);
        validate_vacancy(&preview)?;
        let vacancy = self.store.patch_vacancy(id, patch)?;
        info!(vacancy = %id, max_applicants = vacancy.max_applicants, "vacancy updated");
        Ok(vacancy)
    }

    pub fn toggle_vacancy_active(
        &self,
        principal: &Principal,
        id: &VacancyId,
    ) -> Result<Vacancy, BoardError> {
        authorize(principal, Action::ManageVacancies)?;
        let vacancy = self.store.toggle_vacancy_active(id)?;
        info!(vacancy = %id, is_active = vacancy.is_active, "vacancy activity toggled");
        Ok(vacancy)
    }

    pub fn remove_vacancy(&self, principal: &Principal, id: &VacancyId) -> Result<(), BoardError> {
        authorize(principal, Action::RemoveVacancy)?;
        self.get_vacancy(id)?;
        self.store.remove_vacancy(id)?;
        info!(vacancy = %id, "vacancy removed");
        Ok(())
    }

    /// Bulk-create vacancies, stopping at the first invalid draft.
    pub fn import_vacancies(
        &self,
        principal: &Principal,
        drafts: Vec<VacancyDraft>,
    ) -> Result<Vec<Vacancy>, BoardError> {
        authorize(principal, Action::ManageVacancies)?;
        drafts
            .into_iter()
            .map(|draft| self.create_vacancy(principal, draft))
            .collect()
    }

    // Users

    /// Public self-registration; always yields a candidate account.
    pub fn register(&self, new_user: NewUser) -> Result<User, BoardError> {
        self.insert_user(new_user, Role::Candidate)
    }

    /// Administrator-driven account creation with an explicit role.
    pub fn create_user(&self, principal: &Principal, new_user: NewUser) -> Result<User, BoardError> {
        authorize(principal, Action::ManageUsers)?;
        let role = new_user.role.unwrap_or(Role::Candidate);
        self.insert_user(new_user, role)
    }

    /// Creates the first administrator of an empty installation.
    pub fn bootstrap_administrator(&self, new_user: NewUser) -> Result<User, BoardError> {
        let administrators = read_with_retry("count_users_with_role", || {
            self.store.count_users_with_role(Role::Administrator)
        })?;
        if administrators > 0 {
            return Err(BoardError::InvalidState("an administrator already exists"));
        }
        self.insert_user(new_user, Role::Administrator)
    }

    pub fn list_users(&self, principal: &Principal) -> Result<Vec<User>, BoardError> {
        authorize(principal, Action::ManageUsers)?;
        Ok(read_with_retry("list_users", || self.store.list_users())?)
    }

    pub fn get_user(&self, principal: &Principal, id: &UserId) -> Result<User, BoardError> {
        if principal.id != *id {
            authorize(principal, Action::ViewUsers)?;
        }
        self.user(id)
    }

    pub fn change_role(
        &self,
        principal: &Principal,
        id: &UserId,
        role: Role,
    ) -> Result<User, BoardError> {
        authorize(principal, Action::ManageUsers)?;
        if principal.id == *id {
            return Err(BoardError::Forbidden("you cannot change your own role"));
        }
        let mut user = self.user(id)?;
        user.role = role;
        self.store.update_user(user.clone())?;
        info!(user = %id, role = role.label(), "user role changed");
        Ok(user)
    }

    pub fn remove_user(&self, principal: &Principal, id: &UserId) -> Result<(), BoardError> {
        authorize(principal, Action::ManageUsers)?;
        if principal.id == *id {
            return Err(BoardError::InvalidState("you cannot delete your own account"));
        }
        self.user(id)?;
        self.store.remove_user(id)?;
        info!(user = %id, "user removed");
        Ok(())
    }

    pub fn user_stats(&self, principal: &Principal) -> Result<UserStatsView, BoardError> {
        authorize(principal, Action::ViewStatistics)?;
        let users = read_with_retry("list_users", || self.store.list_users())?;
        let mut users_by_role: BTreeMap<Role, u64> =
            Role::ALL.into_iter().map(|role| (role, 0)).collect();
        for user in &users {
            *users_by_role.entry(user.role).or_default() += 1;
        }

        Ok(UserStatsView {
            total_users: users.len(),
            users_by_role,
            recent_users: users.into_iter().take(RECENT_USERS_LIMIT).collect(),
        })
    }

    fn insert_user(&self, new_user: NewUser, role: Role) -> Result<User, BoardError> {
        let name = new_user.name.trim().to_string();
        let email = new_user.email.trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err(BoardError::Validation("name must not be empty".to_string()));
        }
        if !is_plausible_email(&email) {
            return Err(BoardError::Validation(format!("'{email}' is not a valid email")));
        }
        if read_with_retry("find_user_by_email", || self.store.find_user_by_email(&email))?
            .is_some()
        {
            return Err(BoardError::Conflict(ConflictReason::EmailTaken));
        }

        let user = User {
            id: UserId::generate(),
            name,
            email,
            role,
            created_at: Utc::now(),
        };
        let stored = self.store.insert_user(user)?;
        info!(user = %stored.id, role = stored.role.label(), "user registered");
        Ok(stored)
    }

    fn user(&self, id: &UserId) -> Result<User, BoardError> {
        read_with_retry("find_user", || self.store.find_user(id))?
            .ok_or_else(|| BoardError::not_found("user", id))
    }

    fn application(&self, id: &ApplicationId) -> Result<Application, BoardError> {
        read_with_retry("fetch_application", || self.store.fetch_application(id))?
            .ok_or_else(|| BoardError::not_found("application", id))
    }
}

fn validate_vacancy(vacancy: &Vacancy) -> Result<(), BoardError> {
    if vacancy.max_applicants < 1 {
        return Err(BoardError::Validation(
            "max_applicants must be at least 1".to_string(),
        ));
    }

    let required = [
        ("title", &vacancy.title),
        ("description", &vacancy.description),
        ("technologies", &vacancy.technologies),
        ("seniority", &vacancy.seniority),
        ("location", &vacancy.location),
        ("salary_range", &vacancy.salary_range),
        ("company", &vacancy.company),
    ];
    match required.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((field, _)) => Err(BoardError::Validation(format!("{field} must not be empty"))),
        None => Ok(()),
    }
}

fn matches_query(vacancy: &Vacancy, query: &VacancyQuery, counts: &HashMap<VacancyId, u64>) -> bool {
    let contains = |haystack: &str, needle: &Option<String>| {
        needle
            .as_deref()
            .map_or(true, |needle| haystack.to_lowercase().contains(&needle.trim().to_lowercase()))
    };

    if !contains(&vacancy.company, &query.company) || !contains(&vacancy.location, &query.location)
    {
        return false;
    }
    if query.modality.is_some_and(|modality| modality != vacancy.modality) {
        return false;
    }
    if query.is_active.is_some_and(|active| active != vacancy.is_active) {
        return false;
    }
    if let Some(wanted) = query.has_available_slots {
        let taken = counts.get(&vacancy.id).copied().unwrap_or(0);
        let has_slots = taken < u64::from(vacancy.max_applicants);
        if has_slots != wanted {
            return false;
        }
    }
    true
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
