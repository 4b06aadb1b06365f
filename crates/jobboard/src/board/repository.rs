use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::domain::{
    Application, ApplicationId, Role, User, UserId, Vacancy, VacancyId, VacancyPatch,
};

/// Optional equality filter over the application table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub vacancy_id: Option<VacancyId>,
    pub user_id: Option<UserId>,
}

impl ApplicationFilter {
    pub const fn all() -> Self {
        Self {
            vacancy_id: None,
            user_id: None,
        }
    }

    pub const fn for_vacancy(vacancy_id: VacancyId) -> Self {
        Self {
            vacancy_id: Some(vacancy_id),
            user_id: None,
        }
    }

    pub const fn for_user(user_id: UserId) -> Self {
        Self {
            vacancy_id: None,
            user_id: Some(user_id),
        }
    }

    pub fn matches(&self, application: &Application) -> bool {
        self.vacancy_id
            .map_or(true, |id| application.vacancy_id == id)
            && self.user_id.map_or(true, |id| application.user_id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationOrder {
    /// Newest first; ties fall back to reverse insertion order.
    AppliedAtDesc,
    AppliedAtAsc,
}

/// Columns that support `COUNT(DISTINCT ..)` style aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationColumn {
    VacancyId,
    UserId,
}

/// Limits re-validated by the store inside the insert's critical section.
///
/// Vacancy capacity is not carried here: the store reads it from the vacancy row it locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLimits {
    pub candidate_quota: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewApplication {
    pub user_id: UserId,
    pub vacancy_id: VacancyId,
    pub applied_at: DateTime<Utc>,
}

/// Grouped row produced by `applications_per_vacancy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VacancyApplicationCount {
    pub vacancy_id: VacancyId,
    pub applications_count: u64,
}

/// Storage abstraction for application records.
///
/// `insert_application` is the transaction boundary: implementations must check that the
/// vacancy exists and is active, the `(user_id, vacancy_id)` uniqueness, the vacancy's current
/// `max_applicants`, and the candidate quota atomically with the write.
pub trait ApplicationRepository: Send + Sync {
    fn find_application(
        &self,
        user_id: &UserId,
        vacancy_id: &VacancyId,
    ) -> Result<Option<Application>, RepositoryError>;
    fn fetch_application(&self, id: &ApplicationId)
        -> Result<Option<Application>, RepositoryError>;
    fn count_applications(&self, filter: &ApplicationFilter) -> Result<u64, RepositoryError>;
    fn list_applications(
        &self,
        filter: &ApplicationFilter,
        order: ApplicationOrder,
        limit: Option<usize>,
    ) -> Result<Vec<Application>, RepositoryError>;
    fn count_distinct(&self, column: ApplicationColumn) -> Result<u64, RepositoryError>;
    fn applications_per_vacancy(&self) -> Result<Vec<VacancyApplicationCount>, RepositoryError>;
    fn insert_application(
        &self,
        draft: NewApplication,
        limits: SlotLimits,
    ) -> Result<Application, RepositoryError>;
    fn update_application(&self, application: Application) -> Result<(), RepositoryError>;
    fn remove_application(&self, id: &ApplicationId) -> Result<(), RepositoryError>;
}

/// Storage abstraction for vacancies. Removing a vacancy cascades to its applications.
///
/// `patch_vacancy` and `toggle_vacancy_active` are read-modify-write operations and must run
/// as one transaction. A patch may not lower `max_applicants` below the vacancy's live
/// application count.
pub trait VacancyRepository: Send + Sync {
    fn insert_vacancy(&self, vacancy: Vacancy) -> Result<Vacancy, RepositoryError>;
    fn patch_vacancy(&self, id: &VacancyId, patch: VacancyPatch)
        -> Result<Vacancy, RepositoryError>;
    fn toggle_vacancy_active(&self, id: &VacancyId) -> Result<Vacancy, RepositoryError>;
    fn find_vacancy(&self, id: &VacancyId) -> Result<Option<Vacancy>, RepositoryError>;
    /// Newest first.
    fn list_vacancies(&self) -> Result<Vec<Vacancy>, RepositoryError>;
    fn remove_vacancy(&self, id: &VacancyId) -> Result<(), RepositoryError>;
}

/// Storage abstraction for user accounts.
///
/// Updates and removals that would leave the system without an administrator fail with
/// `LastAdministrator`; removing a user cascades to their applications.
pub trait UserRepository: Send + Sync {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError>;
    fn update_user(&self, user: User) -> Result<(), RepositoryError>;
    fn find_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    /// Newest first.
    fn list_users(&self) -> Result<Vec<User>, RepositoryError>;
    fn count_users_with_role(&self, role: Role) -> Result<u64, RepositoryError>;
    fn remove_user(&self, id: &UserId) -> Result<(), RepositoryError>;
}

/// Everything the job-board services need from a backing store.
pub trait JobBoardStore: UserRepository + VacancyRepository + ApplicationRepository {}

impl<T> JobBoardStore for T where T: UserRepository + VacancyRepository + ApplicationRepository {}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("candidate already holds an application for this vacancy")]
    DuplicateApplication,
    #[error("vacancy is not accepting applications")]
    VacancyInactive,
    #[error("vacancy has no remaining slots")]
    CapacityExceeded,
    #[error("capacity cannot drop below the {current} applications already held")]
    CapacityBelowApplications { current: u64 },
    #[error("candidate holds the maximum number of applications")]
    QuotaExceeded,
    #[error("email already registered")]
    EmailTaken,
    #[error("operation would leave no administrator")]
    LastAdministrator,
    #[error("record already exists")]
    Conflict,
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn missing(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Runs an idempotent read, retrying exactly once when the store reports it is unavailable.
pub(crate) fn read_with_retry<T, F>(operation: &'static str, mut read: F) -> Result<T, RepositoryError>
where
    F: FnMut() -> Result<T, RepositoryError>,
{
    match read() {
        Err(RepositoryError::Unavailable(reason)) => {
            warn!(operation, %reason, "storage read failed, retrying once");
            read()
        }
        other => other,
    }
}
