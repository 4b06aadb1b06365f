//! Process-local store used by the API binary, the demo, and tests.
//!
//! A single mutex guards all three tables, so every trait method is one transaction.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Role, User, UserId, Vacancy, VacancyId,
    VacancyPatch,
};
use super::repository::{
    ApplicationColumn, ApplicationFilter, ApplicationOrder, ApplicationRepository,
    NewApplication, RepositoryError, SlotLimits, UserRepository, VacancyApplicationCount,
    VacancyRepository,
};

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    vacancies: Vec<Vacancy>,
    applications: Vec<Application>,
}

impl MemoryState {
    fn count_matching(&self, filter: &ApplicationFilter) -> u64 {
        self.applications
            .iter()
            .filter(|application| filter.matches(application))
            .count() as u64
    }

    fn administrators(&self) -> usize {
        self.users
            .iter()
            .filter(|user| user.role == Role::Administrator)
            .count()
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryJobBoardStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryJobBoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }
}

/// Newest first, ties resolved by reverse insertion order.
fn newest_first<T, F>(items: &[T], timestamp: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> chrono::DateTime<chrono::Utc>,
{
    let mut ordered: Vec<T> = items.iter().rev().cloned().collect();
    ordered.sort_by(|left, right| timestamp(right).cmp(&timestamp(left)));
    ordered
}

impl ApplicationRepository for InMemoryJobBoardStore {
    fn find_application(
        &self,
        user_id: &UserId,
        vacancy_id: &VacancyId,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard
            .applications
            .iter()
            .find(|application| {
                application.user_id == *user_id && application.vacancy_id == *vacancy_id
            })
            .cloned())
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard
            .applications
            .iter()
            .find(|application| application.id == *id)
            .cloned())
    }

    fn count_applications(&self, filter: &ApplicationFilter) -> Result<u64, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.count_matching(filter))
    }

    fn list_applications(
        &self,
        filter: &ApplicationFilter,
        order: ApplicationOrder,
        limit: Option<usize>,
    ) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.lock()?;
        let matching: Vec<Application> = guard
            .applications
            .iter()
            .filter(|application| filter.matches(application))
            .cloned()
            .collect();
        drop(guard);

        let mut ordered = newest_first(&matching, |application| application.applied_at);
        if order == ApplicationOrder::AppliedAtAsc {
            ordered.reverse();
        }
        if let Some(limit) = limit {
            ordered.truncate(limit);
        }
        Ok(ordered)
    }

    fn count_distinct(&self, column: ApplicationColumn) -> Result<u64, RepositoryError> {
        let guard = self.lock()?;
        let count = match column {
            ApplicationColumn::VacancyId => guard
                .applications
                .iter()
                .map(|application| application.vacancy_id)
                .collect::<BTreeSet<_>>()
                .len(),
            ApplicationColumn::UserId => guard
                .applications
                .iter()
                .map(|application| application.user_id)
                .collect::<BTreeSet<_>>()
                .len(),
        };
        Ok(count as u64)
    }

    fn applications_per_vacancy(&self) -> Result<Vec<VacancyApplicationCount>, RepositoryError> {
        let guard = self.lock()?;
        let mut grouped: BTreeMap<VacancyId, u64> = BTreeMap::new();
        for application in &guard.applications {
            *grouped.entry(application.vacancy_id).or_default() += 1;
        }
        Ok(grouped
            .into_iter()
            .map(|(vacancy_id, applications_count)| VacancyApplicationCount {
                vacancy_id,
                applications_count,
            })
            .collect())
    }

    fn insert_application(
        &self,
        draft: NewApplication,
        limits: SlotLimits,
    ) -> Result<Application, RepositoryError> {
        let mut guard = self.lock()?;

        let vacancy = guard
            .vacancies
            .iter()
            .find(|vacancy| vacancy.id == draft.vacancy_id)
            .ok_or_else(|| RepositoryError::missing("vacancy", draft.vacancy_id))?;
        if !vacancy.is_active {
            return Err(RepositoryError::VacancyInactive);
        }
        let max_applicants = vacancy.max_applicants;
        if guard.applications.iter().any(|application| {
            application.user_id == draft.user_id && application.vacancy_id == draft.vacancy_id
        }) {
            return Err(RepositoryError::DuplicateApplication);
        }
        if guard.count_matching(&ApplicationFilter::for_vacancy(draft.vacancy_id))
            >= u64::from(max_applicants)
        {
            return Err(RepositoryError::CapacityExceeded);
        }
        if guard.count_matching(&ApplicationFilter::for_user(draft.user_id))
            >= u64::from(limits.candidate_quota)
        {
            return Err(RepositoryError::QuotaExceeded);
        }

        let application = Application {
            id: ApplicationId::generate(),
            user_id: draft.user_id,
            vacancy_id: draft.vacancy_id,
            applied_at: draft.applied_at,
            status: ApplicationStatus::Submitted,
        };
        guard.applications.push(application.clone());
        Ok(application)
    }

    fn update_application(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let slot = guard
            .applications
            .iter_mut()
            .find(|existing| existing.id == application.id)
            .ok_or_else(|| RepositoryError::missing("application", application.id))?;
        if slot.user_id != application.user_id || slot.vacancy_id != application.vacancy_id {
            return Err(RepositoryError::Conflict);
        }
        *slot = application;
        Ok(())
    }

    fn remove_application(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let before = guard.applications.len();
        guard.applications.retain(|application| application.id != *id);
        if guard.applications.len() == before {
            return Err(RepositoryError::missing("application", id));
        }
        Ok(())
    }
}

impl VacancyRepository for InMemoryJobBoardStore {
    fn insert_vacancy(&self, vacancy: Vacancy) -> Result<Vacancy, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.vacancies.iter().any(|existing| existing.id == vacancy.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.vacancies.push(vacancy.clone());
        Ok(vacancy)
    }

    fn patch_vacancy(
        &self,
        id: &VacancyId,
        patch: VacancyPatch,
    ) -> Result<Vacancy, RepositoryError> {
        let mut guard = self.lock()?;
        let current = guard.count_matching(&ApplicationFilter::for_vacancy(*id));
        let slot = guard
            .vacancies
            .iter_mut()
            .find(|existing| existing.id == *id)
            .ok_or_else(|| RepositoryError::missing("vacancy", id))?;

        let mut patched = slot.clone();
        patch.apply_to(&mut patched);
        if u64::from(patched.max_applicants) < current {
            return Err(RepositoryError::CapacityBelowApplications { current });
        }
        *slot = patched.clone();
        Ok(patched)
    }

    fn toggle_vacancy_active(&self, id: &VacancyId) -> Result<Vacancy, RepositoryError> {
        let mut guard = self.lock()?;
        let slot = guard
            .vacancies
            .iter_mut()
            .find(|existing| existing.id == *id)
            .ok_or_else(|| RepositoryError::missing("vacancy", id))?;
        slot.is_active = !slot.is_active;
        Ok(slot.clone())
    }

    fn find_vacancy(&self, id: &VacancyId) -> Result<Option<Vacancy>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.vacancies.iter().find(|vacancy| vacancy.id == *id).cloned())
    }

    fn list_vacancies(&self) -> Result<Vec<Vacancy>, RepositoryError> {
        let guard = self.lock()?;
        Ok(newest_first(&guard.vacancies, |vacancy| vacancy.created_at))
    }

    fn remove_vacancy(&self, id: &VacancyId) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let before = guard.vacancies.len();
        guard.vacancies.retain(|vacancy| vacancy.id != *id);
        if guard.vacancies.len() == before {
            return Err(RepositoryError::missing("vacancy", id));
        }
        guard
            .applications
            .retain(|application| application.vacancy_id != *id);
        Ok(())
    }
}

impl UserRepository for InMemoryJobBoardStore {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.users.iter().any(|existing| existing.id == user.id) {
            return Err(RepositoryError::Conflict);
        }
        if guard
            .users
            .iter()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(RepositoryError::EmailTaken);
        }
        guard.users.push(user.clone());
        Ok(user)
    }

    fn update_user(&self, user: User) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        if guard.users.iter().any(|existing| {
            existing.id != user.id && existing.email.eq_ignore_ascii_case(&user.email)
        }) {
            return Err(RepositoryError::EmailTaken);
        }
        let administrators = guard.administrators();
        let slot = guard
            .users
            .iter_mut()
            .find(|existing| existing.id == user.id)
            .ok_or_else(|| RepositoryError::missing("user", user.id))?;
        if slot.role == Role::Administrator
            && user.role != Role::Administrator
            && administrators <= 1
        {
            return Err(RepositoryError::LastAdministrator);
        }
        *slot = user;
        Ok(())
    }

    fn find_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.users.iter().find(|user| user.id == *id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard
            .users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let guard = self.lock()?;
        Ok(newest_first(&guard.users, |user| user.created_at))
    }

    fn count_users_with_role(&self, role: Role) -> Result<u64, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.users.iter().filter(|user| user.role == role).count() as u64)
    }

    fn remove_user(&self, id: &UserId) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let user = guard
            .users
            .iter()
            .find(|user| user.id == *id)
            .ok_or_else(|| RepositoryError::missing("user", id))?;
        if user.role == Role::Administrator && guard.administrators() <= 1 {
            return Err(RepositoryError::LastAdministrator);
        }
        guard.users.retain(|user| user.id != *id);
        guard.applications.retain(|application| application.user_id != *id);
        Ok(())
    }
}
