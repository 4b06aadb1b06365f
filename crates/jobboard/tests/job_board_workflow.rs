use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use jobboard::board::{
    seed_demo_data, Application, ApplicationColumn, ApplicationFilter, ApplicationId,
    ApplicationOrder, ApplicationRepository, BoardError, ConflictReason, InMemoryJobBoardStore,
    JobBoardService, Modality, NewApplication, NewUser, RepositoryError, Role, SlotLimits, User,
    UserId, UserRepository, Vacancy, VacancyApplicationCount, VacancyDraft, VacancyId,
    VacancyPatch, VacancyRepository,
};

fn draft(title: &str, max_applicants: u32) -> VacancyDraft {
    VacancyDraft {
        title: title.to_string(),
        description: format!("{title} opening"),
        technologies: "Rust".to_string(),
        seniority: "Mid".to_string(),
        soft_skills: None,
        location: "Remote".to_string(),
        modality: Modality::Remote,
        salary_range: "USD 3k".to_string(),
        company: "Workflow Co".to_string(),
        max_applicants,
    }
}

fn person(name: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: format!("{}@workflow.test", name.to_lowercase()),
        role: None,
    }
}

#[test]
fn candidate_lifecycle_from_registration_to_dashboard() {
    let service = JobBoardService::new(Arc::new(InMemoryJobBoardStore::new()));
    let admin = service
        .bootstrap_administrator(person("Root"))
        .expect("bootstrap")
        .principal();
    let manager = service
        .create_user(
            &admin,
            NewUser {
                role: Some(Role::Manager),
                ..person("Lead")
            },
        )
        .expect("manager")
        .principal();

    let vacancies: Vec<Vacancy> = ["Alpha", "Beta", "Gamma", "Delta"]
        .into_iter()
        .map(|title| service.create_vacancy(&manager, draft(title, 2)))
        .collect::<Result<_, _>>()
        .expect("vacancies");

    let ana = service.register(person("Ana")).expect("ana").principal();
    for vacancy in &vacancies[..3] {
        service.apply(&ana, &vacancy.id).expect("within quota");
    }
    assert_eq!(
        service.apply(&ana, &vacancies[3].id),
        Err(BoardError::Conflict(ConflictReason::QuotaExceeded))
    );

    let stats = service
        .candidate_stats(&manager, &ana.id)
        .expect("candidate stats");
    assert_eq!(stats.total_applications, 3);
    assert_eq!(stats.active_applications, 3);

    let dashboard = service.dashboard(&admin).expect("dashboard");
    assert_eq!(dashboard.total_applications, 3);
    assert_eq!(dashboard.vacancies_with_applications, 3);
    assert_eq!(dashboard.users_with_applications, 1);
    assert_eq!(dashboard.most_popular_vacancies.len(), 3);
}

#[test]
fn seeded_installation_rejects_further_applications_to_full_vacancies() {
    let service = JobBoardService::new(Arc::new(InMemoryJobBoardStore::new()));
    let summary = seed_demo_data(&service).expect("seed");

    let newcomer = service.register(person("Newcomer")).expect("register").principal();
    let full = &summary.vacancies[0];
    assert_eq!(
        service.apply(&newcomer, &full.id),
        Err(BoardError::Conflict(ConflictReason::VacancyFull))
    );

    let open = &summary.vacancies[2];
    service.apply(&newcomer, &open.id).expect("open seat");
}

/// Delegates to the in-memory store but reports an outage for the first `outages`
/// application counts and for every application insert when `reject_writes` is set.
/// When `stale_vacancy` holds a copy, `find_vacancy` serves it instead of the stored row.
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryJobBoardStore,
    outages: AtomicUsize,
    count_calls: AtomicUsize,
    insert_calls: AtomicUsize,
    reject_writes: bool,
    stale_vacancy: Mutex<Option<Vacancy>>,
}

impl FlakyStore {
    fn outage() -> RepositoryError {
        RepositoryError::Unavailable("simulated outage".to_string())
    }
}

impl ApplicationRepository for FlakyStore {
    fn find_application(
        &self,
        user_id: &UserId,
        vacancy_id: &VacancyId,
    ) -> Result<Option<Application>, RepositoryError> {
        self.inner.find_application(user_id, vacancy_id)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch_application(id)
    }

    fn count_applications(&self, filter: &ApplicationFilter) -> Result<u64, RepositoryError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        let pending = self.outages.load(Ordering::SeqCst);
        if pending > 0 {
            self.outages.store(pending - 1, Ordering::SeqCst);
            return Err(Self::outage());
        }
        self.inner.count_applications(filter)
    }

    fn list_applications(
        &self,
        filter: &ApplicationFilter,
        order: ApplicationOrder,
        limit: Option<usize>,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.list_applications(filter, order, limit)
    }

    fn count_distinct(&self, column: ApplicationColumn) -> Result<u64, RepositoryError> {
        self.inner.count_distinct(column)
    }

    fn applications_per_vacancy(&self) -> Result<Vec<VacancyApplicationCount>, RepositoryError> {
        self.inner.applications_per_vacancy()
    }

    fn insert_application(
        &self,
        draft: NewApplication,
        limits: SlotLimits,
    ) -> Result<Application, RepositoryError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_writes {
            return Err(Self::outage());
        }
        self.inner.insert_application(draft, limits)
    }

    fn update_application(&self, application: Application) -> Result<(), RepositoryError> {
        self.inner.update_application(application)
    }

    fn remove_application(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        self.inner.remove_application(id)
    }
}

impl VacancyRepository for FlakyStore {
    fn insert_vacancy(&self, vacancy: Vacancy) -> Result<Vacancy, RepositoryError> {
        self.inner.insert_vacancy(vacancy)
    }

    fn patch_vacancy(
        &self,
        id: &VacancyId,
        patch: VacancyPatch,
    ) -> Result<Vacancy, RepositoryError> {
        self.inner.patch_vacancy(id, patch)
    }

    fn toggle_vacancy_active(&self, id: &VacancyId) -> Result<Vacancy, RepositoryError> {
        self.inner.toggle_vacancy_active(id)
    }

    fn find_vacancy(&self, id: &VacancyId) -> Result<Option<Vacancy>, RepositoryError> {
        let stale = self
            .stale_vacancy
            .lock()
            .map_err(|_| RepositoryError::Unavailable("stale copy poisoned".to_string()))?
            .clone();
        match stale {
            Some(vacancy) if vacancy.id == *id => Ok(Some(vacancy)),
            _ => self.inner.find_vacancy(id),
        }
    }

    fn list_vacancies(&self) -> Result<Vec<Vacancy>, RepositoryError> {
        self.inner.list_vacancies()
    }

    fn remove_vacancy(&self, id: &VacancyId) -> Result<(), RepositoryError> {
        self.inner.remove_vacancy(id)
    }
}

impl UserRepository for FlakyStore {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError> {
        self.inner.insert_user(user)
    }

    fn update_user(&self, user: User) -> Result<(), RepositoryError> {
        self.inner.update_user(user)
    }

    fn find_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        self.inner.find_user(id)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.inner.find_user_by_email(email)
    }

    fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        self.inner.list_users()
    }

    fn count_users_with_role(&self, role: Role) -> Result<u64, RepositoryError> {
        self.inner.count_users_with_role(role)
    }

    fn remove_user(&self, id: &UserId) -> Result<(), RepositoryError> {
        self.inner.remove_user(id)
    }
}

fn flaky_service(store: FlakyStore) -> (JobBoardService<FlakyStore>, Arc<FlakyStore>) {
    let store = Arc::new(store);
    (JobBoardService::new(store.clone()), store)
}

#[test]
fn statistics_reads_survive_a_single_outage() {
    let (service, store) = flaky_service(FlakyStore::default());
    let admin = service
        .bootstrap_administrator(person("Root"))
        .expect("bootstrap")
        .principal();
    let vacancy = service.create_vacancy(&admin, draft("Steady", 3)).expect("vacancy");

    store.outages.store(1, Ordering::SeqCst);
    store.count_calls.store(0, Ordering::SeqCst);
    let stats = service
        .vacancy_stats(&admin, &vacancy.id)
        .expect("retried read succeeds");
    assert_eq!(stats.available_slots, 3);
    assert_eq!(store.count_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn persistent_outage_surfaces_as_transient() {
    let (service, store) = flaky_service(FlakyStore::default());
    let admin = service
        .bootstrap_administrator(person("Root"))
        .expect("bootstrap")
        .principal();
    let vacancy = service.create_vacancy(&admin, draft("Down", 3)).expect("vacancy");

    store.outages.store(2, Ordering::SeqCst);
    assert!(matches!(
        service.vacancy_stats(&admin, &vacancy.id),
        Err(BoardError::Transient(_))
    ));
}

#[test]
fn failed_application_write_is_not_retried() {
    let (service, store) = flaky_service(FlakyStore {
        reject_writes: true,
        ..FlakyStore::default()
    });
    let admin = service
        .bootstrap_administrator(person("Root"))
        .expect("bootstrap")
        .principal();
    let vacancy = service.create_vacancy(&admin, draft("Fragile", 3)).expect("vacancy");
    let candidate = service.register(person("Hopeful")).expect("register").principal();

    assert!(matches!(
        service.apply(&candidate, &vacancy.id),
        Err(BoardError::Transient(_))
    ));
    assert_eq!(store.insert_calls.load(Ordering::SeqCst), 1);
}

fn serve_stale(store: &FlakyStore, vacancy: Vacancy) {
    *store.stale_vacancy.lock().expect("stale copy lock") = Some(vacancy);
}

#[test]
fn capacity_lowered_after_the_engine_read_still_blocks_the_insert() {
    let (service, store) = flaky_service(FlakyStore::default());
    let admin = service
        .bootstrap_administrator(person("Root"))
        .expect("bootstrap")
        .principal();
    let vacancy = service.create_vacancy(&admin, draft("Shrinking", 5)).expect("vacancy");
    for name in ["Early", "Earlier"] {
        let candidate = service.register(person(name)).expect("register").principal();
        service.apply(&candidate, &vacancy.id).expect("seat");
    }

    service
        .update_vacancy(
            &admin,
            &vacancy.id,
            VacancyPatch {
                max_applicants: Some(2),
                ..VacancyPatch::default()
            },
        )
        .expect("capacity lowered");
    serve_stale(&store, vacancy.clone());

    let late = service.register(person("Late")).expect("register").principal();
    assert_eq!(
        service.apply(&late, &vacancy.id),
        Err(BoardError::Conflict(ConflictReason::VacancyFull))
    );
    assert_eq!(
        store
            .inner
            .count_applications(&ApplicationFilter::for_vacancy(vacancy.id))
            .expect("count"),
        2
    );
}

#[test]
fn vacancy_closed_after_the_engine_read_rejects_the_insert() {
    let (service, store) = flaky_service(FlakyStore::default());
    let admin = service
        .bootstrap_administrator(person("Root"))
        .expect("bootstrap")
        .principal();
    let vacancy = service.create_vacancy(&admin, draft("Closing", 5)).expect("vacancy");
    service
        .toggle_vacancy_active(&admin, &vacancy.id)
        .expect("closed");
    serve_stale(&store, vacancy.clone());

    let candidate = service.register(person("Hopeful")).expect("register").principal();
    assert_eq!(
        service.apply(&candidate, &vacancy.id),
        Err(BoardError::InvalidState("vacancy not active"))
    );
    assert_eq!(store.insert_calls.load(Ordering::SeqCst), 1);
}
