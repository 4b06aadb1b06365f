use std::sync::Arc;

use axum::http::request::Builder;
use axum::response::Response;
use serde_json::Value;
use uuid::Uuid;

use crate::board::domain::{
    Modality, NewUser, Principal, Role, Vacancy, VacancyDraft, VacancyPatch,
};
use crate::board::memory::InMemoryJobBoardStore;
use crate::board::router::{board_router, USER_ID_HEADER, USER_ROLE_HEADER};
use crate::board::service::JobBoardService;

pub(super) type Service = JobBoardService<InMemoryJobBoardStore>;

pub(super) struct Fixture {
    pub(super) service: Arc<Service>,
    pub(super) store: Arc<InMemoryJobBoardStore>,
    pub(super) admin: Principal,
    pub(super) manager: Principal,
}

pub(super) fn new_user(name: &str, role: Role) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: format!(
            "{}-{}@example.com",
            name.to_lowercase().replace(' ', "."),
            Uuid::new_v4().simple()
        ),
        role: Some(role),
    }
}

pub(super) fn draft(title: &str, company: &str, max_applicants: u32) -> VacancyDraft {
    VacancyDraft {
        title: title.to_string(),
        description: format!("{title} at {company}"),
        technologies: "Rust, PostgreSQL".to_string(),
        seniority: "Senior".to_string(),
        soft_skills: None,
        location: "Medellin".to_string(),
        modality: Modality::Remote,
        salary_range: "USD 3k-5k".to_string(),
        company: company.to_string(),
        max_applicants,
    }
}

pub(super) fn fixture() -> Fixture {
    let store = Arc::new(InMemoryJobBoardStore::new());
    let service = Arc::new(JobBoardService::new(store.clone()));
    let admin = service
        .bootstrap_administrator(new_user("Root Admin", Role::Administrator))
        .expect("bootstrap admin")
        .principal();
    let manager = service
        .create_user(&admin, new_user("Hiring Manager", Role::Manager))
        .expect("create manager")
        .principal();

    Fixture {
        service,
        store,
        admin,
        manager,
    }
}

impl Fixture {
    pub(super) fn candidate(&self, name: &str) -> Principal {
        self.service
            .register(new_user(name, Role::Candidate))
            .expect("register candidate")
            .principal()
    }

    pub(super) fn candidates(&self, count: usize) -> Vec<Principal> {
        (0..count)
            .map(|index| self.candidate(&format!("Candidate {index}")))
            .collect()
    }

    pub(super) fn vacancy(&self, title: &str, max_applicants: u32) -> Vacancy {
        self.service
            .create_vacancy(&self.manager, draft(title, "Acme", max_applicants))
            .expect("create vacancy")
    }

    pub(super) fn inactive_vacancy(&self, title: &str) -> Vacancy {
        let vacancy = self.vacancy(title, 5);
        self.service
            .update_vacancy(
                &self.manager,
                &vacancy.id,
                VacancyPatch {
                    is_active: Some(false),
                    ..VacancyPatch::default()
                },
            )
            .expect("deactivate vacancy")
    }

    pub(super) fn router(&self) -> axum::Router {
        board_router(self.service.clone())
    }
}

pub(super) fn as_principal(builder: Builder, principal: &Principal) -> Builder {
    builder
        .header(USER_ID_HEADER, principal.id.to_string())
        .header(USER_ROLE_HEADER, principal.role.label())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
