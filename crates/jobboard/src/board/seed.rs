//! Deterministic demo data set.

use serde::Serialize;
use tracing::info;

use super::domain::{Modality, NewUser, Principal, Role, User, Vacancy, VacancyDraft};
use super::error::BoardError;
use super::repository::JobBoardStore;
use super::service::JobBoardService;

#[derive(Debug, Clone, Serialize)]
pub struct SeedSummary {
    pub administrator: User,
    pub manager: User,
    pub candidates: Vec<User>,
    pub vacancies: Vec<Vacancy>,
    pub applications: usize,
}

impl SeedSummary {
    pub fn administrator_principal(&self) -> Principal {
        self.administrator.principal()
    }

    pub fn manager_principal(&self) -> Principal {
        self.manager.principal()
    }
}

fn person(name: &str, email: &str, role: Role) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
        role: Some(role),
    }
}

fn vacancy(
    title: &str,
    technologies: &str,
    seniority: &str,
    modality: Modality,
    company: &str,
    max_applicants: u32,
) -> VacancyDraft {
    VacancyDraft {
        title: title.to_string(),
        description: format!("{title} role at {company}"),
        technologies: technologies.to_string(),
        seniority: seniority.to_string(),
        soft_skills: Some("Communication, ownership".to_string()),
        location: "Medellin".to_string(),
        modality,
        salary_range: "USD 2k-4k".to_string(),
        company: company.to_string(),
        max_applicants,
    }
}

/// Populates an empty store with users, vacancies, and applications created through the
/// eligibility engine, so seeded data obeys the same rules as live traffic.
pub fn seed_demo_data<S>(service: &JobBoardService<S>) -> Result<SeedSummary, BoardError>
where
    S: JobBoardStore + 'static,
{
    let administrator =
        service.bootstrap_administrator(person("Ada Admin", "admin@jobboard.dev", Role::Administrator))?;
    let admin = administrator.principal();
    let manager = service.create_user(
        &admin,
        person("Mateo Manager", "manager@jobboard.dev", Role::Manager),
    )?;

    let candidates = [
        ("Camila Rust", "camila@jobboard.dev"),
        ("Diego Node", "diego@jobboard.dev"),
        ("Elena Data", "elena@jobboard.dev"),
        ("Felipe Ops", "felipe@jobboard.dev"),
    ]
    .into_iter()
    .map(|(name, email)| service.register(person(name, email, Role::Candidate)))
    .collect::<Result<Vec<_>, _>>()?;

    let manager_principal = manager.principal();
    let vacancies = [
        vacancy("Backend Engineer", "Rust, PostgreSQL", "Senior", Modality::Remote, "Acme", 3),
        vacancy("Frontend Developer", "TypeScript, React", "Mid", Modality::Hybrid, "Globex", 2),
        vacancy("Data Engineer", "Python, Spark", "Senior", Modality::Onsite, "Initech", 5),
        vacancy("QA Analyst", "Playwright", "Junior", Modality::Remote, "Umbrella", 1),
    ]
    .into_iter()
    .map(|draft| service.create_vacancy(&manager_principal, draft))
    .collect::<Result<Vec<_>, _>>()?;

    let plan: [(usize, &[usize]); 4] = [
        (0, &[0, 1, 2][..]),
        (1, &[0, 2][..]),
        (2, &[0][..]),
        (3, &[1, 3][..]),
    ];
    let mut applications = 0;
    for (candidate, targets) in plan {
        let principal = candidates[candidate].principal();
        for &target in targets {
            service.apply(&principal, &vacancies[target].id)?;
            applications += 1;
        }
    }

    info!(
        users = candidates.len() + 2,
        vacancies = vacancies.len(),
        applications,
        "demo data seeded"
    );

    Ok(SeedSummary {
        administrator,
        manager,
        candidates,
        vacancies,
        applications,
    })
}
