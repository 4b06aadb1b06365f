use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier wrapper for registered users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier wrapper for posted vacancies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VacancyId(pub Uuid);

impl VacancyId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for VacancyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Closed set of roles a user can hold. Exactly one per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Candidate,
    Manager,
    Administrator,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Candidate, Role::Manager, Role::Administrator];

    pub const fn label(self) -> &'static str {
        match self {
            Role::Candidate => "candidate",
            Role::Manager => "manager",
            Role::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "candidate" | "developer" | "coder" => Ok(Role::Candidate),
            "manager" | "gestor" => Ok(Role::Manager),
            "administrator" | "admin" => Ok(Role::Administrator),
            _ => Err(UnknownRole(value.to_string())),
        }
    }
}

/// Authenticated caller as supplied by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
}

impl Principal {
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.role)
    }
}

/// Registration payload. Credentials are handled by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Remote,
    Hybrid,
    Onsite,
}

impl Modality {
    pub const fn label(self) -> &'static str {
        match self {
            Modality::Remote => "remote",
            Modality::Hybrid => "hybrid",
            Modality::Onsite => "onsite",
        }
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(Modality::Remote),
            "hybrid" => Ok(Modality::Hybrid),
            "onsite" | "on-site" | "on_site" => Ok(Modality::Onsite),
            other => Err(format!("unknown modality '{other}'")),
        }
    }
}

/// A posted opening with a fixed number of applicant seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vacancy {
    pub id: VacancyId,
    pub title: String,
    pub description: String,
    pub technologies: String,
    pub seniority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_skills: Option<String>,
    pub location: String,
    pub modality: Modality,
    pub salary_range: String,
    pub company: String,
    pub max_applicants: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields a manager supplies when posting a vacancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacancyDraft {
    pub title: String,
    pub description: String,
    pub technologies: String,
    pub seniority: String,
    #[serde(default)]
    pub soft_skills: Option<String>,
    pub location: String,
    pub modality: Modality,
    pub salary_range: String,
    pub company: String,
    pub max_applicants: u32,
}

impl VacancyDraft {
    pub fn into_vacancy(self, created_at: DateTime<Utc>) -> Vacancy {
        Vacancy {
            id: VacancyId::generate(),
            title: self.title,
            description: self.description,
            technologies: self.technologies,
            seniority: self.seniority,
            soft_skills: self.soft_skills,
            location: self.location,
            modality: self.modality,
            salary_range: self.salary_range,
            company: self.company,
            max_applicants: self.max_applicants,
            is_active: true,
            created_at,
        }
    }
}

/// Partial update applied to an existing vacancy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacancyPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Option<String>,
    #[serde(default)]
    pub seniority: Option<String>,
    #[serde(default)]
    pub soft_skills: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub modality: Option<Modality>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub max_applicants: Option<u32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl VacancyPatch {
    pub fn apply_to(self, vacancy: &mut Vacancy) {
        if let Some(title) = self.title {
            vacancy.title = title;
        }
        if let Some(description) = self.description {
            vacancy.description = description;
        }
        if let Some(technologies) = self.technologies {
            vacancy.technologies = technologies;
        }
        if let Some(seniority) = self.seniority {
            vacancy.seniority = seniority;
        }
        if let Some(soft_skills) = self.soft_skills {
            vacancy.soft_skills = Some(soft_skills);
        }
        if let Some(location) = self.location {
            vacancy.location = location;
        }
        if let Some(modality) = self.modality {
            vacancy.modality = modality;
        }
        if let Some(salary_range) = self.salary_range {
            vacancy.salary_range = salary_range;
        }
        if let Some(company) = self.company {
            vacancy.company = company;
        }
        if let Some(max_applicants) = self.max_applicants {
            vacancy.max_applicants = max_applicants;
        }
        if let Some(is_active) = self.is_active {
            vacancy.is_active = is_active;
        }
    }
}

/// Administrative status; the eligibility rules never look at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    UnderReview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// A candidate's claim on one seat of one vacancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub vacancy_id: VacancyId,
    pub applied_at: DateTime<Utc>,
    pub status: ApplicationStatus,
}
