//! Job-board core: application eligibility, slot accounting, statistics, and the
//! management operations around them.

pub mod access;
pub mod domain;
pub mod eligibility;
pub mod error;
pub mod import;
pub mod memory;
pub mod repository;
pub mod router;
pub mod seed;
pub mod service;
pub mod slots;
pub mod stats;

#[cfg(test)]
mod tests;

pub use access::{authorize, Action};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, Modality, NewUser, Principal, Role, User,
    UserId, Vacancy, VacancyDraft, VacancyId, VacancyPatch,
};
pub use eligibility::EligibilityEngine;
pub use error::{BoardError, ConflictReason};
pub use import::{ImportError, VacancyCsvImporter};
pub use memory::InMemoryJobBoardStore;
pub use repository::{
    ApplicationColumn, ApplicationFilter, ApplicationOrder, ApplicationRepository,
    JobBoardStore, NewApplication, RepositoryError, SlotLimits, UserRepository,
    VacancyApplicationCount, VacancyRepository,
};
pub use router::board_router;
pub use seed::{seed_demo_data, SeedSummary};
pub use service::{JobBoardService, Page, SortDirection, UserStatsView, VacancyQuery, VacancySort};
pub use slots::{SlotLedger, SlotUsage, CANDIDATE_APPLICATION_QUOTA};
pub use stats::{
    CandidateStatsView, DashboardView, PopularVacancyView, StatisticsAggregator,
    VacancyApplicationCountView, VacancyStatsView,
};
