//! Role-based permission matrix.

use super::domain::{Principal, Role};
use super::error::BoardError;

/// Operations guarded by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Apply,
    ManageVacancies,
    RemoveVacancy,
    ListAllApplications,
    ReviewApplications,
    RemoveApplication,
    ViewStatistics,
    ManageUsers,
    ViewUsers,
}

impl Action {
    const fn denial(self) -> &'static str {
        match self {
            Action::Apply => "only candidates may apply",
            Action::ManageVacancies => "only managers and administrators may manage vacancies",
            Action::RemoveVacancy => "only administrators may delete vacancies",
            Action::ListAllApplications => "candidates may only view their own applications",
            Action::ReviewApplications => {
                "only managers and administrators may review applications"
            }
            Action::RemoveApplication => "only administrators may delete applications",
            Action::ViewStatistics => "only managers and administrators may view statistics",
            Action::ManageUsers => "only administrators may manage users",
            Action::ViewUsers => "only managers and administrators may view other users",
        }
    }
}

impl Role {
    pub const fn permits(self, action: Action) -> bool {
        match action {
            Action::Apply => match self {
                Role::Candidate => true,
                Role::Manager | Role::Administrator => false,
            },
            Action::ManageVacancies
            | Action::ListAllApplications
            | Action::ReviewApplications
            | Action::ViewStatistics
            | Action::ViewUsers => match self {
                Role::Manager | Role::Administrator => true,
                Role::Candidate => false,
            },
            Action::RemoveVacancy | Action::RemoveApplication | Action::ManageUsers => {
                match self {
                    Role::Administrator => true,
                    Role::Candidate | Role::Manager => false,
                }
            }
        }
    }
}

pub fn authorize(principal: &Principal, action: Action) -> Result<(), BoardError> {
    if principal.role.permits(action) {
        Ok(())
    } else {
        Err(BoardError::Forbidden(action.denial()))
    }
}
