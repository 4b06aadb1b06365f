//! Slot and quota bookkeeping derived from the canonical application set.

use std::sync::Arc;

use super::domain::{UserId, Vacancy};
use super::repository::{read_with_retry, ApplicationFilter, ApplicationRepository, RepositoryError};

/// Maximum number of applications a candidate may hold at once.
pub const CANDIDATE_APPLICATION_QUOTA: u32 = 3;

/// Point-in-time seat usage against a capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotUsage {
    pub capacity: u32,
    pub taken: u64,
}

impl SlotUsage {
    /// Remaining seats, clamped at zero even when a race over-filled the capacity.
    pub fn available(&self) -> u64 {
        u64::from(self.capacity).saturating_sub(self.taken)
    }

    pub fn is_exhausted(&self) -> bool {
        self.taken >= u64::from(self.capacity)
    }
}

/// Counts applications on demand. Nothing is cached between calls.
pub struct SlotLedger<S> {
    store: Arc<S>,
}

impl<S> SlotLedger<S>
where
    S: ApplicationRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn vacancy_usage(&self, vacancy: &Vacancy) -> Result<SlotUsage, RepositoryError> {
        let filter = ApplicationFilter::for_vacancy(vacancy.id);
        let taken = read_with_retry("count_vacancy_applications", || {
            self.store.count_applications(&filter)
        })?;
        Ok(SlotUsage {
            capacity: vacancy.max_applicants,
            taken,
        })
    }

    pub fn candidate_usage(&self, candidate: &UserId) -> Result<SlotUsage, RepositoryError> {
        let filter = ApplicationFilter::for_user(*candidate);
        let taken = read_with_retry("count_candidate_applications", || {
            self.store.count_applications(&filter)
        })?;
        Ok(SlotUsage {
            capacity: CANDIDATE_APPLICATION_QUOTA,
            taken,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_slots_clamp_at_zero_when_overbooked() {
        let usage = SlotUsage {
            capacity: 2,
            taken: 5,
        };
        assert_eq!(usage.available(), 0);
        assert!(usage.is_exhausted());
    }

    #[test]
    fn usage_below_capacity_reports_remaining_seats() {
        let usage = SlotUsage {
            capacity: 4,
            taken: 1,
        };
        assert_eq!(usage.available(), 3);
        assert!(!usage.is_exhausted());
    }

    #[test]
    fn exact_capacity_is_exhausted() {
        let usage = SlotUsage {
            capacity: 1,
            taken: 1,
        };
        assert_eq!(usage.available(), 0);
        assert!(usage.is_exhausted());
    }
}
