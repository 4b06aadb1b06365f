use crate::infra::{in_memory_service, BoardService};
use clap::Args;
use jobboard::board::{
    seed_demo_data, BoardError, ConflictReason, DashboardView, Modality, NewUser, Principal, Role,
    SeedSummary, VacancyDraft,
};
use jobboard::error::AppError;
use std::thread;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of candidates racing for the contested vacancy.
    #[arg(long, default_value_t = 8)]
    pub(crate) applicants: usize,
    /// Seats on the contested vacancy.
    #[arg(long, default_value_t = 3)]
    pub(crate) capacity: u32,
    /// Print the final dashboard as JSON instead of a text summary.
    #[arg(long)]
    pub(crate) json: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            applicants: 8,
            capacity: 3,
            json: false,
        }
    }
}

/// Tally of concurrent application attempts.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct RaceOutcome {
    pub(crate) accepted: usize,
    pub(crate) vacancy_full: usize,
    pub(crate) other: usize,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = in_memory_service();
    let summary = seed_demo_data(service.as_ref())?;

    println!("Job board demo");
    println!(
        "- seeded {} candidates, {} vacancies, {} applications",
        summary.candidates.len(),
        summary.vacancies.len(),
        summary.applications
    );

    let contested = service.create_vacancy(
        &summary.manager_principal(),
        contested_vacancy(args.capacity),
    )?;
    let racers = register_racers(&service, args.applicants)?;
    let outcome = race(&service, &racers, &contested.id);

    let stats = service.vacancy_stats(&summary.manager_principal(), &contested.id)?;
    println!(
        "\nContested vacancy '{}' ({} seats, {} applicants)",
        contested.title, args.capacity, args.applicants
    );
    println!(
        "- accepted {} | rejected as full {} | other rejections {}",
        outcome.accepted, outcome.vacancy_full, outcome.other
    );
    println!(
        "- {} applications recorded, {} seats left, fully booked: {}",
        stats.current_applications, stats.available_slots, stats.is_fully_booked
    );

    let dashboard = service.dashboard(&summary.administrator_principal())?;
    if args.json {
        match serde_json::to_string_pretty(&dashboard) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => println!("  dashboard unavailable: {err}"),
        }
    } else {
        render_dashboard(&summary, &dashboard);
    }

    Ok(())
}

fn contested_vacancy(capacity: u32) -> VacancyDraft {
    VacancyDraft {
        title: "Staff Rust Engineer".to_string(),
        description: "Contested opening used by the demo race".to_string(),
        technologies: "Rust, Tokio".to_string(),
        seniority: "Staff".to_string(),
        soft_skills: None,
        location: "Remote".to_string(),
        modality: Modality::Remote,
        salary_range: "USD 6k-8k".to_string(),
        company: "Demo Labs".to_string(),
        max_applicants: capacity,
    }
}

fn register_racers(service: &BoardService, count: usize) -> Result<Vec<Principal>, BoardError> {
    (0..count)
        .map(|index| {
            service
                .register(NewUser {
                    name: format!("Racer {index}"),
                    email: format!("racer{index}@demo.jobboard.dev"),
                    role: Some(Role::Candidate),
                })
                .map(|user| user.principal())
        })
        .collect()
}

pub(crate) fn race(
    service: &BoardService,
    racers: &[Principal],
    vacancy_id: &jobboard::board::VacancyId,
) -> RaceOutcome {
    let results: Vec<Result<_, BoardError>> = thread::scope(|scope| {
        let handles: Vec<_> = racers
            .iter()
            .map(|racer| scope.spawn(move || service.apply(racer, vacancy_id)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(BoardError::Transient("worker panicked".to_string())))
            })
            .collect()
    });

    results
        .iter()
        .fold(RaceOutcome::default(), |mut outcome, result| {
            match result {
                Ok(_) => outcome.accepted += 1,
                Err(BoardError::Conflict(ConflictReason::VacancyFull)) => outcome.vacancy_full += 1,
                Err(_) => outcome.other += 1,
            }
            outcome
        })
}

fn render_dashboard(summary: &SeedSummary, dashboard: &DashboardView) {
    println!("\nDashboard");
    println!(
        "- {} applications across {} vacancies from {} candidates",
        dashboard.total_applications,
        dashboard.vacancies_with_applications,
        dashboard.users_with_applications
    );
    println!("Most popular vacancies:");
    for entry in &dashboard.most_popular_vacancies {
        println!(
            "  - {} @ {}: {} applications",
            entry.title, entry.company, entry.applications_count
        );
    }
    println!(
        "Sign in as {} (administrator) or {} (manager) to explore further.",
        summary.administrator.email, summary.manager.email
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn race_never_overfills_the_contested_vacancy() {
        let service = in_memory_service();
        let summary = seed_demo_data(service.as_ref()).expect("seed");
        let vacancy = service
            .create_vacancy(&summary.manager_principal(), contested_vacancy(2))
            .expect("vacancy");
        let racers = register_racers(&service, 6).expect("racers");

        let outcome = race(&service, &racers, &vacancy.id);

        assert_eq!(
            outcome,
            RaceOutcome {
                accepted: 2,
                vacancy_full: 4,
                other: 0,
            }
        );
    }

    #[test]
    fn demo_runs_with_defaults() {
        run_demo(DemoArgs::default()).expect("demo completes");
    }
}
