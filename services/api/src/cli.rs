use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use jobboard::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Job Board API",
    about = "Serve the job-board API or exercise its eligibility rules from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Seed an in-memory board, race candidates for a vacancy, and print the statistics
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Load the demo data set before accepting traffic (same as APP_SEED_DEMO=1)
    #[arg(long)]
    pub(crate) seed: bool,
    /// Vacancy CSV export imported on behalf of the seeded manager
    #[arg(long, requires = "seed")]
    pub(crate) vacancies_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["jobboard-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn csv_import_requires_seeding() {
        let err = Cli::try_parse_from(["jobboard-api", "serve", "--vacancies-csv", "jobs.csv"])
            .expect_err("import without seed is rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let cli = Cli::try_parse_from([
            "jobboard-api",
            "serve",
            "--seed",
            "--vacancies-csv",
            "jobs.csv",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert!(args.seed);
                assert_eq!(args.vacancies_csv, Some(PathBuf::from("jobs.csv")));
            }
            other => panic!("expected serve command, got {other:?}"),
        }
    }
}
