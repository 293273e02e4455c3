use crate::demo::{run_case_audit, run_demo, CaseAuditArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use deal_or_disaster::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Deal or Disaster",
    about = "Serve, demo, and audit the foreclosure-auction training game",
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
    /// Inspect the case catalog
    Cases {
        #[command(subcommand)]
        command: CasesCommand,
    },
    /// Play a scripted session in the terminal
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum CasesCommand {
    /// Check every case's isGoodDeal flag against its numbers
    Audit(CaseAuditArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Cases {
            command: CasesCommand::Audit(args),
        } => run_case_audit(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["deal-or-disaster"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_case_audit_with_path() {
        let cli = Cli::try_parse_from(["deal-or-disaster", "cases", "audit", "--cases", "x.json"])
            .expect("parses");
        match cli.command {
            Some(Command::Cases {
                command: CasesCommand::Audit(args),
            }) => assert_eq!(args.cases.as_deref(), Some(std::path::Path::new("x.json"))),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_demo_seed_and_rounds() {
        let cli = Cli::try_parse_from(["deal-or-disaster", "demo", "--seed", "9", "--rounds", "2"])
            .expect("parses");
        match cli.command {
            Some(Command::Demo(args)) => {
                assert_eq!(args.seed, Some(9));
                assert_eq!(args.rounds, 2);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
