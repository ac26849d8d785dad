use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::auth::{AuthGateway, SessionState};
use crate::config::Config;
use crate::error::Result;
use crate::export;
use crate::feed::{Applied, Feed};
use crate::types::{GenerationParameters, Region, ResultRow};

#[derive(Debug, Parser)]
#[command(name = "rugen", version, about = "Generate, page through, and export random user data")]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the API base URL from the config
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate rows and write them to a CSV file without opening the TUI
    Export {
        #[arg(long)]
        region: Option<Region>,
        #[arg(long)]
        errors: Option<u32>,
        #[arg(long)]
        seed: Option<u64>,
        /// Number of pages to fetch
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Log in and store the session tokens (password is read from stdin)
    Login { email: String },
    /// Forget the stored session
    Logout,
    /// Show the current session
    Whoami,
    /// Bulk user administration
    Users {
        #[command(subcommand)]
        op: UsersOp,
    },
}

#[derive(Debug, Subcommand)]
pub enum UsersOp {
    Block { ids: Vec<String> },
    Unblock { ids: Vec<String> },
    Delete { ids: Vec<String> },
}

pub async fn execute(command: Command, gateway: &AuthGateway, config: &Config) -> Result<()> {
    match command {
        Command::Export {
            region,
            errors,
            seed,
            pages,
            output,
        } => {
            let defaults = config.generator.initial_params();
            let params = GenerationParameters::new(
                region.unwrap_or(defaults.region),
                errors.unwrap_or(defaults.error_amount),
                seed.unwrap_or(defaults.seed),
            );
            let rows = collect_pages(gateway, params, pages).await?;
            let path = output.unwrap_or_else(|| config.generator.export_path.clone());
            export::export_to_path(&rows, &path)?;
            println!("Exported {} rows to {}", rows.len(), path.display());
        }
        Command::Login { email } => {
            print!("Password: ");
            std::io::stdout().flush()?;
            let mut password = String::new();
            std::io::stdin().lock().read_line(&mut password)?;
            let identity = gateway
                .login(&email, password.trim_end_matches(['\r', '\n']))
                .await?;
            println!("Logged in as {}", identity.display_name());
        }
        Command::Logout => {
            gateway.logout().await;
            println!("Logged out");
        }
        Command::Whoami => match gateway.state().await {
            SessionState::Authenticated(identity) => {
                let expiry = identity
                    .expires_at()
                    .map(|at| format!(" (token expires {})", at.to_rfc3339()))
                    .unwrap_or_default();
                println!("{}{}", identity.display_name(), expiry);
            }
            SessionState::Unauthenticated => println!("Not logged in"),
        },
        Command::Users { op } => {
            let (verb, count) = match &op {
                UsersOp::Block { ids } => {
                    gateway.block_users(ids).await?;
                    ("Blocked", ids.len())
                }
                UsersOp::Unblock { ids } => {
                    gateway.unblock_users(ids).await?;
                    ("Unblocked", ids.len())
                }
                UsersOp::Delete { ids } => {
                    gateway.delete_users(ids).await?;
                    ("Deleted", ids.len())
                }
            };
            println!("{} {} user(s)", verb, count);
        }
    }
    Ok(())
}

/// Walk pages 1..=`pages` for one parameter set through the same controller
/// the TUI uses, stopping early when the server runs dry.
pub async fn collect_pages(
    gateway: &AuthGateway,
    params: GenerationParameters,
    pages: u32,
) -> Result<Vec<ResultRow>> {
    let mut feed = Feed::new(params);
    let mut next = feed.set_params(params);

    while let Some(request) = next {
        let rows = gateway.generate_data(&request.params, request.page).await?;
        if let Applied::Exhausted = feed.apply(request.generation, Ok(rows)) {
            break;
        }
        if feed.page() >= pages {
            break;
        }
        next = feed.next_page();
    }

    Ok(feed.rows().to_vec())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::fake::FakeBackend;
    use crate::store::MemoryStore;

    fn gateway(backend: FakeBackend) -> AuthGateway {
        AuthGateway::restore(Arc::new(backend), Arc::new(MemoryStore::default()))
    }

    #[test]
    fn parses_export_flags() {
        let cli = Cli::parse_from([
            "rugen", "export", "--region", "fr", "--errors", "5", "--seed", "9", "--pages", "3",
            "-o", "out.csv",
        ]);
        match cli.command {
            Some(Command::Export {
                region,
                errors,
                seed,
                pages,
                output,
            }) => {
                assert_eq!(region, Some(Region::FR));
                assert_eq!(errors, Some(5));
                assert_eq!(seed, Some(9));
                assert_eq!(pages, 3);
                assert_eq!(output, Some(PathBuf::from("out.csv")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_region() {
        assert!(Cli::try_parse_from(["rugen", "export", "--region", "XX"]).is_err());
    }

    #[test]
    fn rejects_zero_pages() {
        assert!(Cli::try_parse_from(["rugen", "export", "--pages", "0"]).is_err());
        assert!(Cli::try_parse_from(["rugen", "export", "--pages", "1"]).is_ok());
    }

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::parse_from(["rugen", "--base-url", "http://localhost/api"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost/api"));
    }

    #[test]
    fn parses_users_ops() {
        let cli = Cli::parse_from(["rugen", "users", "block", "1", "2"]);
        match cli.command {
            Some(Command::Users {
                op: UsersOp::Block { ids },
            }) => assert_eq!(ids, vec!["1", "2"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[tokio::test]
    async fn collect_pages_appends_in_order() {
        let gw = gateway(FakeBackend::new(4));
        let params = GenerationParameters::new(Region::NO, 2, 11);
        let rows = collect_pages(&gw, params, 3).await.unwrap();

        let expected: Vec<ResultRow> = (1..=3)
            .flat_map(|page| FakeBackend::rows_for(&params, page, 4))
            .collect();
        assert_eq!(rows, expected);
    }

    #[tokio::test]
    async fn collect_pages_stops_when_server_runs_dry() {
        let gw = gateway(FakeBackend {
            rows_per_page: 4,
            last_page: 2,
            ..FakeBackend::default()
        });
        let rows = collect_pages(&gw, GenerationParameters::default(), 10)
            .await
            .unwrap();
        assert_eq!(rows.len(), 8);
    }

    #[tokio::test]
    async fn collect_pages_propagates_server_error() {
        let backend = FakeBackend::new(4);
        *backend.generate_failure.lock().unwrap() = Some((422, "Bad seed".to_string()));
        let gw = gateway(backend);
        let err = collect_pages(&gw, GenerationParameters::default(), 1)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Bad seed");
    }
}
