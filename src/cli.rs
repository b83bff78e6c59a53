//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::load_catalog;
use crate::domain::config_validation::{build_policy, catalog_path, validate_league_config};
use crate::domain::deck;
use crate::domain::error::LeagueError;
use crate::domain::token::TokenCatalog;
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "tokenleague", about = "Fantasy token tournament: decks, sessions and scoring")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the token catalog
    Tokens {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Validate a deck without locking it
    Validate {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma separated token symbols
        #[arg(short, long)]
        tokens: String,
    },
    /// Validate and lock a deck for a wallet
    Lock {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        wallet: String,
        #[arg(short, long)]
        tokens: String,
    },
    /// Run the simulation for a locked session
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        session: String,
        /// Engine output file, overriding [simulation] feed_dir
        #[arg(long)]
        feed: Option<PathBuf>,
    },
    /// Show one session, or all sessions when no id is given
    Session {
        #[arg(short, long)]
        config: PathBuf,
        id: Option<String>,
    },
    /// Show the results of a simulated session
    Results {
        #[arg(short, long)]
        config: PathBuf,
        id: String,
    },
    /// Rank wallets by their best simulated session
    Leaderboard {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Tokens { config, json } => run_tokens(&config, json),
        Command::Validate { config, tokens } => run_validate(&config, &tokens),
        Command::Lock {
            config,
            wallet,
            tokens,
        } => run_lock(&config, &wallet, &tokens),
        Command::Simulate {
            config,
            session,
            feed,
        } => run_simulate(&config, &session, feed.as_deref()),
        Command::Session { config, id } => run_session(&config, id.as_deref()),
        Command::Results { config, id } => run_results(&config, &id),
        Command::Leaderboard { config } => run_leaderboard(&config),
        Command::Serve { config } => run_serve(&config),
    }
}

fn fail(err: LeagueError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    let config = FileConfigAdapter::from_file(path).map_err(fail)?;
    validate_league_config(&config).map_err(fail)?;
    Ok(config)
}

pub fn open_catalog(config: &dyn ConfigPort) -> Result<TokenCatalog, LeagueError> {
    let path = catalog_path(config)?;
    let catalog = load_catalog(&path)?;
    log::info!("loaded {} tokens from {}", catalog.len(), path.display());
    Ok(catalog)
}

/// Split a comma separated symbol list, dropping blanks.
pub fn parse_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{s}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to encode output: {e}");
            ExitCode::from(1)
        }
    }
}

fn run_tokens(config_path: &Path, json: bool) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let catalog = match open_catalog(&config) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    if json {
        return print_json(&catalog.tokens());
    }

    if catalog.is_empty() {
        eprintln!("Catalog is empty");
        return ExitCode::SUCCESS;
    }
    for token in catalog.by_weight_desc() {
        let tier = token.tier().map(|t| t.label()).unwrap_or("-");
        println!(
            "{:<8} {:>4}  {:<12} {}",
            token.symbol, token.tournament_weight, tier, token.name
        );
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path, tokens: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let (policy, catalog) = match build_policy(&config).and_then(|p| Ok((p, open_catalog(&config)?))) {
        Ok(v) => v,
        Err(e) => return fail(e),
    };

    let candidate = parse_tokens(tokens);
    let verdict = deck::validate(&candidate, &catalog, &policy.rules);
    eprintln!("{verdict}");
    let code = print_json(&verdict);
    if verdict.is_valid {
        code
    } else {
        (&LeagueError::InvalidDeck(Box::new(verdict))).into()
    }
}

#[cfg(feature = "sqlite")]
mod league {
    use super::*;
    use crate::adapters::json_adapter::JsonFeedAdapter;
    use crate::adapters::sqlite_adapter::SqliteAdapter;
    use crate::domain::session::SessionManager;
    use crate::ports::simulation_port::SimulationPort;
    use std::sync::Arc;

    pub struct League {
        pub manager: Arc<SessionManager>,
        pub store: Arc<SqliteAdapter>,
    }

    pub fn open(config: &dyn ConfigPort) -> Result<League, LeagueError> {
        let policy = build_policy(config)?;
        let store = Arc::new(SqliteAdapter::from_config(config)?);
        let manager = Arc::new(SessionManager::new(store.clone(), policy));
        Ok(League { manager, store })
    }

    pub fn feed(
        config: &dyn ConfigPort,
        file: Option<&Path>,
    ) -> Result<Arc<dyn SimulationPort + Send + Sync>, LeagueError> {
        if let Some(path) = file {
            return Ok(Arc::new(JsonFeedAdapter::from_file(path.to_path_buf())));
        }
        match config.get_string("simulation", "feed_dir") {
            Some(dir) if !dir.trim().is_empty() => {
                Ok(Arc::new(JsonFeedAdapter::from_dir(PathBuf::from(dir.trim()))))
            }
            _ => Err(LeagueError::ConfigMissing {
                section: "simulation".into(),
                key: "feed_dir".into(),
            }),
        }
    }
}

#[cfg(not(feature = "sqlite"))]
fn storage_unavailable() -> ExitCode {
    eprintln!("error: sqlite feature is required for session storage");
    ExitCode::from(1)
}

fn run_lock(config_path: &Path, wallet: &str, tokens: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        let result = league::open(&config).and_then(|league| {
            let catalog = open_catalog(&config)?;
            league
                .manager
                .lock(wallet, &parse_tokens(tokens), &catalog, chrono::Utc::now())
        });
        match result {
            Ok(session) => {
                eprintln!(
                    "Locked session {} ({} / {} weight), expires {}",
                    session.session_id,
                    session.total_weight,
                    session.weight_limit,
                    session.expires_at.to_rfc3339()
                );
                print_json(&session)
            }
            Err(LeagueError::InvalidDeck(verdict)) => {
                eprintln!("error: invalid deck: {verdict}");
                let _ = print_json(verdict.as_ref());
                (&LeagueError::InvalidDeck(verdict)).into()
            }
            Err(e) => fail(e),
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (&config, wallet, tokens);
        storage_unavailable()
    }
}

fn run_simulate(config_path: &Path, session_id: &str, feed_file: Option<&Path>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::domain::league::{run_simulation, ResultsReport};
        use crate::ports::score_port::ScorePort;

        let result = league::open(&config).and_then(|league| {
            let feed = league::feed(&config, feed_file)?;
            eprintln!("Simulating session {session_id}...");
            run_simulation(
                &league.manager,
                feed.as_ref(),
                Some(league.store.as_ref() as &dyn ScorePort),
                session_id,
                chrono::Utc::now(),
            )
        });
        match result {
            Ok(outcome) => {
                eprintln!(
                    "Final score {:.2}, market position {}",
                    outcome.result.final_score, outcome.result.final_market_position
                );
                print_json(&ResultsReport::build(&outcome.session, outcome.result))
            }
            Err(e) => fail(e),
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (&config, session_id, feed_file);
        storage_unavailable()
    }
}

fn run_session(config_path: &Path, id: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        let now = chrono::Utc::now();
        let league = match league::open(&config) {
            Ok(l) => l,
            Err(e) => return fail(e),
        };
        match id {
            Some(id) => match league.manager.get(id, now) {
                Ok(session) => print_json(&session),
                Err(e) => fail(e),
            },
            None => match league.manager.list(now) {
                Ok(sessions) => {
                    eprintln!("{} session(s)", sessions.len());
                    print_json(&sessions)
                }
                Err(e) => fail(e),
            },
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (&config, id);
        storage_unavailable()
    }
}

fn run_results(config_path: &Path, id: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::domain::league::ResultsReport;

        let now = chrono::Utc::now();
        let result = league::open(&config).and_then(|league| {
            let session = league.manager.get(id, now)?;
            let result = league.manager.results(id, now)?;
            Ok(ResultsReport::build(&session, result))
        });
        match result {
            Ok(report) => print_json(&report),
            Err(e) => fail(e),
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (&config, id);
        storage_unavailable()
    }
}

fn run_leaderboard(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::domain::leaderboard::leaderboard;

        let sessions = match league::open(&config).and_then(|l| l.manager.list(chrono::Utc::now())) {
            Ok(s) => s,
            Err(e) => return fail(e),
        };
        let board = leaderboard(&sessions);
        if board.is_empty() {
            eprintln!("No simulated sessions yet");
        }
        print_json(&board)
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = &config;
        storage_unavailable()
    }
}

fn run_serve(config_path: &Path) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{build_router, AppState};
        use std::net::SocketAddr;
        use std::sync::Arc;

        eprintln!("Loading config from {}", config_path.display());
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        let state = match league::open(&config).and_then(|league| {
            let catalog = open_catalog(&config)?;
            let feed = league::feed(&config, None)?;
            Ok(AppState::new(league.manager, Arc::new(catalog), feed).with_scores(league.store))
        }) {
            Ok(s) => s,
            Err(e) => return fail(e),
        };

        let listen = config
            .get_string("web", "listen")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string());
        let addr: SocketAddr = match listen.parse() {
            Ok(a) => a,
            Err(_) => {
                return fail(LeagueError::ConfigInvalid {
                    section: "web".into(),
                    key: "listen".into(),
                    reason: format!("not a socket address: {listen}"),
                })
            }
        };

        eprintln!("Starting web server on {}", addr);
        let router = build_router(state);

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(r) => r,
            Err(e) => return fail(e.into()),
        };
        let served: Result<(), std::io::Error> = runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router).await
        });
        match served {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail(e.into()),
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}
