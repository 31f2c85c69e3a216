//! CLI definition and dispatch.

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_adapter::CsvLedgerAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::log_notification_adapter::LogNotificationAdapter;
use crate::domain::config_validation::{validate_ledger_config, validate_watch_config};
use crate::domain::drawdown::DrawdownEvaluation;
use crate::domain::equity::compute_equity;
use crate::domain::error::EquitywatchError;
use crate::domain::ledger::TradeStatus;
use crate::domain::review::{AccountReview, ReviewEngine};
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::notification_port::NotificationPort;

#[derive(Parser, Debug)]
#[command(name = "equitywatch", about = "Trading-journal equity and risk monitor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one evaluation pass over the ledger
    Review {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        account: Option<String>,
    },
    /// Poll the ledger on a timer, carrying monitor state across passes
    Watch {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        account: Option<String>,
        /// Seconds between passes, overriding [watch] interval_secs
        #[arg(long)]
        interval: Option<u64>,
    },
    /// List the accounts the ledger store knows
    ListAccounts {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show ledger statistics per account
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        account: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Review { config, account } => run_review(&config, account.as_deref()),
        Command::Watch {
            config,
            account,
            interval,
        } => run_watch(&config, account.as_deref(), interval),
        Command::ListAccounts { config } => run_list_accounts(&config),
        Command::Info { config, account } => run_info(&config, account.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = EquitywatchError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Select and construct the ledger adapter named by `[ledger] source`.
pub fn make_ledger_port(config: &dyn ConfigPort) -> Result<Box<dyn LedgerPort>, EquitywatchError> {
    let source = config
        .get_str("ledger", "source")
        .ok_or_else(|| EquitywatchError::ConfigMissing {
            section: "ledger".into(),
            key: "source".into(),
        })?
        .trim()
        .to_lowercase();

    match source.as_str() {
        "csv" => {
            let base =
                config
                    .get_str("ledger", "csv_path")
                    .ok_or_else(|| EquitywatchError::ConfigMissing {
                        section: "ledger".into(),
                        key: "csv_path".into(),
                    })?;
            Ok(Box::new(CsvLedgerAdapter::new(PathBuf::from(base))))
        }
        "sqlite" => {
            #[cfg(feature = "sqlite")]
            {
                use crate::adapters::sqlite_adapter::SqliteLedgerAdapter;
                return Ok(Box::new(SqliteLedgerAdapter::from_config(config)?));
            }
            #[cfg(not(feature = "sqlite"))]
            Err(EquitywatchError::ConfigInvalid {
                section: "ledger".into(),
                key: "source".into(),
                reason: "this binary was built without the sqlite feature".into(),
            })
        }
        "postgres" => {
            #[cfg(feature = "postgres")]
            {
                use crate::adapters::postgres_adapter::PostgresLedgerAdapter;
                return Ok(Box::new(PostgresLedgerAdapter::from_config(config)?));
            }
            #[cfg(not(feature = "postgres"))]
            Err(EquitywatchError::ConfigInvalid {
                section: "ledger".into(),
                key: "source".into(),
                reason: "this binary was built without the postgres feature".into(),
            })
        }
        other => Err(EquitywatchError::ConfigInvalid {
            section: "ledger".into(),
            key: "source".into(),
            reason: format!("unknown ledger source '{}'", other),
        }),
    }
}

fn print_reviews(engine: &ReviewEngine, reviews: &[AccountReview]) {
    for review in reviews {
        match &review.drawdown {
            DrawdownEvaluation::NotMonitored => {
                print!(
                    "{}: equity {:.2} | not monitored",
                    review.account_id, review.equity
                );
            }
            DrawdownEvaluation::Evaluated {
                drawdown, breached, ..
            } => {
                let peak = engine
                    .drawdown_state(&review.account_id)
                    .map(|s| s.peak_equity)
                    .unwrap_or(review.equity);
                print!(
                    "{}: equity {:.2} | peak {:.2} | drawdown {:.2}{}",
                    review.account_id,
                    review.equity,
                    peak,
                    drawdown,
                    if *breached { " [BREACHED]" } else { "" }
                );
            }
        }
        match review.phase {
            Some(phase) => println!(" | phase {}", phase),
            None => println!(),
        }
    }
}

/// One review pass against arbitrary ports. Split out so tests can drive it
/// with mocks.
pub fn run_review_pass(
    engine: &mut ReviewEngine,
    ledger: &dyn LedgerPort,
    sink: &dyn NotificationPort,
    account_filter: Option<&str>,
) -> ExitCode {
    match engine.review_all(ledger, sink, account_filter, Utc::now()) {
        Ok(reviews) => {
            print_reviews(engine, &reviews);
            eprintln!("{} accounts reviewed", reviews.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_review(config_path: &PathBuf, account: Option<&str>) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    // Stage 2: Validate ledger config
    if let Err(e) = validate_ledger_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 3: Build ledger adapter
    let ledger = match make_ledger_port(&config) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: Review
    let sink = LogNotificationAdapter::new();
    let mut engine = ReviewEngine::new();
    run_review_pass(&mut engine, ledger.as_ref(), &sink, account)
}

fn run_watch(config_path: &PathBuf, account: Option<&str>, interval: Option<u64>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_ledger_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_watch_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let interval_secs = match interval {
        Some(0) => {
            eprintln!("error: --interval must be at least 1");
            return ExitCode::from(2);
        }
        Some(secs) => secs,
        None => config.get_i64("watch", "interval_secs", 60) as u64,
    };

    let ledger = match make_ledger_port(&config) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let sink = LogNotificationAdapter::new();
    let mut engine = ReviewEngine::new();

    eprintln!("Watching ledger every {}s (ctrl-c to stop)", interval_secs);
    loop {
        match engine.review_all(ledger.as_ref(), &sink, account, Utc::now()) {
            Ok(reviews) => print_reviews(&engine, &reviews),
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
        std::thread::sleep(Duration::from_secs(interval_secs));
    }
}

fn run_list_accounts(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_ledger_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let ledger = match make_ledger_port(&config) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let accounts = match ledger.fetch_accounts() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if accounts.is_empty() {
        eprintln!("No accounts found");
    } else {
        for account in &accounts {
            let mut flags = Vec::new();
            if !account.active {
                flags.push("inactive");
            }
            if account.prop_firm {
                flags.push("prop-firm");
            }
            if flags.is_empty() {
                println!("{}", account.id);
            } else {
                println!("{} ({})", account.id, flags.join(", "));
            }
        }
        eprintln!("{} accounts found", accounts.len());
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf, account_filter: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_ledger_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let ledger = match make_ledger_port(&config) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mut accounts = match ledger.fetch_accounts() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if let Some(filter) = account_filter {
        accounts.retain(|a| a.id == filter);
        if accounts.is_empty() {
            let err = EquitywatchError::NoSuchAccount {
                account_id: filter.to_string(),
            };
            eprintln!("error: {err}");
            return (&err).into();
        }
    }

    for config in &accounts {
        let snapshot = match ledger.fetch_ledger(&config.id) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let closed = snapshot
            .trades
            .iter()
            .filter(|t| t.status == TradeStatus::Closed)
            .count();
        let open = snapshot.trades.len() - closed;
        let equity = compute_equity(config, &snapshot.trades, &snapshot.transactions);

        println!(
            "{}: {} closed trades, {} open, {} transactions, equity {:.2}",
            config.id,
            closed,
            open,
            snapshot.transactions.len(),
            equity
        );
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_ledger_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_watch_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!("Configuration is valid");
    ExitCode::SUCCESS
}
