//! Command-line front-end for the ledger.
//!
//! # Responsibility
//! - Map subcommands onto authenticate / summary / audit log / transfer / purchase.
//! - Print results as JSON on stdout and failures as JSON on stderr.
//!
//! # Invariants
//! - Every ledger call receives the caller identity from a verified token.
//! - Exit status follows the error's status class (0 ok, 2 client, 3 auth, 1 server).

use coinledger_core::db::open_db_with_timeout;
use coinledger_core::{
    init_logging_from_config, Authenticator, CatalogRepository, HistoryService, LedgerConfig,
    LedgerError, LedgerService, SqliteCatalogRepository,
};
use log::error;
use serde_json::json;
use std::process::ExitCode;

const USAGE: &str = "usage:
  coinledger auth <username> <password>
  coinledger info <token>
  coinledger history <token>
  coinledger send <token> <to-username> <amount>
  coinledger buy <token> <item>
  coinledger items";

enum CliError {
    Usage(String),
    Setup(String),
    Ledger(LedgerError),
}

impl From<LedgerError> for CliError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(CliError::Usage(message)) => {
            eprintln!("{message}\n{USAGE}");
            ExitCode::from(64)
        }
        Err(CliError::Setup(message)) => {
            eprintln!("{}", json!({ "error": "setup", "message": message }));
            ExitCode::from(1)
        }
        Err(CliError::Ledger(err)) => {
            eprintln!(
                "{}",
                json!({ "error": err.kind().as_str(), "message": err.to_string() })
            );
            ExitCode::from(match err.status_code() {
                401 => 3,
                500 => 1,
                _ => 2,
            })
        }
    }
}

fn run(args: &[String]) -> Result<serde_json::Value, CliError> {
    let Some((command, rest)) = args.split_first() else {
        return Err(CliError::Usage("missing command".to_string()));
    };
    if !matches!(command.as_str(), "auth" | "info" | "history" | "send" | "buy" | "items") {
        return Err(CliError::Usage(format!("unknown command `{command}`")));
    }

    let config = LedgerConfig::from_env().map_err(|err| CliError::Setup(err.to_string()))?;
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }
    let conn = open_db_with_timeout(&config.database_path, config.busy_timeout())
        .map_err(|err| CliError::Setup(format!("cannot open ledger database: {err}")))?;
    let auth =
        Authenticator::new(&config.auth).map_err(|err| CliError::Setup(err.to_string()))?;

    let result = match (command.as_str(), rest) {
        ("auth", [username, password]) => {
            let token = auth.authenticate(&conn, username, password)?;
            json!({ "token": token.token, "expires_at": token.expires_at })
        }
        ("info", [token]) => {
            let caller = auth.verify_token(token)?;
            to_json(HistoryService::new(&conn).get_summary(caller.account_id)?)?
        }
        ("history", [token]) => {
            let caller = auth.verify_token(token)?;
            to_json(HistoryService::new(&conn).get_audit_log(caller.account_id)?)?
        }
        ("send", [token, to_username, amount]) => {
            let caller = auth.verify_token(token)?;
            let amount = amount.parse::<i64>().map_err(|_| {
                LedgerError::InvalidInput(format!("amount `{amount}` is not an integer"))
            })?;
            let record =
                LedgerService::new(&conn).transfer(caller.account_id, to_username, amount)?;
            to_json(record)?
        }
        ("buy", [token, item]) => {
            let caller = auth.verify_token(token)?;
            to_json(LedgerService::new(&conn).purchase(caller.account_id, item)?)?
        }
        ("items", []) => to_json(
            SqliteCatalogRepository::new(&conn)
                .list_items()
                .map_err(LedgerError::from)?,
        )?,
        (other, _) => {
            return Err(CliError::Usage(format!(
                "wrong number of arguments for `{other}`"
            )))
        }
    };
    Ok(result)
}

fn to_json<T: serde::Serialize>(value: T) -> Result<serde_json::Value, CliError> {
    serde_json::to_value(value).map_err(|err| {
        error!("event=cli_output module=cli status=error error={err}");
        CliError::Setup(format!("cannot encode output: {err}"))
    })
}
