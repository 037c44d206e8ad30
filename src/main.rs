mod cache;
mod classify;
mod commands;
mod config;
mod election;
mod error;
mod extract;
mod grades;
mod models;
mod portal;
mod render;
mod schedule;
mod timeslot;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cache::ElectionCache;
use config::Config;
use election::Election;
use error::PortalError;
use portal::{Endpoints, HttpSession};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let config = Config::parse_args();
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            println!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    // Tables go to stdout, so logs stay quiet and on stderr unless asked for.
    let default_filter = if verbose { "warn,eamis=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Whole run. `Ok(false)` means a sub-command failed but the others ran.
async fn run(config: Config) -> Result<bool> {
    let run_start = Instant::now();
    let endpoints = Endpoints::new(&config.base_url);
    let session = HttpSession::new(endpoints.base())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %endpoints.base(),
        "Starting EAMIS query"
    );

    if let Err(e) = portal::check_connection(&session, &endpoints).await {
        debug!(error = %e, "Connectivity probe failed");
        println!("Failed to connect the NKU-EAMIS system!\n");
        return Ok(false);
    }

    let username = match config.username.clone() {
        Some(username) => username,
        None => prompt_line("Input your Student ID:")?,
    };
    let password = password_or_prompt(config.password.clone(), || {
        rpassword::prompt_password("Input your password:")
    })?;
    portal::log_in(&session, &endpoints, &username, &password).await?;
    info!(username = %username, "Logged in");

    println!("{}", "=".repeat(80));
    match commands::student_detail(&session, &endpoints).await {
        Ok(Some(detail)) => println!("{}", commands::render_student_detail(&detail)),
        Ok(None) => debug!("No student detail on page"),
        Err(e) => warn!(error = %e, "Failed to load student detail"),
    }

    let semester_id = match config.semester_selector() {
        Some(selector) => Some(commands::resolve_semester(&session, &endpoints, &selector).await?.id),
        None => None,
    };

    let cache = ElectionCache::open(&config.cache_file);
    let mut all_ok = true;

    if let Some(selection) = config.category_selection() {
        all_ok &= report(
            "grades",
            commands::grade_report(&session, &endpoints, &selection).await,
        );
    }

    if config.courses {
        all_ok &= report(
            "courses",
            commands::course_report(&session, &endpoints, semester_id).await,
        );
    }

    if config.exams {
        all_ok &= report(
            "exams",
            commands::exam_report(&session, &endpoints, semester_id).await,
        );
    }

    if config.elect_course {
        let election = Election::new(&session, &endpoints, &cache);
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        if let Err(e) = election.interact(&mut input, &mut output).await {
            all_ok &= report::<String>("election", Err(e));
        }
    }

    if let Err(e) = cache.teardown() {
        warn!(error = %e, "Failed to remove election cache");
    }

    info!(
        duration_ms = run_start.elapsed().as_millis(),
        success = all_ok,
        "Run completed"
    );
    Ok(all_ok)
}

/// Print a sub-command's output or its diagnostic.
fn report<T: std::fmt::Display>(command: &str, result: Result<T>) -> bool {
    match result {
        Ok(output) => {
            println!("{}", output);
            true
        }
        Err(e) => {
            match e.downcast_ref::<PortalError>() {
                Some(portal_error) => println!("{}", portal_error),
                None => {
                    error!(command = %command, error = %e, "Query failed");
                    println!("Failed to query {}: {:#}", command, e);
                }
            }
            false
        }
    }
}

/// The configured password, or one read without echo.
fn password_or_prompt<P>(given: Option<String>, prompt: P) -> Result<String>
where
    P: FnOnce() -> io::Result<String>,
{
    match given {
        Some(password) => Ok(password),
        None => prompt().context("Failed to read password"),
    }
}

fn prompt_line(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_password_skips_prompt() {
        let password = password_or_prompt(Some("secret".to_string()), || {
            panic!("prompt must not run when a password is configured")
        })
        .unwrap();
        assert_eq!(password, "secret");
    }

    #[test]
    fn test_missing_password_uses_hidden_prompt() {
        let password = password_or_prompt(None, || Ok("typed".to_string())).unwrap();
        assert_eq!(password, "typed");

        let err = password_or_prompt(None, || Err(io::Error::other("no tty"))).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read password"));
    }
}
