//! Flockhub command-line client.
//!
//! A thin front end over `flockhub-core` for signing in and browsing church
//! data from a terminal.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flockhub_core::auth::{FileStorage, KeyringStorage, Storage};
use flockhub_core::models::CheckIn;
use flockhub_core::query::QueryResult;
use flockhub_core::services::Credentials;
use flockhub_core::{create_services, ApiClient, AppState, Config, QueryClient, Queries};

const USAGE: &str = "Usage: flockhub [--keyring] <command> [args]

Commands:
  login [email]             Sign in (prompts for the password)
  logout                    Sign out and forget the session
  whoami                    Show the signed-in user
  churches                  List churches
  use <church-id>           Set the active church
  people                    List people in the active church
  person <id>               Show one person
  teams                     List teams in the active church
  members <team-id>         List members of a team
  services                  List services in the active church
  schedules <service-id>    List schedules for a service
  check-in <person> <service>  Record attendance";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let use_keyring = match args.iter().position(|a| a == "--keyring") {
        Some(index) => {
            args.remove(index);
            true
        }
        None => false,
    };
    let Some(command) = args.first().cloned() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    let mut config = Config::load()?;
    config.apply_env();

    let storage: Arc<dyn Storage> = if use_keyring {
        Arc::new(KeyringStorage::new())
    } else {
        Arc::new(FileStorage::new(config.cache_dir()?))
    };

    let client_config = config.client_config(storage).on_unauthorized(|route| {
        eprintln!("Session expired. Run `flockhub login` to continue ({}).", route);
    });
    let client = ApiClient::new(client_config).context("Failed to configure API client")?;
    let queries = Queries::new(QueryClient::new(), create_services(client.instance()));
    let mut state = AppState::from_config(&config);

    info!(command = %command, mock = config.use_mock, "Running command");
    let rest = &args[1..];
    match command.as_str() {
        "login" => login(&queries, rest.first().cloned()).await,
        "logout" => {
            queries.api().auth.logout().await?;
            println!("Signed out.");
            Ok(())
        }
        "whoami" => {
            let me = settle(queries.me().await)?;
            let role = me.role.map(|r| r.label()).unwrap_or("-");
            println!("{} <{}> {}", me.name, me.email.as_deref().unwrap_or("-"), role);
            Ok(())
        }
        "churches" => {
            for church in settle(queries.churches().await)?.iter() {
                let active = state.active_church() == Some(church.id.as_str());
                let marker = if active { "*" } else { " " };
                println!("{} {:<10} {}", marker, church.id, church.name);
            }
            Ok(())
        }
        "use" => {
            let id = arg(rest, 0, "church-id")?;
            let church = settle(queries.church(Some(id)).await)?;
            if state.set_active_church(Some(church.id.clone())) {
                state.store_in(&mut config);
                config.save()?;
            }
            println!("Active church: {}", church.name);
            Ok(())
        }
        "people" => {
            let church = active_church(&state)?;
            for person in settle(queries.people(Some(church)).await)?.iter() {
                println!("{:<10} {}", person.id, person.display_name());
            }
            Ok(())
        }
        "person" => {
            let person = settle(queries.person(Some(arg(rest, 0, "id")?)).await)?;
            println!("{}", person.display_name());
            if let Some(email) = &person.email {
                println!("  email: {}", email);
            }
            if let Some(phone) = &person.phone {
                println!("  phone: {}", phone);
            }
            Ok(())
        }
        "teams" => {
            let church = active_church(&state)?;
            for team in settle(queries.teams(Some(church)).await)?.iter() {
                println!("{:<10} {:<24} {}", team.id, team.name, team.display_member_count());
            }
            Ok(())
        }
        "members" => {
            let members = settle(queries.team_members(Some(arg(rest, 0, "team-id")?)).await)?;
            for member in members.iter() {
                println!("{:<10} {:<24} {}", member.person_id, member.name, member.role);
            }
            Ok(())
        }
        "services" => {
            let church = active_church(&state)?;
            for service in settle(queries.services(Some(church)).await)?.iter() {
                let upcoming = if service.is_upcoming() { "upcoming" } else { "" };
                println!("{:<10} {:<24} {}", service.id, service.name, upcoming);
            }
            Ok(())
        }
        "schedules" => {
            let schedules =
                settle(queries.schedules_for_service(Some(arg(rest, 0, "service-id")?)).await)?;
            for schedule in schedules.iter() {
                println!(
                    "{:<10} team {:<8} person {:<8} {}",
                    schedule.id,
                    schedule.team_id,
                    schedule.person_id,
                    schedule.status.label()
                );
            }
            Ok(())
        }
        "check-in" => {
            let check_in = CheckIn {
                person_id: arg(rest, 0, "person")?.to_string(),
                service_id: arg(rest, 1, "service")?.to_string(),
                security_code: None,
            };
            let attendance = queries.check_in(&check_in).await?;
            println!("Checked in ({})", attendance.id);
            Ok(())
        }
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    }
}

async fn login(queries: &Queries, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => {
            print!("Email: ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().read_line(&mut line)?;
            line.trim().to_string()
        }
    };
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    let user = queries
        .api()
        .auth
        .login(&Credentials { email, password })
        .await?;
    println!("Signed in as {}", user.name);
    Ok(())
}

/// Turn a query outcome into data or an error for the terminal.
///
/// Data age goes to stderr so listings on stdout stay clean.
fn settle<T: Send + Sync + 'static>(result: QueryResult<T>) -> Result<Arc<T>> {
    if let Some(error) = &result.error {
        bail!("{}", error);
    }
    let age = result.age_display();
    let data = result
        .data
        .ok_or_else(|| anyhow::anyhow!("No data returned"))?;
    eprintln!("(updated {})", age);
    Ok(data)
}

fn active_church(state: &AppState) -> Result<&str> {
    state
        .active_church()
        .ok_or_else(|| anyhow::anyhow!("No active church. Run `flockhub use <church-id>` first."))
}

fn arg<'a>(rest: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    rest.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("Missing <{}>\n\n{}", name, USAGE))
}
