//! credvault CLI - Command line interface for the credential vault.
//!
//! Every command opens its own session: it prompts for the master password,
//! performs one operation and exits.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use credvault_common::{Error, SensitiveString};
use credvault_crypto::{Algorithm, Mode};
use credvault_vault::{CredentialSession, ExpirationStatus, VaultManager};

/// Master-password prompts allowed per command.
const MAX_LOGIN_ATTEMPTS: u32 = 3;

#[derive(Parser)]
#[command(name = "credvault")]
#[command(about = "credvault - Encrypted per-user credential vault")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding account and vault files.
    #[arg(long, global = true, env = "CREDVAULT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account.
    Register {
        /// Account name.
        #[arg(short, long)]
        user: String,

        /// Cipher algorithm: AES, DES or DESede.
        #[arg(short, long, default_value = "AES")]
        algorithm: Algorithm,

        /// Cipher mode: GCM, CBC or ECB. GCM requires AES.
        #[arg(short, long, default_value = "GCM")]
        mode: Mode,
    },

    /// Store a credential. The secret is prompted for.
    Add {
        /// Account name.
        #[arg(short, long)]
        user: String,

        /// Label identifying the credential.
        #[arg(short, long)]
        label: String,

        /// Login name for the service.
        #[arg(short = 'n', long, default_value = "")]
        username: String,

        /// Expiration date (YYYY-MM-DD).
        #[arg(short, long)]
        expires: Option<NaiveDate>,
    },

    /// List stored credentials.
    List {
        /// Account name.
        #[arg(short, long)]
        user: String,

        /// Only show labels or usernames containing this text.
        #[arg(short, long)]
        search: Option<String>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show one credential including its secret.
    Show {
        /// Account name.
        #[arg(short, long)]
        user: String,

        /// Credential label.
        #[arg(short, long)]
        label: String,
    },

    /// Delete a credential.
    Delete {
        /// Account name.
        #[arg(short, long)]
        user: String,

        /// Credential label.
        #[arg(short, long)]
        label: String,
    },

    /// List credentials expiring soon, expired ones included.
    Expiring {
        /// Account name.
        #[arg(short, long)]
        user: String,

        /// Window in days.
        #[arg(short, long, default_value_t = 30)]
        days: i64,
    },

    /// Show vault statistics.
    Stats {
        /// Account name.
        #[arg(short, long)]
        user: String,
    },

    /// Check whether an account exists.
    Exists {
        /// Account name.
        #[arg(short, long)]
        user: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let manager = VaultManager::local(resolve_data_dir(cli.data_dir));

    match cli.command {
        Commands::Register {
            user,
            algorithm,
            mode,
        } => cmd_register(&manager, &user, algorithm, mode),

        Commands::Add {
            user,
            label,
            username,
            expires,
        } => cmd_add(&manager, &user, &label, &username, expires),

        Commands::List { user, search, json } => {
            cmd_list(&manager, &user, search.as_deref(), json)
        }

        Commands::Show { user, label } => cmd_show(&manager, &user, &label),

        Commands::Delete { user, label } => cmd_delete(&manager, &user, &label),

        Commands::Expiring { user, days } => cmd_expiring(&manager, &user, days),

        Commands::Stats { user } => cmd_stats(&manager, &user),

        Commands::Exists { user } => cmd_exists(&manager, &user),
    }
}

/// Pick the storage root: explicit flag or env, then the platform data
/// directory, then `./user_data`.
fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| dirs::data_dir().map(|d| d.join("credvault")))
        .unwrap_or_else(|| PathBuf::from("user_data"))
}

/// Prompt for a secret without echo.
fn prompt_secret(prompt: &str) -> Result<SensitiveString> {
    let secret = rpassword::prompt_password(prompt).context("Failed to read password")?;
    Ok(SensitiveString::new(secret))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Log in, re-prompting after a wrong master password.
fn login_with_retries<F>(manager: &VaultManager, user: &str, mut prompt: F) -> Result<CredentialSession>
where
    F: FnMut() -> Result<SensitiveString>,
{
    if !manager.account_exists(user)? {
        bail!("No account named '{}'", user);
    }

    for attempt in 1..=MAX_LOGIN_ATTEMPTS {
        let password = prompt()?;
        match manager.login(user, password.expose()) {
            Ok(session) => return Ok(session),
            Err(Error::InvalidCredential) => {
                eprintln!(
                    "Invalid master password ({} of {} attempts)",
                    attempt, MAX_LOGIN_ATTEMPTS
                );
            }
            Err(e) => return Err(e).context("Failed to open vault"),
        }
    }

    bail!("Too many failed attempts")
}

fn open_session(manager: &VaultManager, user: &str) -> Result<CredentialSession> {
    login_with_retries(manager, user, || prompt_secret("Master password: "))
}

/// Create a new account.
fn cmd_register(manager: &VaultManager, user: &str, algorithm: Algorithm, mode: Mode) -> Result<()> {
    info!("Registering account: {}", user);

    algorithm
        .check_mode(mode)
        .context("Choose CBC or ECB for DES and DESede")?;

    if manager.account_exists(user)? {
        bail!("Account '{}' already exists", user);
    }

    let password = prompt_secret("Enter master password: ")?;
    let confirm = prompt_secret("Confirm master password: ")?;

    if password != confirm {
        bail!("Passwords do not match");
    }

    if password.is_empty() {
        bail!("Password cannot be empty");
    }

    let session = manager
        .register(user, password.expose(), algorithm, mode)
        .context("Failed to register account")?;

    println!("Account created successfully!");
    println!("  User: {}", session.username());
    println!("  Cipher: {}/{}", algorithm, mode);
    if !mode.is_authenticated() {
        println!("  Note: {} does not detect tampering; GCM is recommended.", mode);
    }

    Ok(())
}

/// Store a credential.
fn cmd_add(
    manager: &VaultManager,
    user: &str,
    label: &str,
    username: &str,
    expires: Option<NaiveDate>,
) -> Result<()> {
    let mut session = open_session(manager, user)?;

    if session.get_credential(label)?.is_some() {
        eprintln!("Warning: '{}' already exists and will be replaced", label);
    }

    let secret = prompt_secret("Secret: ")?;
    session
        .add_credential(label, username, secret, expires)
        .context("Failed to add credential")?;

    println!("Credential '{}' saved.", label);
    Ok(())
}

#[derive(Serialize)]
struct ListedCredential<'a> {
    label: &'a str,
    username: &'a str,
    expiration: Option<NaiveDate>,
    status: ExpirationStatus,
}

/// List credentials, optionally filtered.
fn cmd_list(manager: &VaultManager, user: &str, search: Option<&str>, json: bool) -> Result<()> {
    let session = open_session(manager, user)?;
    let today = today();

    let labels = match search {
        Some(query) => session.search(query)?,
        None => session.list_credentials()?,
    };

    let mut listed = Vec::with_capacity(labels.len());
    for label in &labels {
        if let Some(entry) = session.get_credential(label)? {
            listed.push(ListedCredential {
                label,
                username: &entry.username,
                expiration: entry.expiration,
                status: ExpirationStatus::classify(entry.expiration, today),
            });
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    if listed.is_empty() {
        println!("No credentials stored.");
    } else {
        println!("Credentials for {}:", user);
        for item in &listed {
            let expiration = item
                .expiration
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<24} {:<24} {:<12} {}",
                item.label, item.username, expiration, item.status
            );
        }
    }

    Ok(())
}

/// Show one credential.
fn cmd_show(manager: &VaultManager, user: &str, label: &str) -> Result<()> {
    let session = open_session(manager, user)?;

    let Some(entry) = session.get_credential(label)? else {
        bail!("No credential labelled '{}'", label);
    };

    println!("Label:    {}", label);
    println!("Username: {}", entry.username);
    println!("Secret:   {}", entry.secret.expose());
    match entry.expiration {
        Some(date) => println!(
            "Expires:  {} ({})",
            date,
            ExpirationStatus::classify(Some(date), today())
        ),
        None => println!("Expires:  never"),
    }

    Ok(())
}

/// Delete a credential.
fn cmd_delete(manager: &VaultManager, user: &str, label: &str) -> Result<()> {
    let mut session = open_session(manager, user)?;

    if session
        .delete_credential(label)
        .context("Failed to delete credential")?
    {
        println!("Credential '{}' deleted.", label);
    } else {
        println!("No credential labelled '{}'.", label);
    }

    Ok(())
}

/// List credentials expiring within `days`.
fn cmd_expiring(manager: &VaultManager, user: &str, days: i64) -> Result<()> {
    let session = open_session(manager, user)?;
    let expiring = session.expiring_within(days, today())?;

    if expiring.is_empty() {
        println!("Nothing expires within {} days.", days);
        return Ok(());
    }

    println!("Expiring within {} days:", days);
    for item in expiring {
        let when = match item.days_left {
            d if d < 0 => format!("expired {} day(s) ago", -d),
            0 => "today".to_string(),
            d => format!("in {} day(s)", d),
        };
        println!("  {:<24} {}  {}", item.label, item.expiration, when);
    }

    Ok(())
}

/// Show counts.
fn cmd_stats(manager: &VaultManager, user: &str) -> Result<()> {
    let session = open_session(manager, user)?;
    let stats = session.stats(today())?;

    println!("Vault statistics for {}:", user);
    println!("  Cipher:        {}/{}", session.algorithm()?, session.mode()?);
    println!("  Credentials:   {}", stats.total);
    println!("  No expiration: {}", stats.no_expiry);
    println!("  Expiring soon: {}", stats.expiring_soon);

    Ok(())
}

/// Check account presence.
fn cmd_exists(manager: &VaultManager, user: &str) -> Result<()> {
    if manager.account_exists(user)? {
        println!("Account '{}' exists.", user);
    } else {
        println!("Account '{}' does not exist.", user);
    }
    Ok(())
}
