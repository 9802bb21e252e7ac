use std::io::{self, BufRead, Write};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use idp_admin::bootstrap::{self, Components};
use idp_admin::server;
use idp_admin::service::admin::{DeleteUserRequest, InviteOutcome, InviteUserRequest, UpdateFavoritesRequest};
use idp_admin::utils::constants::DEFAULT_CONFIG_PATH;
use idp_admin::utils::logging::{self, LogLevel};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the admin HTTP API
    Serve,
    /// Create a user and send them a password-change email
    Invite {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        given_name: Option<String>,
        #[arg(long)]
        family_name: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Print every user as `email - user_id`
    List,
    /// Delete the user registered under an email
    Delete {
        #[arg(long)]
        email: Option<String>,
        #[arg(short, long)]
        yes: bool,
    },
    /// Replace a user's favorites
    Favorites {
        #[arg(long)]
        email: String,
        #[arg(long = "favorite", num_args = 0..)]
        favorites: Vec<String>,
    },
    /// Resolve the M2M token through the cache tiers
    Token {
        /// Print the token value instead of only its metadata
        #[arg(long)]
        show: bool,
        /// Drop the memory copy before resolving
        #[arg(long)]
        refresh: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Read args, load YAML config
    // -------------------------------

    let args = Args::parse();
    let service_config = bootstrap::load_config(&args.config).await?;
    logging::run(Some(&service_config), args.log_level);

    // -------------------------------
    // 2. Store, credentials, token cache, clients
    // -------------------------------

    let components = bootstrap::build(service_config).await?;

    // -------------------------------
    // 3. Dispatch
    // -------------------------------

    match args.command {
        Command::Serve => {
            info!("Service starting...");
            server::server::start(&components.config.settings, components.admin.clone()).await
        }
        Command::Invite {
            email,
            given_name,
            family_name,
            yes,
        } => invite(&components, email, given_name, family_name, yes).await,
        Command::List => list(&components).await,
        Command::Delete { email, yes } => delete(&components, email, yes).await,
        Command::Favorites { email, favorites } => {
            let user = components
                .admin
                .update_favorites(&UpdateFavoritesRequest { email, favorites })
                .await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
            Ok(())
        }
        Command::Token { show, refresh } => token(&components, show, refresh).await,
    }
}

async fn invite(
    components: &Components,
    email: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    yes: bool,
) -> Result<()> {
    let request = InviteUserRequest {
        email: value_or_prompt(email, "Email")?,
        given_name: value_or_prompt(given_name, "Given name")?,
        family_name: value_or_prompt(family_name, "Family name")?,
    };
    if !yes
        && !confirm(&format!(
            "Invite {} {} <{}>?",
            request.given_name, request.family_name, request.email
        ))?
    {
        println!("Aborted.");
        return Ok(());
    }

    match components.admin.invite(&request).await? {
        InviteOutcome::Invited { user_id } => println!("Invited {} ({})", request.email, user_id),
        InviteOutcome::AlreadyExists { user_id } => println!("{} already exists ({})", request.email, user_id),
    }
    Ok(())
}

async fn list(components: &Components) -> Result<()> {
    let users = components.admin.list().await?;
    for user in &users {
        println!("{} - {}", user.email.as_deref().unwrap_or("<no email>"), user.user_id);
    }
    println!("{} users", users.len());
    Ok(())
}

async fn delete(components: &Components, email: Option<String>, yes: bool) -> Result<()> {
    let email = value_or_prompt(email, "Email")?;
    if !yes && !confirm(&format!("Delete user {}? This cannot be undone.", email))? {
        println!("Aborted.");
        return Ok(());
    }
    let user_id = components.admin.delete_by_email(&DeleteUserRequest { email: email.clone() }).await?;
    println!("Deleted {} ({})", email, user_id);
    Ok(())
}

async fn token(components: &Components, show: bool, refresh: bool) -> Result<()> {
    if refresh {
        components.tokens.invalidate();
    }
    let token = components.tokens.get_cached_token().await?;
    println!("tier:       {}", token.source_tier);
    println!("issued_at:  {}", token.issued_at);
    println!("expires_at: {}", token.expires_at);
    println!("parameter:  {}", components.tokens.parameter_path());
    if show {
        println!("token:      {}", token.value);
    }
    Ok(())
}

fn value_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        return Ok(value);
    }
    let answer = prompt(&format!("{}: ", label))?;
    if answer.is_empty() {
        bail!("{} is required", label);
    }
    Ok(answer)
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(&format!("{} [y/N] ", question))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

fn prompt(text: &str) -> Result<String> {
    let mut stdout = io::stdout();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_owned())
}
