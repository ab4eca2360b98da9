//! CLI administration tool for shelf-social.
//!
//! Provides commands for managing accounts, capabilities, API tokens and
//! library holdings without requiring HTTP API access.
//!
//! # Usage
//!
//! ```bash
//! # Create an account and grant it a capability
//! cargo run --bin admin -- user create alice --email alice@example.com
//! cargo run --bin admin -- user grant alice can_create
//!
//! # Issue, list and revoke API tokens
//! cargo run --bin admin -- token create alice --name laptop
//! cargo run --bin admin -- token list
//! cargo run --bin admin -- token revoke laptop
//!
//! # Stock a library
//! cargo run --bin admin -- library create "Central"
//! cargo run --bin admin -- library add-book "Central" 12
//! cargo run --bin admin -- librarian assign "Central" "Ada"
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_*` components (required): PostgreSQL connection
//! - `TOKEN_SIGNING_SECRET` (required for `user create` and `token create`)

use shelf_social::application::services::auth_service::{
    generate_token, hash_password, hash_token,
};
use shelf_social::config::Config;
use shelf_social::domain::access::Capability;
use shelf_social::domain::entities::{Books, NewUser, User};
use shelf_social::domain::repositories::{
    LibraryRepository, ResourceRepository, TokenRepository, UserRepository,
};
use shelf_social::infrastructure::persistence::{
    PgLibraryRepository, PgResourceRepository, PgTokenRepository, PgUserRepository,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input, Password};
use sqlx::PgPool;
use std::sync::Arc;
use validator::Validate;

/// CLI tool for managing shelf-social.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage accounts and capabilities
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage API tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Manage libraries and their holdings
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },

    /// Manage librarians
    Librarian {
        #[command(subcommand)]
        action: LibrarianAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Account subcommands.
#[derive(Subcommand)]
enum UserAction {
    /// Create a new account
    Create {
        username: String,

        #[arg(short, long)]
        email: Option<String>,

        /// Grant every capability and bypass ownership checks
        #[arg(long)]
        superuser: bool,
    },

    /// List all accounts
    List,

    /// Grant a capability (can_view, can_create, can_edit, can_delete)
    Grant { username: String, capability: String },

    /// Revoke a capability
    Revoke { username: String, capability: String },
}

/// Token management subcommands.
#[derive(Subcommand)]
enum TokenAction {
    /// Create a new API token for an account
    Create {
        username: String,

        /// Token name (e.g., "laptop", "CI")
        #[arg(short, long)]
        name: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List all tokens
    List,

    /// Revoke a token
    Revoke {
        /// Token name or ID to revoke
        name_or_id: String,
    },
}

/// Library subcommands.
#[derive(Subcommand)]
enum LibraryAction {
    /// Create a library
    Create { name: String },

    /// Add a book to a library's holdings
    AddBook { library: String, book_id: i64 },
}

/// Librarian subcommands.
#[derive(Subcommand)]
enum LibrarianAction {
    /// Assign the librarian of a library, replacing any previous one
    Assign { library: String, name: String },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url =
        Config::load_database_url()?.context("DATABASE_URL or DB_HOST must be set")?;

    let pool = Arc::new(
        PgPool::connect(&database_url)
            .await
            .context("Failed to connect to database")?,
    );

    match cli.command {
        Commands::User { action } => handle_user_action(action, pool).await?,
        Commands::Token { action } => handle_token_action(action, pool).await?,
        Commands::Library { action } => handle_library_action(action, pool).await?,
        Commands::Librarian { action } => handle_librarian_action(action, pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

fn signing_secret() -> Result<String> {
    std::env::var("TOKEN_SIGNING_SECRET").context("TOKEN_SIGNING_SECRET must be set")
}

fn parse_capability(value: &str) -> Result<Capability> {
    value.parse().map_err(|e: String| anyhow::anyhow!(e))
}

async fn require_user(users: &PgUserRepository, username: &str) -> Result<User> {
    users
        .find_by_username(username)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .with_context(|| format!("User '{username}' not found"))
}

/// Dispatches account commands.
async fn handle_user_action(action: UserAction, pool: Arc<PgPool>) -> Result<()> {
    let users = PgUserRepository::new(pool);

    match action {
        UserAction::Create {
            username,
            email,
            superuser,
        } => create_user(&users, username, email, superuser).await?,
        UserAction::List => list_users(&users).await?,
        UserAction::Grant {
            username,
            capability,
        } => set_capability(&users, &username, &capability, true).await?,
        UserAction::Revoke {
            username,
            capability,
        } => set_capability(&users, &username, &capability, false).await?,
    }

    Ok(())
}

/// Creates an account, prompting for the email and password.
///
/// The password is stored salted and keyed by `TOKEN_SIGNING_SECRET`.
async fn create_user(
    users: &PgUserRepository,
    username: String,
    email: Option<String>,
    superuser: bool,
) -> Result<()> {
    println!("{}", "👤 Create Account".bright_blue().bold());
    println!();

    let secret = signing_secret()?;

    let email = match email {
        Some(e) => e,
        None => Input::new().with_prompt("Email").interact_text()?,
    };

    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;

    let new_user = NewUser {
        username,
        email,
        password_hash: hash_password(&secret, &password),
        is_superuser: superuser,
    };
    new_user.validate().context("Invalid account details")?;

    let user = users
        .create(new_user)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create user: {}", e))?;

    println!();
    println!("{}", "✅ Account created successfully!".green().bold());
    println!("  ID:       {}", user.id.to_string().bright_black());
    println!("  Username: {}", user.username.cyan());
    if user.is_superuser {
        println!("  Role:     {}", "superuser".bright_yellow());
    }
    println!();

    Ok(())
}

/// Lists all accounts with their capabilities.
async fn list_users(users: &PgUserRepository) -> Result<()> {
    println!("{}", "📋 Accounts".bright_blue().bold());
    println!();

    let all = users
        .list()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list users: {}", e))?;

    if all.is_empty() {
        println!("{}", "  No accounts found".yellow());
        return Ok(());
    }

    println!(
        "  {:<5} {:<20} {:<30} {}",
        "ID".bright_white().bold(),
        "Username".bright_white().bold(),
        "Email".bright_white().bold(),
        "Capabilities".bright_white().bold()
    );
    println!("  {}", "─".repeat(85).bright_black());

    for user in &all {
        let capabilities = if user.is_superuser {
            "superuser".bright_yellow().to_string()
        } else {
            user.capabilities
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };

        println!(
            "  {:<5} {:<20} {:<30} {}",
            user.id.to_string().bright_black(),
            user.username.cyan(),
            user.email,
            capabilities
        );
    }

    println!();
    println!("  Total: {}", all.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

async fn set_capability(
    users: &PgUserRepository,
    username: &str,
    capability: &str,
    granted: bool,
) -> Result<()> {
    let capability = parse_capability(capability)?;
    let user = require_user(users, username).await?;

    users
        .set_capability(user.id, capability, granted)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to update capability: {}", e))?;

    let verb = if granted { "granted to" } else { "revoked from" };
    println!(
        "{} {} {} {}",
        "✅".green(),
        capability.as_str().bright_yellow(),
        verb,
        user.username.cyan()
    );

    Ok(())
}

/// Dispatches token management commands.
async fn handle_token_action(action: TokenAction, pool: Arc<PgPool>) -> Result<()> {
    let tokens = PgTokenRepository::new(pool.clone());

    match action {
        TokenAction::Create {
            username,
            name,
            yes,
        } => {
            let users = PgUserRepository::new(pool);
            let user = require_user(&users, &username).await?;
            create_token(&tokens, &user, name, yes).await?;
        }
        TokenAction::List => list_tokens(&tokens).await?,
        TokenAction::Revoke { name_or_id } => revoke_token(&tokens, &name_or_id).await?,
    }

    Ok(())
}

/// Creates a new API token for `user`.
///
/// Only the HMAC of the token is stored. The raw value is displayed once
/// and cannot be retrieved later.
async fn create_token(
    tokens: &PgTokenRepository,
    user: &User,
    name: Option<String>,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🔑 Create API Token".bright_blue().bold());
    println!();

    let secret = signing_secret()?;

    let token_name = match name {
        Some(n) => n,
        None => Input::new()
            .with_prompt("Token name")
            .with_initial_text("default")
            .interact_text()?,
    };

    let token_value = generate_token();

    println!("{}", "Token details:".bright_white().bold());
    println!("  User:  {}", user.username.cyan());
    println!("  Name:  {}", token_name.cyan());
    println!("  Token: {}", token_value.bright_yellow().bold());
    println!();
    println!(
        "{}",
        "⚠️  IMPORTANT: Save this token now! You won't be able to see it again."
            .red()
            .bold()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this token?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    tokens
        .create_token(user.id, &token_name, &hash_token(&secret, &token_value))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create token: {}", e))?;

    println!();
    println!("{}", "✅ Token created successfully!".green().bold());
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:3000/api/accounts/profile",
        token_value.bright_yellow()
    );
    println!();

    Ok(())
}

/// Lists all API tokens with status indicators.
async fn list_tokens(tokens: &PgTokenRepository) -> Result<()> {
    println!("{}", "📋 API Tokens".bright_blue().bold());
    println!();

    let all = tokens
        .list_tokens()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list tokens: {}", e))?;

    if all.is_empty() {
        println!("{}", "  No tokens found".yellow());
        return Ok(());
    }

    println!(
        "  {:<5} {:<8} {:<25} {:<20} {:<10}",
        "ID".bright_white().bold(),
        "User".bright_white().bold(),
        "Name".bright_white().bold(),
        "Created".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for token in &all {
        let status = if token.revoked_at.is_some() {
            "REVOKED".red()
        } else {
            "ACTIVE".green()
        };

        println!(
            "  {:<5} {:<8} {:<25} {:<20} {}",
            token.id.to_string().bright_black(),
            token.user_id.to_string().bright_black(),
            token.name.cyan(),
            token
                .created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            status
        );
    }

    println!();
    println!("  Total: {}", all.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

/// Revokes a token by ID, or by name when the input is not numeric.
async fn revoke_token(tokens: &PgTokenRepository, name_or_id: &str) -> Result<()> {
    println!("{}", "🔒 Revoke API Token".bright_blue().bold());
    println!();

    let all = tokens
        .list_tokens()
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    let token = match name_or_id.parse::<i64>() {
        Ok(id) => all.into_iter().find(|t| t.id == id),
        Err(_) => all.into_iter().find(|t| t.name == name_or_id),
    }
    .context("Token not found")?;

    if token.revoked_at.is_some() {
        println!("{}", "⚠️  This token is already revoked".yellow());
        return Ok(());
    }

    println!("  Token: {}", token.name.cyan());
    println!("  ID:    {}", token.id.to_string().bright_black());
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Revoke this token?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    tokens
        .revoke_token(token.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to revoke token: {}", e))?;

    println!();
    println!("{}", "✅ Token revoked successfully!".green().bold());
    println!();

    Ok(())
}

/// Dispatches library commands.
async fn handle_library_action(action: LibraryAction, pool: Arc<PgPool>) -> Result<()> {
    let libraries = PgLibraryRepository::new(pool.clone());

    match action {
        LibraryAction::Create { name } => {
            let library = libraries
                .create_library(&name)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create library: {}", e))?;
            println!(
                "{} Library {} created (ID {})",
                "✅".green(),
                library.name.cyan(),
                library.id.to_string().bright_black()
            );
        }
        LibraryAction::AddBook { library, book_id } => {
            let library = libraries
                .find_library_by_name(&library)
                .await
                .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
                .with_context(|| format!("Library '{library}' not found"))?;

            let books = PgResourceRepository::<Books>::new(pool);
            let book = books
                .find_by_id(book_id)
                .await
                .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
                .with_context(|| format!("Book {book_id} not found"))?;

            libraries
                .add_book(library.id, book.id)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to add book: {}", e))?;
            println!(
                "{} {} added to {}",
                "✅".green(),
                book.title.cyan(),
                library.name.cyan()
            );
        }
    }

    Ok(())
}

/// Dispatches librarian commands.
async fn handle_librarian_action(action: LibrarianAction, pool: Arc<PgPool>) -> Result<()> {
    let libraries = PgLibraryRepository::new(pool);

    match action {
        LibrarianAction::Assign { library, name } => {
            let library = libraries
                .find_library_by_name(&library)
                .await
                .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
                .with_context(|| format!("Library '{library}' not found"))?;

            let librarian = libraries
                .assign_librarian(library.id, &name)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to assign librarian: {}", e))?;
            println!(
                "{} {} is now the librarian of {}",
                "✅".green(),
                librarian.name.cyan(),
                library.name.cyan()
            );
        }
    }

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let counts: (i64, i64, i64, i64) = sqlx::query_as(
                "SELECT (SELECT COUNT(*) FROM users), (SELECT COUNT(*) FROM books), \
                 (SELECT COUNT(*) FROM posts), \
                 (SELECT COUNT(*) FROM api_tokens WHERE revoked_at IS NULL)",
            )
            .fetch_one(pool)
            .await?;

            println!("  PostgreSQL:    {}", version.bright_white());
            println!("  Users:         {}", counts.0.to_string().bright_green().bold());
            println!("  Books:         {}", counts.1.to_string().bright_green().bold());
            println!("  Posts:         {}", counts.2.to_string().bright_green().bold());
            println!("  Active tokens: {}", counts.3.to_string().bright_green().bold());
            println!();
        }
    }

    Ok(())
}
