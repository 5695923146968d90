//! oauth2-mongo - administration entry point
//!
//! Inspects and edits the client and token collections, and provisions the
//! expiry indexes.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use oauth2_mongo::config::defaults;
use oauth2_mongo::{
    Client, ClientConfig, ClientStore, Config, MongoClientStore, MongoConnection,
    MongoTokenStore, TokenConfig, TokenStore,
};

#[derive(Parser, Debug)]
#[command(name = "oauth2-mongo")]
#[command(about = "Manage OAuth 2.0 clients and tokens stored in MongoDB")]
#[command(version)]
struct Cli {
    /// MongoDB connection string
    #[arg(long, env = "MONGO_URL", default_value = defaults::URL)]
    mongo_url: String,

    /// Database holding the OAuth collections
    #[arg(long, env = "MONGO_DB", default_value = defaults::DATABASE)]
    database: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the ExpiredAt indexes, failing on any error
    EnsureIndexes,

    /// Manage registered clients
    #[command(subcommand)]
    Client(ClientCommand),

    /// Inspect or revoke tokens
    #[command(subcommand)]
    Token(TokenCommand),
}

#[derive(Subcommand, Debug)]
enum ClientCommand {
    /// Register a client
    Set {
        #[arg(long)]
        id: String,
        #[arg(long)]
        secret: String,
        #[arg(long, default_value = "")]
        domain: String,
        #[arg(long, default_value = "")]
        user_id: String,
    },
    /// Print a client as JSON
    Get { id: String },
    /// Delete a client
    Remove { id: String },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Print the stored token record as JSON
    Get(TokenKey),
    /// Delete one code, access or refresh entry
    Remove(TokenKey),
}

const MISSING_KEY: &str = "one of --code, --access or --refresh is required";

/// Exactly one of the three keys.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct TokenKey {
    #[arg(long)]
    code: Option<String>,
    #[arg(long)]
    access: Option<String>,
    #[arg(long)]
    refresh: Option<String>,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn run(command: Command, connection: &MongoConnection) -> anyhow::Result<()> {
    match command {
        Command::EnsureIndexes => {
            let config = TokenConfig::default();
            let tokens = MongoTokenStore::without_indexes(connection.clone(), config);
            tokens
                .ensure_indexes()
                .await
                .context("Failed to create expiry indexes")?;
            tracing::info!("Expiry indexes are in place");
        }
        Command::Client(command) => {
            let config = ClientConfig::default();
            let clients = MongoClientStore::new(connection.clone(), config);
            run_client(command, &clients).await?;
        }
        Command::Token(command) => {
            let config = TokenConfig::default();
            let tokens = MongoTokenStore::new(connection.clone(), config).await;
            run_token(command, &tokens).await?;
        }
    }
    Ok(())
}

async fn run_client(command: ClientCommand, clients: &impl ClientStore) -> anyhow::Result<()> {
    match command {
        ClientCommand::Set {
            id,
            secret,
            domain,
            user_id,
        } => {
            clients
                .set(&Client::new(id.as_str(), secret, domain, user_id))
                .await?;
            tracing::info!(id = %id, "Client registered");
        }
        ClientCommand::Get { id } => {
            let client = clients.get_by_id(&id).await?;
            println!("{}", serde_json::to_string_pretty(&client)?);
        }
        ClientCommand::Remove { id } => {
            clients.remove_by_id(&id).await?;
            tracing::info!(id = %id, "Client removed");
        }
    }
    Ok(())
}

async fn run_token(command: TokenCommand, tokens: &impl TokenStore) -> anyhow::Result<()> {
    match command {
        TokenCommand::Get(key) => {
            let token = match (key.code, key.access, key.refresh) {
                (Some(code), _, _) => tokens.get_by_code(&code).await?,
                (_, Some(access), _) => tokens.get_by_access(&access).await?,
                (_, _, Some(refresh)) => tokens.get_by_refresh(&refresh).await?,
                (None, None, None) => anyhow::bail!(MISSING_KEY),
            };
            println!("{}", serde_json::to_string_pretty(&token)?);
        }
        TokenCommand::Remove(key) => {
            match (key.code, key.access, key.refresh) {
                (Some(code), _, _) => tokens.remove_by_code(&code).await?,
                (_, Some(access), _) => tokens.remove_by_access(&access).await?,
                (_, _, Some(refresh)) => tokens.remove_by_refresh(&refresh).await?,
                (None, None, None) => anyhow::bail!(MISSING_KEY),
            }
            tracing::info!("Token entry removed");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        database = %cli.database,
        "Starting oauth2-mongo"
    );

    let config = Config::new(cli.mongo_url, cli.database);
    let connection = MongoConnection::connect(&config)
        .await
        .context("Failed to connect to MongoDB")?;

    let result = run(cli.command, &connection).await;
    connection.close().await;
    result
}
