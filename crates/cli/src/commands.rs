//! CLI commands

use anyhow::{Context as _, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Subcommand;
use pledge_http::client::{ApiClient, FileTokenStore, TokenStore};
use pledge_http::services::ClaimsDecoder;
use pledge_http::types::{
    Campaign, CreateCampaignRequest, DonationRequest, ProfileUpdate, RegisterRequest,
    TopUpRequest, UpdateCampaignRequest,
};
use pledge_http::{GuardDecision, PledgeConfig, RouteGuard};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config;

/// Everything a command needs besides its own arguments
pub struct Context {
    config: PledgeConfig,
    data_dir: PathBuf,
    session_path: PathBuf,
}

impl Context {
    pub fn load(
        config_path: Option<PathBuf>,
        explicit_data_dir: Option<PathBuf>,
        data_dir: PathBuf,
    ) -> Result<Self> {
        let config = config::load_config(config_path.as_deref())?;

        let session_path = match (&config.client.session_file, explicit_data_dir) {
            (Some(path), _) => path.clone(),
            (None, Some(dir)) => dir.join("session.json"),
            (None, None) => FileTokenStore::default_path(),
        };
        debug!(session = %session_path.display(), "Resolved session file");

        Ok(Self {
            config,
            data_dir,
            session_path,
        })
    }

    fn session(&self) -> FileTokenStore {
        FileTokenStore::open(&self.session_path)
    }

    fn client(&self) -> Result<ApiClient> {
        let client = ApiClient::builder()
            .settings(&self.config.client)
            .token_store(Arc::new(self.session()))
            .navigator(Arc::new(|location: &str| {
                eprintln!("Session expired, run `pledge login` to continue (redirected to {location})");
            }))
            .build()?;
        Ok(client)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session
    Login {
        email: String,

        #[arg(long, env = "PLEDGE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        phone: String,

        #[arg(long, env = "PLEDGE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Exchange the refresh credential for a new access credential
    Refresh,

    /// Show the claims of the stored credential
    Whoami,

    /// Browse and manage campaigns
    Campaigns {
        #[command(subcommand)]
        command: CampaignCommands,
    },

    /// Donate to a campaign from the wallet
    Donate {
        campaign_id: i64,

        amount: f64,

        /// Message shown with the donation
        #[arg(long, default_value = "")]
        message: String,
    },

    /// Wallet balance, top-ups and history
    Wallet {
        #[command(subcommand)]
        command: WalletCommands,
    },

    /// Notifications
    Notifications {
        #[command(subcommand)]
        command: NotificationCommands,
    },

    /// User profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Evaluate the route guard locally
    Guard {
        #[command(subcommand)]
        command: GuardCommands,
    },

    /// Generate default configuration files
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum CampaignCommands {
    /// List all campaigns
    List,

    /// List campaigns you own
    Mine,

    /// Show one campaign
    Show { id: i64 },

    /// Create a campaign
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,

        #[arg(long)]
        target_amount: f64,

        /// Start date (YYYY-MM-DD or RFC 3339, defaults to now)
        #[arg(long)]
        start_date: Option<String>,

        /// End date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        end_date: String,

        #[arg(long)]
        image_url: Option<String>,
    },

    /// Update fields of a campaign
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        target_amount: Option<f64>,

        /// End date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        end_date: Option<String>,

        #[arg(long)]
        image_url: Option<String>,
    },

    /// Delete a campaign
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Show the wallet balance
    Balance,

    /// Top up the wallet
    TopUp {
        amount: f64,

        #[arg(long)]
        payment_method: String,

        #[arg(long)]
        phone_number: String,
    },

    /// Show transaction history
    History,
}

#[derive(Subcommand)]
pub enum NotificationCommands {
    /// List notifications
    List,

    /// Mark a notification as read
    Read { id: i64 },

    /// Delete a notification
    Delete { id: i64 },

    /// Subscribe to campaign notifications
    Subscribe,
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show your profile, or another user's
    Show { id: Option<i64> },

    /// Update your profile
    Update {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        bio: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum GuardCommands {
    /// Decide a navigation to PATH
    Check {
        path: String,

        /// Credential to evaluate instead of the stored session
        #[arg(long)]
        token: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration
    Init {
        /// Output file path (defaults to pledge.toml in the data directory)
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Commands {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        match self {
            Self::Login { email, password } => {
                let client = ctx.client()?;
                client.login(&email, &password).await?;
                println!("Logged in as {email}");
                Ok(())
            }
            Self::Register {
                name,
                email,
                phone,
                password,
            } => {
                let client = ctx.client()?;
                let message = client
                    .register(&RegisterRequest {
                        name,
                        email,
                        password,
                        phone,
                    })
                    .await?;
                println!("{message}");
                Ok(())
            }
            Self::Logout => {
                ctx.client()?.logout();
                println!("Logged out");
                Ok(())
            }
            Self::Refresh => {
                ctx.client()?.refresh().await?;
                println!("Session refreshed");
                Ok(())
            }
            Self::Whoami => whoami(ctx),
            Self::Campaigns { command } => command.execute(&ctx.client()?).await,
            Self::Donate {
                campaign_id,
                amount,
                message,
            } => {
                let client = ctx.client()?;
                let receipt = client
                    .donate(campaign_id, &DonationRequest { amount, message })
                    .await?;
                info!(campaign_id, amount, "Donation submitted");
                print_json(&receipt)
            }
            Self::Wallet { command } => command.execute(&ctx.client()?).await,
            Self::Notifications { command } => command.execute(&ctx.client()?).await,
            Self::Profile { command } => command.execute(&ctx.client()?).await,
            Self::Guard { command } => command.execute(ctx),
            Self::Config { command } => command.execute(ctx),
        }
    }
}

fn whoami(ctx: &Context) -> Result<()> {
    let Some(token) = ctx.session().get() else {
        println!("Not logged in");
        return Ok(());
    };

    let decoder = ClaimsDecoder::from_secret(ctx.config.guard.jwt_secret.as_deref());
    let claims = decoder
        .decode(&token)
        .context("Stored credential is no longer valid, log in again")?;

    println!("Subject: {}", claims.sub);
    if let Some(name) = &claims.name {
        println!("Name:    {name}");
    }
    if let Some(email) = &claims.email {
        println!("Email:   {email}");
    }
    println!("Role:    {}", claims.role.as_deref().unwrap_or("-"));
    if let Some(expires) = DateTime::<Utc>::from_timestamp(claims.exp, 0) {
        println!("Expires: {}", expires.to_rfc3339());
    }
    if !decoder.verifies_signature() {
        println!("(signature not verified)");
    }
    Ok(())
}

impl CampaignCommands {
    pub async fn execute(self, client: &ApiClient) -> Result<()> {
        match self {
            Self::List => {
                print_campaigns(&client.list_campaigns().await?);
                Ok(())
            }
            Self::Mine => {
                print_campaigns(&client.list_my_campaigns().await?);
                Ok(())
            }
            Self::Show { id } => print_json(&client.get_campaign(id).await?),
            Self::Create {
                name,
                description,
                target_amount,
                start_date,
                end_date,
                image_url,
            } => {
                let start_date = match start_date {
                    Some(date) => normalize_date(&date)?,
                    None => Utc::now().to_rfc3339(),
                };
                let request = CreateCampaignRequest {
                    name,
                    description,
                    target_amount,
                    start_date,
                    end_date: normalize_date(&end_date)?,
                    image_url,
                };
                print_json(&client.create_campaign(&request).await?)
            }
            Self::Update {
                id,
                name,
                description,
                target_amount,
                end_date,
                image_url,
            } => {
                let request = UpdateCampaignRequest {
                    name,
                    description,
                    target_amount,
                    end_date: end_date.as_deref().map(normalize_date).transpose()?,
                    image_url,
                };
                print_json(&client.update_campaign(id, &request).await?)
            }
            Self::Delete { id } => {
                client.delete_campaign(id).await?;
                println!("Deleted campaign {id}");
                Ok(())
            }
        }
    }
}

impl WalletCommands {
    pub async fn execute(self, client: &ApiClient) -> Result<()> {
        match self {
            Self::Balance => print_json(&client.wallet().await?),
            Self::TopUp {
                amount,
                payment_method,
                phone_number,
            } => {
                let request = TopUpRequest {
                    amount,
                    payment_method,
                    phone_number,
                };
                print_json(&client.top_up(&request).await?)
            }
            Self::History => {
                let transactions = client.transactions().await?;
                if transactions.is_empty() {
                    println!("No transactions");
                }
                for tx in transactions {
                    println!(
                        "{}  {:<9} {:>12.2}  {:<10} {}",
                        display_date(&tx.timestamp),
                        format!("{:?}", tx.kind).to_lowercase(),
                        tx.amount,
                        tx.status,
                        tx.campaign_title.as_deref().unwrap_or_default(),
                    );
                }
                Ok(())
            }
        }
    }
}

impl NotificationCommands {
    pub async fn execute(self, client: &ApiClient) -> Result<()> {
        match self {
            Self::List => {
                let notifications = client.notifications().await?;
                if notifications.is_empty() {
                    println!("No notifications");
                }
                for n in notifications {
                    let marker = if n.marked_as_read { ' ' } else { '*' };
                    println!(
                        "{marker} {:>5}  {}  {}: {}",
                        n.id,
                        display_date(&n.created_at),
                        n.title,
                        n.content
                    );
                }
                Ok(())
            }
            Self::Read { id } => {
                client.mark_notification_read(id).await?;
                println!("Marked notification {id} as read");
                Ok(())
            }
            Self::Delete { id } => {
                client.delete_notification(id).await?;
                println!("Deleted notification {id}");
                Ok(())
            }
            Self::Subscribe => {
                client.subscribe_notifications().await?;
                println!("Subscribed to notifications");
                Ok(())
            }
        }
    }
}

impl ProfileCommands {
    pub async fn execute(self, client: &ApiClient) -> Result<()> {
        match self {
            Self::Show { id: None } => print_json(&client.my_profile().await?),
            Self::Show { id: Some(id) } => print_json(&client.profile(id).await?),
            Self::Update {
                name,
                email,
                phone,
                bio,
            } => {
                let update = ProfileUpdate {
                    name,
                    email,
                    phone,
                    bio,
                };
                print_json(&client.update_profile(&update).await?)
            }
        }
    }
}

impl GuardCommands {
    pub fn execute(self, ctx: &Context) -> Result<()> {
        match self {
            Self::Check { path, token } => {
                let guard = RouteGuard::new(ctx.config.guard.clone());
                if !guard.applies_to(&path) {
                    println!("{path}: not guarded");
                    return Ok(());
                }

                let credential = token.or_else(|| ctx.session().get());
                let class = guard.config().routes.classify(&path);
                match guard.decide(&path, credential.as_deref()) {
                    GuardDecision::Allow => println!("{path} ({class:?}): allow"),
                    GuardDecision::Redirect(location) => {
                        println!("{path} ({class:?}): redirect to {location}");
                    }
                }
                Ok(())
            }
        }
    }
}

impl ConfigCommands {
    pub fn execute(self, ctx: &Context) -> Result<()> {
        match self {
            Self::Init { output, force } => {
                let config_path = output.unwrap_or_else(|| ctx.data_dir.join("pledge.toml"));
                config::generate_default_config(&config_path, force)?;
                println!("Generated configuration at: {}", config_path.display());
                Ok(())
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_campaigns(campaigns: &[Campaign]) {
    if campaigns.is_empty() {
        println!("No campaigns");
    }
    for c in campaigns {
        println!(
            "{:>5}  {:<32} {:>12.2} / {:<12.2} ends {}  {:?}",
            c.id,
            c.name,
            c.collected_amount,
            c.target_amount,
            display_date(&c.end_date),
            c.status
        );
    }
}

/// Accept `YYYY-MM-DD` or RFC 3339 and produce RFC 3339
fn normalize_date(input: &str) -> Result<String> {
    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Ok(date.to_rfc3339());
    }
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{input}', expected YYYY-MM-DD or RFC 3339"))?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc().to_rfc3339())
}

/// Calendar date of a backend timestamp, or the raw value if it doesn't parse
fn display_date(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map_or_else(|_| timestamp.to_string(), |date| date.format("%Y-%m-%d").to_string())
}
