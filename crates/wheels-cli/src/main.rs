//! Wheels CLI - payments, uploads and notifications from the terminal
//!
//! Thin client over the Wheels API for operators and local testing.

mod api;
mod config;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::Password;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use api::{AlfalahPaymentRequest, NotificationRequest, PaymentIntentRequest, WheelsClient};
use config::Config;
use wheels_realtime::{ConnectionState, RealtimeClient, RealtimeEvent};

#[derive(Parser)]
#[command(name = "wheels")]
#[command(about = "Wheels CLI - payments, uploads and notifications", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Login and store API key
    Login {
        /// API key (will prompt if not provided)
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Show or update configuration
    Config {
        /// API base URL
        #[arg(long)]
        base_url: Option<String>,
        /// Realtime WebSocket URL
        #[arg(long)]
        ws_url: Option<String>,
        /// User to act as on user-scoped calls
        #[arg(long)]
        user_id: Option<String>,
    },

    /// List featured listing plans
    Plans,

    /// Payment operations
    Pay {
        #[command(subcommand)]
        action: PayAction,
    },

    /// Signed upload credentials
    Upload {
        #[command(subcommand)]
        action: UploadAction,
    },

    /// Push notifications
    Notify {
        #[command(subcommand)]
        action: NotifyAction,
    },

    /// Print realtime events until Ctrl-C
    Listen {
        /// WebSocket URL (defaults to the configured one)
        #[arg(long)]
        url: Option<String>,
    },
}

#[derive(Subcommand)]
enum PayAction {
    /// Start a Bank Alfalah hosted checkout
    Alfalah {
        /// Amount in rupees
        #[arg(short, long)]
        amount: f64,
        /// Transaction reference (generated if omitted)
        #[arg(long)]
        order_id: Option<String>,
        /// Redirect target after payment
        #[arg(long)]
        return_url: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Check a Bank Alfalah order
    Verify {
        order_id: String,
    },
    /// Create a Stripe PaymentIntent
    Stripe {
        /// Amount in major units
        #[arg(short, long, conflicts_with = "plan", required_unless_present = "plan")]
        amount: Option<f64>,
        /// Featured plan id (basic, premium, platinum)
        #[arg(short, long)]
        plan: Option<String>,
        #[arg(long)]
        order_id: Option<String>,
        #[arg(long)]
        listing_id: Option<String>,
    },
    /// Send a locally signed Stripe event to the webhook
    SimulateWebhook {
        /// Endpoint secret (whsec_...)
        #[arg(long, env = "STRIPE_WEBHOOK_SECRET")]
        secret: String,
        /// PaymentIntent id
        #[arg(long, default_value = "pi_simulated")]
        intent: String,
        /// Amount in minor units
        #[arg(long, default_value_t = 100_000)]
        amount: i64,
        #[arg(long, default_value = "pkr")]
        currency: String,
        /// Send payment_intent.payment_failed instead of succeeded
        #[arg(long)]
        failed: bool,
    },
}

#[derive(Subcommand)]
enum UploadAction {
    /// Cloudinary upload signature
    Signature,
    /// Signed Cloud Storage PUT URL
    Url {
        /// Object path in the bucket
        #[arg(long)]
        path: String,
        #[arg(long)]
        content_type: String,
    },
}

#[derive(Subcommand)]
enum NotifyAction {
    /// Send a push notification
    Send {
        /// Device token (repeat for several devices)
        #[arg(long = "token", conflicts_with = "user", required_unless_present = "user")]
        tokens: Vec<String>,
        /// User whose registered devices all receive it
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Login { key } => cmd_login(key).await,
        Commands::Config { base_url, ws_url, user_id } => cmd_config(base_url, ws_url, user_id),
        Commands::Plans => cmd_plans().await,
        Commands::Pay { action } => cmd_pay(action).await,
        Commands::Upload { action } => cmd_upload(action).await,
        Commands::Notify { action } => cmd_notify(action).await,
        Commands::Listen { url } => cmd_listen(url).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn client(config: &Config) -> WheelsClient {
    WheelsClient::new(&config.base_url, config.api_key.as_deref())
        .with_user(config.user_id.as_deref())
}

// ============================================
// Command Implementations
// ============================================

async fn cmd_login(key: Option<String>) -> Result<()> {
    let mut config = Config::load()?;

    let api_key = match key {
        Some(k) => k,
        None => Password::new()
            .with_prompt("API Key")
            .interact()
            .context("Failed to read API key")?,
    };

    // Test connection
    let client = WheelsClient::new(&config.base_url, Some(&api_key));
    print!("Testing connection... ");

    match client.health().await {
        Ok(true) => println!("{}", "OK".green()),
        _ => {
            println!("{}", "Failed".red());
            bail!("Could not reach Wheels API at {}", config.base_url);
        }
    }

    config.set_api_key(api_key);
    config.save()?;

    println!("{} API key saved to {:?}", "✓".green(), Config::config_path()?);

    if config.user_id.is_none() {
        println!("\n{}", "Tip: set a user for upload commands:".yellow());
        println!("  wheels config --user-id <USER_ID>");
    }

    Ok(())
}

fn cmd_config(
    base_url: Option<String>,
    ws_url: Option<String>,
    user_id: Option<String>,
) -> Result<()> {
    let mut config = Config::load()?;

    let changed = base_url.is_some() || ws_url.is_some() || user_id.is_some();
    if let Some(url) = base_url {
        config.base_url = url;
    }
    if let Some(url) = ws_url {
        config.ws_url = Some(url);
    }
    if let Some(user) = user_id {
        config.user_id = Some(user);
    }
    if changed {
        config.save()?;
        println!("{} Configuration saved", "✓".green());
    }

    println!("{}", "Configuration:".bold());
    println!("  Path: {:?}", Config::config_path()?);
    println!("  Base URL: {}", config.base_url);
    println!("  Realtime URL: {}", config.realtime_url());
    println!(
        "  API Key: {}",
        if config.api_key.is_some() { "Set".green() } else { "Not set".red() }
    );
    println!(
        "  User: {}",
        config.user_id.as_deref().unwrap_or("None").cyan()
    );

    Ok(())
}

async fn cmd_plans() -> Result<()> {
    let config = Config::load()?;
    let plans = client(&config).list_plans().await?;

    println!("{}", "Featured plans:".bold());
    for plan in plans {
        println!(
            "  {} {} {} - {} days",
            plan.id.cyan(),
            plan.name.bold(),
            format!("Rs. {}", plan.price).green(),
            plan.duration_days
        );
        println!("    {}", plan.description.dimmed());
    }

    Ok(())
}

async fn cmd_pay(action: PayAction) -> Result<()> {
    let config = Config::load()?;
    let client = client(&config);

    match action {
        PayAction::Alfalah { amount, order_id, return_url, email, name, description } => {
            let order_id = order_id
                .unwrap_or_else(|| format!("ORD-{}", uuid::Uuid::new_v4().simple()));

            let response = client
                .alfalah_initialize(&AlfalahPaymentRequest {
                    amount,
                    order_id: order_id.clone(),
                    return_url,
                    customer_email: email,
                    customer_name: name,
                    description,
                })
                .await?;

            println!("{} Payment initialized for {}", "✓".green(), order_id.cyan());
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        PayAction::Verify { order_id } => {
            let verification = client.alfalah_verify(&order_id).await?;

            let status = match verification.status.as_str() {
                "completed" => verification.status.green(),
                "failed" => verification.status.red(),
                _ => verification.status.yellow(),
            };
            let marker = if verification.success { "✓".green() } else { "✗".red() };

            println!("{} {} [{}]", marker, order_id.cyan(), status);
            if let Some(message) = verification.message {
                println!("  {}", message.dimmed());
            }
            println!("{}", serde_json::to_string_pretty(&verification.transaction_details)?);
        }

        PayAction::Stripe { amount, plan, order_id, listing_id } => {
            let intent = client
                .create_payment_intent(&PaymentIntentRequest {
                    amount,
                    plan_id: plan,
                    order_id,
                    listing_id,
                })
                .await?;

            println!("{} PaymentIntent created", "✓".green());
            println!("  Client secret: {}", intent.client_secret);
        }

        PayAction::SimulateWebhook { secret, intent, amount, currency, failed } => {
            let event_type = if failed {
                "payment_intent.payment_failed"
            } else {
                "payment_intent.succeeded"
            };
            let now = chrono::Utc::now().timestamp();
            let event = simulated_payment_event(
                event_type,
                &intent,
                amount,
                &currency,
                config.user_id.as_deref(),
                now,
            );
            let payload = serde_json::to_string(&event)?;
            let signature = wheels::domain::services::stripe_signature::sign(
                payload.as_bytes(),
                &secret,
                now,
            );

            client.send_webhook(payload, &signature).await?;
            println!("{} {} accepted", "✓".green(), event_type.cyan());
        }
    }

    Ok(())
}

/// A PaymentIntent event shaped like the ones Stripe delivers
fn simulated_payment_event(
    event_type: &str,
    intent: &str,
    amount: i64,
    currency: &str,
    user_id: Option<&str>,
    created: i64,
) -> serde_json::Value {
    // Notifications only reach the user recorded on the intent
    let metadata = match user_id {
        Some(user) => serde_json::json!({ "user_id": user }),
        None => serde_json::json!({}),
    };
    serde_json::json!({
        "id": format!("evt_{}", uuid::Uuid::new_v4().simple()),
        "type": event_type,
        "created": created,
        "data": {
            "object": {
                "object": "payment_intent",
                "id": intent,
                "amount": amount,
                "currency": currency,
                "metadata": metadata
            }
        }
    })
}

async fn cmd_upload(action: UploadAction) -> Result<()> {
    let config = Config::load()?;
    if config.user_id.is_none() {
        bail!("No user configured. Run 'wheels config --user-id <USER_ID>' first.");
    }
    let client = client(&config);

    match action {
        UploadAction::Signature => {
            let signature = client.upload_signature().await?;
            println!("{}", "Upload signature:".bold());
            println!("  signature: {}", signature.signature);
            println!("  timestamp: {}", signature.timestamp);
            println!("  folder:    {}", signature.folder);
            println!("  context:   {}", signature.context);
        }

        UploadAction::Url { path, content_type } => {
            let signed = client.upload_url(&path, &content_type).await?;
            println!("{} Upload URL (expires {})", "✓".green(), signed.expires_at.dimmed());
            println!("{}", signed.upload_url);
            println!("{}", "Required headers:".bold());
            for (name, value) in &signed.headers {
                println!("  {}: {}", name.cyan(), value);
            }
        }
    }

    Ok(())
}

async fn cmd_notify(action: NotifyAction) -> Result<()> {
    let config = Config::load()?;
    let client = client(&config);

    match action {
        NotifyAction::Send { tokens, user, title, body } => {
            let sent = client
                .send_notification(&NotificationRequest {
                    tokens,
                    user_id: user,
                    title,
                    body,
                })
                .await?;

            let marker = if sent.success { "✓".green() } else { "✗".red() };
            println!(
                "{} Delivered to {} device(s), {} failed",
                marker, sent.success_count, sent.failure_count
            );
            for id in &sent.message_ids {
                println!("  {}", id.dimmed());
            }
            for token in &sent.invalid_tokens {
                println!("  {} {}", "unregistered:".yellow(), token);
            }
        }
    }

    Ok(())
}

async fn cmd_listen(url: Option<String>) -> Result<()> {
    let config = Config::load()?;
    let url = url.unwrap_or_else(|| config.realtime_url());

    let realtime = RealtimeClient::new(url.clone());
    let mut events = realtime.subscribe();
    let mut states = realtime.watch_state();
    realtime.connect()?;

    // The query carries the API key; keep it off the terminal
    let endpoint = url.split('?').next().unwrap_or(&url).to_string();
    println!("{} Listening on {} (Ctrl-C to stop)", "→".cyan(), endpoint);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    eprintln!("{} skipped {} events", "!".yellow(), skipped);
                }
                Err(RecvError::Closed) => break,
            },
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                if state == ConnectionState::GaveUp {
                    bail!("Gave up reconnecting to {}", endpoint);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                realtime.disconnect();
                println!("\n{} Disconnected", "✓".green());
                break;
            }
        }
    }

    Ok(())
}

fn print_event(event: &RealtimeEvent) {
    let payload = event.payload();
    match event {
        RealtimeEvent::ChatMessage(_) => println!(
            "{} {} → {}: {}",
            "[chat]".cyan(),
            payload["senderId"].as_str().unwrap_or("?"),
            payload["recipientId"].as_str().unwrap_or("?"),
            payload["text"].as_str().unwrap_or_default()
        ),
        RealtimeEvent::Notification(_) => println!(
            "{} {}: {}",
            format!("[{}]", payload["kind"].as_str().unwrap_or("notification")).green(),
            payload["title"].as_str().unwrap_or_default().bold(),
            payload["body"].as_str().unwrap_or_default()
        ),
        RealtimeEvent::Other(_) => println!("{} {}", "[event]".dimmed(), payload),
    }
}
