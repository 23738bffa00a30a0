//! SpendLens - invoice spend analytics
//!
//! A CLI dashboard over an invoice collection: spend statistics, monthly
//! trends, vendor and category breakdowns, an unpaid cash-outflow forecast,
//! and natural-language questions answered through a local Ollama model.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (not signed in, bad data file, config error, etc.)

mod analysis;
mod assistant;
mod cli;
mod config;
mod ledger;
mod models;
mod query;
mod report;
mod session;

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use cli::{AccountCommand, Args, Command, OutputFormat};
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use ledger::{InvoiceStore, MockOptions};
use session::{AppState, JsonFileStore, ProfileUpdate, Registration, SessionStore};
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if let Command::InitConfig = args.command {
        return handle_init_config();
    }

    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    info!("SpendLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args, config).await {
        error!("Command failed: {:#}", e);
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle init-config: generate a default .spendlens.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  .spendlens.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .spendlens.toml")?;

    println!("✅ Created .spendlens.toml with default settings.");
    println!("   Edit it to choose the data file, model, and page size.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Dispatch one command.
async fn run(args: Args, config: Config) -> Result<()> {
    let session_store = JsonFileStore::new(config.session.state_dir.clone());
    let mut state = session_store.load()?;
    debug!("Session state in {}", session_store.dir().display());

    if args.command.requires_sign_in() && !state.is_signed_in() {
        bail!(
            "You are not signed in. Run `spendlens account login` or `spendlens account guest` first."
        );
    }

    match args.command {
        Command::Account(ref command) => {
            handle_account(command, &mut state, &session_store)?;
        }
        Command::GenerateData { count, seed, force } => {
            handle_generate_data(&config, count, seed, force)?;
        }
        Command::Dashboard => {
            let store = load_or_generate(&config)?;
            let output = render_dashboard(&args, &store, &state)?;
            emit(&args, &output)?;
        }
        Command::Invoices { page, .. } => {
            let store = load_or_generate(&config)?;
            let output = render_invoice_page(
                &args,
                &store,
                args.command.sort_config(),
                page,
                config.dashboard.page_size,
            )?;
            emit(&args, &output)?;
        }
        Command::SetStatus {
            ref invoice,
            status,
        } => {
            let mut store = load_or_generate(&config)?;
            let previous = store.update_status(invoice, status)?;
            store.save()?;

            let stats = analysis::compute_stats(store.invoices());
            let outstanding = analysis::outstanding_total(store.invoices());
            if let Some(updated) = store.find(invoice) {
                println!(
                    "✅ {} ({}): {} -> {}",
                    updated.invoice_number, updated.vendor.name, previous, status
                );
            }
            println!(
                "   Total spend: {} | Outstanding: {}",
                report::format::format_currency(stats.total_spend),
                report::format::format_currency(outstanding)
            );
        }
        Command::Ask { ref question } => {
            let store = load_or_generate(&config)?;
            handle_ask(&args, &config, &store, question).await?;
        }
        Command::InitConfig => unreachable!("handled before logging is initialised"),
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .spendlens.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            // Logging is not initialised yet
            eprintln!("⚠️  Ignoring .spendlens.toml: {:#}", e);
            Ok(Config::default())
        }
    }
}

/// Load the invoice file, writing a mock dataset first if it is missing.
fn load_or_generate(config: &Config) -> Result<InvoiceStore> {
    let path = &config.data.invoices_path;

    if path.exists() {
        return InvoiceStore::load(path);
    }

    info!("No invoice file at {}, generating mock data", path.display());
    let invoices = ledger::generate_mock_invoices(&MockOptions {
        count: config.data.mock_count,
        seed: config.data.mock_seed,
        ..Default::default()
    });

    let store = InvoiceStore::new(path.clone(), invoices);
    store.save()?;
    Ok(store)
}

fn handle_generate_data(
    config: &Config,
    count: Option<usize>,
    seed: Option<u64>,
    force: bool,
) -> Result<()> {
    let path = &config.data.invoices_path;

    if path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        );
    }

    let invoices = ledger::generate_mock_invoices(&MockOptions {
        count: count.unwrap_or(config.data.mock_count),
        seed: seed.or(config.data.mock_seed),
        ..Default::default()
    });

    let store = InvoiceStore::new(path.clone(), invoices);
    store.save()?;

    println!(
        "✅ Wrote {} mock invoices to {}",
        store.invoices().len(),
        store.path().display()
    );
    Ok(())
}

fn render_dashboard(args: &Args, store: &InvoiceStore, state: &AppState) -> Result<String> {
    let invoices = store.invoices();
    let dashboard = analysis::compute_dashboard(invoices);

    let recent = ledger::paginate(invoices, ledger::SortConfig::default(), 1, 5);
    let prepared_for = state
        .current_user
        .as_ref()
        .map(|u| u.name.clone())
        .unwrap_or_default();

    let report = report::DashboardReport {
        metadata: report::ReportMetadata {
            generated_at: Utc::now(),
            source: store.path().display().to_string(),
            prepared_for,
        },
        outstanding_total: analysis::outstanding_total(invoices),
        recent_invoices: recent.rows.into_iter().cloned().collect(),
        dashboard,
    };

    match args.format {
        OutputFormat::Json => report::generate_json_report(&report),
        OutputFormat::Markdown => Ok(report::generate_markdown_report(&report)),
    }
}

fn render_invoice_page(
    args: &Args,
    store: &InvoiceStore,
    sort: ledger::SortConfig,
    page: usize,
    page_size: usize,
) -> Result<String> {
    let page = ledger::paginate(store.invoices(), sort, page, page_size);

    match args.format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "page": page.page,
            "total_pages": page.total_pages,
            "total_rows": page.total_rows,
            "invoices": page.rows,
        }))?),
        OutputFormat::Markdown => Ok(report::generate_invoice_page(&page)),
    }
}

async fn handle_ask(
    args: &Args,
    config: &Config,
    store: &InvoiceStore,
    question: &[String],
) -> Result<()> {
    let engine = query::QueryEngine::from_invoices(store.invoices(), config.model.max_rows)?;

    let backend = assistant::OllamaBackend::new(assistant::OllamaConfig {
        ollama_url: config.model.ollama_url.clone(),
        model_name: config.model.name.clone(),
        temperature: config.model.temperature,
        timeout_seconds: config.model.timeout_seconds,
    })?;
    let assistant = assistant::Assistant::new(backend, Local::now().date_naive());
    let mut chat = assistant::ChatSession::new();

    if !question.is_empty() {
        let question = question.join(" ");
        return ask_once(args, &assistant, &engine, &mut chat, &question).await;
    }

    if !args.quiet {
        println!(
            "💬 Ask about your invoices ({}). Type `exit` to quit.",
            assistant.model_name()
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }
        ask_once(args, &assistant, &engine, &mut chat, line).await?;
    }

    debug!("Chat ended after {} messages", chat.messages().len());

    Ok(())
}

async fn ask_once<B: assistant::ChatBackend>(
    args: &Args,
    assistant: &assistant::Assistant<B>,
    engine: &query::QueryEngine,
    chat: &mut assistant::ChatSession,
    question: &str,
) -> Result<()> {
    let spinner = if args.quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.set_message("Thinking...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let reply = chat.ask(assistant, engine, question).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(reply)?,
        OutputFormat::Markdown => report::generate_chat_reply(reply),
    };
    emit(args, &output)
}

fn handle_account(
    command: &AccountCommand,
    state: &mut AppState,
    store: &impl SessionStore,
) -> Result<()> {
    match command {
        AccountCommand::Register {
            name,
            email,
            password,
            mobile,
        } => {
            let user = state.register(
                Registration {
                    name: name.clone(),
                    email: email.clone(),
                    password: password.clone(),
                    mobile: mobile.clone(),
                },
                session::new_user_id(),
            )?;
            println!("✅ Account created successfully! Signed in as {}.", user.name);
        }
        AccountCommand::Login { email, password } => {
            let user = state.login(email, password)?;
            println!("✅ Logged in successfully! Welcome back, {}.", user.name);
        }
        AccountCommand::Guest => {
            let user = state.guest_login();
            println!("✅ Continuing as {}.", user.name);
        }
        AccountCommand::Logout => match state.logout() {
            Some(user) => println!("👋 Signed out {}.", user.email),
            None => println!("Nobody is signed in."),
        },
        AccountCommand::Whoami => {
            let user = state.require_user()?;
            println!("👤 {}", user.name);
            println!("   Email:  {}", user.email);
            if !user.mobile.is_empty() {
                println!("   Mobile: {}", user.mobile);
            }
            println!("   Avatar: {}", user.profile_pic_url);
            return Ok(());
        }
        AccountCommand::UpdateProfile { name, mobile } => {
            let user = state.update_profile(ProfileUpdate {
                name: name.clone(),
                mobile: mobile.clone(),
            })?;
            println!("✅ Changes saved for {}.", user.name);
        }
        AccountCommand::SetAvatar { url } => {
            state.update_profile_picture(url)?;
            println!("✅ Profile picture updated.");
        }
    }

    store.save(state)
}

/// Print output, or write it to `--output` when given.
fn emit(args: &Args, content: &str) -> Result<()> {
    match args.output {
        Some(ref path) => {
            report::write_output(content, path)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            if !args.quiet {
                println!("✅ Saved to {}", path.display());
            }
        }
        None => println!("{}", content),
    }
    Ok(())
}
