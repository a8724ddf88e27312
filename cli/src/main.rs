use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use parakh::net::types::{AdminRequest, DashboardStats, RequestStatus};
use parakh::state::Notifier;
use parakh::state::admin::{AdminConsole, AdminError, KNOWN_AGENTS};
use parakh::state::chat::{ChatSession, SubmitOutcome};
use parakh::state::courtroom::{AdvanceOutcome, Courtroom, CourtroomError};
use parakh::{ApiClient, ApiError, Backend, ClientConfig};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] parakh::config::ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Admin(#[from] AdminError),
    #[error("read input failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unknown agent `{0}`")]
    UnknownAgent(String),
    #[error("chat request failed")]
    ChatFailed,
}

#[derive(Parser, Debug)]
#[command(name = "parakh-cli", about = "Policy guardian chat, courtroom and admin console")]
struct Cli {
    #[arg(long, env = "PARAKH_API_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the backend is up.
    Ping,
    /// Talk to the assistant.
    Chat(ChatArgs),
    /// Audit a policy document.
    Audit(AuditArgs),
    /// Run a courtroom debate one turn at a time.
    Court(CourtArgs),
    /// Admin dashboard.
    Admin(AdminCommand),
    /// Medical report helpers.
    Medical(MedicalCommand),
}

#[derive(Args, Debug)]
struct ChatArgs {
    #[arg(long, env = "PARAKH_CHAT_CONTEXT")]
    context: Option<String>,

    /// Send one message and exit instead of reading stdin.
    #[arg(long)]
    message: Option<String>,
}

#[derive(Args, Debug)]
struct AuditArgs {
    #[arg(long, conflicts_with = "text", required_unless_present = "text")]
    file: Option<String>,

    #[arg(long)]
    text: Option<String>,

    #[arg(long, env = "PARAKH_DOC_TYPE")]
    doc_type: Option<String>,

    /// Ask for the long-form markdown report instead of the structured audit.
    #[arg(long, default_value_t = false)]
    full_report: bool,
}

#[derive(Args, Debug)]
struct CourtArgs {
    #[arg(long)]
    context: String,
}

#[derive(Args, Debug)]
struct AdminCommand {
    /// Unlocks the console view. The backend does not check it.
    #[arg(long)]
    passphrase: String,

    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    Stats,
    Requests,
    Approve { index: usize },
    Deny { index: usize },
    ApproveId { id: String },
    DenyId { id: String },
    Trigger { agent: String },
}

#[derive(Args, Debug)]
struct MedicalCommand {
    #[command(subcommand)]
    command: MedicalSubcommand,
}

#[derive(Subcommand, Debug)]
enum MedicalSubcommand {
    Analyze {
        #[arg(long)]
        query: String,
        #[arg(long, default_value = "")]
        policy_context: String,
    },
    Explain {
        term: String,
    },
}

/// Alerts go straight to stderr so they interleave with the transcript.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn alert(&self, message: &str) {
        eprintln!("[!] {message}");
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config = ClientConfig { base_url, ..config }.validated()?;
    }
    let client = Arc::new(ApiClient::from_config(&config)?);
    tracing::debug!(base_url = client.base_url(), "backend client configured");

    match cli.command {
        Command::Ping => run_ping(client.as_ref()).await,
        Command::Chat(args) => run_chat(client, &config, args).await,
        Command::Audit(args) => run_audit(client.as_ref(), &config, args).await,
        Command::Court(args) => run_court(client, args).await,
        Command::Admin(admin) => run_admin(client, &config, admin).await,
        Command::Medical(medical) => run_medical(client.as_ref(), medical).await,
    }
}

async fn run_ping(client: &ApiClient) -> Result<(), CliError> {
    let health = client.health().await?;
    println!("{}", health.status);
    Ok(())
}

async fn run_chat(client: Arc<ApiClient>, config: &ClientConfig, args: ChatArgs) -> Result<(), CliError> {
    let context = args.context.unwrap_or_else(|| config.chat_context.clone());
    let mut chat = ChatSession::new(client).with_context(context);

    if let Some(message) = args.message {
        let outcome = chat.submit(&message).await;
        print_last_reply(&chat);
        if outcome == SubmitOutcome::Failed {
            return Err(CliError::ChatFailed);
        }
        return Ok(());
    }

    let mut lines = stdin_lines();
    eprintln!("chat ready; empty line is ignored, ctrl-d exits");
    while let Some(line) = lines.next_line().await? {
        chat.set_input(line);
        if chat.send_input().await != SubmitOutcome::Ignored {
            print_last_reply(&chat);
        }
    }
    Ok(())
}

fn print_last_reply(chat: &ChatSession) {
    if let Some(turn) = chat.history().last() {
        println!("assistant> {}", turn.content);
    }
}

async fn run_audit(client: &ApiClient, config: &ClientConfig, args: AuditArgs) -> Result<(), CliError> {
    let policy_text = match (args.file, args.text) {
        (Some(path), _) => tokio::fs::read_to_string(path).await?,
        (None, Some(text)) => text,
        (None, None) => String::new(),
    };
    let doc_type = args.doc_type.unwrap_or_else(|| config.doc_type.clone());

    if args.full_report {
        let report = client.request_full_report(&policy_text, &doc_type).await?;
        println!("{}", report.report_markdown);
        return Ok(());
    }

    let result = client.request_policy_audit(&policy_text, &doc_type).await?;
    print_json(&Value::Object(result.report))?;
    if let Some(review) = result.critic_review {
        println!("--- critic review ---");
        print_json(&Value::Object(review))?;
    }
    Ok(())
}

async fn run_court(client: Arc<ApiClient>, args: CourtArgs) -> Result<(), CliError> {
    let mut court = Courtroom::new(client, Arc::new(StderrNotifier));
    let mut lines = stdin_lines();

    let mut outcome = court.start(&args.context).await;
    loop {
        match outcome {
            Ok(AdvanceOutcome::Appended(turn)) => println!("{turn}"),
            Ok(AdvanceOutcome::Ignored) => {
                eprintln!("case context is empty");
                return Ok(());
            }
            Err(CourtroomError::MalformedTurn(reason)) => eprintln!("no turn this round: {reason}"),
            Err(CourtroomError::Transport(_)) => {}
        }

        eprintln!("[enter] next argument, [q] adjourn");
        match lines.next_line().await? {
            Some(line) if line.trim().eq_ignore_ascii_case("q") => break,
            Some(_) => outcome = court.advance().await,
            None => break,
        }
    }
    eprintln!("adjourned after {} turns", court.history().len());
    Ok(())
}

async fn run_admin(client: Arc<ApiClient>, config: &ClientConfig, admin: AdminCommand) -> Result<(), CliError> {
    let mut console = AdminConsole::new(client, Arc::new(StderrNotifier), config.admin_passphrase.clone());
    console.unlock(&admin.passphrase)?;
    if let Err(error) = console.refresh().await {
        eprintln!("refresh incomplete: {error}");
    }

    match admin.command {
        AdminSubcommand::Stats => {
            print_stats(console.stats(), console.pending_count());
        }
        AdminSubcommand::Requests => print_requests(console.requests()),
        AdminSubcommand::Approve { index } => {
            console.decide(index, RequestStatus::Approved).await?;
            print_requests(console.requests());
        }
        AdminSubcommand::Deny { index } => {
            console.decide(index, RequestStatus::Denied).await?;
            print_requests(console.requests());
        }
        AdminSubcommand::ApproveId { id } => {
            console.decide_by_id(&id, RequestStatus::Approved).await?;
            print_requests(console.requests());
        }
        AdminSubcommand::DenyId { id } => {
            console.decide_by_id(&id, RequestStatus::Denied).await?;
            print_requests(console.requests());
        }
        AdminSubcommand::Trigger { agent } => {
            let agent = agent.to_ascii_uppercase();
            if !KNOWN_AGENTS.contains(&agent.as_str()) {
                return Err(CliError::UnknownAgent(agent));
            }
            let ack = console.force_trigger(&agent).await?;
            if let Some(result) = ack.result {
                println!("{result}");
            }
        }
    }
    Ok(())
}

fn print_stats(stats: Option<&DashboardStats>, pending: usize) {
    let Some(stats) = stats else {
        println!("no stats");
        return;
    };
    if let Some(error) = &stats.error {
        println!("backend: {error}");
    }
    let total = stats.metrics.total_policies_analyzed.unwrap_or(0);
    let zone = stats.metrics.top_risk_zip.as_deref().unwrap_or("N/A");
    println!("total policies:  {total}");
    println!("risk zone:       {zone}");
    println!("pending actions: {pending}");
    for company in &stats.companies {
        println!("  {:<30} {:>4} flags", company.name, company.flags);
    }
}

fn print_requests(requests: &[AdminRequest]) {
    if requests.is_empty() {
        println!("No pending requests.");
        return;
    }
    for (index, request) in requests.iter().enumerate() {
        let id = request.id.as_deref().unwrap_or("-");
        println!(
            "[{index}] {:<8} {} {} ({id})\n    {}",
            request.status, request.timestamp, request.tool, request.message
        );
    }
}

async fn run_medical(client: &ApiClient, medical: MedicalCommand) -> Result<(), CliError> {
    match medical.command {
        MedicalSubcommand::Analyze { query, policy_context } => {
            let analysis = client.analyze_medical_report(&query, &policy_context).await?;
            print_json(&analysis.analysis)
        }
        MedicalSubcommand::Explain { term } => {
            let explanation = client.explain_medical_term(&term).await?;
            print_json(&explanation.explanation)
        }
    }
}

fn stdin_lines() -> Lines<BufReader<Stdin>> {
    BufReader::new(tokio::io::stdin()).lines()
}

fn print_json(value: &Value) -> Result<(), CliError> {
    match value {
        Value::String(text) => println!("{text}"),
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}
