// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::applications::{AggregationState, Aggregator};
use crate::config::{AdminConfig, ConfigOverrides};
use crate::core::ApiClient;
use crate::dashboard::{render_viewer, Dashboard, DashboardError};
use crate::export::write_csv;
use crate::guard::{GuardState, SessionGuard, LOGIN_ROUTE, VALIDATING_PLACEHOLDER};
use crate::lifetime::Lifetime;
use crate::resume::PREVIEW_FAILURE_MESSAGE;
use crate::session::SessionStore;

#[derive(Parser)]
#[command(name = "career-admin")]
#[command(about = "Review job applications submitted through the career portal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to ./config.yaml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL, e.g. https://careers.example.com/api
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Applications requested per page
    #[arg(long, global = true)]
    pub page_size: Option<u32>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Record the token issued by the portal login
    Login {
        #[arg(long)]
        token: String,
    },
    /// Forget the stored token
    Logout,
    #[command(flatten)]
    Dashboard(DashboardCommand),
}

/// Commands that run behind the session guard
#[derive(Subcommand)]
pub enum DashboardCommand {
    /// Check the stored token against the backend
    Validate,
    /// List jobs with their applicant counts
    Jobs,
    /// List the applicants of one job
    Applicants { job_code: String },
    /// Show every detail of one applicant
    Show { applicant_id: String },
    /// Fetch an applicant's resume and save it as <name>.pdf
    Resume {
        applicant_id: String,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Export all applicants as CSV
    Export {
        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Interactive dashboard
    Browse,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            base_url: self.base_url.clone(),
            page_size: self.page_size,
        }
    }
}

pub async fn handle_command(cli: Cli, config: AdminConfig, lifetime: Lifetime) -> Result<()> {
    let store = SessionStore::new(&config.session.store_path);

    match cli.command {
        Command::Login { token } => {
            store.save(&token).await?;
            println!("✅ Session token stored in {}", store.path().display());
        }
        Command::Logout => {
            if store.clear().await? {
                println!("✅ Logged out");
            } else {
                println!("No session token was stored");
            }
        }
        Command::Dashboard(command) => {
            let credentials = store.credentials().await?;
            let client = ApiClient::new(&config.api, credentials)
                .context("Failed to create HTTP client")?;
            info!("Using API at {}", client.base_url());

            require_session(&client, &lifetime).await?;
            handle_dashboard_command(command, &client, &config, &lifetime).await?;
        }
    }

    Ok(())
}

async fn handle_dashboard_command(
    command: DashboardCommand,
    client: &ApiClient,
    config: &AdminConfig,
    lifetime: &Lifetime,
) -> Result<()> {
    match command {
        DashboardCommand::Validate => {
            println!("✅ Session is valid");
        }

        DashboardCommand::Jobs => {
            let dashboard = load_dashboard(client, config, lifetime).await?;
            print!("{}", dashboard.render());
        }

        DashboardCommand::Applicants { job_code } => {
            let mut dashboard = load_dashboard(client, config, lifetime).await?;
            dashboard.select_job(&job_code)?;
            print!("{}", dashboard.render());
        }

        DashboardCommand::Show { applicant_id } => {
            let mut dashboard = load_dashboard(client, config, lifetime).await?;
            dashboard.select_applicant(&applicant_id)?;
            print!("{}", dashboard.render());
        }

        DashboardCommand::Resume { applicant_id, out } => {
            let mut dashboard = load_dashboard(client, config, lifetime).await?;
            dashboard.select_applicant(&applicant_id)?;

            if let Err(e) = dashboard.preview_resume(client).await {
                warn!("Resume preview failed: {}", e);
                anyhow::bail!("{}: {}", PREVIEW_FAILURE_MESSAGE, e);
            }

            print!("{}", render_viewer(dashboard.viewer()));
            let path = dashboard.download_resume(&out).await?;
            println!("✅ Saved {}", path.display());
        }

        DashboardCommand::Export { out } => {
            let dashboard = load_dashboard(client, config, lifetime).await?;
            let grouping = dashboard
                .state()
                .grouping()
                .ok_or(DashboardError::NotLoaded)?;

            let rows = match &out {
                Some(path) => {
                    let file = std::fs::File::create(path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    write_csv(grouping, file)?
                }
                None => write_csv(grouping, std::io::stdout().lock())?,
            };

            if let Some(path) = out {
                println!("✅ Exported {} applicants to {}", rows, path.display());
            }
        }

        DashboardCommand::Browse => {
            let mut dashboard = Dashboard::new(lifetime);
            let aggregator = Aggregator::new(client, config.api.page_size);
            println!("{}", dashboard.render());
            if !dashboard.load(&aggregator).await {
                return Ok(());
            }
            browse(&mut dashboard, &aggregator, client).await?;
        }
    }

    Ok(())
}

/// Run the session guard; anything but `Authorized` sends the user to log in
async fn require_session(client: &ApiClient, lifetime: &Lifetime) -> Result<()> {
    info!("{}", VALIDATING_PLACEHOLDER);

    let mut guard = SessionGuard::new(client.clone());
    let state = lifetime
        .run(guard.check(client.credentials()))
        .await
        .context("Interrupted while validating the session")?;

    match state {
        GuardState::Authorized => Ok(()),
        _ => anyhow::bail!(
            "❌ Session is not valid. Log in at {} and run `career-admin login --token <token>`",
            LOGIN_ROUTE
        ),
    }
}

async fn load_dashboard(
    client: &ApiClient,
    config: &AdminConfig,
    lifetime: &Lifetime,
) -> Result<Dashboard> {
    let mut dashboard = Dashboard::new(lifetime);
    let aggregator = Aggregator::new(client, config.api.page_size);

    if !dashboard.load(&aggregator).await {
        anyhow::bail!("Interrupted while loading applications");
    }
    if let AggregationState::Failed(message) = dashboard.state() {
        anyhow::bail!("❌ {}", message);
    }

    Ok(dashboard)
}

// ===== Interactive dashboard =====

const BROWSE_HELP: &str = "\
Commands:
  jobs                 job list
  open <n|code>        applicants of a job
  show <n|id>          applicant details
  resume [n|id]        preview the resume of the shown applicant
  + / -                zoom the resume in / out
  download [dir]       save the open resume as <name>.pdf
  close                close the resume
  back                 previous view
  reload               fetch everything again
  help                 this text
  quit                 leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Jobs,
    Open(String),
    Show(String),
    Resume(Option<String>),
    ZoomIn,
    ZoomOut,
    Download(Option<PathBuf>),
    Close,
    Back,
    Reload,
    Help,
    Quit,
}

impl FromStr for BrowseCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.trim().splitn(2, char::is_whitespace);
        let verb = parts.next().unwrap_or("").to_lowercase();
        let arg = parts
            .next()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        let required = |arg: Option<String>, usage: &str| {
            arg.ok_or_else(|| format!("usage: {}", usage))
        };

        match verb.as_str() {
            "jobs" | "j" => Ok(BrowseCommand::Jobs),
            "open" | "o" => Ok(BrowseCommand::Open(required(arg, "open <n|code>")?)),
            "show" | "s" => Ok(BrowseCommand::Show(required(arg, "show <n|id>")?)),
            "resume" | "r" => Ok(BrowseCommand::Resume(arg)),
            "+" | "zoom-in" => Ok(BrowseCommand::ZoomIn),
            "-" | "zoom-out" => Ok(BrowseCommand::ZoomOut),
            "download" | "d" => Ok(BrowseCommand::Download(arg.map(PathBuf::from))),
            "close" | "c" => Ok(BrowseCommand::Close),
            "back" | "b" => Ok(BrowseCommand::Back),
            "reload" => Ok(BrowseCommand::Reload),
            "help" | "h" | "?" => Ok(BrowseCommand::Help),
            "quit" | "q" | "exit" => Ok(BrowseCommand::Quit),
            "" => Err(String::new()),
            other => Err(format!("unknown command '{}', try 'help'", other)),
        }
    }
}

async fn browse(
    dashboard: &mut Dashboard,
    aggregator: &Aggregator<&ApiClient>,
    client: &ApiClient,
) -> Result<()> {
    let lifetime = dashboard.lifetime().clone();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!("{}", dashboard.render());

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let line = match lifetime.run(lines.next_line()).await {
            Some(line) => line.context("Failed to read command")?,
            None => break,
        };
        let Some(line) = line else { break };

        let command = match line.parse::<BrowseCommand>() {
            Ok(command) => command,
            Err(message) => {
                if !message.is_empty() {
                    println!("{}", message);
                }
                continue;
            }
        };

        match command {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => {
                println!("{}", BROWSE_HELP);
                continue;
            }
            BrowseCommand::Reload => {
                if !dashboard.load(aggregator).await {
                    break;
                }
            }
            BrowseCommand::Jobs => while dashboard.back() {},
            BrowseCommand::Open(key) => report(dashboard.select_job(&key).map(|_| ())),
            BrowseCommand::Show(key) => report(dashboard.select_applicant(&key).map(|_| ())),
            BrowseCommand::Resume(key) => {
                if let Some(key) = key {
                    if let Err(e) = dashboard.select_applicant(&key) {
                        report(Err(e));
                        continue;
                    }
                }
                match dashboard.preview_resume(client).await {
                    Ok(()) => {}
                    Err(DashboardError::Cancelled) => break,
                    Err(e @ DashboardError::Resume(_)) => {
                        warn!("Resume preview failed: {}", e);
                        println!("❌ {}", PREVIEW_FAILURE_MESSAGE);
                        continue;
                    }
                    Err(e) => report(Err(e)),
                }
            }
            BrowseCommand::ZoomIn => dashboard.zoom_in(),
            BrowseCommand::ZoomOut => dashboard.zoom_out(),
            BrowseCommand::Download(dir) => {
                let dir = dir.unwrap_or_else(|| PathBuf::from("."));
                match dashboard.download_resume(&dir).await {
                    Ok(path) => println!("✅ Saved {}", path.display()),
                    Err(e) => println!("❌ {}", e),
                }
                continue;
            }
            BrowseCommand::Close => dashboard.close_resume(),
            BrowseCommand::Back => {
                dashboard.back();
            }
        }

        println!("{}", dashboard.render());
    }

    Ok(())
}

fn report(result: Result<(), DashboardError>) {
    if let Err(e) = result {
        println!("❌ {}", e);
    }
}
