mod account;
mod app;
mod assistant_cmd;
mod config;
mod goals;
mod notes;
mod overview;
mod planner;
mod quiz;
mod rooms;
mod tasks;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "studyhall",
    version,
    about = "studyhall - student dashboard with live-syncing tasks, planner, notes, and study rooms"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the signed-in account
    Account {
        #[command(subcommand)]
        action: account::AccountAction,
    },

    /// Manage tasks
    Task {
        #[command(subcommand)]
        action: tasks::TaskAction,
    },

    /// Manage study goals
    Goal {
        #[command(subcommand)]
        action: goals::GoalAction,
    },

    /// Manage notes
    Note {
        #[command(subcommand)]
        action: notes::NoteAction,
    },

    /// Manage planner events
    Plan {
        #[command(subcommand)]
        action: planner::PlanAction,
    },

    /// Create, join, and chat in study rooms
    Room {
        #[command(subcommand)]
        action: rooms::RoomAction,
    },

    /// Author and take quizzes
    Quiz {
        #[command(subcommand)]
        action: quiz::QuizAction,
    },

    /// Dashboard overview: stats, subject progress, badges
    Overview,

    /// Ask the AI learning assistant
    Assistant {
        /// The question to ask
        prompt: Vec<String>,
    },

    /// Show or set configuration
    Config {
        /// Set the data directory
        #[arg(long)]
        data_dir: Option<std::path::PathBuf>,

        /// Set the assistant endpoint URL (empty string to unset)
        #[arg(long)]
        assistant_endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Account { action } => account::run(action).await,
        Commands::Task { action } => tasks::run(action).await,
        Commands::Goal { action } => goals::run(action).await,
        Commands::Note { action } => notes::run(action).await,
        Commands::Plan { action } => planner::run(action).await,
        Commands::Room { action } => rooms::run(action).await,
        Commands::Quiz { action } => quiz::run(action).await,
        Commands::Overview => overview::run().await,
        Commands::Assistant { prompt } => assistant_cmd::run(prompt.join(" ")).await,
        Commands::Config {
            data_dir,
            assistant_endpoint,
        } => {
            if data_dir.is_none() && assistant_endpoint.is_none() {
                config::show_config()
            } else {
                config::set_config(data_dir, assistant_endpoint)
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
