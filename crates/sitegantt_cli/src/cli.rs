//! Command-line interface for sitegantt.
//!
//! Flags fall back to environment variables so the same binary works from a
//! shell or from scheduled automation.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sitegantt_core::{
    default_log_level, init_logging, open_db, ApiKeyGuard, GanttService, Granularity, LogLevel,
    NewTask, ReportKind, ReportService, RoleBadge, SqliteReportRepository, SqliteTaskRepository,
    TaskUpdate,
};
use std::path::PathBuf;

/// sitegantt - construction schedule Gantt engine
#[derive(Parser, Debug)]
#[command(name = "sitegantt")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "SITEGANTT_DB", default_value = "sitegantt.db")]
    pub db: PathBuf,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true, env = "SITEGANTT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true, env = "SITEGANTT_LOG_DIR")]
    pub log_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Render the visible Gantt rows of one project as JSON
    Gantt {
        /// Project id
        #[arg(long)]
        project: String,

        /// Timeline columns: month or day
        #[arg(long, default_value = "month")]
        granularity: Granularity,

        /// Reference date (defaults to the local date)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Task ids to collapse
        #[arg(long)]
        collapse: Vec<String>,

        /// Collapse every task before rendering
        #[arg(long, conflicts_with = "collapse")]
        collapse_all: bool,
    },

    /// Group one project's tasks into status columns as JSON
    Kanban {
        /// Project id
        #[arg(long)]
        project: String,
    },

    /// Build one report: project-status, blocked-tasks, purchase-risk, timesheet-week
    Report {
        kind: String,

        /// Configured reports secret
        #[arg(long, env = "REPORTS_API_KEY", hide_env_values = true)]
        expected_key: Option<String>,

        /// Presented `x-api-key` value
        #[arg(long)]
        key: Option<String>,
    },

    /// Resolve the display badge for a stored role string
    Role { raw: String },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a project and print its id
    Create {
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task appended after its siblings
    Add {
        #[arg(long)]
        project: String,

        /// Parent task id
        #[arg(long)]
        parent: Option<String>,

        #[command(flatten)]
        fields: TaskFields,
    },

    /// Replace the editable fields of a task
    Edit {
        id: String,

        #[command(flatten)]
        fields: TaskFields,
    },

    /// Mark a task completed now
    Complete { id: String },

    /// Delete a task and its subtree
    Delete { id: String },
}

#[derive(Args, Debug)]
pub struct TaskFields {
    #[arg(long)]
    name: String,

    /// First day (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    /// Last day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,

    #[arg(long)]
    milestone: bool,

    #[arg(long)]
    notes: Option<String>,

    /// Responsible profile id
    #[arg(long)]
    responsible: Option<String>,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        self.init_logging()?;
        match self.command {
            Commands::Role { raw } => print_json(&RoleBadge::for_raw(&raw)),
            Commands::Project(ProjectCommands::Create { name }) => {
                let conn = open_db(&self.db)
                    .with_context(|| format!("failed to open {}", self.db.display()))?;
                let repo = SqliteTaskRepository::try_new(&conn)?;
                if name.trim().is_empty() {
                    bail!("project name must not be blank");
                }
                println!("{}", repo.create_project(&name)?);
                Ok(())
            }
            Commands::Task(command) => {
                let conn = open_db(&self.db)
                    .with_context(|| format!("failed to open {}", self.db.display()))?;
                let service = GanttService::new(SqliteTaskRepository::try_new(&conn)?);
                run_task(&service, command)
            }
            Commands::Gantt {
                project,
                granularity,
                today,
                collapse,
                collapse_all,
            } => {
                let conn = open_db(&self.db)
                    .with_context(|| format!("failed to open {}", self.db.display()))?;
                let service = GanttService::new(SqliteTaskRepository::try_new(&conn)?);
                let mut board = service.load(&project)?;
                if collapse_all {
                    board.collapse_all();
                }
                for id in &collapse {
                    if !board.forest().contains(id) {
                        bail!("task not found in project: {id}");
                    }
                    board.collapse(id);
                }
                let today = today.unwrap_or_else(|| Local::now().date_naive());
                print_json(&board.view(granularity, today))
            }
            Commands::Kanban { project } => {
                let conn = open_db(&self.db)
                    .with_context(|| format!("failed to open {}", self.db.display()))?;
                let service = GanttService::new(SqliteTaskRepository::try_new(&conn)?);
                print_json(&service.load_kanban(&project)?.columns())
            }
            Commands::Report {
                kind,
                expected_key,
                key,
            } => {
                let kind: ReportKind = kind.parse()?;
                let conn = open_db(&self.db)
                    .with_context(|| format!("failed to open {}", self.db.display()))?;
                let service = ReportService::new(
                    SqliteReportRepository::try_new(&conn)?,
                    ApiKeyGuard::new(expected_key),
                );
                print_json(&service.run(kind, key.as_deref(), Utc::now())?)
            }
        }
    }

    fn init_logging(&self) -> Result<()> {
        let Some(log_dir) = self.log_dir.as_deref() else {
            return Ok(());
        };
        let level = match self.log_level.as_deref() {
            Some(raw) => raw.parse::<LogLevel>()?,
            None => default_log_level(),
        };
        init_logging(level, log_dir).context("failed to initialize logging")
    }
}

fn run_task(
    service: &GanttService<SqliteTaskRepository<'_>>,
    command: TaskCommands,
) -> Result<()> {
    match command {
        TaskCommands::Add {
            project,
            parent,
            fields,
        } => {
            let request = NewTask {
                project_id: project,
                parent_id: parent,
                name: fields.name,
                start_date: fields.start,
                end_date: fields.end,
                is_milestone: fields.milestone,
                notes: fields.notes,
                responsible_id: fields.responsible,
            };
            print_json(&service.add_task(&request)?)
        }
        TaskCommands::Edit { id, fields } => {
            let update = TaskUpdate {
                name: fields.name,
                start_date: fields.start,
                end_date: fields.end,
                is_milestone: fields.milestone,
                notes: fields.notes,
                responsible_id: fields.responsible,
            };
            service.edit_task(&id, &update)?;
            println!("{id}");
            Ok(())
        }
        TaskCommands::Complete { id } => {
            service.complete_task(&id, Utc::now())?;
            println!("{id}");
            Ok(())
        }
        TaskCommands::Delete { id } => {
            let deleted = service.delete_task(&id)?;
            println!("{deleted}");
            Ok(())
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
