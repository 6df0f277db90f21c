//! plancast CLI - Planned-vs-actual project planner
//!
//! Command-line interface for editing projects and tasks, rendering
//! timelines and auditing rendered pages.

mod config;
mod report;
mod storage;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use plancast_core::{
    MonthWindow, PlannerStore, Priority, ProjectDraft, Renderer, TaskDraft, TaskFilter, TaskStatus,
    Timeline,
};
use plancast_render::{HtmlTimelineRenderer, ProgressAudit, SvgTimelineRenderer, TextRenderer};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::PlancastConfig;

#[derive(Parser)]
#[command(name = "plancast")]
#[command(author, version, about = "Planned-vs-actual project planner", long_about = None)]
struct Cli {
    /// Verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Store file
    #[arg(long, env = "PLANCAST_STORE", default_value = "plancast.json", global = true)]
    store: PathBuf,

    /// Configuration file (TOML)
    #[arg(long, env = "PLANCAST_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a store with the default project
    Init {
        /// Replace an existing store
        #[arg(long)]
        force: bool,
    },

    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectCommand,
    },

    /// Manage tasks in a project
    Task {
        #[command(subcommand)]
        action: TaskCommand,
    },

    /// Show the task table and project summary
    Show {
        /// Case-insensitive search over name and description
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        status: Option<TaskStatus>,

        #[arg(long)]
        priority: Option<Priority>,

        /// Project id (current project if not specified)
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Render the planned-vs-actual timeline
    Timeline {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = TimelineFormat::Text)]
        format: TimelineFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show children of collapsed tasks
        #[arg(long)]
        expand_all: bool,

        /// Use the dark HTML theme
        #[arg(long)]
        dark: bool,

        #[arg(short, long)]
        project: Option<String>,
    },

    /// Month view: task spans and the tasks active on each day
    Calendar {
        /// Month as YYYY-MM (current month if not specified)
        #[arg(short, long)]
        month: Option<MonthWindow>,

        #[arg(short, long)]
        project: Option<String>,
    },

    /// Export every project as JSON
    Export {
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Repair divergent progress cells in a rendered HTML page
    Audit {
        /// HTML file to check
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Where to write the repaired page (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Create a project and switch to it
    Add {
        name: String,

        /// Start date (today if not specified)
        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long)]
        end: Option<NaiveDate>,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Change a project's details
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long)]
        end: Option<NaiveDate>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// List all projects
    List,

    /// Make a project current
    Switch { id: String },

    /// Close a project and its tasks
    Remove { id: String },
}

#[derive(Subcommand)]
enum TaskCommand {
    /// Add a task
    Add {
        name: String,

        /// Planned start date
        #[arg(long)]
        start: NaiveDate,

        /// Planned duration in days
        #[arg(long, default_value_t = 1)]
        days: u32,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(long, default_value = "medium")]
        priority: Priority,

        #[arg(long, default_value = "pending")]
        status: TaskStatus,

        /// Actual start date
        #[arg(long)]
        actual_start: Option<NaiveDate>,

        /// Actual duration in days
        #[arg(long)]
        actual_days: Option<u32>,

        #[arg(long, default_value_t = 0)]
        progress: u8,

        /// Parent task id (must be a top-level task)
        #[arg(long)]
        parent: Option<String>,

        #[arg(short, long)]
        project: Option<String>,
    },

    /// Change a task; omitted options keep their value
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long)]
        days: Option<u32>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        priority: Option<Priority>,

        #[arg(long)]
        status: Option<TaskStatus>,

        #[arg(long)]
        actual_start: Option<NaiveDate>,

        #[arg(long)]
        actual_days: Option<u32>,

        /// Forget the actual start and duration
        #[arg(long, conflicts_with_all = ["actual_start", "actual_days"])]
        clear_actual: bool,

        #[arg(long)]
        progress: Option<u8>,

        #[arg(long)]
        parent: Option<String>,

        /// Make the task top-level
        #[arg(long, conflicts_with = "parent")]
        no_parent: bool,

        #[arg(short, long)]
        project: Option<String>,
    },

    /// Delete a task and its sub-tasks
    Remove {
        id: String,

        #[arg(short, long)]
        project: Option<String>,
    },

    /// Collapse or expand a parent task
    Toggle {
        id: String,

        #[arg(short, long)]
        project: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum TimelineFormat {
    Text,
    Html,
    Json,
    Svg,
}

/// Clock and paths shared by every command
struct Session {
    store_path: PathBuf,
    config: PlancastConfig,
    today: NaiveDate,
    now: DateTime<Utc>,
}

impl Session {
    fn load_store(&self) -> Result<PlannerStore> {
        storage::load(&self.store_path, self.today, self.now)
    }

    fn save_store(&self, store: &PlannerStore) -> Result<()> {
        storage::save(&self.store_path, store)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let ctx = Session {
        store_path: cli.store,
        config: PlancastConfig::load(cli.config.as_deref())?,
        today: Local::now().date_naive(),
        now: Utc::now(),
    };

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(&ctx, force),
        Some(Commands::Project { action }) => cmd_project(&ctx, action),
        Some(Commands::Task { action }) => cmd_task(&ctx, action),
        Some(Commands::Show {
            search,
            status,
            priority,
            project,
        }) => {
            let store = ctx.load_store()?;
            let filter = TaskFilter {
                search,
                status,
                priority,
            };
            let project = resolve_project(&store, project.as_deref())?;
            let project = store.project(&project).context("project vanished")?;
            print!("{}", report::show(project, &filter, &ctx.config.display.date_format));
            Ok(())
        }
        Some(Commands::Timeline {
            format,
            output,
            expand_all,
            dark,
            project,
        }) => cmd_timeline(&ctx, format, output.as_deref(), expand_all, dark, project.as_deref()),
        Some(Commands::Calendar { month, project }) => {
            let store = ctx.load_store()?;
            let id = resolve_project(&store, project.as_deref())?;
            let project = store.project(&id).context("project vanished")?;
            let month = month.unwrap_or_else(|| MonthWindow::containing(ctx.today));
            print!("{}", report::calendar(project, &month));
            Ok(())
        }
        Some(Commands::Export { output }) => {
            let store = ctx.load_store()?;
            let json = serde_json::to_string_pretty(&store.export(ctx.now))?;
            write_output(output.as_deref(), &json)
        }
        Some(Commands::Audit { file, output }) => cmd_audit(&file, output.as_deref()),
        None => {
            println!("plancast - Planned-vs-actual project planner");
            println!("Run with --help for usage information");
            Ok(())
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_init(ctx: &Session, force: bool) -> Result<()> {
    if ctx.store_path.exists() && !force {
        bail!(
            "{} already exists (use --force to replace it)",
            ctx.store_path.display()
        );
    }
    let store = PlannerStore::with_default_project(ctx.today, ctx.now);
    ctx.save_store(&store)?;
    println!("Created: {}", ctx.store_path.display());
    Ok(())
}

fn cmd_project(ctx: &Session, action: ProjectCommand) -> Result<()> {
    let mut store = ctx.load_store()?;
    match action {
        ProjectCommand::Add {
            name,
            start,
            end,
            description,
        } => {
            let mut draft = ProjectDraft::new(name, start.unwrap_or(ctx.today));
            draft.end_date = end;
            draft.description = description;
            let id = store.create_project(&draft, ctx.now)?;
            println!("Created project {id}");
        }
        ProjectCommand::Edit {
            id,
            name,
            start,
            end,
            description,
        } => {
            let project = store
                .project(&id)
                .ok_or_else(|| plancast_core::PlanError::ProjectNotFound(id.clone()))?;
            let mut draft = ProjectDraft::from_project(project);
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(start) = start {
                draft.start_date = Some(start);
            }
            if end.is_some() {
                draft.end_date = end;
            }
            if let Some(description) = description {
                draft.description = description;
            }
            store.update_project(&id, &draft)?;
            println!("Updated project {id}");
        }
        ProjectCommand::List => {
            print!("{}", report::project_list(&store, &ctx.config.display.date_format));
            return Ok(());
        }
        ProjectCommand::Switch { id } => {
            store.switch_project(&id)?;
            println!("Switched to {id}");
        }
        ProjectCommand::Remove { id } => {
            let removed = store.remove_project(&id)?;
            println!("Removed project {} ({} tasks)", removed.id, removed.tasks.len());
        }
    }
    ctx.save_store(&store)
}

fn cmd_task(ctx: &Session, action: TaskCommand) -> Result<()> {
    let mut store = ctx.load_store()?;
    match action {
        TaskCommand::Add {
            name,
            start,
            days,
            description,
            priority,
            status,
            actual_start,
            actual_days,
            progress,
            parent,
            project,
        } => {
            let project = resolve_project(&store, project.as_deref())?;
            let mut draft = TaskDraft::new(name, start, days).progress(progress);
            draft.description = description;
            draft.priority = priority;
            draft.status = status;
            draft.start_actual = actual_start;
            draft.duration_actual = actual_days;
            draft.parent_id = parent;
            let id = store.add_task(&project, &draft, ctx.now)?;
            println!("Added {id}");
        }
        TaskCommand::Edit {
            id,
            name,
            start,
            days,
            description,
            priority,
            status,
            actual_start,
            actual_days,
            clear_actual,
            progress,
            parent,
            no_parent,
            project,
        } => {
            let project = resolve_project(&store, project.as_deref())?;
            let task = store
                .project(&project)
                .and_then(|p| p.get_task(&id))
                .ok_or_else(|| plancast_core::PlanError::TaskNotFound(id.clone()))?;

            let mut draft = TaskDraft::from_task(task);
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(start) = start {
                draft.start_planned = Some(start);
            }
            if let Some(days) = days {
                draft.duration_planned = days;
            }
            if let Some(description) = description {
                draft.description = description;
            }
            if let Some(priority) = priority {
                draft.priority = priority;
            }
            if let Some(status) = status {
                draft.status = status;
            }
            if clear_actual {
                draft.start_actual = None;
                draft.duration_actual = None;
            }
            if actual_start.is_some() {
                draft.start_actual = actual_start;
            }
            if actual_days.is_some() {
                draft.duration_actual = actual_days;
            }
            if let Some(progress) = progress {
                draft.progress = progress;
            }
            if no_parent {
                draft.parent_id = None;
            } else if parent.is_some() {
                draft.parent_id = parent;
            }

            store.update_task(&project, &id, &draft, ctx.now)?;
            println!("Updated {id}");
        }
        TaskCommand::Remove { id, project } => {
            let project = resolve_project(&store, project.as_deref())?;
            let removed = store.remove_task(&project, &id)?;
            println!("Removed {} task(s)", removed.len());
        }
        TaskCommand::Toggle { id, project } => {
            let project = resolve_project(&store, project.as_deref())?;
            let collapsed = store.toggle_collapsed(&project, &id)?;
            println!("{id} {}", if collapsed { "collapsed" } else { "expanded" });
        }
    }
    ctx.save_store(&store)
}

fn cmd_timeline(
    ctx: &Session,
    format: TimelineFormat,
    output: Option<&Path>,
    expand_all: bool,
    dark: bool,
    project: Option<&str>,
) -> Result<()> {
    let store = ctx.load_store()?;
    let id = resolve_project(&store, project)?;
    let project = store.project(&id).context("project vanished")?;
    let timeline = Timeline::compute(project, &ctx.config.timeline);
    let date_format = ctx.config.display.date_format.as_str();
    info!(project = %id, tasks = project.tasks.len(), off_plan = timeline.off_plan_count(), "rendering timeline");

    let rendered = match format {
        TimelineFormat::Text => TextRenderer::new()
            .bar_width(ctx.config.display.bar_width)
            .date_format(date_format)
            .render(project, &timeline)?,
        TimelineFormat::Html => {
            let mut renderer = HtmlTimelineRenderer::new().date_format(date_format);
            if expand_all {
                renderer = renderer.expand_all();
            }
            if dark {
                renderer = renderer.dark_theme();
            }
            renderer.render(project, &timeline)?
        }
        TimelineFormat::Json => serde_json::to_string_pretty(&timeline)?,
        TimelineFormat::Svg => SvgTimelineRenderer::new().render(project, &timeline)?,
    };
    write_output(output, &rendered)
}

fn cmd_audit(file: &Path, output: Option<&Path>) -> Result<()> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let outcome = ProgressAudit::new()?.run(&html);
    eprintln!(
        "Checked {} progress cell(s), repaired {} of {} value(s)",
        outcome.cells, outcome.report.repaired, outcome.report.checked
    );
    write_output(output, &outcome.html)
}

// ============================================================================
// Helpers
// ============================================================================

/// Explicit project id, or the current project
fn resolve_project(store: &PlannerStore, explicit: Option<&str>) -> Result<String> {
    match explicit {
        Some(id) if store.project(id).is_some() => Ok(id.to_string()),
        Some(id) => Err(plancast_core::PlanError::ProjectNotFound(id.to_string()).into()),
        None => Ok(store.current_id()?),
    }
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => {
            print!("{content}");
            if !content.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}
