use super::*;
#[derive(Parser)]
#[command(
    name = "docsync",
    author,
    version,
    about = "Launch, supervise and configure the DocSync worker"
)]
pub(super) struct Cli {
    #[arg(
        long,
        global = true,
        help = "Run the bundled worker from the resource root"
    )]
    pub(super) packaged: bool,
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        help = "Worker source checkout used in development mode"
    )]
    pub(super) project_root: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        help = "Directory holding the bundled worker in packaged mode"
    )]
    pub(super) resource_root: Option<PathBuf>,
    #[command(subcommand)]
    pub(super) command: Option<Commands>,
}

#[derive(clap::Subcommand)]
pub(super) enum Commands {
    #[command(about = "Launch terminal UI (default)")]
    Tui,
    #[command(about = "Run a sync and stream worker output")]
    Sync(SyncArgs),
    #[command(about = "Probe the worker with a bounded health check")]
    Health,
    #[command(about = "Run the worker's cleanup mode")]
    Clean,
    #[command(about = "Show or change Feishu credentials")]
    Config(ConfigArgs),
    #[command(about = "Manage sync tasks")]
    Task(TaskArgs),
}

#[derive(Parser)]
pub(super) struct SyncArgs {
    #[arg(long, help = "Re-upload everything regardless of change detection")]
    pub(super) force: bool,
}

#[derive(Parser)]
pub(super) struct ConfigArgs {
    #[command(subcommand)]
    pub(super) command: ConfigCommands,
}

#[derive(clap::Subcommand)]
pub(super) enum ConfigCommands {
    #[command(about = "Print the config path, credentials (masked) and task count")]
    Show,
    #[command(about = "Update app id and/or app secret")]
    Set(SetConfigArgs),
}

#[derive(Parser)]
pub(super) struct SetConfigArgs {
    #[arg(long)]
    pub(super) app_id: Option<String>,
    #[arg(long)]
    pub(super) app_secret: Option<String>,
}

#[derive(Parser)]
pub(super) struct TaskArgs {
    #[command(subcommand)]
    pub(super) command: TaskCommands,
}

#[derive(clap::Subcommand)]
pub(super) enum TaskCommands {
    #[command(about = "List configured tasks")]
    List,
    #[command(about = "Add a task")]
    Add(AddTaskArgs),
    #[command(about = "Edit a task by index")]
    Edit(EditTaskArgs),
    #[command(about = "Remove a task by index")]
    Remove(RemoveTaskArgs),
}

#[derive(Parser)]
pub(super) struct AddTaskArgs {
    #[arg(long)]
    pub(super) note: String,
    #[arg(
        long,
        required_unless_present = "browse",
        help = "Local folder or Markdown file"
    )]
    pub(super) local: Option<String>,
    #[arg(long, help = "Feishu folder or document token")]
    pub(super) cloud: String,
    #[arg(long)]
    pub(super) vault_root: Option<String>,
    #[arg(long, help = "Add the task disabled")]
    pub(super) disabled: bool,
    #[arg(long, help = "Always force this task")]
    pub(super) force: bool,
    #[arg(long, conflicts_with = "local", help = "Pick the local folder interactively")]
    pub(super) browse: bool,
}

#[derive(Parser)]
pub(super) struct EditTaskArgs {
    #[arg(long)]
    pub(super) index: usize,
    #[arg(long)]
    pub(super) note: Option<String>,
    #[arg(long)]
    pub(super) local: Option<String>,
    #[arg(long)]
    pub(super) cloud: Option<String>,
    #[arg(long, conflicts_with = "clear_vault_root")]
    pub(super) vault_root: Option<String>,
    #[arg(long)]
    pub(super) clear_vault_root: bool,
    #[arg(long, conflicts_with = "disable")]
    pub(super) enable: bool,
    #[arg(long)]
    pub(super) disable: bool,
    #[arg(long, value_name = "BOOL")]
    pub(super) force: Option<bool>,
}

#[derive(Parser)]
pub(super) struct RemoveTaskArgs {
    #[arg(long)]
    pub(super) index: usize,
    #[arg(long, help = "Skip the confirmation prompt")]
    pub(super) yes: bool,
}
