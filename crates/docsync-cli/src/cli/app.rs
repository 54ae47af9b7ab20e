use super::*;
pub(super) fn run() -> anyhow::Result<ExitCode> {
    let Cli {
        packaged,
        project_root,
        resource_root,
        command,
    } = Cli::parse();
    let command = command.unwrap_or(Commands::Tui);

    let log_buffer = LogBuffer::new(200);
    let output = match command {
        Commands::Tui => LogOutput::File(default_log_dir()?.join(logging::LOG_FILE_NAME)),
        _ => LogOutput::Stderr,
    };
    logging::init(log_buffer.clone(), &output)?;

    let mode = resolve_mode(packaged, DeploymentMode::from_env());
    let layout = RuntimeLayout::resolve(mode, project_root, resource_root)?;
    info!(
        command = command_label(&command),
        mode = %layout.mode,
        cwd = %layout.worker_cwd().display(),
        "Running command"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("create tokio runtime")?;

    match command {
        Commands::Tui => {
            let ui_state = UiStateStore::new(default_ui_state_path()?);
            tui::run_tui(&layout, &runtime, ui_state, log_buffer)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Sync(args) => handle_sync(args, &layout, &runtime),
        Commands::Health => handle_health(&layout, &runtime),
        Commands::Clean => handle_clean(&layout, &runtime),
        Commands::Config(args) => handle_config(args, &layout, &runtime),
        Commands::Task(args) => handle_task(args, &layout, &runtime),
    }
}

/// `--packaged` wins, then `DOCSYNC_MODE`, then the build profile.
pub(super) fn resolve_mode(packaged: bool, from_env: Option<DeploymentMode>) -> DeploymentMode {
    if packaged {
        return DeploymentMode::Packaged;
    }
    from_env.unwrap_or(if cfg!(debug_assertions) {
        DeploymentMode::Development
    } else {
        DeploymentMode::Packaged
    })
}

fn command_label(command: &Commands) -> &'static str {
    match command {
        Commands::Tui => "tui",
        Commands::Sync(_) => "sync",
        Commands::Health => "health",
        Commands::Clean => "clean",
        Commands::Config(_) => "config",
        Commands::Task(_) => "task",
    }
}
