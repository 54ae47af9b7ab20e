use super::*;
pub(super) fn handle_task(
    args: TaskArgs,
    layout: &RuntimeLayout,
    runtime: &Runtime,
) -> anyhow::Result<ExitCode> {
    let store = ConfigStore::for_layout(layout);
    let mut session = SessionController::new(store.load(), None);
    match args.command {
        TaskCommands::List => {
            if session.tasks().is_empty() {
                println!("No tasks configured in {}", store.path().display());
            }
            for (index, task) in session.tasks().iter().enumerate() {
                println!("{}", format_task_line(index, task));
            }
            Ok(ExitCode::SUCCESS)
        }
        TaskCommands::Add(args) => {
            let local_path = match args.local {
                Some(local) => local,
                None => {
                    let (bridge, _events) = open_bridge(layout, runtime, Arc::new(StdinPicker))?;
                    let Some(path) = runtime.block_on(bridge.select_folder()) else {
                        eprintln!("No folder selected.");
                        return Ok(ExitCode::FAILURE);
                    };
                    path.display().to_string()
                }
            };
            let task = Task {
                vault_root: args.vault_root.filter(|root| !root.trim().is_empty()),
                enabled: !args.disabled,
                force: args.force,
                ..Task::new(args.note, local_path, args.cloud)
            };
            let index = session.add_task(task, &store)?;
            println!("Added {}", format_task_line(index, &session.tasks()[index]));
            Ok(ExitCode::SUCCESS)
        }
        TaskCommands::Edit(args) => {
            let mut task = session
                .tasks()
                .get(args.index)
                .cloned()
                .with_context(|| format!("no task at index {}", args.index))?;
            if let Some(note) = args.note {
                task.note = note;
            }
            if let Some(local) = args.local {
                task.local_path = local;
            }
            if let Some(cloud) = args.cloud {
                task.cloud_token = cloud;
            }
            if args.clear_vault_root {
                task.vault_root = None;
            } else if let Some(root) = args.vault_root {
                task.vault_root = Some(root).filter(|root| !root.trim().is_empty());
            }
            if args.enable {
                task.enabled = true;
            }
            if args.disable {
                task.enabled = false;
            }
            if let Some(force) = args.force {
                task.force = force;
            }
            session.edit_task(args.index, task, &store)?;
            println!(
                "Updated {}",
                format_task_line(args.index, &session.tasks()[args.index])
            );
            Ok(ExitCode::SUCCESS)
        }
        TaskCommands::Remove(args) => {
            let line = format_task_line(args.index, session.request_delete(args.index)?);
            if !args.yes && !confirm(&format!("Remove {line}?"))? {
                session.cancel_delete();
                eprintln!("Cancelled.");
                return Ok(ExitCode::SUCCESS);
            }
            let removed = session.confirm_delete(&store)?;
            println!("Removed task '{}'", removed.note);
            Ok(ExitCode::SUCCESS)
        }
    }
}
