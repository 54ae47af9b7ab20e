use super::*;
pub(super) fn handle_config(
    args: ConfigArgs,
    layout: &RuntimeLayout,
    runtime: &Runtime,
) -> anyhow::Result<ExitCode> {
    let (bridge, _events) = open_bridge(layout, runtime, Arc::new(NoPicker))?;
    match args.command {
        ConfigCommands::Show => {
            let document = runtime.block_on(bridge.get_config());
            println!("Config: {}", bridge.store().path().display());
            println!(
                "App id: {}",
                if document.app_id.trim().is_empty() {
                    "<unset>"
                } else {
                    document.app_id.as_str()
                }
            );
            println!("App secret: {}", mask_secret(&document.app_secret));
            println!(
                "Tasks: {} ({} enabled)",
                document.tasks.len(),
                document.actionable_tasks().count()
            );
            if document.unreadable_tasks > 0 {
                println!("Unreadable tasks: {}", document.unreadable_tasks);
            }
            if !document.extra.is_empty() {
                let keys: Vec<&str> = document.extra.keys().map(String::as_str).collect();
                println!("Other keys: {}", keys.join(", "));
            }
            Ok(ExitCode::SUCCESS)
        }
        ConfigCommands::Set(args) => {
            let patch = ConfigPatch {
                app_id: args.app_id.map(|value| value.trim().to_string()),
                app_secret: args.app_secret.map(|value| value.trim().to_string()),
                ..ConfigPatch::default()
            };
            if patch.is_empty() {
                anyhow::bail!("nothing to set; pass --app-id and/or --app-secret");
            }
            let result = runtime.block_on(bridge.save_config(patch));
            if !result.success {
                anyhow::bail!(
                    "failed to save config at {}",
                    bridge.store().path().display()
                );
            }
            println!("Saved {}", bridge.store().path().display());
            Ok(ExitCode::SUCCESS)
        }
    }
}
