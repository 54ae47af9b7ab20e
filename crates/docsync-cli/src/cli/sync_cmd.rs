use super::*;
pub(super) fn handle_sync(
    args: SyncArgs,
    layout: &RuntimeLayout,
    runtime: &Runtime,
) -> anyhow::Result<ExitCode> {
    let (bridge, mut events) = open_bridge(layout, runtime, Arc::new(NoPicker))?;
    let document = bridge.store().load();
    if document.actionable_tasks().next().is_none() {
        warn!(path = %bridge.store().path().display(), "No enabled tasks configured");
    }
    if !document.has_credentials() {
        warn!("Feishu app id or secret is not set");
    }

    let request = RunSyncRequest::new(args.force);
    info!(session = %request.session_id, force = args.force, "Starting sync");
    bridge.run_sync(request);

    let Some(finished) = runtime.block_on(wait_for_finish(&mut events)) else {
        anyhow::bail!("event stream closed before the sync finished");
    };
    if finished.success {
        let ui_state = UiStateStore::new(default_ui_state_path()?);
        if let Err(err) = ui_state.record_sync(&crate::ui_state::now_rfc3339()) {
            warn!(error = %format!("{err:#}"), "Failed to record last sync time");
        }
        eprintln!("Sync finished.");
    } else {
        eprintln!(
            "Sync failed{}.",
            finished
                .exit_code
                .map(|code| format!(" with exit code {code}"))
                .unwrap_or_default()
        );
    }
    Ok(exit_code_for(&finished))
}

pub(super) fn handle_health(layout: &RuntimeLayout, runtime: &Runtime) -> anyhow::Result<ExitCode> {
    let (bridge, _events) = open_bridge(layout, runtime, Arc::new(NoPicker))?;
    info!(timeout_ms = bridge.probe_timeout().as_millis() as u64, "Running health check");
    let result = runtime.block_on(bridge.health_check());
    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    if result.success {
        eprintln!("Health check passed.");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("Health check failed.");
        Ok(ExitCode::FAILURE)
    }
}

pub(super) fn handle_clean(layout: &RuntimeLayout, runtime: &Runtime) -> anyhow::Result<ExitCode> {
    let (bridge, mut events) = open_bridge(layout, runtime, Arc::new(NoPicker))?;
    info!("Starting cleanup");
    bridge.run_clean();
    let Some(finished) = runtime.block_on(wait_for_finish(&mut events)) else {
        anyhow::bail!("event stream closed before cleanup finished");
    };
    if finished.success {
        eprintln!("Cleanup finished.");
    } else {
        eprintln!("Cleanup failed.");
    }
    Ok(exit_code_for(&finished))
}
