use super::*;

pub(in crate::cli) fn open_bridge(
    layout: &RuntimeLayout,
    runtime: &Runtime,
    picker: Arc<dyn PathPicker>,
) -> anyhow::Result<(Bridge, EventStream)> {
    Bridge::for_layout(
        layout,
        &LaunchOverrides::from_env(),
        picker,
        runtime.handle().clone(),
    )
}

/// Prints streamed output until the first terminal event. `None` when the
/// stream closes first.
pub(in crate::cli) async fn wait_for_finish(events: &mut EventStream) -> Option<Finished> {
    while let Some(event) = events.next().await {
        match event {
            BridgeEvent::SyncLog(line) => print_log_line(line.stream, &line.line),
            BridgeEvent::SyncFinished(finished) | BridgeEvent::CleanFinished(finished) => {
                return Some(finished);
            }
        }
    }
    None
}
