use super::*;

/// A chooser request handed from the bridge's blocking picker thread to the
/// UI thread. The UI answers on `reply`; dropping it counts as a cancel.
pub(in crate::tui) struct PickPrompt {
    pub(in crate::tui) request: PickRequest,
    pub(in crate::tui) reply: mpsc::Sender<Option<PathBuf>>,
}

pub(in crate::tui) struct TuiPicker {
    prompts: mpsc::Sender<PickPrompt>,
}

impl TuiPicker {
    pub(in crate::tui) fn channel() -> (Self, mpsc::Receiver<PickPrompt>) {
        let (prompts, rx) = mpsc::channel();
        (Self { prompts }, rx)
    }
}

impl docsync_core::picker::PathPicker for TuiPicker {
    fn pick(&self, request: &PickRequest) -> Option<PathBuf> {
        let (reply, answer) = mpsc::channel();
        let prompt = PickPrompt {
            request: request.clone(),
            reply,
        };
        if self.prompts.send(prompt).is_err() {
            warn!("Terminal UI is gone, cancelling picker");
            return None;
        }
        answer.recv().ok().flatten()
    }
}
