use super::*;

/// In-terminal folder/file chooser answering one `PickPrompt`.
pub(in crate::tui) struct BrowserState {
    pub(in crate::tui) request: PickRequest,
    pub(in crate::tui) dir: PathBuf,
    pub(in crate::tui) entries: Vec<BrowserEntry>,
    pub(in crate::tui) selected: usize,
    pub(in crate::tui) error: Option<String>,
    reply: Option<mpsc::Sender<Option<PathBuf>>>,
}

impl BrowserState {
    pub(in crate::tui) fn open(prompt: PickPrompt) -> Self {
        let dir = prompt
            .request
            .start
            .clone()
            .filter(|dir| dir.is_dir())
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("/"));
        let mut state = Self {
            request: prompt.request,
            dir,
            entries: Vec::new(),
            selected: 0,
            error: None,
            reply: Some(prompt.reply),
        };
        state.load();
        state
    }

    fn load(&mut self) {
        self.selected = 0;
        match list_entries(&self.dir, self.request.kind) {
            Ok(entries) => {
                self.entries = entries;
                self.error = None;
            }
            Err(err) => {
                warn!(dir = %self.dir.display(), error = %format!("{err:#}"), "Failed to list directory");
                self.entries.clear();
                self.error = Some(format!("{err:#}"));
            }
        }
    }

    pub(in crate::tui) fn current(&self) -> Option<&BrowserEntry> {
        self.entries.get(self.selected)
    }

    pub(in crate::tui) fn move_selection(&mut self, delta: isize) {
        self.selected = step_index(self.selected, delta, self.entries.len());
    }

    pub(in crate::tui) fn enter(&mut self, dir: PathBuf) {
        self.dir = dir;
        self.load();
    }

    pub(in crate::tui) fn parent(&mut self) {
        let Some(parent) = self.dir.parent().map(PathBuf::from) else {
            return;
        };
        let previous = self.dir.clone();
        self.enter(parent);
        if let Some(index) = self.entries.iter().position(|entry| entry.path == previous) {
            self.selected = index;
        }
    }

    pub(in crate::tui) fn is_folder_pick(&self) -> bool {
        self.request.kind == PickKind::Folder
    }

    /// Sends the answer back to the waiting picker. Only the first call counts.
    pub(in crate::tui) fn finish(&mut self, path: Option<PathBuf>) {
        if let Some(reply) = self.reply.take()
            && reply.send(path).is_err()
        {
            debug!("Picker stopped waiting before an answer arrived");
        }
    }
}
