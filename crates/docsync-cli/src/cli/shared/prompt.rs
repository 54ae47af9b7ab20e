use super::*;
use docsync_core::picker::PickRequest;

/// Answers `select-folder` / `select-file` from a line typed on stdin.
pub(in crate::cli) struct StdinPicker;

impl PathPicker for StdinPicker {
    fn pick(&self, request: &PickRequest) -> Option<PathBuf> {
        let start = request
            .start
            .as_ref()
            .map(|dir| format!(" [relative to {}]", dir.display()))
            .unwrap_or_default();
        let answer = match prompt_line(&format!("{}{start} (empty to cancel): ", request.title())) {
            Ok(answer) => answer,
            Err(err) => {
                warn!(error = %err, "Failed to read path from stdin");
                return None;
            }
        };
        let answer = answer.trim();
        if answer.is_empty() {
            return None;
        }
        let path = PathBuf::from(answer);
        match (&request.start, path.is_relative()) {
            (Some(start), true) => Some(start.join(path)),
            _ => Some(path),
        }
    }
}

pub(in crate::cli) fn confirm(question: &str) -> anyhow::Result<bool> {
    let answer = prompt_line(&format!("{question} [y/N]: "))?;
    Ok(parse_yes(&answer))
}

pub(in crate::cli) fn parse_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn prompt_line(prompt: &str) -> anyhow::Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{prompt}").context("write prompt")?;
    stderr.flush().context("flush prompt")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read stdin")?;
    Ok(line)
}
