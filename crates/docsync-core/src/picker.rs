use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension filter for the file chooser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileFilter {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
}

impl FileFilter {
    pub const MARKDOWN: FileFilter = FileFilter {
        name: "Markdown",
        extensions: &["md", "markdown"],
    };

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickKind {
    Folder,
    File(FileFilter),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickRequest {
    pub kind: PickKind,
    pub start: Option<PathBuf>,
}

impl PickRequest {
    pub fn folder(start: Option<PathBuf>) -> Self {
        Self {
            kind: PickKind::Folder,
            start,
        }
    }

    pub fn markdown_file(start: Option<PathBuf>) -> Self {
        Self {
            kind: PickKind::File(FileFilter::MARKDOWN),
            start,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            PickKind::Folder => "Select folder",
            PickKind::File(_) => "Select Markdown file",
        }
    }

    /// Whether `path` is an acceptable answer for this request.
    pub fn accepts(&self, path: &Path) -> bool {
        match self.kind {
            PickKind::Folder => path.is_dir(),
            PickKind::File(filter) => path.is_file() && filter.matches(path),
        }
    }
}

/// Host-supplied chooser behind `select-folder` and `select-file`.
/// Blocking; `None` means the user cancelled.
pub trait PathPicker: Send + Sync {
    fn pick(&self, request: &PickRequest) -> Option<PathBuf>;
}

/// Picker for hosts with no interactive chooser. Always cancels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPicker;

impl PathPicker for NoPicker {
    fn pick(&self, _request: &PickRequest) -> Option<PathBuf> {
        None
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrowserEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Visible entries of `dir` for an in-terminal browser: directories first,
/// then (for file requests) matching files, each group sorted case-insensitively.
pub fn list_entries(dir: &Path, kind: PickKind) -> anyhow::Result<Vec<BrowserEntry>> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))? {
        let entry = entry.context("read directory entry")?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            dirs.push(BrowserEntry {
                name,
                path,
                is_dir: true,
            });
        } else if let PickKind::File(filter) = kind {
            if filter.matches(&path) {
                files.push(BrowserEntry {
                    name,
                    path,
                    is_dir: false,
                });
            }
        }
    }
    dirs.sort_by_key(|entry| entry.name.to_lowercase());
    files.sort_by_key(|entry| entry.name.to_lowercase());
    dirs.extend(files);
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn markdown_filter_is_case_insensitive() {
        assert!(FileFilter::MARKDOWN.matches(Path::new("notes/README.MD")));
        assert!(FileFilter::MARKDOWN.matches(Path::new("a.markdown")));
        assert!(!FileFilter::MARKDOWN.matches(Path::new("a.txt")));
        assert!(!FileFilter::MARKDOWN.matches(Path::new("md")));
    }

    #[test]
    fn lists_dirs_first_and_hides_dotfiles() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("zeta")).unwrap();
        fs::create_dir(tmp.path().join("Alpha")).unwrap();
        fs::create_dir(tmp.path().join(".git")).unwrap();
        fs::write(tmp.path().join("b.md"), "# b").unwrap();
        fs::write(tmp.path().join("A.md"), "# a").unwrap();
        fs::write(tmp.path().join("c.txt"), "c").unwrap();

        let folders = list_entries(tmp.path(), PickKind::Folder).unwrap();
        let names: Vec<_> = folders.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "zeta"]);

        let files = list_entries(tmp.path(), PickKind::File(FileFilter::MARKDOWN)).unwrap();
        let names: Vec<_> = files.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "zeta", "A.md", "b.md"]);
        assert!(!files[2].is_dir);
    }

    #[test]
    fn request_accepts_matching_kind_only() {
        let tmp = TempDir::new().unwrap();
        let doc = tmp.path().join("doc.md");
        fs::write(&doc, "# doc").unwrap();

        let folder = PickRequest::folder(None);
        assert!(folder.accepts(tmp.path()));
        assert!(!folder.accepts(&doc));

        let file = PickRequest::markdown_file(None);
        assert!(file.accepts(&doc));
        assert!(!file.accepts(tmp.path()));
        assert!(!file.accepts(&tmp.path().join("missing.md")));
    }

    #[test]
    fn no_picker_cancels() {
        assert_eq!(NoPicker.pick(&PickRequest::folder(None)), None);
    }
}
