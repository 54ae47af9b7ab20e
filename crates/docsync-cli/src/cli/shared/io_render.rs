use super::*;

/// Worker stdout goes to stdout, everything else to stderr.
pub(in crate::cli) fn print_log_line(stream: OutputStream, line: &str) {
    match stream {
        OutputStream::Stdout => println!("{line}"),
        OutputStream::Stderr => eprintln!("{line}"),
        OutputStream::System => eprintln!("[docsync] {line}"),
    }
}

/// Mirrors the worker's exit code where it fits in a process exit status.
pub(in crate::cli) fn exit_code_for(finished: &Finished) -> ExitCode {
    if finished.success {
        return ExitCode::SUCCESS;
    }
    match finished.exit_code.and_then(|code| u8::try_from(code).ok()) {
        Some(code) if code != 0 => ExitCode::from(code),
        _ => ExitCode::FAILURE,
    }
}

pub(in crate::cli) fn mask_secret(secret: &str) -> String {
    let secret = secret.trim();
    if secret.is_empty() {
        return "<unset>".to_string();
    }
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "*".repeat(secret.chars().count())
    } else {
        format!("{visible}{}", "*".repeat(8))
    }
}

pub(in crate::cli) fn format_task_line(index: usize, task: &Task) -> String {
    let mut flags = Vec::new();
    if !task.enabled {
        flags.push("disabled");
    }
    if task.force {
        flags.push("force");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };
    let vault = task
        .vault_root
        .as_deref()
        .map(|root| format!(" vault={root}"))
        .unwrap_or_default();
    format!(
        "{index}: {} | {} -> {}{vault}{flags}",
        task.note, task.local_path, task.cloud_token
    )
}
