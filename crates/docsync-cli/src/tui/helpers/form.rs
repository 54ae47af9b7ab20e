use super::*;

pub(in crate::tui) const NOTE_FIELD: usize = 0;
pub(in crate::tui) const LOCAL_FIELD: usize = 1;
pub(in crate::tui) const CLOUD_FIELD: usize = 2;
pub(in crate::tui) const VAULT_FIELD: usize = 3;
pub(in crate::tui) const ENABLED_FIELD: usize = 4;
pub(in crate::tui) const FORCE_FIELD: usize = 5;

pub(in crate::tui) fn task_form_fields(task: Option<&Task>) -> Vec<InputField> {
    let task = task.cloned().unwrap_or_default();
    vec![
        InputField::new("Note").with_value(task.note),
        InputField::new("Local path (folder or .md)").with_value(task.local_path),
        InputField::new("Cloud token").with_value(task.cloud_token),
        InputField::new("Vault root (optional)").with_value(task.vault_root.unwrap_or_default()),
        InputField::new("Enabled (y/n)").with_value(yes_no(task.enabled)),
        InputField::new("Force (y/n)").with_value(yes_no(task.force)),
    ]
}

/// Builds a task from the form, keeping unknown keys from `base`.
pub(in crate::tui) fn task_from_fields(fields: &[InputField], base: Task) -> Result<Task, String> {
    let value = |index: usize| {
        fields
            .get(index)
            .map(|field| field.value.trim().to_string())
            .unwrap_or_default()
    };
    let enabled = parse_yes_no(&value(ENABLED_FIELD))
        .ok_or_else(|| "Enabled must be y or n".to_string())?;
    let force =
        parse_yes_no(&value(FORCE_FIELD)).ok_or_else(|| "Force must be y or n".to_string())?;
    let task = Task {
        note: value(NOTE_FIELD),
        local_path: value(LOCAL_FIELD),
        cloud_token: value(CLOUD_FIELD),
        vault_root: optional_text(&value(VAULT_FIELD)),
        enabled,
        force,
        ..base
    };
    task.validate().map_err(|err| err.to_string())?;
    Ok(task)
}

pub(in crate::tui) fn credentials_fields(app_id: &str) -> Vec<InputField> {
    vec![
        InputField::new("App id").with_value(app_id),
        InputField::with_mask("App secret"),
    ]
}

pub(in crate::tui) fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub(in crate::tui) fn parse_yes_no(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Some(true),
        "n" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "y" } else { "n" }
}

/// Field a picker result should land in.
pub(in crate::tui) fn pick_target_field(current: usize, kind: PickKind) -> usize {
    match kind {
        PickKind::Folder if current == VAULT_FIELD => VAULT_FIELD,
        _ => LOCAL_FIELD,
    }
}
