use crate::logging::{self, LogBuffer, LogOutput};
use crate::session::SessionController;
use crate::tui;
use crate::ui_state::UiStateStore;
use anyhow::Context;
use clap::Parser;
use docsync_core::bridge::{Bridge, RunSyncRequest};
use docsync_core::config::{ConfigPatch, ConfigStore, Task};
use docsync_core::deployment::{
    DeploymentMode, RuntimeLayout, default_log_dir, default_ui_state_path,
};
use docsync_core::events::{BridgeEvent, EventStream, Finished, OutputStream};
use docsync_core::launch::LaunchOverrides;
use docsync_core::picker::{NoPicker, PathPicker};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{info, warn};

mod app;
mod args;
mod config_cmd;
mod shared;
mod sync_cmd;
mod task_cmd;

use args::*;

use config_cmd::handle_config;
use shared::{
    StdinPicker, confirm, exit_code_for, format_task_line, mask_secret, open_bridge,
    wait_for_finish,
};
use sync_cmd::{handle_clean, handle_health, handle_sync};
use task_cmd::handle_task;

pub fn run() -> anyhow::Result<ExitCode> {
    app::run()
}
