use std::process::ExitCode;

mod cli;
mod logging;
mod session;
mod tui;
mod ui_state;

fn main() -> anyhow::Result<ExitCode> {
    cli::run()
}
