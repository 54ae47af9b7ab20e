use super::*;

mod browse;
mod core;
mod forms;
mod main_view;
mod tasks;
