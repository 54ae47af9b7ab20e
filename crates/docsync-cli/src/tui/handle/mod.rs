use super::*;

mod browse;
mod dispatch;
mod forms;
mod main_view;
mod tasks;
