use super::*;

mod bridge;
mod io_render;
mod prompt;

pub(in crate::cli) use bridge::*;
pub(in crate::cli) use io_render::*;
pub(in crate::cli) use prompt::*;
