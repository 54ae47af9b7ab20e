use super::*;

mod browser;
mod form;
mod layout;

pub(in crate::tui) use browser::*;
pub(in crate::tui) use form::*;
pub(in crate::tui) use layout::*;
