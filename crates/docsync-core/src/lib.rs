pub mod bridge;
pub mod config;
pub mod deployment;
pub mod events;
pub mod launch;
pub mod lockfile;
pub mod picker;
pub mod session;
pub mod supervisor;
