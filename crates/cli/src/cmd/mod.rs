//! CLI command implementations

pub mod changes;
pub mod history;
pub mod list;
pub mod save;
pub mod start;
pub mod status;
pub mod stop;
