//! CLI commands

pub mod apply;
pub mod config;
pub mod delete;
pub mod list;
pub mod ping;
pub mod show;

pub use apply::ApplyCommand;
pub use config::ConfigCommand;
pub use delete::DeleteCommand;
pub use list::ListCommand;
pub use ping::PingCommand;
pub use show::ShowCommand;
