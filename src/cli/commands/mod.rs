//! CLI command implementations.

mod batch;
mod chat;
mod config;
mod doctor;
mod files;
mod init;
mod run;

pub use batch::run_batch;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use files::run_files;
pub use init::run_init;
pub use run::run_single;
