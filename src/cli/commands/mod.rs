pub mod config;
pub mod finalize;
pub mod init;
pub mod log;
pub mod manage;
pub mod photo;
pub mod status;
pub mod task;
pub mod template;
pub mod watch;
