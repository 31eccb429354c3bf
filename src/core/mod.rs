pub mod checklist;
pub mod clock;
pub mod config;
pub mod finalize;
pub mod lease;
pub mod log;
pub mod merger;
pub mod photo;
pub mod resolver;
pub mod scheduler;
pub mod session;
pub mod template;
