//! CLI command implementations

pub mod domains;
pub mod init;
pub mod run;
