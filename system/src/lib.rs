pub mod config;
pub mod machine;
pub mod pty;

pub use config::{ConfigError, SystemConfig};
pub use machine::System;
pub use pty::UnixPty;
