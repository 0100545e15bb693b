#![allow(dead_code)]

use once_cell::sync::Lazy;
use ssh_node::services::logger::{LogLevel, Logger};
use ssh_node::SshParams;
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub fn quiet_logger() -> Logger {
    Logger::with_level("test", LogLevel::Error)
}

pub fn connection() -> SshParams {
    SshParams {
        host: Some("192.168.0.1".to_string()),
        user: Some("nci".to_string()),
        identity_file: Some("~/.ssh/id_rsa_01".to_string()),
        ..SshParams::default()
    }
}
