use clap::Parser;
use std::path::PathBuf;

use crate::ipc::{ServiceTarget, DEFAULT_PACKAGE};

/// Default application title, shown while no run has produced output
pub const APP_NAME: &str = "runbridge";

/// Command line options
#[derive(Debug, Parser)]
#[command(name = "runbridge", version, about = "Launch run configurations on a worker process")]
pub struct Cli {
    /// Package the worker belongs to
    #[arg(long, env = "RUNBRIDGE_PACKAGE", default_value = DEFAULT_PACKAGE)]
    pub package: String,

    /// Action the worker answers to (defaults to <package>.RemoteService)
    #[arg(long, env = "RUNBRIDGE_ACTION")]
    pub action: Option<String>,

    /// Socket the worker listens on, overriding the runtime directory lookup
    #[arg(long, env = "RUNBRIDGE_SOCKET")]
    pub socket: Option<PathBuf>,

    /// Log file (the terminal belongs to the UI)
    #[arg(long, env = "RUNBRIDGE_LOG")]
    pub log_file: Option<PathBuf>,

    /// Title shown while nothing is running
    #[arg(long, default_value = APP_NAME)]
    pub title: String,
}

/// Resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub target: ServiceTarget,
    pub log_file: PathBuf,
    pub title: String,
}

impl Cli {
    pub fn into_settings(self) -> Settings {
        let action = self
            .action
            .unwrap_or_else(|| ServiceTarget::default_action(&self.package));
        let mut target = ServiceTarget::new(self.package, action);
        if let Some(socket) = self.socket {
            target = target.with_socket(socket);
        }

        let log_file = self.log_file.unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_NAME)
                .join(format!("{}.log", APP_NAME))
        });

        Settings {
            target,
            log_file,
            title: self.title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Cli::try_parse_from(["runbridge"]).unwrap().into_settings();

        assert_eq!(settings.target.package, DEFAULT_PACKAGE);
        assert_eq!(settings.target.action, "org.xprolog.xp.RemoteService");
        assert_eq!(settings.title, APP_NAME);
        assert!(settings.log_file.ends_with("runbridge/runbridge.log"));
    }

    #[test]
    fn test_action_follows_package() {
        let settings = Cli::try_parse_from(["runbridge", "--package", "com.example"])
            .unwrap()
            .into_settings();
        assert_eq!(settings.target.action, "com.example.RemoteService");
    }

    #[test]
    fn test_explicit_socket_and_action() {
        let settings = Cli::try_parse_from([
            "runbridge",
            "--action",
            "custom.Action",
            "--socket",
            "/tmp/custom.sock",
            "--title",
            "Console",
        ])
        .unwrap()
        .into_settings();

        assert_eq!(settings.target.action, "custom.Action");
        assert_eq!(settings.target.socket, PathBuf::from("/tmp/custom.sock"));
        assert_eq!(settings.title, "Console");
    }
}
