use crate::tracing::{LogLevel, TracingFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pkgscope")]
#[command(about = "Inspect the package manager and workspaces of a JavaScript monorepo")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        long,
        global = true,
        env = "PKGSCOPE_CWD",
        help = "Project root to inspect",
        default_value = "."
    )]
    pub cwd: PathBuf,

    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(
        long = "log-format",
        global = true,
        env = "PKGSCOPE_LOG_FORMAT",
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,

    #[arg(
        long,
        global = true,
        env = "PKGSCOPE_PROBE_TIMEOUT",
        help = "Seconds to wait for `<manager> --version`",
        default_value_t = 10
    )]
    pub probe_timeout: u64,

    #[arg(long, global = true, help = "Print machine-readable JSON")]
    pub json: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Show the package manager governing the project")]
    Detect,
    #[command(about = "List the manifest of every workspace package")]
    Workspaces,
    #[command(about = "Show the package manager version, probing the executable if needed")]
    Version,
    #[command(about = "Show the tokens placed before forwarded script arguments")]
    Args,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["pkgscope", "detect"]).unwrap();

        assert_eq!(cli.command, Commands::Detect);
        assert_eq!(cli.cwd, PathBuf::from("."));
        assert_eq!(cli.level, LogLevel::Warn);
        assert_eq!(cli.log_format, TracingFormat::Compact);
        assert_eq!(cli.probe_timeout, 10);
        assert!(!cli.json);
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pkgscope",
            "workspaces",
            "--cwd",
            "/tmp/project",
            "--json",
            "-l",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.command, Commands::Workspaces);
        assert_eq!(cli.cwd, PathBuf::from("/tmp/project"));
        assert_eq!(cli.level, LogLevel::Debug);
        assert!(cli.json);
    }

    #[test]
    fn test_log_format_parsing() {
        let cli = Cli::try_parse_from(["pkgscope", "--log-format", "json", "args"]).unwrap();
        assert_eq!(cli.log_format, TracingFormat::Json);

        assert!(Cli::try_parse_from(["pkgscope", "--log-format", "xml", "args"]).is_err());
    }

    #[test]
    fn test_probe_timeout_must_be_numeric() {
        let cli = Cli::try_parse_from(["pkgscope", "--probe-timeout", "3", "version"]).unwrap();
        assert_eq!(cli.probe_timeout, 3);

        assert!(Cli::try_parse_from(["pkgscope", "--probe-timeout", "soon", "version"]).is_err());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["pkgscope"]).is_err());
    }
}
