//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use planning_core::{OutputMode, TracingOutputFormat};

/// planning-ics - publishes a physician's shifts from the clinic planning as a calendar feed
#[derive(Debug, Parser)]
#[command(name = "planning-ics")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "PLANNING_ICS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log format: pretty, compact or json
    #[arg(long, env = "PLANNING_ICS_LOG_FORMAT", global = true)]
    pub log_format: Option<TracingOutputFormat>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The subcommand to run; `serve` when none is given.
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Serve(ServeArgs::default()))
    }
}

/// Available commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Serve the calendar feed over HTTP (default)
    Serve(ServeArgs),

    /// Convert a saved planning page to ICS
    Render(RenderArgs),

    /// List the events of an ICS file
    Inspect(InspectArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides config and PORT)
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Planning HTML file, or `-` for stdin
    #[arg(long, short)]
    pub input: PathBuf,

    /// Where to write the ICS (stdout when omitted)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Time representation: utc or local-with-zone-id
    #[arg(long)]
    pub mode: Option<OutputMode>,

    /// IANA zone of the planning's times
    #[arg(long)]
    pub zone: Option<String>,

    /// Marker token to track
    #[arg(long)]
    pub marker: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    /// ICS file to read
    pub file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::try_parse_from(["planning-ics"]).unwrap();
        assert!(cli.command.is_none());
        assert!(matches!(cli.command(), Command::Serve(ServeArgs { port: None, bind: None })));
    }

    #[test]
    fn serve_flags() {
        let cli = Cli::try_parse_from(["planning-ics", "serve", "--port", "8080", "--bind", "127.0.0.1"])
            .unwrap();
        match cli.command() {
            Command::Serve(args) => {
                assert_eq!(args.port, Some(8080));
                assert_eq!(args.bind.as_deref(), Some("127.0.0.1"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn render_flags() {
        let cli = Cli::try_parse_from([
            "planning-ics",
            "render",
            "--input",
            "planning.htm",
            "--mode",
            "utc",
            "--marker",
            "AB",
            "--debug",
        ])
        .unwrap();
        assert!(cli.debug);
        match cli.command() {
            Command::Render(args) => {
                assert_eq!(args.input, PathBuf::from("planning.htm"));
                assert_eq!(args.mode, Some(OutputMode::Utc));
                assert_eq!(args.marker.as_deref(), Some("AB"));
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(
            Cli::try_parse_from(["planning-ics", "render", "-i", "x.htm", "--mode", "floating"])
                .is_err()
        );
    }

    #[test]
    fn global_log_format() {
        let cli = Cli::try_parse_from(["planning-ics", "inspect", "feed.ics", "--log-format", "json"])
            .unwrap();
        assert_eq!(cli.log_format, Some(TracingOutputFormat::Json));
        assert!(matches!(cli.command(), Command::Inspect(InspectArgs { .. })));
    }
}
