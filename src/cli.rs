use std::path::PathBuf;

mod clear;
mod init;
mod requirements;
mod terminal;
mod test_cases;

use clap::ArgAction;
use clear::Clear;
use init::Init;
use testgen::Paths;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the root of the project
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.run(&Paths::new(self.root))
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Generate requirement files from external sources
    #[command(visible_aliases = ["r", "req"])]
    Requirements(requirements::Command),

    /// Generate, preview, and render test cases
    #[command(visible_aliases = ["t", "tc", "tests"])]
    TestCases(test_cases::Command),

    /// Remove everything the tool has generated
    Clear(Clear),

    /// Create a starter configuration and directory layout
    Init(Init),
}

impl Command {
    fn run(self, paths: &Paths) -> anyhow::Result<()> {
        match self {
            Self::Requirements(command) => command.run(paths),
            Self::TestCases(command) => command.run(paths),
            Self::Clear(command) => command.run(paths),
            Self::Init(command) => command.run(paths),
        }
    }
}
