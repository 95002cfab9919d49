use anyhow::Context;
use clap::builder::PossibleValuesParser;
use testgen::{
    Config, Paths,
    plugins::{
        MarkupRegistry,
        markup::{self, DEFAULT_FORMAT},
    },
    storage::{clear_directory, requirements, test_cases},
};
use tracing::instrument;

use super::terminal::{self, Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    #[command(subcommand)]
    command: TestCasesCommand,
}

#[derive(Debug, clap::Parser)]
enum TestCasesCommand {
    /// Generate test cases from the requirements and the configuration
    #[command(visible_aliases = ["m", "mk"])]
    Make(Make),

    /// Render saved test cases with a markup plugin
    #[command(visible_aliases = ["mup", "markup"])]
    MarkupPreview(MarkupPreview),
}

impl Command {
    pub fn run(self, paths: &Paths) -> anyhow::Result<()> {
        match self.command {
            TestCasesCommand::Make(command) => command.run(paths),
            TestCasesCommand::MarkupPreview(command) => command.run(paths),
        }
    }
}

#[derive(Debug, clap::Parser)]
pub struct Make {
    /// Print a summary instead of saving
    #[arg(short, long)]
    dry_run: bool,
}

impl Make {
    #[instrument]
    fn run(self, paths: &Paths) -> anyhow::Result<()> {
        let store = requirements::load(&paths.requirements()).with_context(|| {
            format!(
                "failed to load requirements (run `{} requirements make` first?)",
                env!("CARGO_BIN_NAME")
            )
        })?;
        let config = Config::load(&paths.config())?;
        config.check_references(|id| store.contains(id))?;

        let generation = testgen::run(&store, &config);

        for report in &generation.reports {
            for gap in &report.gaps {
                println!(
                    "{}",
                    format!(
                        "{}: {} has no applicable '{}' values",
                        report.set, gap.requirement, gap.dimension
                    )
                    .dim()
                );
            }
        }

        if self.dry_run {
            println!("{}", test_cases::summary(&generation.cases));
            return Ok(());
        }

        let dir = paths.test_cases();
        clear_directory(&dir).with_context(|| format!("failed to clear {}", dir.display()))?;
        let written = test_cases::save(&generation.cases, &dir)?;

        println!(
            "{}",
            format!(
                "✅ Saved {} test case(s) to {}",
                written.len(),
                dir.display()
            )
            .success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct MarkupPreview {
    /// The output format
    #[arg(long, short, default_value = DEFAULT_FORMAT, value_parser = format_parser())]
    format: String,

    /// Print rendered test cases instead of writing files
    #[arg(short, long)]
    dry_run: bool,
}

/// Restricts `--format` to the registered markup plugins.
fn format_parser() -> PossibleValuesParser {
    let names: Vec<&'static str> = MarkupRegistry::builtin().names().collect();
    PossibleValuesParser::new(names)
}

impl MarkupPreview {
    #[instrument]
    fn run(self, paths: &Paths) -> anyhow::Result<()> {
        let registry = MarkupRegistry::builtin();
        let plugin = registry
            .get(&self.format)
            .with_context(|| format!("unknown markup format '{}'", self.format))?;

        let source = paths.test_cases();
        let cases = test_cases::load(&source)?;
        if cases.is_empty() {
            anyhow::bail!(
                "no test cases found in {} (run `{} test-cases make` first)",
                source.display(),
                env!("CARGO_BIN_NAME")
            );
        }

        if self.dry_run {
            let mut failed = 0;
            for rendered in markup::render_all(plugin, &cases) {
                match rendered.result {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        eprintln!("{}", format!("{}: {e}", rendered.case).error());
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                anyhow::bail!("{failed} test case(s) failed to render");
            }
            return Ok(());
        }

        let dir = paths.rendered();
        clear_directory(&dir).with_context(|| format!("failed to clear {}", dir.display()))?;

        let progress = terminal::progress_bar(cases.len(), "Rendering");
        let report = markup::render_to_dir(plugin, &cases, &dir, || progress.inc(1));
        progress.finish_and_clear();

        for failure in &report.failures {
            eprintln!("{}", format!("{}: {}", failure.case, failure.error).error());
        }
        if !report.failures.is_empty() {
            anyhow::bail!(
                "{} of {} test case(s) failed to render",
                report.failures.len(),
                cases.len()
            );
        }

        println!(
            "{}",
            format!(
                "✅ Rendered {} test case(s) to {}",
                report.written.len(),
                dir.display()
            )
            .success()
        );
        Ok(())
    }
}
