use testgen::{
    Paths,
    plugins::{
        PluginError, SourceRegistry,
        sources::{self, RequirementsGenerator},
    },
};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Command {
    #[command(subcommand)]
    command: RequirementsCommand,
}

#[derive(Debug, clap::Parser)]
enum RequirementsCommand {
    /// Run requirements generators over their source directories
    #[command(visible_aliases = ["m", "mk"])]
    Make(Make),

    /// List the available requirements generators
    #[command(visible_aliases = ["l", "ls", "lp"])]
    ListPlugins,
}

impl Command {
    pub fn run(self, paths: &Paths) -> anyhow::Result<()> {
        let registry = SourceRegistry::builtin();
        match self.command {
            RequirementsCommand::Make(make) => make.run(paths, &registry),
            RequirementsCommand::ListPlugins => {
                for plugin in registry.iter() {
                    println!("{:<10} {}", plugin.name(), plugin.description().dim());
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, clap::Parser)]
pub struct Make {
    /// The generator to run, or 'all'
    #[arg(default_value = "all")]
    plugin: String,
}

impl Make {
    #[instrument(skip(registry))]
    fn run(self, paths: &Paths, registry: &SourceRegistry) -> anyhow::Result<()> {
        if self.plugin == "all" {
            return run_all(paths, registry);
        }

        let Some(plugin) = registry.get(&self.plugin) else {
            let available: Vec<&str> = registry.iter().map(|p| p.name()).collect();
            anyhow::bail!(
                "unknown requirements generator '{}' (available: {})",
                self.plugin,
                available.join(", ")
            );
        };
        run_one(plugin, paths)?;
        Ok(())
    }
}

fn run_all(paths: &Paths, registry: &SourceRegistry) -> anyhow::Result<()> {
    let mut ran = 0;
    let mut failed = 0;
    for plugin in registry.iter() {
        match run_one(plugin, paths) {
            Ok(()) => ran += 1,
            Err(PluginError::MissingInput(dir)) => {
                println!(
                    "{}",
                    format!("{}: skipped, {} not found", plugin.name(), dir.display()).dim()
                );
            }
            Err(e) => {
                eprintln!("{}", format!("{}: {e}", plugin.name()).error());
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} requirements generator(s) failed");
    }
    if ran == 0 {
        println!(
            "{}",
            format!(
                "No sources found. Add files under {}/<plugin>/",
                paths.sources().display()
            )
            .warning()
        );
    }
    Ok(())
}

fn run_one(plugin: &dyn RequirementsGenerator, paths: &Paths) -> Result<(), PluginError> {
    let (path, count) = sources::run(plugin, paths)?;
    println!(
        "{}",
        format!(
            "✅ {}: wrote {count} requirement(s) to {}",
            plugin.name(),
            path.display()
        )
        .success()
    );
    Ok(())
}
