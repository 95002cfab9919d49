use anyhow::Context;
use dialoguer::Confirm;
use testgen::Paths;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Clear {
    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,
}

impl Clear {
    #[instrument]
    pub fn run(self, paths: &Paths) -> anyhow::Result<()> {
        let output = paths.output();
        if !output.exists() {
            println!("{}", "Nothing to clear".dim());
            return Ok(());
        }

        if !self.yes {
            let confirmed = Confirm::new()
                .with_prompt(format!("Remove everything under {}?", output.display()))
                .default(false)
                .interact()?;
            if !confirmed {
                println!("Cancelled");
                return Ok(());
            }
        }

        paths
            .remove_output()
            .with_context(|| format!("failed to remove {}", output.display()))?;
        println!(
            "{}",
            format!("✅ Removed {}", output.display()).success()
        );
        Ok(())
    }
}
