use std::fs;

use anyhow::Context;
use testgen::Paths;
use tracing::instrument;

use super::terminal::Colorize;

/// The configuration written by `init`.
const STARTER_CONFIG: &str = r#"_version = "1"

[generation]
strategy = "full"
max_cases = 1000

[[sets]]
name = "default"

[[sets.dimensions]]
name = "Browser"
values = ["chrome", "firefox"]

[[sets.dimensions]]
name = "Locale"
values = ["en", "fr"]

[[sets.filters]]
kind = "exclude"
description = "firefox is not shipped in French"
matches = { Browser = "firefox", Locale = "fr" }
"#;

#[derive(Debug, clap::Parser)]
pub struct Init {}

impl Init {
    #[instrument]
    pub fn run(self, paths: &Paths) -> anyhow::Result<()> {
        let config = paths.config();
        if config.exists() {
            anyhow::bail!(
                "Project already initialized (found existing {})",
                config.display()
            );
        }

        fs::create_dir_all(paths.root())
            .with_context(|| format!("failed to create {}", paths.root().display()))?;
        fs::write(&config, STARTER_CONFIG)
            .with_context(|| format!("failed to write {}", config.display()))?;

        for source in ["markdown", "csv"] {
            let dir = paths.sources().join(source);
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        paths
            .setup_output()
            .context("failed to create output directories")?;

        println!(
            "{}",
            format!("Initialized project in {}", paths.root().display()).success()
        );
        println!("  Created: {}", config.display());
        println!("  Created: {}/{{markdown,csv}}/", paths.sources().display());
        println!();
        println!("Next steps:");
        println!("  {} requirements make", env!("CARGO_BIN_NAME"));
        println!("  {} test-cases make --dry-run", env!("CARGO_BIN_NAME"));

        Ok(())
    }
}
