//! CLI command definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use panelsmith::{JsonKind, MigrationOptions};
use std::path::PathBuf;

/// Panelsmith - reliability tools for LLM-driven manga pre-production
#[derive(Parser, Debug)]
#[command(name = "panelsmith")]
#[command(about = "Reliability tools for LLM-driven manga pre-production", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert legacy keyframe shot prompts to the 3x3 storyboard format
    MigrateShotPrompts(MigrateArgs),

    /// Print the JSON value recovered from a model reply
    Extract {
        /// File holding the reply; stdin when omitted
        file: Option<PathBuf>,

        /// Required top-level kind
        #[arg(long)]
        expect: Option<ExpectedKind>,
    },
}

/// Arguments of `migrate-shot-prompts`
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Count what would change without writing (default)
    #[arg(long, conflicts_with = "apply")]
    pub dry_run: bool,

    /// Write converted prompts back
    #[arg(long)]
    pub apply: bool,

    /// Maximum scenes to scan; 0 scans all
    #[arg(long, default_value_t = 0)]
    pub limit: usize,

    /// Restrict the scan to one project
    #[arg(long)]
    pub project_id: Option<String>,
}

impl MigrateArgs {
    /// Migration options for these flags.
    pub fn options(&self) -> MigrationOptions {
        let base = if self.apply {
            MigrationOptions::apply()
        } else {
            MigrationOptions::dry_run()
        };
        let base = base.with_limit(self.limit);
        match &self.project_id {
            Some(project_id) => base.with_project_id(project_id.clone()),
            None => base,
        }
    }
}

/// Top-level JSON kind accepted by `extract --expect`
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ExpectedKind {
    /// `{ ... }`
    Object,
    /// `[ ... ]`
    Array,
}

impl From<ExpectedKind> for JsonKind {
    fn from(kind: ExpectedKind) -> Self {
        match kind {
            ExpectedKind::Object => JsonKind::Object,
            ExpectedKind::Array => JsonKind::Array,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelsmith::MigrationMode;

    #[test]
    fn test_migrate_defaults_to_dry_run() {
        let cli = Cli::try_parse_from(["panelsmith", "migrate-shot-prompts"]).unwrap();
        let Commands::MigrateShotPrompts(args) = cli.command else {
            panic!("expected migrate-shot-prompts");
        };
        assert_eq!(args.options().mode(), MigrationMode::DryRun);
    }

    #[test]
    fn test_migrate_apply_with_filters() {
        let cli = Cli::try_parse_from([
            "panelsmith",
            "--verbose",
            "migrate-shot-prompts",
            "--apply",
            "--limit",
            "50",
            "--project-id",
            "p7",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::MigrateShotPrompts(args) = cli.command else {
            panic!("expected migrate-shot-prompts");
        };
        let options = args.options();
        assert_eq!(options.mode(), MigrationMode::Apply);
        assert_eq!(options.limit, 50);
        assert_eq!(options.project_id.as_deref(), Some("p7"));
    }

    #[test]
    fn test_dry_run_and_apply_conflict() {
        let parsed =
            Cli::try_parse_from(["panelsmith", "migrate-shot-prompts", "--dry-run", "--apply"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_extract_reads_stdin_without_file() {
        let cli = Cli::try_parse_from(["panelsmith", "extract", "--expect", "array"]).unwrap();
        let Commands::Extract { file, expect } = cli.command else {
            panic!("expected extract");
        };
        assert!(file.is_none());
        assert_eq!(expect.map(JsonKind::from), Some(JsonKind::Array));
    }
}
