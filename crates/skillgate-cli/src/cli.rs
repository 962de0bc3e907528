//! CLI argument definitions for SkillGate.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// SkillGate -- match requests to scripted skills and run them safely.
#[derive(Parser)]
#[command(
    name = "skillgate",
    version,
    about = "SkillGate -- intent matching and approval-gated skill execution",
    long_about = "Matches free-text requests against a catalog of scripted skills and runs \
                  their tool sequences with safety checks, capability checks, and per-step \
                  approval."
)]
pub struct Cli {
    /// Configuration file.
    #[arg(long, short, global = true, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Skills directory; overrides the configured one.
    #[arg(long, global = true)]
    pub skills: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every skill in the catalog.
    List,

    /// Score a request against the catalog.
    Match {
        /// The request text.
        text: String,

        /// Show every candidate, ignoring the minimum confidence.
        #[arg(long)]
        all: bool,
    },

    /// Check whether a skill's tools are available.
    Check {
        /// Skill identifier.
        skill_id: String,
    },

    /// Run a skill.
    Run {
        /// Skill identifier.
        skill_id: String,

        /// Parameter as `key=value`; may be repeated.
        #[arg(long = "param", short, value_parser = parse_key_value)]
        params: Vec<(String, String)>,

        /// Original user request, checked for emergency keywords.
        #[arg(long)]
        input: Option<String>,

        /// Approve every gated step without asking.
        #[arg(long, short)]
        yes: bool,
    },

    /// Answer a chat message through the fast path.
    Chat {
        /// The chat message.
        text: String,

        /// Approve every gated step without asking.
        #[arg(long, short)]
        yes: bool,
    },
}

/// Split `key=value`.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in `{raw}`"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_pairs() {
        assert_eq!(
            parse_key_value("quantity=2").unwrap(),
            ("quantity".to_owned(), "2".to_owned())
        );
        assert_eq!(
            parse_key_value("note=a=b").unwrap(),
            ("note".to_owned(), "a=b".to_owned())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn run_arguments() {
        let cli = Cli::try_parse_from([
            "skillgate", "--skills", "demo", "run", "order_groceries", "-p", "quantity=2", "--yes",
        ])
        .unwrap();
        assert_eq!(cli.skills, Some(PathBuf::from("demo")));
        match cli.command {
            Commands::Run {
                skill_id,
                params,
                yes,
                input,
            } => {
                assert_eq!(skill_id, "order_groceries");
                assert_eq!(params, [("quantity".to_owned(), "2".to_owned())]);
                assert!(yes);
                assert!(input.is_none());
            }
            _ => panic!("expected run"),
        }
    }
}
