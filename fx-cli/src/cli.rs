//! CLI parser.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "teamsfx")]
#[command(about = "Teams bot lifecycle: scaffold, provision, deploy, local debug", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Project root; the bot code lives in `<dir>/bot` (C#: the root itself).
    #[arg(long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    /// Environment whose configuration is read and written.
    #[arg(long, global = true, default_value = "dev")]
    pub env: String,

    /// Application name used to derive Azure resource names.
    #[arg(long, global = true, default_value = "teamsfx-bot")]
    pub app_name: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Scaffold the bot project from a template.
    Init {
        /// javascript, typescript or csharp.
        #[arg(short, long)]
        language: String,
        /// create-new or reuse-existing.
        #[arg(long, default_value = "create-new")]
        way: String,
        /// Comma separated: bot, messaging-extension.
        #[arg(long, default_value = "bot")]
        capabilities: String,
        /// app-service or azure-functions.
        #[arg(long)]
        host_type: Option<String>,
        /// Required with `--way reuse-existing`.
        #[arg(long)]
        bot_id: Option<String>,
        #[arg(long)]
        bot_password: Option<String>,
    },
    /// Register the bot and create the Azure hosting resources.
    Provision,
    /// Build, package and upload the bot when it changed.
    Deploy,
    /// Register a local debug bot and point it at a tunnel endpoint.
    LocalDebug {
        /// Public HTTPS endpoint forwarding to the local bot.
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Print the stored configuration of the environment, secrets masked.
    ShowConfig,
    /// Store one value, e.g. values normally provided by other plugins.
    Set {
        plugin: String,
        key: String,
        value: String,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Init { .. } => "init",
            Commands::Provision => "provision",
            Commands::Deploy => "deploy",
            Commands::LocalDebug { .. } => "local-debug",
            Commands::ShowConfig => "show-config",
            Commands::Set { .. } => "set",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_init_with_globals() {
        let cli = Cli::try_parse_from([
            "teamsfx",
            "--env",
            "staging",
            "init",
            "--language",
            "typescript",
            "--capabilities",
            "bot,messaging-extension",
        ])
        .unwrap();

        assert_eq!(cli.env, "staging");
        assert_eq!(cli.project_dir, PathBuf::from("."));
        match cli.command {
            Commands::Init {
                language,
                way,
                capabilities,
                bot_id,
                ..
            } => {
                assert_eq!(language, "typescript");
                assert_eq!(way, "create-new");
                assert_eq!(capabilities, "bot,messaging-extension");
                assert!(bot_id.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_set_and_global_after_subcommand() {
        let cli = Cli::try_parse_from([
            "teamsfx",
            "set",
            "solution",
            "location",
            "eastus",
            "--app-name",
            "My Bot",
        ])
        .unwrap();

        assert_eq!(cli.app_name, "My Bot");
        assert_eq!(
            cli.command,
            Commands::Set {
                plugin: "solution".to_string(),
                key: "location".to_string(),
                value: "eastus".to_string(),
            }
        );
    }

    #[test]
    fn test_init_requires_language() {
        assert!(Cli::try_parse_from(["teamsfx", "init"]).is_err());
    }
}
