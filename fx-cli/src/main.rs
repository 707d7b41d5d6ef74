//! teamsfx CLI: scaffold, provision, deploy and debug a Teams bot. Config from env and `.env`.

use anyhow::Result;
use clap::Parser;
use fx_cli::{execute, App, Cli};
use fx_core::{init_tracing, FxError};
use teams_bot::FxConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = FxConfig::load()?;
    config.validate()?;
    init_tracing(&config.log_file)?;

    let app = App::from_config(&config).await?;
    match execute(&cli, &app).await {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
            Ok(())
        }
        Err(e) => {
            if let Some(fx) = e.downcast_ref::<FxError>() {
                eprintln!("[{}] {}: {}", fx.category(), fx.name(), fx);
                for suggestion in fx.suggestions() {
                    eprintln!("  - {}", suggestion);
                }
                if let Some(link) = fx.help_link() {
                    eprintln!("  See {}", link);
                }
                std::process::exit(1);
            }
            Err(e)
        }
    }
}
