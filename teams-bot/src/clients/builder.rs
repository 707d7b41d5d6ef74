//! Local build step run before packaging.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fx_core::{FxError, FxResult, PackageSource, ProgrammingLanguage};
use tokio::process::Command;
use tracing::{debug, info};

pub const DEFAULT_DOTNET_FRAMEWORK: &str = "net6.0";

#[async_trait]
pub trait LocalBuilder: Send + Sync {
    /// Builds the project in `working_dir` and returns the folder to package.
    async fn build(&self, language: ProgrammingLanguage, working_dir: &Path) -> FxResult<PathBuf>;
}

/// Runs the language build commands through the platform shell.
#[derive(Debug, Clone, Default)]
pub struct CommandBuilder;

impl CommandBuilder {
    async fn run(&self, command: &str, dir: &Path) -> FxResult<()> {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(command);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(command);
            c
        };
        let fail = |message: String| FxError::CommandExecution {
            command: command.to_string(),
            dir: dir.display().to_string(),
            message,
        };

        debug!(command = %command, dir = %dir.display(), "running build command");
        let output = cmd
            .current_dir(dir)
            .output()
            .await
            .map_err(|e| fail(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(fail(format!("{}: {}", output.status, stderr)));
        }
        Ok(())
    }
}

#[async_trait]
impl LocalBuilder for CommandBuilder {
    async fn build(&self, language: ProgrammingLanguage, working_dir: &Path) -> FxResult<PathBuf> {
        let strategy = language.strategy();
        for command in strategy.build_commands {
            self.run(command, working_dir).await?;
        }
        let output = package_folder(strategy.package_source, working_dir).await;
        info!(language = %language, output = %output.display(), "local build finished");
        Ok(output)
    }
}

/// Folder holding the payload after the build.
pub async fn package_folder(source: PackageSource, working_dir: &Path) -> PathBuf {
    match source {
        PackageSource::WorkingDir => working_dir.to_path_buf(),
        PackageSource::DotnetPublish => {
            let framework = dotnet_framework(working_dir).await;
            working_dir
                .join("bin")
                .join("Release")
                .join(framework)
                .join("publish")
        }
    }
}

/// `TargetFramework` of the first `.csproj` in `dir`, or [`DEFAULT_DOTNET_FRAMEWORK`].
pub async fn dotnet_framework(dir: &Path) -> String {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return DEFAULT_DOTNET_FRAMEWORK.to_string();
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csproj") {
            continue;
        }
        if let Ok(content) = tokio::fs::read_to_string(&path).await {
            if let Some(framework) = parse_target_framework(&content) {
                return framework;
            }
        }
    }
    DEFAULT_DOTNET_FRAMEWORK.to_string()
}

fn parse_target_framework(csproj: &str) -> Option<String> {
    let start = csproj.find("<TargetFramework>")? + "<TargetFramework>".len();
    let end = csproj[start..].find("</TargetFramework>")? + start;
    let value = csproj[start..end].trim();
    (!value.is_empty()).then(|| value.to_string())
}
