//! Closed variant types shared by the lifecycle, and the per-language lookup table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgrammingLanguage {
    JavaScript,
    TypeScript,
    CSharp,
}

/// Where the packaged payload comes from after a local build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageSource {
    /// The working directory itself is zipped.
    WorkingDir,
    /// `bin/Release/<framework>/publish` produced by `dotnet publish`.
    DotnetPublish,
}

/// Build and packaging facts for one language.
#[derive(Debug)]
pub struct LanguageStrategy {
    pub build_commands: &'static [&'static str],
    /// Files inside the template carrying `{BOT_ID}`/`{BOT_PASSWORD}` placeholders.
    pub config_files: &'static [&'static str],
    pub site_app_settings: &'static [(&'static str, &'static str)],
    pub package_source: PackageSource,
    /// Bot code lives in this subfolder of the project root; empty means the root.
    pub bot_folder: &'static str,
}

const NODE_SITE_SETTINGS: &[(&str, &str)] = &[
    ("SCM_DO_BUILD_DURING_DEPLOYMENT", "true"),
    ("WEBSITE_NODE_DEFAULT_VERSION", "~18"),
];

static JAVASCRIPT: LanguageStrategy = LanguageStrategy {
    build_commands: &["npm install"],
    config_files: &[".env"],
    site_app_settings: NODE_SITE_SETTINGS,
    package_source: PackageSource::WorkingDir,
    bot_folder: "bot",
};

static TYPESCRIPT: LanguageStrategy = LanguageStrategy {
    build_commands: &["npm install", "npm run build"],
    config_files: &[".env"],
    site_app_settings: NODE_SITE_SETTINGS,
    package_source: PackageSource::WorkingDir,
    bot_folder: "bot",
};

static CSHARP: LanguageStrategy = LanguageStrategy {
    build_commands: &["dotnet publish --configuration Release"],
    config_files: &["appsettings.json", "appsettings.Development.json"],
    site_app_settings: &[],
    package_source: PackageSource::DotnetPublish,
    bot_folder: "",
};

impl ProgrammingLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgrammingLanguage::JavaScript => "javascript",
            ProgrammingLanguage::TypeScript => "typescript",
            ProgrammingLanguage::CSharp => "csharp",
        }
    }

    /// Short form used in template archive names.
    pub fn template_tag(&self) -> &'static str {
        match self {
            ProgrammingLanguage::JavaScript => "js",
            ProgrammingLanguage::TypeScript => "ts",
            ProgrammingLanguage::CSharp => "csharp",
        }
    }

    pub fn strategy(&self) -> &'static LanguageStrategy {
        match self {
            ProgrammingLanguage::JavaScript => &JAVASCRIPT,
            ProgrammingLanguage::TypeScript => &TYPESCRIPT,
            ProgrammingLanguage::CSharp => &CSHARP,
        }
    }
}

impl fmt::Display for ProgrammingLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgrammingLanguage {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "javascript" | "js" => Ok(ProgrammingLanguage::JavaScript),
            "typescript" | "ts" => Ok(ProgrammingLanguage::TypeScript),
            "csharp" | "c#" | "cs" => Ok(ProgrammingLanguage::CSharp),
            _ => Err(FxError::Validation {
                field: "programmingLanguage".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HostType {
    #[default]
    AppService,
    Functions,
}

impl HostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostType::AppService => "app-service",
            HostType::Functions => "azure-functions",
        }
    }
}

impl FromStr for HostType {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "app-service" => Ok(HostType::AppService),
            "azure-functions" => Ok(HostType::Functions),
            _ => Err(FxError::Validation {
                field: "hostType".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WayToRegisterBot {
    CreateNew,
    ReuseExisting,
}

impl WayToRegisterBot {
    pub fn as_str(&self) -> &'static str {
        match self {
            WayToRegisterBot::CreateNew => "create-new",
            WayToRegisterBot::ReuseExisting => "reuse-existing",
        }
    }
}

impl FromStr for WayToRegisterBot {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create-new" => Ok(WayToRegisterBot::CreateNew),
            "reuse-existing" => Ok(WayToRegisterBot::ReuseExisting),
            _ => Err(FxError::Validation {
                field: "wayToRegisterBot".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginActRole {
    Bot,
    MessageExtension,
}

impl PluginActRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginActRole::Bot => "bot",
            PluginActRole::MessageExtension => "messaging-extension",
        }
    }

    /// Template group for a set of roles; `None` when no role is given.
    pub fn template_group(roles: &[PluginActRole]) -> Option<&'static str> {
        let bot = roles.contains(&PluginActRole::Bot);
        let msgext = roles.contains(&PluginActRole::MessageExtension);
        match (bot, msgext) {
            (true, true) => Some("bot-msgext"),
            (true, false) => Some("bot"),
            (false, true) => Some("msgext"),
            (false, false) => None,
        }
    }
}

impl FromStr for PluginActRole {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bot" => Ok(PluginActRole::Bot),
            "messaging-extension" | "msgext" => Ok(PluginActRole::MessageExtension),
            _ => Err(FxError::Validation {
                field: "capability".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse_and_strategy() {
        let ts: ProgrammingLanguage = "TypeScript".parse().unwrap();
        assert_eq!(ts, ProgrammingLanguage::TypeScript);
        assert_eq!(ts.strategy().build_commands, &["npm install", "npm run build"]);
        assert_eq!(
            ProgrammingLanguage::CSharp.strategy().package_source,
            PackageSource::DotnetPublish
        );
        assert!("python".parse::<ProgrammingLanguage>().is_err());
    }

    #[test]
    fn test_template_group() {
        use PluginActRole::*;
        assert_eq!(PluginActRole::template_group(&[Bot]), Some("bot"));
        assert_eq!(PluginActRole::template_group(&[MessageExtension]), Some("msgext"));
        assert_eq!(
            PluginActRole::template_group(&[MessageExtension, Bot]),
            Some("bot-msgext")
        );
        assert_eq!(PluginActRole::template_group(&[]), None);
    }

    #[test]
    fn test_host_type_default() {
        assert_eq!(HostType::default(), HostType::AppService);
    }
}
