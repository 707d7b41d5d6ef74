//! Length-bounded Azure resource names derived from the app name.

use uuid::Uuid;

use crate::error::{FxError, FxResult};

/// Token inserted between the app name and the suffix.
pub const PLUGIN_ALIAS: &str = "BT";

/// Maximum name lengths accepted by the target services.
pub struct MaxLengths;

impl MaxLengths {
    pub const WEB_APP_SITE_NAME: usize = 60;
    pub const APP_SERVICE_PLAN_NAME: usize = 40;
    pub const BOT_CHANNEL_REG_NAME: usize = 42;
    pub const AAD_DISPLAY_NAME: usize = 120;
}

pub struct ResourceNameFactory;

impl ResourceNameFactory {
    /// Builds `normalized(app_name) + "bt" + suffix`.
    ///
    /// Without a suffix a fresh UUID (simple form) is used. When the candidate is
    /// longer than `limit`, the trailing `limit` characters are kept so the suffix survives.
    pub fn create_common_name(
        app_name: Option<&str>,
        suffix: Option<&str>,
        limit: Option<usize>,
    ) -> FxResult<String> {
        let app_name = match app_name {
            Some(name) if !name.is_empty() => name,
            _ => return Err(FxError::MissingParameter("appName".to_string())),
        };

        let suffix = match suffix {
            Some(s) => s.to_string(),
            None => Uuid::new_v4().simple().to_string(),
        };
        let candidate = format!(
            "{}{}{}",
            Self::normalize(app_name),
            PLUGIN_ALIAS.to_lowercase(),
            suffix
        );

        match limit {
            Some(limit) if candidate.chars().count() > limit => {
                let skip = candidate.chars().count() - limit;
                Ok(candidate.chars().skip(skip).collect())
            }
            _ => Ok(candidate),
        }
    }

    /// Keeps ASCII letters and digits, lower-cased.
    pub fn normalize(app_name: &str) -> String {
        app_name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect()
    }
}
