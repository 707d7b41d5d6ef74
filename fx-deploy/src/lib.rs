//! # fx-deploy
//!
//! Incremental deployment engine for the bot project folder.
//!
//! - [`DeployMgr`] keeps a single `{ time }` record per working directory and decides
//!   whether anything changed since the last successful deploy.
//! - [`FuncHostedDeployMgr`] keeps per-environment records plus a zip snapshot of the
//!   last payload, so unchanged files are copied from the snapshot instead of re-read.

pub mod archive;
pub mod deploy_mgr;
pub mod func_hosted;
pub mod ignore_rules;
mod fs_util;

pub use archive::{zip_directory, LATEST_TRUST_MTIME_MS, ZIP_TIME_GRANULARITY_MS};
pub use deploy_mgr::DeployMgr;
pub use func_hosted::{FuncHostedDeployMgr, PackResult};
pub use ignore_rules::IgnoreMatcher;

/// Folder inside the working directory that holds deployment bookkeeping.
pub const DEPLOYMENT_FOLDER: &str = ".deployment";
/// Classic record file: `{ "time": <epoch-ms> }`.
pub const DEPLOYMENT_RECORD_FILE: &str = "bot.json";
/// Functions-hosted record file: `{ "<env>": { "time": <epoch-ms> } }`.
pub const DEPLOYMENT_INFO_FILE: &str = "deployment.json";
/// Zip snapshot of the last functions-hosted payload.
pub const DEPLOYMENT_ZIP_CACHE_FILE: &str = "deployment.zip";

/// Path prefixes (relative to the working dir) never considered for change detection.
pub const WALK_SKIP_PATHS: &[&str] = &[
    "node_modules/.bin",
    ".fx",
    DEPLOYMENT_FOLDER,
    ".vscode",
    ".git",
    "bin",
    "obj",
];

/// Excluded from classic packages in addition to [`WALK_SKIP_PATHS`].
pub const PACKAGE_EXCLUDE_PATHS: &[&str] = &["node_modules/keytar"];

/// Ignore file of functions-hosted projects, gitignore syntax.
pub const FUNC_IGNORE_FILE: &str = ".funcignore";

/// Content of a generated host ignore file.
pub const DEFAULT_IGNORE_RULES: &[&str] = &[".fx", ".vscode", ".git", "node_modules/.bin"];
