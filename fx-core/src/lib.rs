//! # fx-core
//!
//! Shared building blocks for the Teams bot lifecycle: the [`FxError`] taxonomy,
//! [`RetryHandler`], [`ResourceNameFactory`], the language/host variant types and
//! tracing initialization.

pub mod error;
pub mod logger;
pub mod naming;
pub mod retry;
pub mod types;

pub use error::{ErrorCategory, FxError, FxResult, RemoteError};
pub use logger::{init_tracing, mask_secret};
pub use naming::{MaxLengths, ResourceNameFactory, PLUGIN_ALIAS};
pub use retry::{ExternalCall, RetryHandler};
pub use types::{
    HostType, LanguageStrategy, PackageSource, PluginActRole, ProgrammingLanguage,
    WayToRegisterBot,
};
