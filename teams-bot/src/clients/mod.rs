//! Collaborators reached over the network or the local toolchain. Each is a trait with a
//! default implementation so the lifecycle can run against fakes.

mod http;

pub mod azure;
pub mod builder;
pub mod registration;
pub mod template;

pub use azure::{
    ensure_resource_providers, zip_deploy_endpoint, AppServicePlanSpec, ArmClient, AzureOperations,
    AzureScope, BotChannelSpec, PublishingCredentials, WebApp, WebAppSpec,
};
pub use builder::{CommandBuilder, LocalBuilder};
pub use registration::{
    BotAuthCredential, BotRegistrar, BotRegistration, ExistingAadApp, RegistrationClient,
};
pub use template::{
    extract_template, prepare_template, replace_placeholders_on_disk, BotPlaceholders,
    HttpTemplateProvider, TemplateProvider,
};
