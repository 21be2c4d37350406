#[cfg(feature = "cli")]
pub mod cli;
pub mod credentials;
pub mod settings;

#[cfg(feature = "cli")]
pub use cli::{Cli, Commands, ImportArgs};
pub use credentials::{CredentialOptions, Credentials};
pub use settings::{HttpSettings, Settings};
