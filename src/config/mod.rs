pub mod fees;
pub mod loader;
pub mod provider;
pub mod reconciler;

pub use fees::FeeConfig;
pub use loader::AppConfig;
pub use provider::ProviderConfig;
pub use reconciler::ReconcilerConfig;
