// Infrastructure layer modules
pub mod config;
pub mod error_reporter;
pub mod logging;
pub mod ynab_client;

// Re-exports
pub use config::{RelayConfig, RelayConfigError};
pub use error_reporter::{ErrorReporter, ReportContext, TracingErrorReporter};
pub use logging::init_logging;
pub use ynab_client::{DownstreamResponse, SendError, TransactionSender, YnabClient};
