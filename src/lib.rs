mod error;
mod latch;

pub use error::{LatchError, Result};
pub use latch::CountDownLatch;

use tracing::{subscriber::SetGlobalDefaultError, Level};
use tracing_subscriber::EnvFilter;

pub fn log_init() -> std::result::Result<(), SetGlobalDefaultError> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_max_level(Level::TRACE)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}
