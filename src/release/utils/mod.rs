//! Filesystem and subprocess helpers shared by the pipeline stages.

pub mod fs;
pub mod process;

use crate::release::error::{Context, Result};

/// Runs blocking filesystem work off the async runtime and waits for it.
pub async fn blocking<T, F>(what: &str, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .context(format!("{what} task failed"))?
}
