use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{ExecutionRequest, ExecutionResult, ExecutorRouter};
use crate::errors::ExecutorError;

pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_millis(5000);

/// Routes a request to its backend and bounds it by a wall-clock budget.
///
/// Cancelling an outstanding call is done by dropping the future returned by
/// [`ExecutionChannel::execute`]. Backends release their resources on drop
/// (child processes are spawned with `kill_on_drop`, containers are stopped by
/// a guard).
#[derive(Clone)]
pub struct ExecutionChannel {
    router: Arc<ExecutorRouter>,
    timeout: Duration,
}

impl ExecutionChannel {
    pub fn new(router: ExecutorRouter, timeout: Duration) -> Self {
        Self {
            router: Arc::new(router),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn router(&self) -> &ExecutorRouter {
        &self.router
    }

    pub async fn execute(
        &self,
        request: &ExecutionRequest,
    ) -> Result<ExecutionResult, ExecutorError> {
        let executor = self.router.resolve(request.language)?;
        log::debug!(
            "Executing {} source ({} bytes) on backend '{}'",
            request.language,
            request.content.len(),
            executor.name()
        );

        let started = Instant::now();
        match tokio::time::timeout(self.timeout, executor.execute_code(request)).await {
            Ok(Ok(mut result)) => {
                if result.duration_ms == 0 {
                    result.duration_ms = started.elapsed().as_millis() as u64;
                }
                log::info!(
                    "{} run finished with exit status {} in {} ms",
                    request.language,
                    result.exit_status,
                    result.duration_ms
                );
                Ok(result)
            }
            Ok(Err(err)) => {
                log::warn!("{} run failed on '{}': {}", request.language, executor.name(), err);
                Err(err)
            }
            Err(_) => {
                log::warn!(
                    "{} run exceeded the {:?} execution budget",
                    request.language,
                    self.timeout
                );
                Err(ExecutorError::Timeout(self.timeout))
            }
        }
    }
}
