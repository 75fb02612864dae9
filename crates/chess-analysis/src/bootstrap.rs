//! Starting an engine from an ordered list of sources.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::engine::{EngineClient, EngineError, EngineOptions, EngineTransport};

/// A place an engine can come from.
pub trait EngineProvider: Send + Sync {
    /// Label used in logs and in [`EngineError::Unavailable`].
    fn name(&self) -> &str;

    /// Opens a fresh connection to a not-yet-initialized engine.
    fn open(&self) -> Result<EngineTransport, EngineError>;
}

/// Spawns a local executable and talks UCI over its stdio.
#[derive(Debug, Clone)]
pub struct ProcessProvider {
    name: String,
    command: String,
    args: Vec<String>,
}

impl ProcessProvider {
    pub fn new(command: impl Into<String>) -> Self {
        let command = command.into();
        Self {
            name: command.clone(),
            command,
            args: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

impl EngineProvider for ProcessProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<EngineTransport, EngineError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Handshake("engine stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Handshake("engine stdout not captured".to_string()))?;

        let mut transport = EngineTransport::new(stdout, stdin, self.name.clone());
        transport.child = Some(child);
        Ok(transport)
    }
}

/// How often each source is tried before moving on.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts_per_source: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts_per_source: 1,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Tries each provider in order until one completes the handshake.
///
/// The whole attempt is bounded by `overall_timeout`.
///
/// # Errors
///
/// [`EngineError::Unavailable`] naming every source tried when all of them
/// fail or the time runs out.
pub async fn launch(
    providers: &[Box<dyn EngineProvider>],
    policy: &RetryPolicy,
    options: &EngineOptions,
    overall_timeout: Duration,
) -> Result<EngineClient, EngineError> {
    let mut tried = Vec::new();
    match timeout(
        overall_timeout,
        try_sources(providers, policy, options, &mut tried),
    )
    .await
    {
        Ok(Some(client)) => Ok(client),
        Ok(None) => Err(EngineError::Unavailable { tried }),
        Err(_) => {
            warn!(timeout = ?overall_timeout, "engine bootstrap timed out");
            Err(EngineError::Unavailable { tried })
        }
    }
}

async fn try_sources(
    providers: &[Box<dyn EngineProvider>],
    policy: &RetryPolicy,
    options: &EngineOptions,
    tried: &mut Vec<String>,
) -> Option<EngineClient> {
    for provider in providers {
        tried.push(provider.name().to_string());
        for attempt in 1..=policy.attempts_per_source.max(1) {
            if attempt > 1 {
                sleep(policy.backoff).await;
            }
            debug!(source = provider.name(), attempt, "starting engine");
            let transport = match provider.open() {
                Ok(transport) => transport,
                Err(e) => {
                    debug!(source = provider.name(), error = %e, "engine source failed to start");
                    continue;
                }
            };
            match EngineClient::connect(transport, options.clone()).await {
                Ok(client) => {
                    info!(source = provider.name(), engine = client.name(), "engine connected");
                    return Some(client);
                }
                Err(e) => warn!(source = provider.name(), attempt, error = %e, "engine handshake failed"),
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_executables_are_unavailable() {
        let providers: Vec<Box<dyn EngineProvider>> = vec![
            Box::new(ProcessProvider::new("/nonexistent/engine-a")),
            Box::new(ProcessProvider::new("/nonexistent/engine-b").with_name("b")),
        ];
        let err = launch(
            &providers,
            &RetryPolicy::default(),
            &EngineOptions::default(),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        match err {
            EngineError::Unavailable { tried } => {
                assert_eq!(tried, vec!["/nonexistent/engine-a", "b"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_source_list() {
        let err = launch(
            &[],
            &RetryPolicy::default(),
            &EngineOptions::default(),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::Unavailable { tried } if tried.is_empty()));
    }
}
