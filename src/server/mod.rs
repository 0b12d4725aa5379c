//! Server process management
//!
//! Spawns and supervises the llama-server child process. Its merged output
//! is pumped line by line into an unbounded channel — the push source the
//! log console consumes. The stream ends only when the process does;
//! closing is idempotent.

use crate::launch::command::CACHE_ENV_VAR;
use crate::launch::params::{Backend, LaunchParams};
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Server already running.")]
    AlreadyRunning,
    #[error("Failed to start llama-server: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("llama-server produced no output pipes")]
    NoPipes,
}

/// Environment overrides that force a backend choice. Selection works by
/// hiding the GPU runtimes that would otherwise win: Vulkan has no env var
/// of its own, so forcing it means hiding ROCm, and forcing CPU hides
/// everything.
pub fn backend_env(backend: Backend) -> Vec<(&'static str, &'static str)> {
    match backend {
        Backend::Vulkan => vec![("HIP_VISIBLE_DEVICES", "-1")],
        Backend::Rocm => vec![("CUDA_VISIBLE_DEVICES", "-1")],
        Backend::Cuda => vec![("HIP_VISIBLE_DEVICES", "-1")],
        Backend::Cpu => vec![
            ("CUDA_VISIBLE_DEVICES", "-1"),
            ("HIP_VISIBLE_DEVICES", "-1"),
        ],
        Backend::Auto | Backend::Sycl => Vec::new(),
    }
}

/// Handle on the supervised llama-server process.
///
/// At most one child at a time: a second start while one is attached is
/// refused, and stopping when nothing runs is a no-op.
#[derive(Default)]
pub struct ServerHandle {
    child: Option<Child>,
}

impl ServerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a child process is attached and has not exited.
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(Some(status)) => {
                    tracing::info!("llama-server exited: {}", status);
                    self.child = None;
                    false
                }
                Ok(None) => true,
                Err(e) => {
                    tracing::warn!("could not poll llama-server: {}", e);
                    true
                }
            },
            None => false,
        }
    }

    /// Spawn llama-server and return the receiving end of its log stream.
    ///
    /// The channel is unbounded: every line the process writes is
    /// forwarded in arrival order with no buffering limit. The channel
    /// closes when the process's pipes do — that closure is the terminal
    /// event for the session.
    pub fn start(
        &mut self,
        server_path: &str,
        args: &[String],
        params: &LaunchParams,
    ) -> Result<mpsc::UnboundedReceiver<String>, ServerError> {
        if self.is_running() {
            return Err(ServerError::AlreadyRunning);
        }

        let cache_path = if params.cache_path.trim().is_empty() {
            "."
        } else {
            params.cache_path.as_str()
        };

        let mut cmd = Command::new(server_path);
        cmd.args(args)
            .env(CACHE_ENV_VAR, cache_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in backend_env(params.backend) {
            cmd.env(key, value);
        }

        tracing::info!("starting llama-server: {} {}", server_path, args.join(" "));
        let mut child = cmd.spawn()?;

        let stdout = child.stdout.take().ok_or(ServerError::NoPipes)?;
        let stderr = child.stderr.take().ok_or(ServerError::NoPipes)?;

        let (tx, rx) = mpsc::unbounded_channel();
        spawn_line_pump(stdout, tx.clone());
        spawn_line_pump(stderr, tx);

        self.child = Some(child);
        Ok(rx)
    }

    /// Kill the child and close its log stream. Idempotent: calling with
    /// nothing attached, or twice, does nothing and never panics.
    pub async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                tracing::warn!("failed to kill llama-server: {}", e);
            }
            match child.wait().await {
                Ok(status) => tracing::info!("llama-server stopped: {}", status),
                Err(e) => tracing::warn!("failed to reap llama-server: {}", e),
            }
        }
    }
}

/// Forward each line from one pipe into the shared log channel. The pump
/// ends at EOF; when both pumps are done the channel closes.
fn spawn_line_pump(pipe: impl AsyncRead + Unpin + Send + 'static, tx: mpsc::UnboundedSender<String>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(pipe).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        // Receiver gone; the session was torn down.
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!("log pipe read error: {}", e);
                    break;
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_env_hides_competing_runtimes() {
        assert_eq!(
            backend_env(Backend::Vulkan),
            vec![("HIP_VISIBLE_DEVICES", "-1")]
        );
        assert_eq!(
            backend_env(Backend::Cuda),
            vec![("HIP_VISIBLE_DEVICES", "-1")]
        );
        assert_eq!(
            backend_env(Backend::Rocm),
            vec![("CUDA_VISIBLE_DEVICES", "-1")]
        );
        assert_eq!(backend_env(Backend::Cpu).len(), 2);
        assert!(backend_env(Backend::Auto).is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_start_streams_lines_then_closes() {
        let mut handle = ServerHandle::new();
        let params = LaunchParams::default();
        let mut rx = handle
            .start("echo", &["hello".to_string()], &params)
            .unwrap();

        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
        // EOF closes the stream: the terminal event for the session.
        assert_eq!(rx.recv().await, None);
        handle.stop().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_second_start_refused_while_running() {
        let mut handle = ServerHandle::new();
        let params = LaunchParams::default();
        let _rx = handle
            .start("sleep", &["5".to_string()], &params)
            .unwrap();

        let again = handle.start("sleep", &["5".to_string()], &params);
        assert!(matches!(again, Err(ServerError::AlreadyRunning)));
        handle.stop().await;
        assert!(!handle.is_running());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let mut handle = ServerHandle::new();
        handle.stop().await;

        let params = LaunchParams::default();
        let _rx = handle
            .start("sleep", &["5".to_string()], &params)
            .unwrap();
        handle.stop().await;
        handle.stop().await;
        assert!(!handle.is_running());
    }
}
