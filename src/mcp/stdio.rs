// ABOUTME: Child-process transport speaking newline-delimited JSON over stdin/stdout
// ABOUTME: Spawns the configured server command and terminates it with SIGTERM then SIGKILL

use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::transport::{Transport, TransportError, TransportFactory};
use crate::config::ServerConfig;

/// Grace period between SIGTERM and SIGKILL.
const TERMINATE_GRACE: Duration = Duration::from_secs(2);

/// Transport over a spawned server's standard streams.
pub struct StdioTransport {
    server: String,
    stdin: Mutex<Option<BufWriter<ChildStdin>>>,
    stdout: Mutex<BufReader<ChildStdout>>,
    child: Mutex<Option<Child>>,
}

impl StdioTransport {
    /// Spawn `config.command` with its args and env.
    pub fn spawn(config: &ServerConfig) -> Result<Self, TransportError> {
        debug!(server = %config.name, command = %config.command, args = ?config.args, "Spawning server process");

        let mut command = Command::new(&config.command);
        command
            .args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| TransportError::Spawn {
            command: config.command.clone(),
            source,
        })?;

        let stdin = child.stdin.take().ok_or(TransportError::Closed)?;
        let stdout = child.stdout.take().ok_or(TransportError::Closed)?;

        info!(server = %config.name, pid = child.id().unwrap_or(0), "Server process spawned");

        Ok(Self {
            server: config.name.clone(),
            stdin: Mutex::new(Some(BufWriter::new(stdin))),
            stdout: Mutex::new(BufReader::new(stdout)),
            child: Mutex::new(Some(child)),
        })
    }

    async fn terminate(&self, mut child: Child) -> Result<(), TransportError> {
        let pid = child.id().unwrap_or(0);

        #[cfg(unix)]
        {
            use nix::sys::signal::{Signal, kill};
            use nix::unistd::Pid;

            if pid > 0 {
                #[allow(clippy::cast_possible_wrap)]
                let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            }
        }

        #[cfg(not(unix))]
        {
            let _ = child.start_kill();
        }

        match tokio::time::timeout(TERMINATE_GRACE, child.wait()).await {
            Ok(Ok(status)) => {
                debug!(server = %self.server, pid, %status, "Server process exited");
            }
            Ok(Err(e)) => {
                warn!(server = %self.server, error = %e, "Error waiting for server process");
            }
            Err(_) => {
                warn!(server = %self.server, pid, "Server ignored SIGTERM, killing");
                if let Err(e) = child.kill().await {
                    error!(server = %self.server, error = %e, "Failed to kill server process");
                    return Err(TransportError::Io(e));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn send(&self, message: Value) -> Result<(), TransportError> {
        let mut line = serde_json::to_vec(&message)?;
        line.push(b'\n');

        let mut guard = self.stdin.lock().await;
        let stdin = guard.as_mut().ok_or(TransportError::Closed)?;
        stdin.write_all(&line).await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Value>, TransportError> {
        let mut reader = self.stdout.lock().await;
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                debug!(server = %self.server, "Server stdout closed");
                return Ok(None);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => {
                    warn!(server = %self.server, error = %e, "Skipping non-JSON line from server");
                }
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        // Dropping stdin lets well-behaved servers exit on EOF
        self.stdin.lock().await.take();

        let Some(child) = self.child.lock().await.take() else {
            return Ok(());
        };
        info!(server = %self.server, "Terminating server process");
        self.terminate(child).await
    }
}

/// Spawns a [`StdioTransport`] per connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdioTransportFactory;

#[async_trait]
impl TransportFactory for StdioTransportFactory {
    async fn spawn(&self, config: &ServerConfig) -> Result<Arc<dyn Transport>, TransportError> {
        Ok(Arc::new(StdioTransport::spawn(config)?))
    }
}
