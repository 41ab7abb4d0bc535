//! Device driver abstraction and the TCP network driver
//!
//! The session manager drives a [`DeviceDriver`] through the
//! connect → transact → send → status → disconnect lifecycle without
//! knowing anything about the transport. Production uses [`NetworkDriver`]
//! (raw TCP, port 9100); tests inject stubs.

use crate::command::PrintCommand;
use crate::error::{PrintError, PrintResult};
use crate::escpos::encode_commands;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tracing::{info, instrument, warn};

/// Device status snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus {
    /// A connection to the device is open
    pub connection: bool,
    /// The device reports itself ready to print
    pub online: bool,
}

impl DeviceStatus {
    /// A job may only be sent when the device is connected and online
    pub fn is_printable(&self) -> bool {
        self.connection && self.online
    }
}

/// Abstract hardware link
///
/// One driver instance owns at most one open device connection. The
/// command buffer is built offline: `append_command` works before
/// `connect`, mirroring how jobs are assembled before the device is
/// touched.
#[async_trait]
pub trait DeviceDriver: Send {
    /// Open the device connection for `target`
    async fn connect(&mut self, target: &str) -> PrintResult<()>;

    /// Open a print transaction on the connected device
    async fn begin_transaction(&mut self) -> PrintResult<()>;

    /// Append one command to the device buffer
    fn append_command(&mut self, command: &PrintCommand) -> PrintResult<()>;

    /// Query the device status
    async fn status(&mut self) -> PrintResult<DeviceStatus>;

    /// Deliver the buffered commands to the device
    async fn send(&mut self) -> PrintResult<()>;

    /// Resolve when the device reports the in-flight job finished
    async fn wait_job_finished(&mut self) -> PrintResult<()>;

    /// Close the print transaction
    async fn end_transaction(&mut self) -> PrintResult<()>;

    /// Drop the device connection
    async fn disconnect(&mut self) -> PrintResult<()>;

    /// Discard the command buffer
    fn clear_buffer(&mut self);
}

/// Network printer driver (raw TCP, default port 9100)
///
/// Understands `TCP:<host>` and `TCP:<host>:<port>` targets. Raw 9100
/// printers emit no completion event, so the job-finished signal resolves
/// when the send flush completes.
pub struct NetworkDriver {
    stream: Option<TcpStream>,
    buffer: Vec<PrintCommand>,
    in_transaction: bool,
    finished: Option<oneshot::Receiver<()>>,
    timeout: Duration,
}

impl NetworkDriver {
    pub fn new() -> Self {
        Self {
            stream: None,
            buffer: Vec::new(),
            in_transaction: false,
            finished: None,
            timeout: Duration::from_secs(5),
        }
    }

    /// Set the connect timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Split a `TCP:<host>[:<port>]` target into host and port
    fn parse_target(target: &str) -> PrintResult<(String, u16)> {
        let rest = target
            .strip_prefix("TCP:")
            .ok_or_else(|| PrintError::InvalidTarget(target.to_string()))?;

        if rest.is_empty() {
            return Err(PrintError::InvalidTarget(target.to_string()));
        }

        match rest.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => {
                let port: u16 = port
                    .parse()
                    .map_err(|_| PrintError::InvalidTarget(target.to_string()))?;
                Ok((host.to_string(), port))
            }
            _ => Ok((rest.to_string(), 9100)),
        }
    }
}

impl Default for NetworkDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceDriver for NetworkDriver {
    #[instrument(skip(self))]
    async fn connect(&mut self, target: &str) -> PrintResult<()> {
        let (host, port) = Self::parse_target(target)?;

        let stream = tokio::time::timeout(self.timeout, TcpStream::connect((host.as_str(), port)))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}:{}", host, port)))?
            .map_err(|e| PrintError::Connection(format!("{}:{}: {}", host, port, e)))?;

        info!(host = %host, port, "Connected to printer");
        self.stream = Some(stream);
        Ok(())
    }

    async fn begin_transaction(&mut self) -> PrintResult<()> {
        if self.stream.is_none() {
            return Err(PrintError::Transaction("not connected".to_string()));
        }
        self.in_transaction = true;
        Ok(())
    }

    fn append_command(&mut self, command: &PrintCommand) -> PrintResult<()> {
        self.buffer.push(command.clone());
        Ok(())
    }

    async fn status(&mut self) -> PrintResult<DeviceStatus> {
        // Raw 9100 has no status back-channel; an open connection is the
        // only online signal available
        let connection = self.stream.is_some();
        Ok(DeviceStatus {
            connection,
            online: connection,
        })
    }

    #[instrument(skip(self), fields(commands = self.buffer.len()))]
    async fn send(&mut self) -> PrintResult<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| PrintError::Send("not connected".to_string()))?;

        let data = encode_commands(&self.buffer);
        info!(bytes = data.len(), "Sending print data");

        stream
            .write_all(&data)
            .await
            .map_err(|e| PrintError::Send(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| PrintError::Send(e.to_string()))?;

        // Flush completion stands in for the finished event on raw TCP
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(());
        self.finished = Some(rx);

        Ok(())
    }

    async fn wait_job_finished(&mut self) -> PrintResult<()> {
        let rx = self
            .finished
            .take()
            .ok_or_else(|| PrintError::Protocol("no job in flight".to_string()))?;
        rx.await
            .map_err(|_| PrintError::Protocol("job event channel dropped".to_string()))
    }

    async fn end_transaction(&mut self) -> PrintResult<()> {
        self.in_transaction = false;
        Ok(())
    }

    async fn disconnect(&mut self) -> PrintResult<()> {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                warn!(error = %e, "Socket shutdown failed");
            }
        }
        self.in_transaction = false;
        Ok(())
    }

    fn clear_buffer(&mut self) {
        self.buffer.clear();
        self.finished = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_default_port() {
        let (host, port) = NetworkDriver::parse_target("TCP:192.168.1.50").unwrap();
        assert_eq!(host, "192.168.1.50");
        assert_eq!(port, 9100);
    }

    #[test]
    fn test_parse_target_explicit_port() {
        let (host, port) = NetworkDriver::parse_target("TCP:printer.local:9101").unwrap();
        assert_eq!(host, "printer.local");
        assert_eq!(port, 9101);
    }

    #[test]
    fn test_parse_target_rejects_other_schemes() {
        assert!(matches!(
            NetworkDriver::parse_target("BT:00:11:22:33"),
            Err(PrintError::InvalidTarget(_))
        ));
        assert!(matches!(
            NetworkDriver::parse_target("TCP:"),
            Err(PrintError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_append_works_before_connect() {
        let mut driver = NetworkDriver::new();
        driver
            .append_command(&PrintCommand::AppendText("hi".to_string()))
            .unwrap();
        driver.append_command(&PrintCommand::FeedLines(1)).unwrap();
        assert_eq!(driver.buffer.len(), 2);

        driver.clear_buffer();
        assert!(driver.buffer.is_empty());
    }

    #[tokio::test]
    async fn test_connect_failure_is_connection_error() {
        let mut driver = NetworkDriver::new().with_timeout(Duration::from_millis(200));
        // Port 1 on localhost is closed
        let err = driver.connect("TCP:127.0.0.1:1").await.unwrap_err();
        assert!(matches!(
            err,
            PrintError::Connection(_) | PrintError::Timeout(_)
        ));

        let status = driver.status().await.unwrap();
        assert!(!status.is_printable());
    }

    #[tokio::test]
    async fn test_send_roundtrip_over_local_socket() {
        use tokio::io::AsyncReadExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let mut driver = NetworkDriver::new();
        driver
            .append_command(&PrintCommand::AppendText("ticket".to_string()))
            .unwrap();
        driver
            .connect(&format!("TCP:{}:{}", addr.ip(), addr.port()))
            .await
            .unwrap();
        driver.begin_transaction().await.unwrap();
        assert!(driver.status().await.unwrap().is_printable());
        driver.send().await.unwrap();
        driver.wait_job_finished().await.unwrap();
        driver.end_transaction().await.unwrap();
        driver.disconnect().await.unwrap();

        let received = server.await.unwrap();
        let text = String::from_utf8_lossy(&received);
        assert!(text.contains("ticket"));
    }
}
