//! Session runner: reads newline-delimited messages from a byte stream,
//! dispatches them, and writes replies through a single writer task.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::codec::{self, DecodeError};
use crate::protocol::Dispatcher;
use crate::types::{JsonRpcMessage, McpError, McpResult};

use super::notifier::{Notifier, Outbound};

/// Resource bounds for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerLimits {
    /// Longest accepted line, newline excluded. `None` means no cap.
    pub max_message_bytes: Option<usize>,
    /// Capacity of the writer queue. A full queue stalls the read loop.
    pub outbound_queue: usize,
    /// Spawned requests running at once before the read loop waits.
    pub max_in_flight: usize,
}

impl Default for RunnerLimits {
    fn default() -> Self {
        Self {
            max_message_bytes: Some(10 * 1024 * 1024),
            outbound_queue: 100,
            max_in_flight: 64,
        }
    }
}

/// Drives one connection from first byte to close.
#[derive(Debug)]
pub struct SessionRunner {
    dispatcher: Dispatcher,
    concurrent: bool,
    limits: RunnerLimits,
    shutdown: CancellationToken,
    tx: mpsc::Sender<Outbound>,
    rx: mpsc::Receiver<Outbound>,
}

impl SessionRunner {
    pub fn new(dispatcher: Dispatcher, concurrent: bool, limits: RunnerLimits) -> Self {
        let (tx, rx) = mpsc::channel(limits.outbound_queue.max(1));
        Self {
            dispatcher,
            concurrent,
            limits,
            shutdown: CancellationToken::new(),
            tx,
            rx,
        }
    }

    /// Stop when `token` is cancelled, in addition to EOF.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Token that ends the session when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn notifier(&self) -> Notifier {
        Notifier::new(self.dispatcher.session().clone(), self.tx.clone())
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serve until EOF, cancellation, or an I/O failure.
    ///
    /// In-flight requests are drained and the writer flushed before this
    /// returns; the session is Closed afterwards either way. A writer that
    /// cannot keep up stalls reading instead of queueing without limit.
    pub async fn run<R, W>(self, mut reader: R, writer: W) -> McpResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let SessionRunner {
            dispatcher,
            concurrent,
            limits,
            shutdown,
            tx,
            rx,
        } = self;

        let writer_done = CancellationToken::new();
        let writer_task = spawn_writer(writer, rx, writer_done.clone());
        let tracker = TaskTracker::new();
        let in_flight = Arc::new(Semaphore::new(limits.max_in_flight.max(1)));

        tracing::info!("Session started (concurrent: {concurrent})");

        let mut line = Vec::new();
        let mut result = Ok(());

        loop {
            line.clear();
            let read = tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                _ = writer_done.cancelled() => {
                    tracing::warn!("Writer stopped, ending session");
                    break;
                }
                read = read_line(&mut reader, &mut line, limits.max_message_bytes) => read,
            };

            let reply = match read {
                Ok(Line::Eof) => {
                    tracing::info!("EOF on input, shutting down");
                    break;
                }
                Ok(Line::Oversized(limit)) => {
                    tracing::warn!("Dropping input line longer than {limit} bytes");
                    Some(JsonRpcMessage::Error(
                        DecodeError::Oversized { limit }.to_json_rpc_error(),
                    ))
                }
                Ok(Line::Complete) if line.iter().all(u8::is_ascii_whitespace) => continue,
                Ok(Line::Complete) => match codec::decode(&line) {
                    Ok(msg) => {
                        // initialize and everything before Ready stay inline, in read order.
                        let spawn = concurrent
                            && matches!(msg, JsonRpcMessage::Request(_))
                            && dispatcher.is_ready().await;

                        match msg {
                            JsonRpcMessage::Request(req) if spawn => {
                                let permit = tokio::select! {
                                    _ = shutdown.cancelled() => break,
                                    permit = Arc::clone(&in_flight).acquire_owned() => permit,
                                };
                                let Ok(permit) = permit else { break };
                                let dispatcher = dispatcher.clone();
                                let tx = tx.clone();
                                tracker.spawn(async move {
                                    let reply = dispatcher.handle_request(req).await;
                                    if tx.send(Outbound::Message(reply)).await.is_err() {
                                        tracing::warn!("Writer closed, dropping response");
                                    }
                                    drop(permit);
                                });
                                None
                            }
                            msg => dispatcher.handle_message(msg).await,
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Undecodable message: {e}");
                        Some(JsonRpcMessage::Error(e.to_json_rpc_error()))
                    }
                },
                Err(e) => {
                    tracing::error!("Read error: {e}");
                    result = Err(McpError::Io(e));
                    break;
                }
            };

            if let Some(reply) = reply {
                let sent = tokio::select! {
                    sent = tx.send(Outbound::Message(reply)) => sent.is_ok(),
                    _ = writer_done.cancelled() => false,
                };
                if !sent {
                    break;
                }
            }
        }

        dispatcher.session().lock().await.begin_shutdown();

        tracker.close();
        if !tracker.is_empty() {
            tracing::debug!("Draining {} in-flight request(s)", tracker.len());
        }
        tracker.wait().await;

        // The writer may already be gone.
        tokio::select! {
            _ = tx.send(Outbound::Close) => {}
            _ = writer_done.cancelled() => {}
        }
        drop(tx);

        let write_result = match writer_task.await {
            Ok(r) => r,
            Err(e) => Err(McpError::Transport(format!("writer task failed: {e}"))),
        };

        dispatcher.session().lock().await.close();
        tracing::info!("Session closed");

        result.and(write_result)
    }
}

/// Outcome of reading one input line.
enum Line {
    Complete,
    Oversized(usize),
    Eof,
}

/// Read one line into `line`, never buffering more than `limit` bytes plus
/// the newline. An over-long line is discarded through its newline.
async fn read_line<R>(
    reader: &mut R,
    line: &mut Vec<u8>,
    limit: Option<usize>,
) -> std::io::Result<Line>
where
    R: AsyncBufRead + Unpin,
{
    let Some(limit) = limit else {
        return Ok(match reader.read_until(b'\n', line).await? {
            0 => Line::Eof,
            _ => Line::Complete,
        });
    };

    let cap = (limit as u64).saturating_add(1);
    let n = (&mut *reader).take(cap).read_until(b'\n', line).await?;
    if n == 0 {
        return Ok(Line::Eof);
    }

    let content = match line.last() {
        Some(b'\n') => line.len() - 1,
        _ => line.len(),
    };
    if content <= limit {
        return Ok(Line::Complete);
    }

    discard_through_newline(reader).await?;
    Ok(Line::Oversized(limit))
}

async fn discard_through_newline<R>(reader: &mut R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(());
        }
        match buf.iter().position(|&b| b == b'\n') {
            Some(i) => {
                reader.consume(i + 1);
                return Ok(());
            }
            None => {
                let n = buf.len();
                reader.consume(n);
            }
        }
    }
}

fn spawn_writer<W>(
    writer: W,
    rx: mpsc::Receiver<Outbound>,
    done: CancellationToken,
) -> JoinHandle<McpResult<()>>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let result = write_loop(writer, rx).await;
        if let Err(e) = &result {
            tracing::error!("Write error: {e}");
        }
        done.cancel();
        result
    })
}

async fn write_loop<W>(mut writer: W, mut rx: mpsc::Receiver<Outbound>) -> McpResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(outbound) = rx.recv().await {
        match outbound {
            Outbound::Message(msg) => {
                let bytes = codec::encode(&msg)?;
                writer.write_all(&bytes).await?;
                writer.flush().await?;
            }
            Outbound::Close => break,
        }
    }
    writer.flush().await?;
    Ok(())
}
