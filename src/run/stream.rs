use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;

use super::types::Envelope;

/// One item yielded to the session's single consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Envelope(Envelope),
    /// Transport-level failure. Yielded at most once; the session ends
    /// with it and yields nothing further.
    TransportFailed(String),
}

// =============================================================================
// SSE framing
// =============================================================================

/// Incremental SSE framing decoder: reassembles `data:` payloads from
/// arbitrary byte chunks. Lines may arrive split across chunks; `\r\n`
/// endings are tolerated; comment lines and non-`data` fields are skipped.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns the `data:` payloads completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(rest) = line.strip_prefix("data:") {
                payloads.push(rest.trim_start().to_string());
            }
        }
        payloads
    }
}

// =============================================================================
// StreamSession
// =============================================================================

/// Feeding side of an in-process session, created by
/// [`StreamSession::channel`]. Lets tests and drivers deliver decoded
/// envelopes without a live transport.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    /// Deliver an envelope. Returns false once the session is closed.
    pub fn send(&self, envelope: Envelope) -> bool {
        self.tx.send(SessionEvent::Envelope(envelope)).is_ok()
    }

    /// Simulate a transport failure. Returns false once the session is
    /// closed.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.tx
            .send(SessionEvent::TransportFailed(message.into()))
            .is_ok()
    }
}

/// One subscription to the server's incremental event feed.
///
/// Single consumer: [`StreamSession::next`] yields events in server
/// emission order. [`StreamSession::close`] is synchronous and
/// idempotent; after it (or after a transport failure) `next` yields
/// nothing further.
#[derive(Debug)]
pub struct StreamSession {
    events: mpsc::UnboundedReceiver<SessionEvent>,
    cancel: CancellationToken,
    closed: bool,
}

impl StreamSession {
    /// Open a live SSE subscription.
    ///
    /// The reader task decodes envelopes off the response body and ends
    /// on server close, transport failure, or cancellation via `close`.
    pub async fn connect(http: &reqwest::Client, url: &str) -> Result<StreamSession, AppError> {
        let response = http
            .get(url)
            .header("Accept", "text/event-stream")
            .send()
            .await?
            .error_for_status()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut buffer = SseLineBuffer::new();
            loop {
                let chunk = tokio::select! {
                    _ = token.cancelled() => break,
                    chunk = body.next() => chunk,
                };
                match chunk {
                    Some(Ok(bytes)) => {
                        for payload in buffer.push(&bytes) {
                            match Envelope::decode(&payload) {
                                Some(envelope) => {
                                    if tx.send(SessionEvent::Envelope(envelope)).is_err() {
                                        return; // consumer closed
                                    }
                                }
                                None => {
                                    tracing::debug!(payload = %payload, "skipping unrecognized feed payload");
                                }
                            }
                        }
                    }
                    Some(Err(e)) => {
                        let _ = tx.send(SessionEvent::TransportFailed(e.to_string()));
                        return;
                    }
                    None => break, // server ended the feed
                }
            }
        });

        Ok(StreamSession {
            events: rx,
            cancel,
            closed: false,
        })
    }

    /// In-process session plus its feeding handle: the explicit
    /// single-consumer channel that makes ordering and cancellation
    /// testable deterministically.
    pub fn channel() -> (StreamSession, SessionHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = StreamSession {
            events: rx,
            cancel: CancellationToken::new(),
            closed: false,
        };
        (session, SessionHandle { tx })
    }

    /// Next event in arrival order. None once the session is closed or
    /// the feed has ended.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        if self.closed {
            return None;
        }
        let event = self.events.recv().await;
        if matches!(event, Some(SessionEvent::TransportFailed(_))) {
            // The subscription is done; nothing more may be yielded.
            self.close();
        }
        event
    }

    /// Close the subscription. Idempotent: returns true the first time,
    /// false on every further call, never errors.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.cancel.cancel();
        self.events.close();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
