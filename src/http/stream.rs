//! Streaming relay: one named stream to one client over SSE.
//!
//! # Responsibilities
//! - Check preconditions (manager configured, stream named and present)
//!   before any event-stream byte is written
//! - Write each published event as one SSE frame, in publish order
//! - Watch the connection and log when the client goes away
//!
//! # Design Decisions
//! - The watcher is tied to the response body: dropping the body (client
//!   disconnect, server shutdown) is what releases it, so it cannot outlive
//!   the connection
//! - Channel lifecycle belongs to the stream manager; the relay never closes it
//! - No heartbeat: an idle stream stays open until either side ends it

use std::convert::Infallible;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::extract::{ConnectInfo, Query, Request, State};
use axum::http::{StatusCode, Uri};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tokio::sync::oneshot;
use tokio_stream::Stream;

use crate::http::request::client_ip;
use crate::http::response::respond_failure;
use crate::http::server::AppState;
use crate::streams::{StreamEvent, StreamManager, Subscription};

/// Query string of a relay request.
#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    pub stream: Option<String>,
}

/// Why the relay precondition check failed.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("stream manager is not configured")]
    NotConfigured,
    #[error("please specify a stream")]
    MissingName,
    #[error("stream not found: {0}")]
    NotFound(String),
}

impl StreamError {
    pub fn status(&self) -> StatusCode {
        match self {
            StreamError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            StreamError::MissingName => StatusCode::BAD_REQUEST,
            StreamError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

/// How a relayed connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    /// The stream was closed server-side and fully written.
    StreamClosed,
    /// The body was dropped before the stream ended.
    ClientDisconnected,
}

/// Axum handler relaying `?stream=<name>` from the server's stream manager.
pub async fn relay(State(state): State<AppState>, req: Request) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_ip(req.headers(), peer);
    let query = Query::<StreamQuery>::try_from_uri(req.uri())
        .map(|Query(query)| query)
        .unwrap_or_default();
    respond_stream(state.streams.as_deref(), req.uri(), query.stream.as_deref(), client)
}

/// Relay `stream` from `manager` as the response to `uri`.
pub fn respond_stream(
    manager: Option<&StreamManager>,
    uri: &Uri,
    stream: Option<&str>,
    client: String,
) -> Response {
    let subscription = match open(manager, stream) {
        Ok(subscription) => subscription,
        Err(err) => return respond_failure(uri, Some(err.status()), Some(&err)),
    };
    let name = stream.unwrap_or_default().to_string();

    let (body, done) = RelayStream::new(subscription.into_stream());
    tokio::spawn(watch_client(done, client, name));

    Sse::new(body).into_response()
}

fn open(manager: Option<&StreamManager>, stream: Option<&str>) -> Result<Subscription, StreamError> {
    let manager = manager.ok_or(StreamError::NotConfigured)?;
    let name = stream
        .filter(|name| !name.is_empty())
        .ok_or(StreamError::MissingName)?;
    manager
        .subscribe(name)
        .ok_or_else(|| StreamError::NotFound(name.to_string()))
}

/// Wait for the relay body to finish and log how it ended.
pub async fn watch_client(done: oneshot::Receiver<()>, client: String, stream: String) -> Ending {
    match done.await {
        Ok(()) => {
            tracing::info!(client = %client, stream = %stream, "Stream closed by server");
            Ending::StreamClosed
        }
        Err(_) => {
            tracing::info!(stream = %stream, "The client is disconnected: {}", client);
            Ending::ClientDisconnected
        }
    }
}

type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// SSE body that reports its own end to the watcher.
///
/// Exhausting the stream sends on `done`; dropping it early drops the
/// sender, which the watcher sees as a disconnect.
pub struct RelayStream {
    inner: EventStream,
    done: Option<oneshot::Sender<()>>,
}

impl RelayStream {
    pub fn new(inner: impl Stream<Item = StreamEvent> + Send + 'static) -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let stream = Self {
            inner: Box::pin(inner),
            done: Some(tx),
        };
        (stream, rx)
    }
}

impl Stream for RelayStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(event)) => Poll::Ready(Some(Ok(event.to_sse()))),
            Poll::Ready(None) => {
                if let Some(done) = self.done.take() {
                    let _ = done.send(());
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
