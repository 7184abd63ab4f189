//! # Server-Sent-Events transport.
//!
//! Serves a [`Hub`] over HTTP/1 as a `text/event-stream`. Every client that
//! opens `GET <path>` becomes one hub subscriber for the lifetime of its
//! connection.
//!
//! ```text
//! TcpListener ─accept─► http1 connection ─► route()
//!                                             ├─ GET <path> ─► hub.register() ─► pump task
//!                                             │                  Subscription::next()
//!                                             │                    └─► encode_event() ─► body channel ─► client
//!                                             ├─ other path ─► 404
//!                                             └─ other method ─► 405
//! ```
//!
//! A client that goes away closes the body channel; the pump notices and
//! closes the subscription with [`CloseReason::SinkFailure`](crate::CloseReason).
//! When the hub closes, each body ends after its pending lines are sent.

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, StreamBody, combinators::UnsyncBoxBody};
use hyper::body::{Frame, Incoming};
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::hub::{Hub, Subscription};

/// Frames buffered between a subscription and its HTTP body.
const BODY_BUFFER: usize = 16;

/// Response body type used by every route.
pub type SseBody = UnsyncBoxBody<Bytes, Infallible>;

/// Settings for [`serve`].
#[derive(Clone, Debug)]
pub struct SseConfig {
    /// Request path of the event stream.
    pub path: String,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            path: "/stream".to_string(),
        }
    }
}

/// Accepts connections on `listener` until `token` is cancelled.
///
/// Connections already streaming keep going until the hub closes or the
/// client disconnects.
///
/// # Errors
/// Returns the error from reading the listener's local address.
pub async fn serve(
    listener: TcpListener,
    hub: Hub,
    cfg: SseConfig,
    token: CancellationToken,
) -> std::io::Result<()> {
    let path: Arc<str> = Arc::from(cfg.path);
    tracing::info!(addr = %listener.local_addr()?, path = %path, "sse transport listening");

    loop {
        let (stream, remote) = tokio::select! {
            _ = token.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    continue;
                }
            },
        };

        let hub = hub.clone();
        let path = Arc::clone(&path);
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req: Request<Incoming>| {
                let resp = route(req.method(), req.uri().path(), &hub, &path);
                async move { Ok::<_, Infallible>(resp) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::debug!(%remote, error = %e, "connection ended with error");
            }
        });
    }

    tracing::info!("sse transport stopped accepting");
    Ok(())
}

/// Builds the response for one request.
fn route(method: &Method, path: &str, hub: &Hub, stream_path: &str) -> Response<SseBody> {
    if path != stream_path {
        return plain(StatusCode::NOT_FOUND, "not found\n");
    }
    if method != Method::GET {
        let mut resp = plain(StatusCode::METHOD_NOT_ALLOWED, "method not allowed\n");
        resp.headers_mut()
            .insert(header::ALLOW, HeaderValue::from_static("GET"));
        return resp;
    }

    let sub = hub.register();
    tracing::debug!(subscriber = %sub.id(), "sse client connected");

    let (tx, mut rx) = mpsc::channel::<Bytes>(BODY_BUFFER);
    tokio::spawn(pump(sub, tx));

    let frames = futures::stream::poll_fn(move |cx| {
        rx.poll_recv(cx)
            .map(|chunk| chunk.map(|b| Ok::<_, Infallible>(Frame::data(b))))
    });

    let mut resp = Response::new(StreamBody::new(frames).boxed_unsync());
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    resp
}

fn plain(status: StatusCode, text: &'static str) -> Response<SseBody> {
    let mut resp = Response::new(Full::new(Bytes::from_static(text.as_bytes())).boxed_unsync());
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    resp
}

/// Moves lines from one subscription into its body channel.
async fn pump(mut sub: Subscription, tx: mpsc::Sender<Bytes>) {
    loop {
        let next = tokio::select! {
            line = sub.next() => line,
            _ = tx.closed() => {
                tracing::debug!(subscriber = %sub.id(), "sse client went away");
                sub.sink_failed();
                return;
            }
        };

        // Hub closed and drained: dropping `tx` ends the body.
        let Some(line) = next else { return };

        if tx.send(encode_event(&line)).await.is_err() {
            tracing::debug!(subscriber = %sub.id(), "sse client went away");
            sub.sink_failed();
            return;
        }
    }
}

/// Encodes one line as an SSE event.
///
/// Each line of the text becomes its own `data:` field so embedded line
/// breaks survive. `\r\n`, `\r` and `\n` all count as breaks, as they do
/// for SSE parsers, so payload text can never start a field of its own. A
/// blank line terminates the event.
///
/// ```
/// use logcast::sse::encode_event;
///
/// assert_eq!(&encode_event("Offset=1; message=hi")[..], b"data: Offset=1; message=hi\n\n");
/// ```
pub fn encode_event(text: &str) -> Bytes {
    let mut buf = String::with_capacity(text.len() + 8);
    buf.push_str("data: ");

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                chars.next_if_eq(&'\n');
                buf.push_str("\ndata: ");
            }
            '\n' => buf.push_str("\ndata: "),
            c => buf.push(c),
        }
    }

    buf.push_str("\n\n");
    Bytes::from(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::HubConfig;
    use crate::record::format_line;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn wait_for(mut cond: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[test]
    fn test_multiline_payload_framing() {
        assert_eq!(
            &encode_event("Offset=3; message=a\nb\r\nc")[..],
            b"data: Offset=3; message=a\ndata: b\ndata: c\n\n"
        );
        assert_eq!(&encode_event("")[..], b"data: \n\n");
    }

    #[test]
    fn test_lone_carriage_return_starts_new_data_field() {
        let encoded = encode_event("Offset=1; message=x\revent: evil\r\rid: 7\n");
        assert_eq!(
            &encoded[..],
            b"data: Offset=1; message=x\ndata: event: evil\ndata: \ndata: id: 7\ndata: \n\n"
        );

        let text = std::str::from_utf8(&encoded).expect("utf8");
        let body = text.strip_suffix("\n\n").expect("event terminator");
        for line in body.split(['\r', '\n']) {
            assert!(line.starts_with("data: "), "unframed line: {line:?}");
        }
    }

    #[tokio::test]
    async fn test_route_rejects_other_paths_and_methods() {
        let hub = Hub::new(HubConfig::default());

        let resp = route(&Method::GET, "/nope", &hub, "/stream");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = route(&Method::POST, "/stream", &hub, "/stream");
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()[header::ALLOW], "GET");

        assert!(hub.is_empty());
    }

    #[tokio::test]
    async fn test_stream_delivers_events_then_ends_on_close() {
        let hub = Hub::new(HubConfig::default());
        let resp = route(&Method::GET, "/stream", &hub, "/stream");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-cache");
        assert_eq!(hub.len(), 1);

        hub.publish(format_line(1, "a"));
        hub.publish(format_line(2, "b"));
        hub.close();

        let mut body = resp.into_body();
        let mut got = Vec::new();
        while let Some(frame) = body.frame().await {
            let frame = frame.expect("infallible");
            if let Ok(data) = frame.into_data() {
                got.extend_from_slice(&data);
            }
        }
        assert_eq!(
            got,
            b"data: Offset=1; message=a\n\ndata: Offset=2; message=b\n\n"
        );
    }

    #[tokio::test]
    async fn test_dropped_body_unregisters_subscriber() {
        let hub = Hub::new(HubConfig::default());
        let resp = route(&Method::GET, "/stream", &hub, "/stream");
        assert_eq!(hub.len(), 1);

        drop(resp);
        wait_for(|| hub.is_empty()).await;
    }

    #[tokio::test]
    async fn test_serve_over_tcp() {
        let hub = Hub::new(HubConfig::default());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let token = CancellationToken::new();
        let server = tokio::spawn(serve(
            listener,
            hub.clone(),
            SseConfig::default(),
            token.clone(),
        ));

        let mut conn = tokio::net::TcpStream::connect(addr).await.expect("connect");
        conn.write_all(b"GET /stream HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .expect("write");
        wait_for(|| hub.len() == 1).await;

        hub.publish(format_line(9, "hi"));

        let mut seen = Vec::new();
        let mut buf = [0u8; 1024];
        tokio::time::timeout(Duration::from_secs(5), async {
            while !String::from_utf8_lossy(&seen).contains("data: Offset=9; message=hi\n\n") {
                let n = conn.read(&mut buf).await.expect("read");
                assert!(n > 0, "connection closed early");
                seen.extend_from_slice(&buf[..n]);
            }
        })
        .await
        .expect("event not received");

        let head = String::from_utf8_lossy(&seen).to_lowercase();
        assert!(head.starts_with("http/1.1 200"));
        assert!(head.contains("content-type: text/event-stream"));

        // The server only notices a vanished peer when a write fails.
        drop(conn);
        wait_for(|| {
            hub.publish(format_line(10, "ping"));
            hub.is_empty()
        })
        .await;

        token.cancel();
        server.await.expect("join").expect("serve");
    }
}
