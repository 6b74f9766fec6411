//! HTTP plumbing shared by the remote providers

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// Retry an operation with exponential backoff (1s, 2s, 4s, ...)
pub async fn retry_request<F, Fut, T>(max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt < max_retries {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::generation("Unknown error")))
}

struct LineState<S> {
    bytes: S,
    buf: Vec<u8>,
    pending: VecDeque<String>,
    finished: bool,
}

/// Split a response body into non-empty text lines.
///
/// Lines may straddle network chunks; a trailing line without a newline is
/// flushed when the body ends. A transport error is yielded once and ends
/// the stream.
pub fn lines<S, E>(bytes: S) -> BoxStream<'static, Result<String>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + Unpin + 'static,
    E: Display + Send + 'static,
{
    let state = LineState {
        bytes,
        buf: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(line) = st.pending.pop_front() {
                return Some((Ok(line), st));
            }
            if st.finished {
                let rest = std::mem::take(&mut st.buf);
                let rest = String::from_utf8_lossy(&rest).trim().to_string();
                if rest.is_empty() {
                    return None;
                }
                return Some((Ok(rest), st));
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    st.buf.extend_from_slice(&chunk);
                    while let Some(pos) = st.buf.iter().position(|b| *b == b'\n') {
                        let line: Vec<u8> = st.buf.drain(..=pos).collect();
                        let text = String::from_utf8_lossy(&line).trim().to_string();
                        if !text.is_empty() {
                            st.pending.push_back(text);
                        }
                    }
                }
                Some(Err(e)) => {
                    st.finished = true;
                    st.buf.clear();
                    return Some((Err(Error::generation(format!("Stream error: {}", e))), st));
                }
                None => st.finished = true,
            }
        }
    })
    .boxed()
}
