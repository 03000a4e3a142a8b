//! A single change-stream session.

use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::database::{DatabaseRef, QueryOption};
use crate::error::{decode_server_error, FirebaseError, FirebaseResult};
use crate::sse::{Event, FrameReader};
use crate::traits::HttpError;

/// Open a change stream on `db` and deliver its events on a channel.
///
/// Fails without spawning anything if the stream cannot be established.
/// Otherwise a background task forwards events until the stream ends, a
/// frame is malformed, the receiver is dropped, or `cancel` fires. A stream
/// that ends on its own delivers exactly one terminal event before the
/// channel closes; cancellation closes the channel without one.
///
/// Sends block while the channel is full, so a slow consumer slows reading
/// from the server rather than losing events.
pub async fn watch(
    db: &DatabaseRef,
    cancel: CancellationToken,
    options: &[QueryOption],
) -> FirebaseResult<mpsc::Receiver<Event>> {
    let url = db.request_url(options);
    let mut headers = db.headers().await?;
    headers.insert("Accept".to_string(), "text/event-stream".to_string());

    let stream = db
        .http()
        .get_stream(&url, &headers)
        .await
        .map_err(|err| match err {
            HttpError::ServerError { status, message } => {
                decode_server_error(status, message.as_bytes())
            }
            other => FirebaseError::Http(other),
        })?;

    debug!("Watching {}", url);
    Ok(spawn_session(
        FrameReader::from_stream(stream),
        db.watch_buffer_len(),
        cancel,
    ))
}

/// Drive `frames` on a background task, returning the event channel.
pub(crate) fn spawn_session<R>(
    frames: FrameReader<R>,
    capacity: usize,
    cancel: CancellationToken,
) -> mpsc::Receiver<Event>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity);
    tokio::spawn(run_session(frames, tx, cancel));
    rx
}

async fn run_session<R: AsyncBufRead + Unpin>(
    mut frames: FrameReader<R>,
    tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
) {
    loop {
        let (event, last) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Watch cancelled");
                return;
            }
            frame = frames.read_frame() => match frame {
                Ok(event) => (event, false),
                Err(err) => {
                    warn!("Watch stream ended: {}", err);
                    (Event::from(err), true)
                }
            },
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Watch cancelled while delivering an event");
                return;
            }
            sent = tx.send(event) => {
                if sent.is_err() {
                    debug!("Watch receiver dropped, closing stream");
                    return;
                }
            }
        }

        if last {
            return;
        }
    }
}
