//! Bounded request body buffering that never loses bytes or trailers.

use axum::body::Body;
use bytes::{Bytes, BytesMut};
use futures::{stream, StreamExt};
use http::HeaderMap;
use http_body::Frame;
use http_body_util::{BodyExt, BodyStream, StreamBody};
use tracing::debug;

/// Read `body` into memory, up to `limit` bytes of data.
///
/// Returns a body that yields exactly the original data and trailers,
/// together with the captured data. When the body is larger than `limit` or
/// fails while being read, nothing is captured and the returned body replays
/// the bytes already read followed by the unread remainder (or the error).
pub(crate) async fn tee_body(mut body: Body, limit: usize) -> (Body, Option<Bytes>) {
    let mut buffer = BytesMut::new();
    let mut trailers: Option<HeaderMap> = None;

    while let Some(frame) = body.frame().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                debug!(error = %err, "body failed while buffering, skipping capture");
                let replay = stream::iter(head_frames(buffer.freeze(), trailers))
                    .map(Ok)
                    .chain(stream::iter([Err(err)]));
                return (Body::new(StreamBody::new(replay)), None);
            }
        };

        let frame = match frame.into_data() {
            Ok(data) => data,
            Err(frame) => {
                if let Ok(map) = frame.into_trailers() {
                    trailers.get_or_insert_with(HeaderMap::new).extend(map);
                }
                continue;
            }
        };
        buffer.extend_from_slice(&frame);

        if buffer.len() > limit {
            debug!(limit, "body exceeds buffer limit, skipping capture");
            let replay = stream::iter(head_frames(buffer.freeze(), trailers))
                .map(Ok)
                .chain(BodyStream::new(body));
            return (Body::new(StreamBody::new(replay)), None);
        }
    }

    let captured = buffer.freeze();
    let replay = stream::iter(head_frames(captured.clone(), trailers)).map(Ok::<_, axum::Error>);
    (Body::new(StreamBody::new(replay)), Some(captured))
}

/// Frames replaying what has been read so far: the data, then any trailers.
fn head_frames(data: Bytes, trailers: Option<HeaderMap>) -> Vec<Frame<Bytes>> {
    let mut frames = Vec::with_capacity(2);
    if !data.is_empty() {
        frames.push(Frame::data(data));
    }
    if let Some(trailers) = trailers {
        frames.push(Frame::trailers(trailers));
    }
    frames
}
