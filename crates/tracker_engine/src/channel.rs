use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use crate::{ChannelId, CloseReport, EngineEvent, EventSink, CLOSE_NO_STATUS};

#[derive(Debug, Clone)]
pub struct ChannelSettings {
    pub connect_timeout: Duration,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Drives one status channel until it closes or the engine shuts down.
///
/// Every channel ends with exactly one `ChannelClosed` event, except when the
/// engine is cancelled.
pub(crate) async fn run_channel(
    channel: ChannelId,
    url: String,
    settings: ChannelSettings,
    mut outbound: mpsc::UnboundedReceiver<String>,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
) {
    tracker_info!("channel {} connecting to {}", channel, url);
    let connect = tokio_tungstenite::connect_async(url.as_str());
    let stream = match tokio::time::timeout(settings.connect_timeout, connect).await {
        Ok(Ok((stream, response))) => {
            tracker_debug!(
                "channel {} handshake done (status {})",
                channel,
                response.status()
            );
            stream
        }
        Ok(Err(err)) => {
            tracker_warn!("channel {} connect failed: {}", channel, err);
            emit_closed(sink.as_ref(), channel, CloseReport::abnormal(err.to_string()));
            return;
        }
        Err(_) => {
            tracker_warn!(
                "channel {} connect timed out after {:?}",
                channel,
                settings.connect_timeout
            );
            emit_closed(sink.as_ref(), channel, CloseReport::abnormal("connect timed out"));
            return;
        }
    };

    sink.emit(EngineEvent::ChannelOpened { channel });
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                tracker_debug!("channel {} cancelled", channel);
                return;
            }
            outgoing = outbound.recv() => {
                let Some(text) = outgoing else {
                    let _ = write.send(Message::Close(None)).await;
                    return;
                };
                tracker_debug!("channel {} sending {:?}", channel, text);
                if let Err(err) = write.send(Message::text(text)).await {
                    tracker_warn!("channel {} send failed: {}", channel, err);
                    emit_closed(sink.as_ref(), channel, CloseReport::abnormal(err.to_string()));
                    return;
                }
            }
            incoming = read.next() => match incoming {
                Some(Ok(Message::Binary(payload))) => {
                    sink.emit(EngineEvent::ChannelMessage {
                        channel,
                        payload: payload.to_vec(),
                    });
                }
                Some(Ok(Message::Close(frame))) => {
                    emit_closed(sink.as_ref(), channel, close_report(frame));
                    return;
                }
                Some(Ok(Message::Text(text))) => {
                    tracker_warn!(
                        "channel {} ignoring unsupported text frame ({} bytes)",
                        channel,
                        text.len()
                    );
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracker_warn!("channel {} read failed: {}", channel, err);
                    emit_closed(sink.as_ref(), channel, CloseReport::abnormal(err.to_string()));
                    return;
                }
                None => {
                    emit_closed(
                        sink.as_ref(),
                        channel,
                        CloseReport::abnormal("stream ended without close frame"),
                    );
                    return;
                }
            },
        }
    }
}

fn emit_closed(sink: &dyn EventSink, channel: ChannelId, report: CloseReport) {
    tracker_info!(
        "channel {} closed (clean={}, code={}, reason={:?})",
        channel,
        report.was_clean,
        report.code,
        report.reason
    );
    sink.emit(EngineEvent::ChannelClosed { channel, report });
}

fn close_report(frame: Option<CloseFrame>) -> CloseReport {
    match frame {
        Some(frame) => CloseReport {
            was_clean: true,
            code: u16::from(frame.code),
            reason: frame.reason.as_str().to_owned(),
        },
        None => CloseReport {
            was_clean: true,
            code: CLOSE_NO_STATUS,
            reason: String::new(),
        },
    }
}
