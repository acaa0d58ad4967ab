use std::collections::HashMap;
use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc as async_mpsc;
use tokio_util::sync::CancellationToken;
use tracker_logging::{tracker_debug, tracker_warn};

use crate::channel::{run_channel, ChannelSettings};
use crate::{BranchLookup, ChannelId, EngineEvent, EventSink, QueryId};

#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub channel: ChannelSettings,
}

enum EngineCommand {
    OpenChannel {
        channel: ChannelId,
        url: String,
    },
    SendText {
        channel: ChannelId,
        text: String,
    },
    Lookup {
        query: QueryId,
        pr: u32,
        branch: usize,
        name: String,
    },
    Shutdown,
}

/// Owns the I/O thread. Commands are fire-and-forget; results arrive on the
/// sink given at construction.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(
        settings: EngineSettings,
        lookup: Arc<dyn BranchLookup>,
        sink: Arc<dyn EventSink>,
    ) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();

        thread::Builder::new()
            .name("tracker-engine".to_string())
            .spawn(move || {
                let cancel = CancellationToken::new();
                let mut channels: HashMap<ChannelId, async_mpsc::UnboundedSender<String>> =
                    HashMap::new();

                while let Ok(command) = cmd_rx.recv() {
                    match command {
                        EngineCommand::OpenChannel { channel, url } => {
                            channels.retain(|_, tx| !tx.is_closed());
                            let (tx, rx) = async_mpsc::unbounded_channel();
                            channels.insert(channel, tx);
                            runtime.spawn(run_channel(
                                channel,
                                url,
                                settings.channel.clone(),
                                rx,
                                sink.clone(),
                                cancel.child_token(),
                            ));
                        }
                        EngineCommand::SendText { channel, text } => {
                            match channels.get(&channel) {
                                Some(tx) if tx.send(text).is_ok() => {}
                                _ => {
                                    tracker_warn!("send on unknown or closed channel {}", channel);
                                    channels.remove(&channel);
                                }
                            }
                        }
                        EngineCommand::Lookup {
                            query,
                            pr,
                            branch,
                            name,
                        } => {
                            let lookup = lookup.clone();
                            let sink = sink.clone();
                            runtime.spawn(async move {
                                let result = lookup.is_merged(pr, &name).await;
                                sink.emit(EngineEvent::LookupCompleted {
                                    query,
                                    branch,
                                    result,
                                });
                            });
                        }
                        EngineCommand::Shutdown => break,
                    }
                }

                tracker_debug!("engine shutting down ({} channels)", channels.len());
                cancel.cancel();
                drop(channels);
                runtime.shutdown_timeout(Duration::from_millis(500));
            })?;

        Ok(Self { cmd_tx })
    }

    pub fn open_channel(&self, channel: ChannelId, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::OpenChannel {
            channel,
            url: url.into(),
        });
    }

    pub fn send_text(&self, channel: ChannelId, text: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::SendText {
            channel,
            text: text.into(),
        });
    }

    pub fn lookup(&self, query: QueryId, pr: u32, branch: usize, name: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Lookup {
            query,
            pr,
            branch,
            name: name.into(),
        });
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
