use std::sync::{mpsc, Arc};

use anyhow::Context;
use tracker_core::{CloseInfo, Effect, LookupFailure, Msg};
use tracker_engine::{
    EngineEvent, EngineHandle, EventSink, GithubLookup, LookupFailureKind,
};
use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use super::config::AppConfig;

/// Executes core effects on the engine and feeds engine events back as
/// messages.
pub struct EffectRunner {
    engine: EngineHandle,
    channel_url: String,
}

impl EffectRunner {
    pub fn new(config: &AppConfig, msg_tx: mpsc::Sender<Msg>) -> anyhow::Result<Self> {
        let lookup = GithubLookup::new(config.lookup_settings())
            .context("failed to set up GitHub lookup client")?;
        let engine = EngineHandle::new(
            config.engine_settings(),
            Arc::new(lookup),
            Arc::new(MsgSink { tx: msg_tx }),
        )
        .context("failed to start engine")?;

        Ok(Self {
            engine,
            channel_url: config.channel_url.clone(),
        })
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::OpenChannel { channel } => {
                    tracker_info!("OpenChannel channel={} url={}", channel, self.channel_url);
                    self.engine.open_channel(channel, self.channel_url.clone());
                }
                Effect::SendQuery { channel, query, pr } => {
                    tracker_info!("SendQuery channel={} query={} pr={}", channel, query, pr);
                    self.engine.send_text(channel, pr.to_string());
                }
                Effect::LookupBranch {
                    query,
                    pr,
                    branch,
                    name,
                } => {
                    tracker_debug!("LookupBranch query={} pr={} branch={}", query, pr, name);
                    self.engine.lookup(query, pr.get(), branch, name);
                }
            }
        }
    }
}

struct MsgSink {
    tx: mpsc::Sender<Msg>,
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(map_event(event));
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::ChannelOpened { channel } => Msg::ChannelOpened { channel },
        EngineEvent::ChannelMessage { channel, payload } => {
            Msg::ChannelMessage { channel, payload }
        }
        EngineEvent::ChannelClosed { channel, report } => Msg::ChannelClosed {
            channel,
            close: CloseInfo {
                was_clean: report.was_clean,
                code: report.code,
                reason: report.reason,
            },
        },
        EngineEvent::LookupCompleted {
            query,
            branch,
            result,
        } => {
            let outcome = match result {
                Ok(present) => Ok(present),
                Err(err) if err.kind == LookupFailureKind::NotFound => {
                    tracker_info!("Lookup query={} branch={}: {}", query, branch, err);
                    Err(LookupFailure::NotFound)
                }
                Err(err) => {
                    tracker_warn!("Lookup query={} branch={} failed: {}", query, branch, err);
                    Err(LookupFailure::Other)
                }
            };
            Msg::BranchResolved {
                query,
                branch,
                outcome,
            }
        }
    }
}
