use crate::{AppState, Effect, Msg, PrNumber};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(raw) => {
            state.set_input(raw);
            Vec::new()
        }
        Msg::QuerySubmitted => match PrNumber::parse(state.input()) {
            Ok(pr) => state.begin_query(pr),
            Err(_) => {
                state.reject_input();
                Vec::new()
            }
        },
        Msg::ChannelOpened { channel } => state.channel_opened(channel),
        Msg::ChannelMessage { channel, payload } => {
            state.channel_message(channel, &payload);
            Vec::new()
        }
        Msg::ChannelClosed { channel, close } => state.channel_closed(channel, &close),
        Msg::BranchResolved {
            query,
            branch,
            outcome,
        } => {
            state.branch_resolved(query, branch, outcome);
            Vec::new()
        }
        Msg::QueryTimedOut { query } => {
            state.query_timed_out(query);
            Vec::new()
        }
    };

    (state, effects)
}
