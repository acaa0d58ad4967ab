use std::sync::Once;

use pretty_assertions::assert_eq;
use tracker_core::{
    update, AppState, BranchTable, CloseInfo, ConnectionState, Effect, Msg, PrNumber,
    SessionPhase, TransportKind, CLOSE_NORMAL, CLOSE_NO_STATUS,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tracker_logging::initialize_for_tests);
}

fn channel_state() -> AppState {
    AppState::new(TransportKind::Channel, BranchTable::default())
}

fn submit(state: AppState, input: &str) -> (AppState, Vec<Effect>) {
    let (state, _) = update(state, Msg::InputChanged(input.to_string()));
    update(state, Msg::QuerySubmitted)
}

fn open(state: AppState, channel: u64) -> (AppState, Vec<Effect>) {
    update(state, Msg::ChannelOpened { channel })
}

fn deliver(state: AppState, channel: u64, payload: &[u8]) -> AppState {
    let (state, effects) = update(
        state,
        Msg::ChannelMessage {
            channel,
            payload: payload.to_vec(),
        },
    );
    assert!(effects.is_empty());
    state
}

fn close(state: AppState, channel: u64, close: CloseInfo) -> AppState {
    update(state, Msg::ChannelClosed { channel, close }).0
}

#[test]
fn non_numeric_input_never_touches_the_channel() {
    init_logging();
    for raw in ["abc", "", "12x", "-5", "1.5"] {
        let (mut state, effects) = submit(channel_state(), raw);
        let view = state.view();

        assert!(effects.is_empty(), "input {raw:?}");
        assert_eq!(view.connection, ConnectionState::Closed);
        assert_eq!(view.error_message.as_deref(), Some("Error: not a number"));
        assert!(!view.busy);
        assert!(state.consume_dirty());
    }
}

#[test]
fn invalid_input_clears_busy_of_pending_query() {
    init_logging();
    let (state, _) = submit(channel_state(), "100");
    assert!(state.is_busy());

    let (state, effects) = submit(state, "oops");
    assert!(effects.is_empty());
    assert!(!state.is_busy());
    assert_eq!(state.view().phase, SessionPhase::Idle);
    assert_eq!(state.pending_query(), None);
    assert_eq!(state.connection_state(), ConnectionState::Connecting);

    // The abandoned query still goes out on open; its reply changes nothing.
    let (state, _) = open(state, 1);
    let state = deliver(state, 1, &[1, 1, 1, 1, 1]);
    assert!(state.view().checked_indices().is_empty());
    assert_eq!(state.view().error_message.as_deref(), Some("Error: not a number"));
}

#[test]
fn first_query_opens_exactly_one_channel_and_sends_on_open() {
    init_logging();
    let (state, effects) = submit(channel_state(), " 193766 ");
    assert_eq!(effects, vec![Effect::OpenChannel { channel: 1 }]);

    let view = state.view();
    assert!(view.busy);
    assert_eq!(view.error_message, None);
    assert_eq!(view.phase, SessionPhase::AwaitingConnection);
    assert_eq!(view.connection, ConnectionState::Connecting);
    assert_eq!(view.current_pr, Some(PrNumber::new(193766)));

    let (state, effects) = open(state, 1);
    assert_eq!(
        effects,
        vec![Effect::SendQuery {
            channel: 1,
            query: 1,
            pr: PrNumber::new(193766),
        }]
    );
    assert_eq!(state.view().phase, SessionPhase::Querying);
    assert_eq!(state.connection_state(), ConnectionState::Open);
}

#[test]
fn open_channel_is_reused_without_new_attempt() {
    init_logging();
    let (state, _) = submit(channel_state(), "1");
    let (state, _) = open(state, 1);
    let state = deliver(state, 1, &[0, 0, 0, 0, 0]);

    let (state, effects) = submit(state, "2");
    assert_eq!(
        effects,
        vec![Effect::SendQuery {
            channel: 1,
            query: 2,
            pr: PrNumber::new(2),
        }]
    );
    assert_eq!(state.view().phase, SessionPhase::Querying);
}

#[test]
fn query_while_connecting_is_queued_not_reconnected() {
    init_logging();
    let (state, _) = submit(channel_state(), "1");
    let (state, effects) = submit(state, "2");
    assert!(effects.is_empty());

    let (_state, effects) = open(state, 1);
    assert_eq!(
        effects,
        vec![
            Effect::SendQuery {
                channel: 1,
                query: 1,
                pr: PrNumber::new(1),
            },
            Effect::SendQuery {
                channel: 1,
                query: 2,
                pr: PrNumber::new(2),
            },
        ]
    );
}

#[test]
fn result_vector_sets_and_clears_markers() {
    init_logging();
    let (state, _) = submit(channel_state(), "42");
    let (state, _) = open(state, 1);
    let mut state = deliver(state, 1, &[1, 0, 1, 1, 0]);

    let view = state.view();
    assert_eq!(view.checked_indices(), vec![0, 2, 3]);
    assert!(!view.markers[1].checked);
    assert!(!view.markers[4].checked);
    assert!(!view.busy);
    assert_eq!(view.phase, SessionPhase::Idle);
    assert!(state.consume_dirty());
}

#[test]
fn non_one_bytes_clear_and_extra_bytes_are_ignored() {
    init_logging();
    let (state, _) = submit(channel_state(), "42");
    let (state, _) = open(state, 1);
    let state = deliver(state, 1, &[1, 1, 1, 1, 1]);

    let (state, _) = submit(state, "42");
    let state = deliver(state, 1, &[2, 255, 1, 0, 0, 1, 1]);
    assert_eq!(state.view().checked_indices(), vec![2]);
    assert_eq!(state.view().markers.len(), 5);
}

#[test]
fn short_vector_leaves_remaining_markers_untouched() {
    init_logging();
    let (state, _) = submit(channel_state(), "42");
    let (state, _) = open(state, 1);
    let state = deliver(state, 1, &[1, 1, 1, 1, 1]);

    let (state, _) = submit(state, "43");
    let state = deliver(state, 1, &[0, 0]);
    assert_eq!(state.view().checked_indices(), vec![2, 3, 4]);
    assert!(!state.is_busy());
}

#[test]
fn repeating_a_query_is_idempotent() {
    init_logging();
    let run_once = |state: AppState, channel_open: bool| {
        let (state, _) = submit(state, "193766");
        let state = if channel_open { state } else { open(state, 1).0 };
        deliver(state, 1, &[1, 0, 1, 1, 0])
    };

    let once = run_once(channel_state(), false);
    let twice = run_once(once.clone(), true);

    let strip = |s: &AppState| {
        let mut view = s.view();
        view.dirty = false;
        view
    };
    assert_eq!(strip(&once).markers, strip(&twice).markers);
    assert_eq!(strip(&once).busy, strip(&twice).busy);
    assert_eq!(strip(&once).error_message, strip(&twice).error_message);
}

#[test]
fn normal_close_after_results_shows_no_error() {
    init_logging();
    let (state, _) = submit(channel_state(), "42");
    let (state, _) = open(state, 1);
    let state = deliver(state, 1, &[1, 0, 0, 0, 0]);
    let state = close(state, 1, CloseInfo::clean(CLOSE_NORMAL, ""));

    let view = state.view();
    assert_eq!(view.connection, ConnectionState::Closed);
    assert_eq!(view.error_message, None);
    assert_eq!(view.checked_indices(), vec![0]);

    // A closed channel is replaced, never reused.
    let (_state, effects) = submit(state, "43");
    assert_eq!(effects, vec![Effect::OpenChannel { channel: 2 }]);
}

#[test]
fn clean_close_with_status_surfaces_reason_and_resets_markers() {
    init_logging();
    let (state, _) = submit(channel_state(), "42");
    let (state, _) = open(state, 1);
    let state = deliver(state, 1, &[1, 1, 0, 0, 0]);

    let (state, _) = submit(state, "999999999");
    let state = close(
        state,
        1,
        CloseInfo::clean(1003, "Error: Unable to find the PR provided"),
    );

    let view = state.view();
    assert_eq!(
        view.error_message.as_deref(),
        Some("Error: Unable to find the PR provided")
    );
    assert!(!view.busy);
    assert!(view.checked_indices().is_empty());
    assert_eq!(view.phase, SessionPhase::Idle);
}

#[test]
fn unclean_or_default_close_shows_no_message_but_clears_busy() {
    init_logging();
    let closes = [
        CloseInfo::abnormal("connection reset"),
        CloseInfo::clean(CLOSE_NORMAL, "bye"),
        CloseInfo::clean(CLOSE_NO_STATUS, ""),
    ];
    for info in closes {
        let (state, _) = submit(channel_state(), "42");
        let (state, _) = open(state, 1);
        let (state, effects) = update(
            state,
            Msg::ChannelClosed {
                channel: 1,
                close: info.clone(),
            },
        );
        assert_eq!(effects, vec![Effect::OpenChannel { channel: 2 }], "close {info:?}");
        assert!(state.is_busy(), "close {info:?}");

        let (state, _) = open(state, 2);
        let state = close(state, 2, info.clone());

        let view = state.view();
        assert_eq!(view.error_message, None, "close {info:?}");
        assert!(!view.busy, "close {info:?}");
        assert_eq!(view.connection, ConnectionState::Closed);
        assert_eq!(view.phase, SessionPhase::Idle);
    }
}

#[test]
fn query_sent_as_server_closes_after_reply_is_resent_on_new_channel() {
    init_logging();
    let (state, _) = submit(channel_state(), "1");
    let (state, _) = open(state, 1);
    let state = deliver(state, 1, &[1, 1, 1, 1, 1]);

    let (state, effects) = submit(state, "2");
    assert_eq!(
        effects,
        vec![Effect::SendQuery {
            channel: 1,
            query: 2,
            pr: PrNumber::new(2),
        }]
    );
    let (state, effects) = update(
        state,
        Msg::ChannelClosed {
            channel: 1,
            close: CloseInfo::clean(CLOSE_NORMAL, ""),
        },
    );
    assert_eq!(effects, vec![Effect::OpenChannel { channel: 2 }]);
    assert!(state.is_busy());
    assert_eq!(state.view().phase, SessionPhase::AwaitingConnection);

    let (state, effects) = open(state, 2);
    assert_eq!(
        effects,
        vec![Effect::SendQuery {
            channel: 2,
            query: 2,
            pr: PrNumber::new(2),
        }]
    );
    let state = deliver(state, 2, &[0, 0, 0, 0, 0]);
    let state = close(state, 2, CloseInfo::clean(CLOSE_NORMAL, ""));

    let view = state.view();
    assert_eq!(view.current_pr, Some(PrNumber::new(2)));
    assert!(view.checked_indices().is_empty());
    assert!(!view.busy);
    assert_eq!(view.error_message, None);
}

#[test]
fn unanswered_query_is_resent_only_once() {
    init_logging();
    let (state, _) = submit(channel_state(), "1");
    let (state, _) = open(state, 1);
    let state = deliver(state, 1, &[1, 1, 1, 1, 1]);
    let (state, _) = submit(state, "2");

    let (state, effects) = update(
        state,
        Msg::ChannelClosed {
            channel: 1,
            close: CloseInfo::clean(CLOSE_NORMAL, ""),
        },
    );
    assert_eq!(effects, vec![Effect::OpenChannel { channel: 2 }]);
    let (state, _) = open(state, 2);
    let (state, effects) = update(
        state,
        Msg::ChannelClosed {
            channel: 2,
            close: CloseInfo::clean(CLOSE_NORMAL, ""),
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert!(!view.busy);
    assert_eq!(view.current_pr, Some(PrNumber::new(2)));
    assert!(view.checked_indices().is_empty(), "previous PR's markers must not remain");
    assert_eq!(view.connection, ConnectionState::Closed);
}

#[test]
fn failed_connect_clears_busy_of_queued_query() {
    init_logging();
    let (state, _) = submit(channel_state(), "42");
    let state = close(state, 1, CloseInfo::abnormal("connect timed out"));

    assert!(!state.is_busy());
    assert_eq!(state.error(), None);
    assert_eq!(state.pending_query(), None);
}

#[test]
fn events_from_replaced_channel_are_ignored() {
    init_logging();
    let (state, _) = submit(channel_state(), "1");
    let state = close(state, 1, CloseInfo::abnormal("gone"));
    let (state, effects) = submit(state, "2");
    assert_eq!(effects, vec![Effect::OpenChannel { channel: 2 }]);

    let (state, effects) = open(state, 1);
    assert!(effects.is_empty());
    let state = deliver(state, 1, &[1, 1, 1, 1, 1]);
    let state = close(state, 1, CloseInfo::clean(1003, "stale"));

    let view = state.view();
    assert!(view.busy);
    assert!(view.checked_indices().is_empty());
    assert_eq!(view.error_message, None);
    assert_eq!(view.connection, ConnectionState::Connecting);
}

#[test]
fn stale_result_is_discarded_in_favour_of_latest_query() {
    init_logging();
    let (state, _) = submit(channel_state(), "1");
    let (state, _) = open(state, 1);
    let (state, effects) = submit(state, "2");
    assert_eq!(effects.len(), 1);

    // First reply belongs to query 1, which is stale now.
    let state = deliver(state, 1, &[1, 1, 1, 1, 1]);
    assert!(state.is_busy());
    assert!(state.view().checked_indices().is_empty());

    let state = deliver(state, 1, &[0, 1, 0, 0, 0]);
    assert!(!state.is_busy());
    assert_eq!(state.view().checked_indices(), vec![1]);
}

#[test]
fn unsolicited_message_is_ignored() {
    init_logging();
    let (state, _) = submit(channel_state(), "1");
    let (state, _) = open(state, 1);
    let state = deliver(state, 1, &[0, 0, 0, 0, 0]);
    let before = state.view();

    let state = deliver(state, 1, &[1, 1, 1, 1, 1]);
    assert_eq!(state.view().markers, before.markers);
}

#[test]
fn timeout_clears_busy_and_drops_late_results() {
    init_logging();
    let (state, _) = submit(channel_state(), "7");
    let (state, _) = open(state, 1);
    let query = state.pending_query().expect("query pending");

    let (state, _) = update(state, Msg::QueryTimedOut { query });
    assert!(!state.is_busy());
    assert_eq!(
        state.view().error_message.as_deref(),
        Some("Error: timed out waiting for results")
    );

    let state = deliver(state, 1, &[1, 1, 1, 1, 1]);
    assert!(state.view().checked_indices().is_empty());
}

#[test]
fn timeout_for_settled_query_is_ignored() {
    init_logging();
    let (state, _) = submit(channel_state(), "7");
    let (state, _) = open(state, 1);
    let state = deliver(state, 1, &[1, 0, 0, 0, 0]);

    let (state, _) = update(state, Msg::QueryTimedOut { query: 1 });
    assert_eq!(state.view().error_message, None);
}

#[test]
fn new_submit_clears_previous_error() {
    init_logging();
    let (state, _) = submit(channel_state(), "nope");
    assert!(state.view().error_message.is_some());

    let (state, _) = submit(state, "12");
    assert_eq!(state.view().error_message, None);
    assert!(state.is_busy());
}
