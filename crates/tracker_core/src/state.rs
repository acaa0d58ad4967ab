use std::collections::VecDeque;

use crate::view_model::{AppViewModel, MarkerView};
use crate::{BranchIndex, BranchTable, Effect, PrNumber, SessionError};

pub type QueryId = u64;
pub type ChannelId = u64;

/// Which transport carries queries to the status source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// One persistent channel; one binary result vector per query.
    #[default]
    Channel,
    /// One asynchronous lookup per tracked branch.
    Lookup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Closed,
    Connecting,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    AwaitingConnection,
    Querying,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Connection {
    id: ChannelId,
    open: bool,
    /// Accepted while connecting; sent once the channel opens.
    queued: Vec<(QueryId, PrNumber)>,
    /// Sent and awaiting a result vector, oldest first.
    in_flight: VecDeque<QueryId>,
}

impl Connection {
    fn carries(&self, query: QueryId) -> bool {
        self.queued.iter().any(|(id, _)| *id == query) || self.in_flight.contains(&query)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveQuery {
    id: QueryId,
    pr: PrNumber,
    /// Lookups still outstanding; unused by the channel transport.
    pending: usize,
    /// Results arriving after this is set are ignored.
    settled: bool,
    /// Already re-sent once after its channel closed without answering.
    resent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    transport: TransportKind,
    branches: BranchTable,
    input: String,
    phase: SessionPhase,
    busy: bool,
    error: Option<SessionError>,
    markers: Vec<bool>,
    connection: Option<Connection>,
    next_channel: ChannelId,
    query: Option<ActiveQuery>,
    next_query: QueryId,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(TransportKind::default(), BranchTable::default())
    }
}

impl AppState {
    pub fn new(transport: TransportKind, branches: BranchTable) -> Self {
        let markers = vec![false; branches.len()];
        Self {
            transport,
            branches,
            input: String::new(),
            phase: SessionPhase::Idle,
            busy: false,
            error: None,
            markers,
            connection: None,
            next_channel: 1,
            query: None,
            next_query: 1,
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            transport: self.transport,
            phase: self.phase,
            busy: self.busy,
            input: self.input.clone(),
            current_pr: self.query.as_ref().map(|q| q.pr),
            error_message: self.error.as_ref().map(ToString::to_string),
            connection: self.connection_state(),
            markers: self
                .branches
                .iter()
                .map(|(index, name)| MarkerView {
                    index,
                    branch: name.to_string(),
                    checked: self.markers.get(index).copied().unwrap_or(false),
                })
                .collect(),
            dirty: self.dirty,
        }
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// The latest accepted query, while its results are still awaited.
    pub fn pending_query(&self) -> Option<QueryId> {
        self.query
            .as_ref()
            .filter(|q| !q.settled && self.busy)
            .map(|q| q.id)
    }

    pub fn connection_state(&self) -> ConnectionState {
        match &self.connection {
            None => ConnectionState::Closed,
            Some(conn) if conn.open => ConnectionState::Open,
            Some(_) => ConnectionState::Connecting,
        }
    }

    /// Returns whether the state changed since the last call, and resets it.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn set_input(&mut self, raw: String) {
        if self.input != raw {
            self.input = raw;
            self.dirty = true;
        }
    }

    pub(crate) fn input(&self) -> &str {
        &self.input
    }

    /// Rejects the current input; a query still awaiting results is abandoned.
    pub(crate) fn reject_input(&mut self) {
        self.settle_latest();
        self.error = Some(SessionError::InvalidInput);
    }

    /// Registers a new query and returns the effects that start it.
    pub(crate) fn begin_query(&mut self, pr: PrNumber) -> Vec<Effect> {
        let id = self.next_query;
        self.next_query += 1;
        self.error = None;
        self.busy = true;
        self.dirty = true;
        self.query = Some(ActiveQuery {
            id,
            pr,
            pending: 0,
            settled: false,
            resent: false,
        });

        match self.transport {
            TransportKind::Channel => self.route_over_channel(id, pr),
            TransportKind::Lookup => self.fan_out_lookups(id, pr),
        }
    }

    fn route_over_channel(&mut self, id: QueryId, pr: PrNumber) -> Vec<Effect> {
        match self.connection.as_mut() {
            Some(conn) if conn.open => {
                conn.in_flight.push_back(id);
                self.phase = SessionPhase::Querying;
                vec![Effect::SendQuery {
                    channel: conn.id,
                    query: id,
                    pr,
                }]
            }
            Some(conn) => {
                conn.queued.push((id, pr));
                self.phase = SessionPhase::AwaitingConnection;
                Vec::new()
            }
            None => self.connect_for(id, pr),
        }
    }

    fn connect_for(&mut self, id: QueryId, pr: PrNumber) -> Vec<Effect> {
        let channel = self.next_channel;
        self.next_channel += 1;
        self.connection = Some(Connection {
            id: channel,
            open: false,
            queued: vec![(id, pr)],
            in_flight: VecDeque::new(),
        });
        self.phase = SessionPhase::AwaitingConnection;
        vec![Effect::OpenChannel { channel }]
    }

    fn fan_out_lookups(&mut self, id: QueryId, pr: PrNumber) -> Vec<Effect> {
        let effects: Vec<Effect> = self
            .branches
            .iter()
            .map(|(branch, name)| Effect::LookupBranch {
                query: id,
                pr,
                branch,
                name: name.to_string(),
            })
            .collect();
        if let Some(query) = self.query.as_mut() {
            query.pending = effects.len();
        }
        if effects.is_empty() {
            self.settle_latest();
        } else {
            self.phase = SessionPhase::Querying;
        }
        effects
    }

    pub(crate) fn channel_opened(&mut self, channel: ChannelId) -> Vec<Effect> {
        let Some(conn) = self.connection.as_mut().filter(|c| c.id == channel) else {
            return Vec::new();
        };
        conn.open = true;
        let queued = std::mem::take(&mut conn.queued);
        let mut effects = Vec::with_capacity(queued.len());
        for (query, pr) in queued {
            conn.in_flight.push_back(query);
            effects.push(Effect::SendQuery { channel, query, pr });
        }
        if self.phase == SessionPhase::AwaitingConnection {
            self.phase = SessionPhase::Querying;
        }
        self.dirty = true;
        effects
    }

    pub(crate) fn channel_message(&mut self, channel: ChannelId, payload: &[u8]) {
        let Some(conn) = self.connection.as_mut().filter(|c| c.id == channel) else {
            return;
        };
        let Some(query) = conn.in_flight.pop_front() else {
            return;
        };
        if !self.is_live(query) {
            return;
        }
        for (index, byte) in payload.iter().enumerate() {
            self.set_marker(index, *byte == 1);
        }
        self.settle_latest();
    }

    /// Ends the connection. A latest query that was sent but never answered is
    /// re-sent once on a fresh channel; the server may close right after
    /// answering the previous query.
    pub(crate) fn channel_closed(
        &mut self,
        channel: ChannelId,
        close: &crate::CloseInfo,
    ) -> Vec<Effect> {
        if self.connection.as_ref().map(|c| c.id) != Some(channel) {
            return Vec::new();
        }
        let Some(conn) = self.connection.take() else {
            return Vec::new();
        };
        self.dirty = true;

        if close.reports_error() {
            self.error = Some(SessionError::ChannelClosed {
                code: close.code,
                reason: close.reason.clone(),
            });
            self.markers.iter_mut().for_each(|m| *m = false);
            self.settle_latest();
            return Vec::new();
        }

        let (outstanding, unanswered) = match self.query.as_ref().filter(|q| !q.settled) {
            Some(query) => (conn.carries(query.id), conn.in_flight.contains(&query.id)),
            None => (false, false),
        };
        if !outstanding {
            return Vec::new();
        }
        if unanswered {
            if let Some(query) = self.query.as_mut().filter(|q| !q.resent) {
                query.resent = true;
                let (id, pr) = (query.id, query.pr);
                return self.connect_for(id, pr);
            }
        }
        self.markers.iter_mut().for_each(|m| *m = false);
        self.settle_latest();
        Vec::new()
    }

    pub(crate) fn branch_resolved(
        &mut self,
        query: QueryId,
        branch: BranchIndex,
        outcome: Result<bool, crate::LookupFailure>,
    ) {
        if !self.is_live(query) {
            return;
        }
        match outcome {
            Ok(present) => self.set_marker(branch, present),
            Err(crate::LookupFailure::NotFound) => {
                self.error = Some(SessionError::RemoteLookup);
                self.busy = false;
                self.dirty = true;
            }
            Err(crate::LookupFailure::Other) => {}
        }
        let remaining = match self.query.as_mut() {
            Some(active) => {
                active.pending = active.pending.saturating_sub(1);
                active.pending
            }
            None => 0,
        };
        if remaining == 0 {
            self.settle_latest();
        }
    }

    pub(crate) fn query_timed_out(&mut self, query: QueryId) {
        if self.pending_query() != Some(query) {
            return;
        }
        self.error = Some(SessionError::TimedOut);
        self.settle_latest();
    }

    fn is_live(&self, query: QueryId) -> bool {
        self.query
            .as_ref()
            .is_some_and(|active| active.id == query && !active.settled)
    }

    fn set_marker(&mut self, index: BranchIndex, checked: bool) {
        if let Some(marker) = self.markers.get_mut(index) {
            *marker = checked;
            self.dirty = true;
        }
    }

    fn settle_latest(&mut self) {
        if let Some(active) = self.query.as_mut() {
            active.settled = true;
        }
        self.busy = false;
        self.phase = SessionPhase::Idle;
        self.dirty = true;
    }
}
