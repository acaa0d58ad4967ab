use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use tracker_core::{update, AppState, Msg};
use tracker_logging::{tracker_debug, tracker_warn};

use super::cli::Cli;
use super::effects::EffectRunner;
use super::ui::{render, TerminalSurface};
use super::{config, logging};

pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::initialize(cli.log, logging::level_for_verbosity(cli.verbose));

    let mut config = config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(&config, msg_tx)?;
    let state = AppState::new(config.transport.into(), config.branch_table());
    let mut session = Session {
        state,
        runner,
        surface: TerminalSurface::new(io::stdout()),
        msg_rx,
        query_timeout: config.query_timeout(),
    };

    if cli.prs.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            session.query(line);
        }
        Ok(ExitCode::SUCCESS)
    } else {
        for raw in cli.prs {
            session.query(raw);
        }
        Ok(if session.failed() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        })
    }
}

/// Single-threaded dispatch loop: every message goes through `update` here.
struct Session<W: Write> {
    state: AppState,
    runner: EffectRunner,
    surface: TerminalSurface<W>,
    msg_rx: mpsc::Receiver<Msg>,
    query_timeout: Duration,
}

impl<W: Write> Session<W> {
    /// Submits one identifier and blocks until its results have settled.
    fn query(&mut self, raw: String) {
        self.drain_pending();
        self.dispatch(Msg::InputChanged(raw));
        self.dispatch(Msg::QuerySubmitted);
        self.wait_until_settled();
    }

    /// The last query ended with an error on display.
    fn failed(&self) -> bool {
        self.state.error().is_some()
    }

    /// Applies events that arrived between queries, such as a late close.
    fn drain_pending(&mut self) {
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.dispatch(msg);
        }
    }

    fn wait_until_settled(&mut self) {
        let Some(query) = self.state.pending_query() else {
            return;
        };
        let deadline = Instant::now() + self.query_timeout;

        while self.state.pending_query() == Some(query) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.msg_rx.recv_timeout(remaining) {
                Ok(msg) => self.dispatch(msg),
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    tracker_warn!("query {} timed out after {:?}", query, self.query_timeout);
                    self.dispatch(Msg::QueryTimedOut { query });
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    tracker_warn!("engine stopped while query {} was pending", query);
                    self.dispatch(Msg::QueryTimedOut { query });
                }
            }
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        tracker_logging::set_current_query(self.state.pending_query());
        tracker_debug!("{} dispatch {:?}", tracker_logging::with_query(), msg);

        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            if let Err(err) = self.surface.apply(render(&state.view())) {
                tracker_warn!("failed to write results: {}", err);
            }
        }
        self.state = state;
        self.runner.run(effects);
    }
}
