use tracker_core::{AppViewModel, BranchIndex, ConnectionState, TransportKind};

/// Changes the UI surface applies. One marker per tracked branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    SetHeading(String),
    SetMarker {
        index: BranchIndex,
        label: String,
        checked: bool,
    },
    SetError(Option<String>),
    SetBusy(bool),
}

pub fn render(view: &AppViewModel) -> Vec<UiCommand> {
    let mut cmds = Vec::with_capacity(view.markers.len() + 3);

    cmds.push(UiCommand::SetHeading(heading(view)));
    cmds.extend(view.markers.iter().map(|marker| UiCommand::SetMarker {
        index: marker.index,
        label: marker.branch.clone(),
        checked: marker.checked,
    }));
    cmds.push(UiCommand::SetError(view.error_message.clone()));
    cmds.push(UiCommand::SetBusy(view.busy));

    cmds
}

fn heading(view: &AppViewModel) -> String {
    let transport = match view.transport {
        TransportKind::Channel => match view.connection {
            ConnectionState::Closed => "channel closed",
            ConnectionState::Connecting => "channel connecting",
            ConnectionState::Open => "channel open",
        },
        TransportKind::Lookup => "lookup",
    };
    match view.current_pr {
        Some(pr) => format!("PR #{pr} ({transport})"),
        None => format!("no query yet ({transport})"),
    }
}
