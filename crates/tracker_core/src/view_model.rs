use crate::{BranchIndex, ConnectionState, PrNumber, SessionPhase, TransportKind};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub transport: TransportKind,
    pub phase: SessionPhase,
    pub busy: bool,
    pub input: String,
    pub current_pr: Option<PrNumber>,
    pub error_message: Option<String>,
    pub connection: ConnectionState,
    pub markers: Vec<MarkerView>,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn checked_indices(&self) -> Vec<BranchIndex> {
        self.markers
            .iter()
            .filter(|m| m.checked)
            .map(|m| m.index)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerView {
    pub index: BranchIndex,
    pub branch: String,
    pub checked: bool,
}
