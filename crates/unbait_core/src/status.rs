/// Lifecycle of one resolve request, as advanced by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    PendingTab,
    PendingLoad,
    Extracting,
    Querying,
    Done,
    Errored,
    Canceled,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::Done | RequestStatus::Errored | RequestStatus::Canceled
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            RequestStatus::PendingTab => "pending-tab",
            RequestStatus::PendingLoad => "pending-load",
            RequestStatus::Extracting => "extracting",
            RequestStatus::Querying => "querying",
            RequestStatus::Done => "done",
            RequestStatus::Errored => "errored",
            RequestStatus::Canceled => "canceled",
        }
    }
}
