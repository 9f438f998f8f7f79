use crate::Ack;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Reply to the sender of an incoming update.
    Acknowledge(Ack),
    /// A popup was inserted or changed shape and needs to be measured by the host.
    MeasurePopup { url: String },
    /// A loading popup was dismissed through its explicit control.
    RequestCanceled { url: String },
}
