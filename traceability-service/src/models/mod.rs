pub mod protocol;
pub mod scan;
pub mod status;
pub mod status_update;

pub use protocol::ProtocolPart;
pub use scan::{GitterCheck, LineScan, Position};
pub use status::{CurrentStatus, PartHistory, StatusRecord};
pub use status_update::{GitterStatusChange, StatusUpdate};
