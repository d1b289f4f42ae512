//! Model-based testing.
//!
//! [`ModelLedger`] is the reference; [`crate::SimLedger`] drives the real
//! ledger. Both consume the same [`Operation`] stream and must produce equal
//! [`OperationResult`]s and equal [`ObservableState`]s.

mod ledger;
mod operation;

pub use ledger::{ModelLedger, ModelRoom, ObservableState, ObservedRoom};
pub use operation::{
    ActorId, ModelMessage, ModelRoomId, Operation, OperationError, OperationResult, SmallMessage,
    room_name,
};
