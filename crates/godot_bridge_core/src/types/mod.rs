pub mod operation;
pub mod responses;

pub use operation::{Operation, OperationKind};
pub use responses::*;
