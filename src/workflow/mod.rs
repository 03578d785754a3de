//! Hiring-request approval workflow.
//!
//! Pure decision logic with no I/O: [`resolver`] decides the next status for
//! an actor and [`validator`] guards every write of workflow fields.

pub mod error;
pub mod resolver;
pub mod role;
pub mod status;
pub mod validator;

pub use error::WorkflowError;
pub use resolver::{resolve, Decision, TransitionRule, WorkflowAction};
pub use role::Role;
pub use status::RequestStatus;
pub use validator::StatusWrite;
