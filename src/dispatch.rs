//! Dispatch: confidence gate, handler table, response records and history.

pub mod handlers;
pub mod history;
pub mod response;
pub mod router;

pub use handlers::{Handler, HandlerContext, HandlerReply, builtin_handlers};
pub use history::ResponseHistory;
pub use response::Response;
pub use router::{DEFAULT_CONFIDENCE_THRESHOLD, DispatchOutcome, NOT_UNDERSTOOD_MESSAGE, Router};
