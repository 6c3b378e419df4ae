pub mod retry_flow;
pub mod row_ctx;
pub mod update_session;

pub use retry_flow::{RetryFlow, RowState};
pub use row_ctx::RowCtx;
pub use update_session::UpdateSession;
