mod envelope;
mod session;
mod status;

pub use envelope::{ApiErrorDetail, ApiResult};
pub use session::{QrEndpoint, QrPayload, SessionId};
pub use status::{SessionState, SessionStatus};
