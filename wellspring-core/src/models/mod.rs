pub mod session;
pub mod status;

pub use session::{Role, SessionRef, Turn};
pub use status::StatusCheck;
