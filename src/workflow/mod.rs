pub mod events;
pub mod session_controller;
pub mod session_ctx;
pub mod snapshot;

pub use events::{NavDirection, NavigationOutcome, SessionCommand, SessionEvent};
pub use session_controller::{SessionController, SessionOutcome};
pub use session_ctx::SessionCtx;
pub use snapshot::{SessionPhase, SessionSnapshot, SubmitPrompt};
