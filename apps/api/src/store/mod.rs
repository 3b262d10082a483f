//! State containers composed per caller: `SessionStore` for identity,
//! `ContentStore` for résumés. Both publish their state through a `watch`
//! channel; `subscribe()` hands out a receiver and dropping it unsubscribes.

pub mod error;
pub mod resume_store;
pub mod session_store;

pub use error::ResumeError;
pub use resume_store::{ContentStore, NewResume, ResumeDetailsPatch, ResumeState};
pub use session_store::{AuthSubscription, Identity, SessionState, SessionStore};
