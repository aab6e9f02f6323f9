//! The session: the single owner of definitions, instances, facts, and
//! live milestone constraint registrations.

mod registration;
mod session;

pub use registration::RegistrationId;
pub use session::{EvaluationReport, InstanceFailure, MilestoneFiring, Session};
