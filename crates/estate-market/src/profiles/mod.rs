//! User profiles and the weighted completion score shown on account pages.

pub mod completion;
pub mod domain;
pub mod router;

pub use completion::{ProfileCompletion, ProfileSection};
pub use domain::{AgentDetails, PostalAddress, UserProfile, UserRole};
pub use router::profile_router;
