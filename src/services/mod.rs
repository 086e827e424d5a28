//! Driving-side services
//!
//! The profile collaborator and the operations that run it and register the
//! resulting activities.

pub mod driver;
pub mod profile;

pub use driver::{
    normalize_group_url, validate_time, Driver, GroupJoinOutcome, GroupJoinRequest,
    NameChangeOutcome, NameChangeRequest, MIN_COUNTDOWN_SECONDS,
};
pub use profile::{Profile, ProfileService, SimulatedProfileService};
