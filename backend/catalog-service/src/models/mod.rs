pub mod species;
pub mod user;

pub use species::{DecodedFlags, SpeciesRow, SpeciesSummary};
pub use user::User;
