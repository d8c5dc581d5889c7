pub mod schema;
pub mod species;
pub mod users;
