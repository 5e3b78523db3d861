pub mod consent;
pub mod errors;
pub mod intent;
pub mod plan;
pub mod result;
pub mod schema;
pub mod signing;
pub mod state;
pub mod units;

pub use consent::*;
pub use errors::*;
pub use intent::*;
pub use plan::*;
pub use result::*;
pub use schema::*;
pub use signing::*;
pub use state::*;
pub use units::*;
