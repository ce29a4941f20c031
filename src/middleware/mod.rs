pub mod cors;
pub mod logging;
pub mod recovery;

pub use cors::*;
pub use logging::*;
pub use recovery::*;
