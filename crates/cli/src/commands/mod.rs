pub mod corpus;
pub mod harvest;
pub mod targets;
pub mod util;

pub use corpus::*;
pub use harvest::*;
pub use targets::*;
pub use util::*;
