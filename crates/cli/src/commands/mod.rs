pub mod catalog;
pub mod categories;
pub mod check;
pub mod instructions;
pub mod occurrences;
pub mod projects;
pub mod sequences;
pub mod stats;
pub mod status;
pub mod util;

pub use catalog::*;
pub use categories::*;
pub use check::*;
pub use instructions::*;
pub use occurrences::*;
pub use projects::*;
pub use sequences::*;
pub use stats::*;
pub use status::*;
pub use util::*;
