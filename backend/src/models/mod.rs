pub mod product;
pub mod report;

pub use product::*;
pub use report::*;
