mod product;
pub use product::{Product, ProductState};

mod reachability;
pub use reachability::MinimalRepresentatives;
