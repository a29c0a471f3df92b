pub mod plan;
pub mod seed;
