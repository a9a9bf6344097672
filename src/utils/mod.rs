pub mod audit;
pub mod username_index;
pub mod validation;
