pub mod assess;
pub mod context;
