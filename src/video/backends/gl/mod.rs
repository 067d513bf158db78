pub mod capabilities;
pub mod program;
pub mod types;
pub mod visitor;
