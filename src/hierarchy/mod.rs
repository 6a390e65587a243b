pub mod bounds;
pub mod hierarchy_model;
pub mod path;
