pub mod budget;
pub mod explorer;
pub mod explorer_model;
pub mod recovery;
pub mod selector;
