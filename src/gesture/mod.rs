pub mod coordinates;
pub mod gesture_model;
