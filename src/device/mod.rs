pub mod appium;
pub mod gestures;
pub mod transport;
pub mod wait;
