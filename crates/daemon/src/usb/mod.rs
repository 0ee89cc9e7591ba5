//! USB access to the screen controller
//!
//! All rusb calls are blocking and happen on the display worker thread.

pub mod device;

pub use device::{HidDevice, list_devices};
