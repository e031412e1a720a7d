pub mod composite;
pub mod oscilloscope;
pub mod scroll;
