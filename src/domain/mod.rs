pub mod application;
pub mod event;
pub mod ports;
pub mod wallet;
