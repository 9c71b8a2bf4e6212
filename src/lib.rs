//! Aircraft-overhead display: keeps a WebSocket feed open, follows a push
//! button and draws the result on a 128x32 OLED.
//!
//! Everything here builds on the host. The ESP-IDF glue (WiFi, GPIO, I2C
//! panel, WebSocket client) lives in the binary.

pub mod config;
pub mod decoder;
pub mod display;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod model;
pub mod oled;
pub mod stream;
pub mod supervisor;
pub mod view;

pub use error::{DecodeError, StreamError};
