//! Built-in handlers.
//!
//! Each handler answers expected failures with an `{error, hint?}` value and
//! only returns `Err` for faults that should enter recovery.
pub mod code;
pub mod vision;
pub mod voice;
pub mod web;

pub use code::CodeHandler;
pub use vision::VisionHandler;
pub use voice::VoiceHandler;
pub use web::WebHandler;
