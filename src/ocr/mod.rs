//! Remote text-recognition service integration.
//!
//! One multipart request per image; the service answers with recognized text
//! and an optional translation. The service is a black box; any failure,
//! transport-level or payload-level, degrades to a sentinel value upstream.

mod client;
pub mod types;

pub use client::RecognitionClient;
pub use types::{Recognition, RECOGNITION_UNAVAILABLE};
