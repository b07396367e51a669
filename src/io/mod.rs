//! Audio input
//!
//! The pipeline never reads files itself. Hosts hand it audio either as a
//! borrowed [`SampleWindow`] or through a [`BufferProvider`] that cuts windows
//! around a playback/edit position.

pub mod provider;
pub mod sample_buffer;

pub use provider::{BufferProvider, InMemoryBuffer, WindowRequest};
pub use sample_buffer::SampleWindow;
