//! Framed spectral analysis shared by every feature.

pub mod frame;
pub mod mel;
pub mod stats;
pub mod stft;

pub use frame::{FrameGrid, Padding};
pub use mel::{power_to_db, Dct, MelFilterBank};
pub use stft::{hann_window, Spectrogram};
