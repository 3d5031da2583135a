pub mod generation;
pub mod relay;
pub mod segmentation;
pub mod tts;
