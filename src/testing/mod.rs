//! Synthetic Data Matrix symbols and puck frames for tests, benches and the
//! `pucktool render` command

pub mod encoder;
pub mod render;

pub use encoder::{encode_ascii, encode_codewords, encode_mapping, encode_symbol, EncodeError};
pub use render::{PuckScene, SlotContent};

use crate::error::CaptureError;
use crate::models::Frame;
use crate::pipeline::FrameSource;

/// Frame source that replays rendered scenes
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    frames: Vec<Frame>,
    position: usize,
    repeat: bool,
}

impl SyntheticSource {
    /// Render each scene once, in order
    pub fn new(scenes: Vec<PuckScene>) -> Self {
        Self::from_frames(scenes.iter().map(PuckScene::render).collect())
    }

    /// Replay prepared frames
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            position: 0,
            repeat: false,
        }
    }

    /// Start over after the last frame instead of ending
    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }
}

impl FrameSource for SyntheticSource {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        if self.position >= self.frames.len() {
            if !self.repeat || self.frames.is_empty() {
                return Err(CaptureError::Exhausted);
            }
            self.position = 0;
        }
        let frame = self.frames[self.position].clone();
        self.position += 1;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_order_and_end() {
        let mut source = SyntheticSource::new(vec![
            PuckScene::unipuck(2),
            PuckScene::holder_view(2, "H"),
        ]);
        let first = source.read_frame().unwrap();
        let second = source.read_frame().unwrap();
        assert_ne!(first.width(), second.width());
        assert!(matches!(source.read_frame(), Err(CaptureError::Exhausted)));
    }

    #[test]
    fn test_repeating_source_wraps() {
        let mut source = SyntheticSource::new(vec![PuckScene::unipuck(2)]).repeating();
        for _ in 0..3 {
            assert!(source.read_frame().is_ok());
        }
    }

    #[test]
    fn test_empty_repeating_source_ends() {
        let mut source = SyntheticSource::from_frames(Vec::new()).repeating();
        assert!(matches!(source.read_frame(), Err(CaptureError::Exhausted)));
    }
}
