use crate::DEFAULT_FPS;

/// An animation group marker: "start", "end", attack points and so on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextKey {
    /// 1-based frame the marker lands on
    pub frame: u32,
    /// Marker label, newline-separated entries joined with `/`
    pub label: String,
}

/// Timing information for an imported armature's animation.
/// Added to the root entity when animation import is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    /// Estimated frames per second
    pub fps: u32,
    /// First frame of the animation; always 1
    pub frame_start: u32,
    /// Frame of the last animation group marker, or 1 without markers
    pub frame_end: u32,
    /// Animation group markers in file order
    pub text_keys: Vec<TextKey>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            frame_start: 1,
            frame_end: 1,
            text_keys: Vec::new(),
        }
    }
}
