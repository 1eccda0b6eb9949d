/// Editable parameters of the in-progress polaroid
///
/// The draft is what the user changes between capture and save: the selected
/// filter and the caption text.

use crate::filters::FilterKind;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Draft {
    /// Preset applied when the polaroid is rendered
    pub filter: FilterKind,

    /// Caption for the bottom band; empty = no caption
    pub caption: String,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the caption, keeping at most `max_chars` characters.
    /// Returns true if the text had to be cut.
    pub fn set_caption(&mut self, text: &str, max_chars: usize) -> bool {
        let (caption, cut) = clip_caption(text, max_chars);
        self.caption = caption;
        cut
    }
}

/// First `max_chars` characters of `text`
pub fn clip_caption(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => (text[..end].to_string(), true),
        None => (text.to_string(), false),
    }
}
