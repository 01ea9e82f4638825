//! Editor pages consumed by the tag pipeline

use crate::models::SourceElement;

/// An open editor buffer with completion and highlighting consumers
pub trait EditorPage {
    /// Logical file name of the page, e.g. `main.c`
    fn name(&self) -> &str;

    /// Current in-memory text, including unsaved edits
    fn text(&self) -> &str;

    fn completion_popup_visible(&self) -> bool;

    fn replace_completions(&mut self, elements: &[SourceElement]);

    fn replace_highlight_elements(&mut self, elements: &[SourceElement]);

    fn rehighlight(&mut self);
}

/// In-memory page used by the CLI and tests
#[derive(Debug, Clone, Default)]
pub struct BufferPage {
    name: String,
    text: String,
    popup_visible: bool,
    completions: Vec<SourceElement>,
    highlights: Vec<SourceElement>,
    rehighlights: usize,
}

impl BufferPage {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn set_popup_visible(&mut self, visible: bool) {
        self.popup_visible = visible;
    }

    pub fn completions(&self) -> &[SourceElement] {
        &self.completions
    }

    pub fn highlights(&self) -> &[SourceElement] {
        &self.highlights
    }

    pub fn rehighlight_count(&self) -> usize {
        self.rehighlights
    }
}

impl EditorPage for BufferPage {
    fn name(&self) -> &str {
        &self.name
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn completion_popup_visible(&self) -> bool {
        self.popup_visible
    }

    fn replace_completions(&mut self, elements: &[SourceElement]) {
        self.completions = elements.to_vec();
    }

    fn replace_highlight_elements(&mut self, elements: &[SourceElement]) {
        self.highlights = elements.to_vec();
    }

    fn rehighlight(&mut self) {
        self.rehighlights += 1;
    }
}
