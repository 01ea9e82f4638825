//! Source elements produced by the code parser

use serde::{Deserialize, Serialize};

/// Kind of a parsed symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Define,
    Enum,
    Function,
    Variable,
    Typedef,
    Unknown,
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Define => "define",
            ElementKind::Enum => "enum",
            ElementKind::Function => "function",
            ElementKind::Variable => "variable",
            ElementKind::Typedef => "typedef",
            ElementKind::Unknown => "unknown",
        }
    }
}

/// A parsed symbol used for completion and highlighting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceElement {
    pub text: String,
    pub file_name: String,
    /// Source line the symbol was found on
    pub expression: String,
    pub kind: ElementKind,
    /// File-scoped symbol (e.g. `static`)
    pub is_local: bool,
}

/// The elements of one parse cycle, replaced wholesale on every cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSet {
    elements: Vec<SourceElement>,
}

impl ElementSet {
    pub fn new(elements: Vec<SourceElement>) -> Self {
        Self { elements }
    }

    pub fn all(&self) -> &[SourceElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &SourceElement> {
        self.elements.iter().filter(move |e| e.kind == kind)
    }

    pub fn functions(&self) -> impl Iterator<Item = &SourceElement> {
        self.of_kind(ElementKind::Function)
    }

    pub fn defines(&self) -> impl Iterator<Item = &SourceElement> {
        self.of_kind(ElementKind::Define)
    }

    pub fn enums(&self) -> impl Iterator<Item = &SourceElement> {
        self.of_kind(ElementKind::Enum)
    }

    pub fn types(&self) -> impl Iterator<Item = &SourceElement> {
        self.of_kind(ElementKind::Typedef)
    }

    pub fn variables(&self) -> impl Iterator<Item = &SourceElement> {
        self.of_kind(ElementKind::Variable)
    }
}

impl From<Vec<SourceElement>> for ElementSet {
    fn from(elements: Vec<SourceElement>) -> Self {
        Self::new(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(text: &str, kind: ElementKind) -> SourceElement {
        SourceElement {
            text: text.to_string(),
            file_name: "main.c".to_string(),
            expression: String::new(),
            kind,
            is_local: false,
        }
    }

    #[test]
    fn test_kind_filters_share_one_list() {
        let set = ElementSet::new(vec![
            element("setup", ElementKind::Function),
            element("LED_PIN", ElementKind::Define),
            element("loop", ElementKind::Function),
            element("counter", ElementKind::Variable),
        ]);

        let functions: Vec<_> = set.functions().map(|e| e.text.as_str()).collect();
        assert_eq!(functions, vec!["setup", "loop"]);
        assert_eq!(set.defines().count(), 1);
        assert_eq!(set.variables().count(), 1);
        assert_eq!(set.enums().count(), 0);
        assert_eq!(set.types().count(), 0);
        assert_eq!(set.len(), 4);
    }
}
