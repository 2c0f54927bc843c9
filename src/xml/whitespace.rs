/// Collapses whitespace in extracted text.
///
/// Carries two per-element stacks and a single character of look-behind:
///
/// * `preserve` — whether `xml:space="preserve"` is in effect. The directive is
///   sticky for the whole subtree and only overridden by an explicit nested
///   directive; popping restores the parent's setting exactly.
/// * `containers` — whether the current element is a *container element*:
///   one that structures other elements rather than carrying prose. Text
///   chunks consisting entirely of whitespace directly inside a container are
///   formatting and are dropped in full.
/// * `last_char` — the previously emitted character, needed to collapse
///   whitespace runs across chunk boundaries. `None` is the document-start
///   sentinel; it is deliberately distinct from "previous character was
///   whitespace", so a document that begins with whitespace keeps one space
///   unless its context is a container element.
#[derive(Debug)]
pub struct WhitespaceCompressor {
    preserve: Vec<bool>,
    containers: Vec<bool>,
    last_char: Option<char>,
}

impl WhitespaceCompressor {
    pub fn new() -> Self {
        Self {
            preserve: Vec::new(),
            containers: Vec::new(),
            last_char: None,
        }
    }

    /// Reset all per-run state, called at the start of a document
    pub fn reset(&mut self) {
        self.preserve.clear();
        self.containers.clear();
        self.last_char = None;
    }

    /// Enter an element. `directive` is an explicit space-preservation directive
    /// on this element (`xml:space`), `None` inherits the parent's setting.
    pub fn start_element(&mut self, directive: Option<bool>, container: bool) {
        let inherited = self.preserving();
        self.preserve.push(directive.unwrap_or(inherited));
        self.containers.push(container);
    }

    /// Leave an element, restoring the parent's settings
    pub fn end_element(&mut self) {
        self.preserve.pop();
        self.containers.pop();
    }

    fn preserving(&self) -> bool {
        self.preserve.last().copied().unwrap_or(false)
    }

    fn in_container(&self) -> bool {
        self.containers.last().copied().unwrap_or(false)
    }

    /// Compress one chunk of character content and return what should be
    /// appended to the output text. Newlines and carriage returns normalize to a
    /// single space.
    pub fn compress(&mut self, text: &str) -> String {
        let preserving = self.preserving();
        let strip_all = !preserving
            && self.in_container()
            && !text.is_empty()
            && text.chars().all(char::is_whitespace);
        let mut compressed = String::with_capacity(text.len());
        for mut c in text.chars() {
            if !preserving && c.is_whitespace() {
                let after_whitespace = self.last_char.map_or(false, char::is_whitespace);
                let leading_in_container = self.last_char.is_none() && self.in_container();
                if after_whitespace || strip_all || leading_in_container {
                    continue;
                }
            }
            if c == '\n' || c == '\r' {
                c = ' ';
            }
            compressed.push(c);
            self.last_char = Some(c);
        }
        compressed
    }

    /// Update the look-behind for text that bypassed compression (synthetic
    /// insertions such as line separators)
    pub fn observe(&mut self, text: &str) {
        if let Some(c) = text.chars().last() {
            self.last_char = Some(c);
        }
    }
}

impl Default for WhitespaceCompressor {
    fn default() -> Self {
        Self::new()
    }
}
