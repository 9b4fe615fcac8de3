/// Folds decoded fragments into the growing assistant reply.
#[derive(Debug, Default, Clone)]
pub struct Accumulator {
    text: String,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment in arrival order and returns the text so far.
    pub fn push(&mut self, fragment: &str) -> &str {
        self.text.push_str(fragment);
        &self.text
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
