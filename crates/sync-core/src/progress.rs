//! Progress callbacks

/// Optional `(name, count, total)` callback invoked once per processed item.
///
/// Purely informational; nothing the callback does can change control flow.
pub struct Progress<'a> {
    callback: Option<Box<dyn FnMut(&str, usize, usize) + 'a>>,
}

impl<'a> Progress<'a> {
    pub fn new(callback: impl FnMut(&str, usize, usize) + 'a) -> Self {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// A progress sink that ignores every update.
    pub fn none() -> Self {
        Self { callback: None }
    }

    pub fn report(&mut self, name: &str, count: usize, total: usize) {
        if let Some(callback) = self.callback.as_mut() {
            callback(name, count, total);
        }
    }
}

impl Default for Progress<'_> {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
