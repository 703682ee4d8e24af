//! State that lives for one CLI session and is passed to whoever needs it.

#[derive(Debug, Default)]
pub struct SessionState {
    banner_shown: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The banner text the first time it is asked for, `None` afterwards.
    pub fn take_banner(&mut self) -> Option<&'static str> {
        if self.banner_shown {
            return None;
        }
        self.banner_shown = true;
        Some("Je te crois - incident reports")
    }
}
