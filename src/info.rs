/// Text overlay describing the last thing the user interacted with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoPanel {
    title: String,
    body: String,
    visible: bool,
}

impl InfoPanel {
    pub fn show(&mut self, title: impl Into<String>, body: impl Into<String>) {
        self.title = title.into();
        self.body = body.into();
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Single-line rendering, `None` while hidden.
    pub fn line(&self) -> Option<String> {
        self.visible.then(|| format!("{}: {}", self.title, self.body))
    }
}
