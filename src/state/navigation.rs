/// Image navigation in project order

use super::layout::ProjectLayout;

/// Cursor over a project's `file_names`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    file_names: Vec<String>,
    index: usize,
}

impl Navigation {
    pub fn new(file_names: Vec<String>) -> Self {
        Self {
            file_names,
            index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.file_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_names.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&str> {
        self.file_names.get(self.index).map(String::as_str)
    }

    /// Move forward one image. Stays put on the last image.
    pub fn next(&mut self) -> Option<&str> {
        if self.index + 1 < self.file_names.len() {
            self.index += 1;
        }
        self.current()
    }

    /// Move back one image. Stays put on the first image.
    pub fn prev(&mut self) -> Option<&str> {
        self.index = self.index.saturating_sub(1);
        self.current()
    }

    /// Jump to a named image. Returns false if it is not in the project.
    pub fn go_to(&mut self, file_name: &str) -> bool {
        match self.file_names.iter().position(|n| n == file_name) {
            Some(index) => {
                self.index = index;
                true
            }
            None => false,
        }
    }

    /// Jump to the first image without an annotation in either split.
    /// Returns false (and stays put) when everything is annotated.
    pub fn go_to_first_unannotated(&mut self, layout: &ProjectLayout) -> bool {
        match self.file_names.iter().position(|n| !layout.is_annotated(n)) {
            Some(index) => {
                self.index = index;
                true
            }
            None => false,
        }
    }

    /// The current image and up to `count - 1` after it, e.g. for
    /// segmenting ahead of the user
    pub fn upcoming(&self, count: usize) -> Vec<String> {
        self.file_names
            .iter()
            .skip(self.index)
            .take(count)
            .cloned()
            .collect()
    }

    /// Replace the list after the project was extended, keeping the
    /// current image selected if it is still present
    pub fn set_file_names(&mut self, file_names: Vec<String>) {
        let current = self.current().map(str::to_string);
        self.file_names = file_names;
        self.index = 0;
        if let Some(current) = current {
            self.go_to(&current);
        }
    }

    /// One-based position, e.g. `"2 / 10"`
    pub fn label(&self) -> String {
        if self.file_names.is_empty() {
            return "0 / 0".to_string();
        }
        format!("{} / {}", self.index + 1, self.file_names.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use crate::state::AnnotationSplit;

    fn nav() -> Navigation {
        Navigation::new(vec!["a.png".into(), "b.png".into(), "c.png".into()])
    }

    #[test]
    fn test_next_prev_bounded() {
        let mut nav = nav();
        assert_eq!(nav.label(), "1 / 3");
        assert_eq!(nav.prev(), Some("a.png"));
        assert_eq!(nav.next(), Some("b.png"));
        assert_eq!(nav.next(), Some("c.png"));
        assert_eq!(nav.next(), Some("c.png"));
        assert_eq!(nav.label(), "3 / 3");
        assert_eq!(nav.prev(), Some("b.png"));
    }

    #[test]
    fn test_empty() {
        let mut nav = Navigation::new(Vec::new());
        assert_eq!(nav.current(), None);
        assert_eq!(nav.next(), None);
        assert_eq!(nav.label(), "0 / 0");
    }

    #[test]
    fn test_go_to_and_upcoming() {
        let mut nav = nav();
        assert!(nav.go_to("b.png"));
        assert!(!nav.go_to("zzz.png"));
        assert_eq!(nav.current(), Some("b.png"));
        assert_eq!(nav.upcoming(5), vec!["b.png", "c.png"]);
    }

    #[test]
    fn test_set_file_names_keeps_selection() {
        let mut nav = nav();
        nav.go_to("c.png");
        nav.set_file_names(vec!["a.png".into(), "b.png".into(), "c.png".into(), "d.png".into()]);
        assert_eq!(nav.current(), Some("c.png"));
        assert_eq!(nav.label(), "3 / 4");
    }

    #[test]
    fn test_first_unannotated() {
        let temp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(temp.path().join("p"));
        layout.create_dirs().unwrap();
        fs::write(layout.annotation_path(AnnotationSplit::Train, "a.png"), b"").unwrap();

        let mut nav = nav();
        assert!(nav.go_to_first_unannotated(&layout));
        assert_eq!(nav.current(), Some("b.png"));

        fs::write(layout.annotation_path(AnnotationSplit::Val, "b.png"), b"").unwrap();
        fs::write(layout.annotation_path(AnnotationSplit::Train, "c.png"), b"").unwrap();
        assert!(!nav.go_to_first_unannotated(&layout));
        assert_eq!(nav.current(), Some("b.png"));
    }
}
