use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use relative_path::{RelativePath, RelativePathBuf};

/// A markdown note inside the notes directory.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteFile {
    relative_path: RelativePathBuf,
    identifier: String,
    display_path: String,
}

impl NoteFile {
    /// Create a new NoteFile from a path relative to the notes root
    pub fn new(relative_path: RelativePathBuf) -> Self {
        let identifier = relative_path
            .file_stem()
            .unwrap_or("Untitled")
            .to_string();
        let display_path = {
            let path_str = relative_path.as_str();
            path_str.strip_suffix(".md").unwrap_or(path_str).to_string()
        };

        Self {
            relative_path,
            identifier,
            display_path,
        }
    }

    pub fn relative_path(&self) -> &RelativePath {
        &self.relative_path
    }

    /// The file stem; what references point at.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Relative path without the .md extension
    pub fn display_path(&self) -> &str {
        &self.display_path
    }

    /// Title for the note: its first level-one heading, or the file stem.
    pub fn title(&self, content: &str) -> String {
        title_from_markdown(content).unwrap_or_else(|| self.identifier.clone())
    }
}

impl From<&str> for NoteFile {
    fn from(path: &str) -> Self {
        Self::new(RelativePathBuf::from(path))
    }
}

/// Text of the first non-empty `# Heading` in `content`.
pub fn title_from_markdown(content: &str) -> Option<String> {
    let mut in_title = false;
    let mut title = String::new();

    for event in Parser::new(content) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_title = true,
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                let trimmed = title.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
                in_title = false;
                title.clear();
            }
            Event::Text(text) | Event::Code(text) if in_title => title.push_str(&text),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn identifier_is_file_stem() {
        let note = NoteFile::from("projects/2024/roadmap.md");
        assert_eq!(note.identifier(), "roadmap");
        assert_eq!(note.display_path(), "projects/2024/roadmap");
        assert_eq!(note.relative_path().as_str(), "projects/2024/roadmap.md");
    }

    #[rstest]
    #[case::atx("# Roadmap\n\nbody", Some("Roadmap"))]
    #[case::setext("Roadmap\n=======\n", Some("Roadmap"))]
    #[case::inline_code("# The `cache` design", Some("The cache design"))]
    #[case::skips_h2("## Sub\n\n# Main", Some("Main"))]
    #[case::skips_empty_h1("#\n\n# Real", Some("Real"))]
    #[case::no_heading("just text", None)]
    fn extracts_first_h1(#[case] content: &str, #[case] expected: Option<&str>) {
        assert_eq!(title_from_markdown(content).as_deref(), expected);
    }

    #[test]
    fn title_falls_back_to_identifier() {
        let note = NoteFile::from("inbox.md");
        assert_eq!(note.title("- a list"), "inbox");
        assert_eq!(note.title("# Inbox Zero"), "Inbox Zero");
    }
}
