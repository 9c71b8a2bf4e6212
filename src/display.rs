use std::fmt::Display;

pub const CONNECTING_WIFI: &str = "Connecting to WiFi...";
pub const WAITING_FOR_DATA: &str = "Waiting for data...";
pub const SKY_EMPTY: &str = "The sky is empty!";

/// Something that can put a few lines of text in front of the user.
///
/// Rendering is best effort: a sink swallows (and logs) its own I/O failures,
/// so callers never have to handle them.
pub trait DisplaySink {
    /// Clear the screen and draw `lines` top to bottom.
    fn show_lines(&mut self, lines: &[String]);

    /// Column width used by [`DisplaySink::show_text`].
    fn wrap_width(&self) -> usize;

    /// Word-wrap `text` to [`DisplaySink::wrap_width`] and show the result.
    fn show_text(&mut self, text: &str) {
        let lines = wrap(text, self.wrap_width());
        self.show_lines(&lines);
    }
}

/// Show `Error: {error}`.
pub fn report_error<S, E>(sink: &mut S, error: E)
where
    S: DisplaySink + ?Sized,
    E: Display,
{
    sink.show_text(&format!("Error: {}", error));
}

/// Greedy word wrap.
///
/// Words are appended to the current line until the letters already on it
/// plus the next word would exceed `column`; separating spaces do not count.
/// A word longer than `column` gets a line of its own and is not split.
pub fn wrap(text: &str, column: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;

    for word in text.split_whitespace() {
        let len = word.chars().count();
        if count > 0 && count + len > column {
            lines.push(std::mem::take(&mut current));
            count = 0;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
        count += len;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lines {
        shown: Vec<Vec<String>>,
    }

    impl DisplaySink for Lines {
        fn show_lines(&mut self, lines: &[String]) {
            self.shown.push(lines.to_vec());
        }

        fn wrap_width(&self) -> usize {
            14
        }
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(
            wrap("London Heathrow (United Kingdom)", 14),
            vec!["London Heathrow", "(United", "Kingdom)"]
        );
    }

    #[test]
    fn spaces_do_not_count_toward_width() {
        // 6 + 6 letters fit in 12 columns even though the line is 13 wide.
        assert_eq!(wrap("abcdef ghijkl", 12), vec!["abcdef ghijkl"]);
        assert_eq!(wrap("abcdef ghijklm", 12), vec!["abcdef", "ghijklm"]);
    }

    #[test]
    fn long_words_are_not_split() {
        assert_eq!(
            wrap("Aeropuerto Internacional", 6),
            vec!["Aeropuerto", "Internacional"]
        );
    }

    #[test]
    fn blank_text_has_no_lines() {
        assert!(wrap("", 14).is_empty());
        assert!(wrap("   ", 14).is_empty());
    }

    #[test]
    fn show_text_wraps_at_sink_width() {
        let mut sink = Lines { shown: Vec::new() };
        sink.show_text("Heathrow Airport (United Kingdom)");
        assert_eq!(
            sink.shown,
            vec![vec!["Heathrow", "Airport (United", "Kingdom)"]]
        );
    }

    #[test]
    fn errors_are_prefixed() {
        let mut sink = Lines { shown: Vec::new() };
        report_error(&mut sink, "boom");
        assert_eq!(sink.shown, vec![vec!["Error: boom"]]);
    }
}
