/// Byte-level scanner over markup.
///
/// Every delimiter the scanner stops at is ASCII, so offsets it reports
/// always fall on a `char` boundary.
#[derive(Clone)]
pub struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn rest(&self) -> &'a str {
        &self.src[self.pos.min(self.src.len())..]
    }

    pub fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    pub fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + ahead).copied()
    }

    /// Byte comparison; safe mid-character while scanning for ASCII.
    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.src
            .as_bytes()
            .get(self.pos..)
            .is_some_and(|rest| rest.starts_with(pat))
    }

    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Advances past the whole character under the cursor.
    pub fn bump_char(&mut self) -> Option<char> {
        let c = self.rest().chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consumes `pat` if the input continues with it.
    pub fn eat(&mut self, pat: &[u8]) -> bool {
        let matched = self.starts_with(pat);
        if matched {
            self.pos += pat.len();
        }
        matched
    }

    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Everything before the next `pat`, or the rest of the input.
    pub fn take_until(&mut self, pat: &[u8]) -> &'a str {
        let start = self.pos;
        while !self.eof() && !self.starts_with(pat) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Moves past the next `pat`. Returns false, at eof, when there is none.
    pub fn skip_past(&mut self, pat: &[u8]) -> bool {
        self.take_until(pat);
        self.eat(pat)
    }

    pub fn skip_whitespace(&mut self) {
        self.take_while(|b| b.is_ascii_whitespace());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eat_only_consumes_on_match() {
        let mut cur = Cursor::new("<a href>");
        assert!(!cur.eat(b"</"));
        assert_eq!(cur.offset(), 0);
        assert!(cur.eat(b"<a"));
        assert_eq!(cur.rest(), " href>");
    }

    #[test]
    fn empty_input_is_eof() {
        let mut cur = Cursor::new("");
        assert!(cur.eof());
        assert_eq!(cur.peek(), None);
        assert_eq!(cur.bump(), None);
        assert!(cur.starts_with(b""));
    }

    #[test]
    fn take_while_stops_at_first_mismatch() {
        let mut cur = Cursor::new("abc123");
        assert_eq!(cur.take_while(|b| b.is_ascii_alphabetic()), "abc");
        assert_eq!(cur.peek(), Some(b'1'));
        assert_eq!(cur.peek_at(2), Some(b'3'));
    }

    #[test]
    fn bump_char_steps_over_multibyte_characters() {
        let mut cur = Cursor::new("él<");
        assert_eq!(cur.bump_char(), Some('é'));
        assert_eq!(cur.offset(), 2);
        assert_eq!(cur.take_until(b"<"), "l");
        assert_eq!(cur.bump_char(), Some('<'));
        assert_eq!(cur.bump_char(), None);
    }

    #[test]
    fn take_until_keeps_multibyte_text_intact() {
        let mut cur = Cursor::new("世界<b>");
        assert_eq!(cur.take_until(b"<"), "世界");
        assert!(cur.starts_with(b"<b>"));
    }

    #[test]
    fn skip_past_missing_pattern_stops_at_eof() {
        let mut cur = Cursor::new("a comment --> tail");
        assert!(cur.skip_past(b"-->"));
        assert_eq!(cur.rest(), " tail");

        let mut cur = Cursor::new("never closed");
        assert!(!cur.skip_past(b"-->"));
        assert!(cur.eof());
    }
}
