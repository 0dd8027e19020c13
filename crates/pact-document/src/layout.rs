//! Line building, word wrapping and pagination for fixed-width text.

/// One output line. `keep_with_next` stops a heading from being left alone at
/// the bottom of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
  pub text:           String,
  pub keep_with_next: bool,
}

/// Accumulates lines at a fixed width.
pub struct Sheet {
  width: usize,
  lines: Vec<Line>,
}

impl Sheet {
  pub fn new(width: usize) -> Self { Self { width, lines: Vec::new() } }

  pub fn blank(&mut self) {
    // Never stack blank lines or open the document with one.
    if self.lines.last().is_some_and(|l| !l.text.is_empty()) {
      self.push(String::new(), false);
    }
  }

  pub fn centered(&mut self, text: &str) {
    for line in wrap(text, self.width) {
      let pad = self.width.saturating_sub(line.chars().count()) / 2;
      self.push(format!("{}{line}", " ".repeat(pad)), true);
    }
  }

  /// A heading underlined to its own width.
  pub fn heading(&mut self, text: &str) {
    self.blank();
    let mut underline = 0;
    for line in wrap(text, self.width) {
      underline = underline.max(line.chars().count());
      self.push(line, true);
    }
    self.push("-".repeat(underline), true);
  }

  /// A `label: value` line whose continuation lines align under the value.
  pub fn field(&mut self, label: &str, value: &str) {
    let prefix = format!("{label}: ");
    let indent = prefix.chars().count();
    let wrapped = wrap(value, self.width.saturating_sub(indent).max(1));
    for (i, line) in wrapped.into_iter().enumerate() {
      let lead = if i == 0 { prefix.clone() } else { " ".repeat(indent) };
      self.push(format!("{lead}{line}"), false);
    }
  }

  /// Wrap free text. Blank lines in the input separate paragraphs.
  pub fn paragraph(&mut self, text: &str, indent: usize) {
    let available = self.width.saturating_sub(indent).max(1);
    let pad = " ".repeat(indent);
    for (i, para) in text.split("\n\n").enumerate() {
      if i > 0 {
        self.blank();
      }
      for line in wrap(para, available) {
        self.push(format!("{pad}{line}"), false);
      }
    }
  }

  pub fn into_lines(self) -> Vec<Line> { self.lines }

  fn push(&mut self, text: String, keep_with_next: bool) {
    self.lines.push(Line { text, keep_with_next });
  }
}

/// Greedy word wrap. Words longer than `width` are split across lines.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
  let mut out = Vec::new();
  let mut current = String::new();
  let mut current_len = 0;

  for word in text.split_whitespace() {
    let mut word: Vec<char> = word.chars().collect();

    while word.len() > width {
      if current_len > 0 {
        out.push(std::mem::take(&mut current));
        current_len = 0;
      }
      let rest = word.split_off(width);
      out.push(word.into_iter().collect());
      word = rest;
    }

    let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
    if needed > width {
      out.push(std::mem::take(&mut current));
      current_len = 0;
    }
    if current_len > 0 {
      current.push(' ');
      current_len += 1;
    }
    current.extend(word.iter());
    current_len += word.len();
  }

  if current_len > 0 || out.is_empty() {
    out.push(current);
  }
  out
}

/// Split `lines` into pages of `body_lines` lines each, moving a trailing
/// run of `keep_with_next` lines onto the following page.
pub fn paginate(lines: Vec<Line>, body_lines: usize) -> Vec<Vec<String>> {
  let mut pages = Vec::new();
  let mut page: Vec<Line> = Vec::with_capacity(body_lines);

  for line in lines {
    // Leading blank lines waste the top of a fresh page.
    if page.is_empty() && line.text.is_empty() {
      continue;
    }
    if page.len() == body_lines {
      let keep = page.iter().rev().take_while(|l| l.keep_with_next).count();
      let carry = if keep < page.len() { page.split_off(page.len() - keep) } else { Vec::new() };
      pages.push(std::mem::take(&mut page));
      page = carry;
    }
    page.push(line);
  }
  if !page.is_empty() || pages.is_empty() {
    pages.push(page);
  }

  pages
    .into_iter()
    .map(|p| p.into_iter().map(|l| l.text).collect())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wrap_respects_width() {
    let text = "The Guest keeps the accommodation clean and tidy and respects quiet hours.";
    for line in wrap(text, 20) {
      assert!(line.chars().count() <= 20, "{line:?}");
    }
  }

  #[test]
  fn wrap_splits_overlong_words() {
    let hash = "a".repeat(50);
    let lines = wrap(&format!("hash {hash}"), 20);
    let twenty = "a".repeat(20);
    assert_eq!(lines, vec![
      "hash".to_owned(),
      twenty.clone(),
      twenty,
      "a".repeat(10)
    ]);
  }

  #[test]
  fn wrap_of_empty_text_is_one_empty_line() {
    assert_eq!(wrap("   ", 10), [""]);
  }

  #[test]
  fn headings_are_not_orphaned() {
    let mut sheet = Sheet::new(40);
    for i in 0..3 {
      sheet.paragraph(&format!("line {i}"), 0);
    }
    sheet.heading("Next");
    sheet.paragraph("body", 0);

    // Five body lines per page: three text lines, a blank, then the heading
    // would be cut off from its text.
    let pages = paginate(sheet.into_lines(), 5);
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[1][0], "Next");
    assert_eq!(pages[1][2], "body");
  }
}
