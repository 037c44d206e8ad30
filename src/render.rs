//! Plain-text tables for the terminal.
//!
//! Every table gets a leading index column numbered from 1. Widths are
//! measured in terminal columns so CJK course names line up.

use std::fmt;

use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    aligns: Vec<Align>,
    rows: Vec<Vec<String>>,
    row_rules: bool,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let aligns = vec![Align::default(); headers.len()];
        Self {
            headers,
            aligns,
            rows: Vec::new(),
            row_rules: false,
        }
    }

    /// Draw a rule between every row, not just around the header.
    pub fn with_row_rules(mut self) -> Self {
        self.row_rules = true;
        self
    }

    /// Set alignment of a data column (0 = first header).
    pub fn align(mut self, column: usize, align: Align) -> Self {
        if let Some(slot) = self.aligns.get_mut(column) {
            *slot = align;
        }
        self
    }

    /// Rows are padded or cut to the header's arity.
    pub fn add_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = row.into_iter().map(Into::into).collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let header: Vec<String> = std::iter::once(String::new())
            .chain(self.headers.iter().cloned())
            .collect();
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                std::iter::once((i + 1).to_string())
                    .chain(row.iter().cloned())
                    .collect()
            })
            .collect();
        let aligns: Vec<Align> = std::iter::once(Align::Center)
            .chain(self.aligns.iter().copied())
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| cell_width(h)).collect();
        for row in &body {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell_width(cell));
            }
        }

        let rule = rule_line(&widths);
        let mut out = String::new();
        out.push_str(&rule);
        push_row(&mut out, &header, &widths, &vec![Align::Center; widths.len()]);
        out.push_str(&rule);
        for (i, row) in body.iter().enumerate() {
            push_row(&mut out, row, &widths, &aligns);
            if self.row_rules && i + 1 < body.len() {
                out.push_str(&rule);
            }
        }
        if !body.is_empty() {
            out.push_str(&rule);
        }
        out
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn rule_line(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for w in widths {
        line.push_str(&"-".repeat(w + 2));
        line.push('+');
    }
    line.push('\n');
    line
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize], aligns: &[Align]) {
    let lines: Vec<Vec<&str>> = cells.iter().map(|c| c.split('\n').collect()).collect();
    let height = lines.iter().map(Vec::len).max().unwrap_or(1);

    for line_no in 0..height {
        out.push('|');
        for ((cell_lines, &width), &align) in lines.iter().zip(widths).zip(aligns) {
            let text = cell_lines.get(line_no).copied().unwrap_or("");
            out.push(' ');
            out.push_str(&pad(text, width, align));
            out.push_str(" |");
        }
        out.push('\n');
    }
}

fn pad(text: &str, width: usize, align: Align) -> String {
    let fill = width.saturating_sub(display_width(text));
    let (left, right) = match align {
        Align::Left => (0, fill),
        Align::Right => (fill, 0),
        Align::Center => (fill / 2, fill - fill / 2),
    };
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}

fn cell_width(cell: &str) -> usize {
    cell.split('\n').map(display_width).max().unwrap_or(0)
}

/// Terminal columns taken by `text`; East Asian wide glyphs count double.
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_width() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("高等数学"), 8);
        assert_eq!(display_width("高数II"), 6);
        assert_eq!(display_width("（）"), 4);
    }

    #[test]
    fn test_index_column_and_alignment() {
        let mut table = Table::new(["name", "credit"]);
        table.add_row(["abc", "3"]);
        table.add_row(["de", "4.5"]);

        let expected = "\
+---+------+--------+
|   | name | credit |
+---+------+--------+
| 1 | abc  |   3    |
| 2 |  de  |  4.5   |
+---+------+--------+
";
        assert_eq!(table.render(), expected);
    }

    #[test]
    fn test_left_aligned_column_with_wide_glyphs() {
        let mut table = Table::new(["课程", "成绩"]).align(1, Align::Left);
        table.add_row(["数学", "90"]);
        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "|   | 课程 | 成绩 |");
        assert_eq!(lines[3], "| 1 | 数学 | 90   |");
        assert!(lines.iter().all(|l| display_width(l) == display_width(lines[0])));
    }

    #[test]
    fn test_multiline_cells_and_row_rules() {
        let mut table = Table::new(["1"]).with_row_rules();
        table.add_row(["数学\n张三@A101"]);
        table.add_row([""]);

        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[3].contains("数学"));
        assert!(lines[4].contains("张三@A101"));
        assert!(lines[5].starts_with("+-"));
        assert!(lines.iter().all(|l| display_width(l) == display_width(lines[0])));
    }

    #[test]
    fn test_row_arity_follows_header() {
        let mut table = Table::new(["a", "b"]);
        table.add_row(["only"]);
        table.add_row(["x", "y", "z"]);
        assert_eq!(table.len(), 2);
        assert!(!table.render().contains('z'));
    }

    #[test]
    fn test_empty_table_renders_header() {
        let table = Table::new(["a"]);
        assert!(table.is_empty());
        assert_eq!(table.render().lines().count(), 3);
    }
}
