//! Partitioning of the grade page into course categories.
//!
//! The transcript is one long table: a header row naming each category is
//! followed by that category's 8-cell grade rows, in category order.

use scraper::{Html, Selector};
use tracing::debug;

use crate::models::{normalize_roman, Category, GradeRow};

const GRADE_ROW_CELLS: usize = 8;
const NAME_CELL: usize = 2;
const CREDIT_CELL: usize = 3;
const SCORE_CELL: usize = 5;

/// A `<tr>` reduced to what the classifier looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub text: String,
}

impl TableRow {
    fn is_grade_row(&self) -> bool {
        self.cells.len() == GRADE_ROW_CELLS
    }

    fn mentions(&self, category: Category) -> bool {
        self.text.contains(category.header())
    }

    fn grade(&self) -> GradeRow {
        GradeRow::new(
            normalize_roman(&self.cells[NAME_CELL]),
            self.cells[CREDIT_CELL].clone(),
            self.cells[SCORE_CELL].clone(),
        )
    }
}

/// Every `<tr>` of the page, in document order.
pub fn table_rows(html: &str) -> Vec<TableRow> {
    let document = Html::parse_document(html);
    let tr_selector = Selector::parse("tr").expect("Invalid tr selector");
    let td_selector = Selector::parse("td").expect("Invalid td selector");

    document
        .select(&tr_selector)
        .map(|row| TableRow {
            cells: row
                .select(&td_selector)
                .map(|td| normalize_ws(&td.text().collect::<String>()))
                .collect(),
            text: row.text().collect(),
        })
        .collect()
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Requested categories: letters A–E in any case, other characters ignored,
/// duplicates collapsed, sorted in category order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySelection(Vec<Category>);

impl CategorySelection {
    pub fn parse(selector: &str) -> Self {
        let mut categories: Vec<Category> = selector.chars().filter_map(Category::from_letter).collect();
        categories.sort();
        categories.dedup();
        Self(categories)
    }

    pub fn categories(&self) -> &[Category] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical letters, e.g. `"BCD"`.
    pub fn label(&self) -> String {
        self.0.iter().map(|c| c.letter()).collect()
    }
}

enum ScanState {
    BeforeTarget,
    Accumulating(Vec<GradeRow>),
    Done(Vec<GradeRow>),
}

/// Grade rows of one category: the rows after its header and before the
/// next category's header (or end of input for the last category).
pub fn classify(rows: &[TableRow], target: Category) -> Vec<GradeRow> {
    let next = target.next();
    let mut state = ScanState::BeforeTarget;

    for row in rows {
        state = match state {
            ScanState::BeforeTarget => {
                let ends_here = next.is_some_and(|n| row.mentions(n));
                if row.mentions(target) && !ends_here {
                    ScanState::Accumulating(Vec::new())
                } else if ends_here {
                    ScanState::Done(Vec::new())
                } else {
                    ScanState::BeforeTarget
                }
            }
            ScanState::Accumulating(mut acc) => {
                if row.is_grade_row() {
                    acc.push(row.grade());
                }
                if row.mentions(target) {
                    acc.clear();
                }
                if next.is_some_and(|n| row.mentions(n)) {
                    ScanState::Done(acc)
                } else {
                    ScanState::Accumulating(acc)
                }
            }
            done @ ScanState::Done(_) => done,
        };
        if matches!(state, ScanState::Done(_)) {
            break;
        }
    }

    let rows = match state {
        ScanState::BeforeTarget => Vec::new(),
        ScanState::Accumulating(acc) | ScanState::Done(acc) => acc,
    };
    debug!(category = %target.letter(), rows = rows.len(), "Classified grade rows");
    rows
}

/// One independent pass per selected category, in selection order.
pub fn classify_all(rows: &[TableRow], selection: &CategorySelection) -> Vec<Vec<GradeRow>> {
    selection
        .categories()
        .iter()
        .map(|&category| classify(rows, category))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(category: Category) -> TableRow {
        TableRow {
            cells: vec![category.header().to_string()],
            text: format!("\n{}(要求学分: 10)\n", category.header()),
        }
    }

    fn data(name: &str) -> TableRow {
        let cells: Vec<String> = vec!["1", "CODE", name, "3", "必修", "90", "是", ""]
            .into_iter()
            .map(String::from)
            .collect();
        TableRow {
            text: cells.join(" "),
            cells,
        }
    }

    fn names(rows: &[GradeRow]) -> Vec<&str> {
        rows.iter().map(|r| r.course_name.as_str()).collect()
    }

    #[test]
    fn test_rows_between_headers() {
        let rows = vec![
            header(Category::DepartmentRequired),
            data("b1"),
            header(Category::MajorRequired),
            data("c1"),
            data("c2"),
            header(Category::MajorElective),
            data("d1"),
        ];

        assert_eq!(names(&classify(&rows, Category::MajorRequired)), vec!["c1", "c2"]);
        assert_eq!(names(&classify(&rows, Category::DepartmentRequired)), vec!["b1"]);
        assert_eq!(names(&classify(&rows, Category::MajorElective)), vec!["d1"]);
    }

    #[test]
    fn test_last_category_runs_to_end() {
        let rows = vec![
            header(Category::MajorElective),
            data("d1"),
            header(Category::FreeElective),
            data("e1"),
            data("e2"),
        ];
        assert_eq!(names(&classify(&rows, Category::FreeElective)), vec!["e1", "e2"]);
    }

    #[test]
    fn test_absent_category_is_empty() {
        let rows = vec![header(Category::MajorRequired), data("c1")];
        assert!(classify(&rows, Category::UniversityRequired).is_empty());
        assert!(classify(&rows, Category::FreeElective).is_empty());
    }

    #[test]
    fn test_next_header_before_target_yields_nothing() {
        let rows = vec![data("x"), header(Category::DepartmentRequired), data("b1")];
        assert!(classify(&rows, Category::UniversityRequired).is_empty());
    }

    #[test]
    fn test_target_and_next_header_on_one_row() {
        let combined = TableRow {
            cells: vec!["专业必修课 专业选修课".to_string()],
            text: "专业必修课 专业选修课".to_string(),
        };
        let rows = vec![combined, data("d1"), data("d2")];
        assert!(classify(&rows, Category::MajorRequired).is_empty());
    }

    fn wide_header(category: Category) -> TableRow {
        let mut row = data(category.header());
        row.text = format!("{} 要求学分: 30", category.header());
        row
    }

    #[test]
    fn test_eight_cell_header_is_not_a_grade() {
        let rows = vec![
            wide_header(Category::MajorRequired),
            data("c1"),
            header(Category::MajorElective),
        ];
        assert_eq!(names(&classify(&rows, Category::MajorRequired)), vec!["c1"]);
    }

    #[test]
    fn test_repeated_target_header_restarts_collection() {
        let rows = vec![
            header(Category::MajorRequired),
            data("stale"),
            wide_header(Category::MajorRequired),
            data("c1"),
            data("c2"),
            header(Category::MajorElective),
            data("d1"),
        ];
        assert_eq!(names(&classify(&rows, Category::MajorRequired)), vec!["c1", "c2"]);
    }

    #[test]
    fn test_rows_with_other_cell_counts_are_ignored() {
        let mut short = data("short");
        short.cells.truncate(7);
        let rows = vec![header(Category::MajorRequired), short, data("c1")];
        assert_eq!(names(&classify(&rows, Category::MajorRequired)), vec!["c1"]);
    }

    #[test]
    fn test_selected_fields_and_roman_names() {
        let rows = vec![header(Category::MajorRequired), data("高等数学Ⅱ")];
        let result = classify(&rows, Category::MajorRequired);
        assert_eq!(result, vec![GradeRow::new("高等数学II".into(), "3".into(), "90".into())]);
    }

    #[test]
    fn test_selection_parsing() {
        let selection = CategorySelection::parse("dbBxd");
        assert_eq!(
            selection.categories(),
            &[Category::DepartmentRequired, Category::MajorElective]
        );
        assert_eq!(selection.label(), "BD");
        assert!(CategorySelection::parse("xyz").is_empty());
    }

    #[test]
    fn test_classify_all_matches_selection_length() {
        let rows = vec![header(Category::UniversityRequired), data("a1")];
        for selector in ["A", "ab", "EDCBA", "aaaa", "cC", ""] {
            let selection = CategorySelection::parse(selector);
            let result = classify_all(&rows, &selection);
            assert_eq!(result.len(), selection.categories().len());
        }
    }

    #[test]
    fn test_table_rows_from_html() {
        let html = r#"<html><body><table>
            <tr><td colspan="8">专业必修课 要求学分: 30</td></tr>
            <tr><td>1</td><td>MATH</td><td> 高等数学Ⅱ </td><td>5</td><td>必修</td><td>88 (补考)</td><td>是</td><td></td></tr>
            <tr><td colspan="8">专业选修课</td></tr>
        </table></body></html>"#;
        let rows = table_rows(html);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].cells.len(), 8);

        let result = classify(&rows, Category::MajorRequired);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].course_name, "高等数学II");
        assert_eq!(result[0].credit, "5");
        assert_eq!(result[0].score, "88 (补考)");
    }
}
