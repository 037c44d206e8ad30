use serde::{Deserialize, Serialize};

/// Ordered course categories of a grade transcript (letters A–E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    UniversityRequired,
    DepartmentRequired,
    MajorRequired,
    MajorElective,
    FreeElective,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::UniversityRequired,
        Category::DepartmentRequired,
        Category::MajorRequired,
        Category::MajorElective,
        Category::FreeElective,
    ];

    /// 1-based position, matching the order of the headers on the grade page.
    pub fn index(self) -> usize {
        self as usize + 1
    }

    pub fn from_index(index: usize) -> Option<Self> {
        index.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'A'..='E' => Self::from_index(letter.to_ascii_uppercase() as usize - 'A' as usize + 1),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        (b'A' + self as u8) as char
    }

    /// Header text the portal prints above each category's rows.
    pub fn header(self) -> &'static str {
        match self {
            Category::UniversityRequired => "校公共必修课",
            Category::DepartmentRequired => "院系公共必修课",
            Category::MajorRequired => "专业必修课",
            Category::MajorElective => "专业选修课",
            Category::FreeElective => "任选课",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeRow {
    pub course_name: String,
    /// Credit as displayed; parsed only when aggregating.
    pub credit: String,
    pub score: String,
}

impl GradeRow {
    pub fn new(course_name: String, credit: String, score: String) -> Self {
        Self {
            course_name,
            credit,
            score,
        }
    }
}

/// One weekly occurrence of a course, as decoded from the time-slot formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meeting {
    pub day: usize,
    pub period: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseDescriptor {
    pub name: String,
    pub teacher: String,
    pub room: String,
    pub meetings: Vec<Meeting>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemesterInfo {
    pub id: i64,
    pub school_year: String,
    pub ordinal: String,
}

/// Semester named on the command line as `<year>-<year>:<1|2>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemesterSelector {
    pub school_year: String,
    pub ordinal: String,
}

impl SemesterSelector {
    pub fn parse(text: &str) -> Option<Self> {
        let (school_year, ordinal) = text.trim().split_once(':')?;
        let (from, to) = school_year.split_once('-')?;
        let is_year = |y: &str| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit());
        if !is_year(from) || !is_year(to) || !matches!(ordinal, "1" | "2") {
            return None;
        }
        Some(Self {
            school_year: school_year.to_string(),
            ordinal: ordinal.to_string(),
        })
    }

    pub fn matches(&self, info: &SemesterInfo) -> bool {
        info.school_year == self.school_year && info.ordinal == self.ordinal
    }
}

impl std::fmt::Display for SemesterSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.school_year, self.ordinal)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExamRow {
    pub course_name: String,
    pub date: String,
    pub time: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectableCourse {
    pub id: String,
    pub course_no: String,
    pub name: String,
    pub teacher: String,
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDetail {
    pub name: String,
    pub department: String,
    pub major: String,
}

/// Result message of one elect/drop request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionOutcome {
    pub message: String,
    /// Elected, already elected, or in conflict; no point retrying.
    pub settled: bool,
}

/// Replace roman-numeral glyphs with their ASCII spelling.
pub fn normalize_roman(text: &str) -> String {
    text.replace('Ⅰ', "I")
        .replace('Ⅱ', "II")
        .replace('Ⅲ', "III")
        .replace('Ⅳ', "IV")
}
