//! Pattern extraction over raw portal pages.
//!
//! The portal renders most of its data as inline JavaScript or loosely
//! nested `<td>` cells, so every target here is a regular expression run over
//! the decoded page text. Every extractor preserves document order and
//! returns an empty result (never an error) when nothing matches.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::models::{ElectableCourse, ElectionOutcome, ExamRow, SemesterInfo, StudentDetail};

struct Patterns {
    semester_calendar: Regex,
    semester_cookie: Regex,
    course_table_ids: Regex,
    teachers: Regex,
    course_info: Regex,
    student_detail: Regex,
    exam_batch: Regex,
    exam_unarranged: Regex,
    exam_row: Regex,
    election_profile: Regex,
    election_semester: Regex,
    elected_ids: Regex,
    electable_course: Regex,
    election_message: Regex,
    election_settled: Regex,
}

impl Patterns {
    fn new() -> Self {
        // Constant patterns; a failure here is a typo, not a runtime condition.
        let re = |pattern: &str| Regex::new(pattern).expect("static regex must compile");
        Self {
            semester_calendar: re(r#"(?s)\{id:(.+?),schoolYear:"(.+?)",name:"(.+?)"\}"#),
            semester_cookie: re(r"semester\.id=([^;,\s]+)"),
            course_table_ids: re(r#"bg\.form\.addInput\(form,"ids","(.+?)"\);"#),
            teachers: re(r#"var teachers = \[\{id:.*?,name:"(.+?)",lab:.*?\}\];"#),
            // `)","<name>(<code>)","<..>","<room>","<week bitmap>"`
            course_info: re(r#"\)","(.+?)\(.+?\)",".*?","(.*?)","0*1*0*""#),
            student_detail: re(
                r"(?s)姓名：</td>.*?<td>(.+?)</td>.*?院系：</td>.*?<td>(.+?)</td>.*?专业：</td>.*?<td>(.+?)</td>",
            ),
            exam_batch: re(r"'/eams/stdExam!examTable\.action\?examBatch\.id=(.+?)'"),
            exam_unarranged: re(r#"<font color="BBC4C3">exam.*?noArrange</font>"#),
            exam_row: re(concat!(
                r"(?s)<td>\d{4}</td><td>(.*?)</td><td>.*?</td>",
                r".*?<td>>*(.*?)<*</td>",
                r".*?<td>>*(.*?)<*</td>",
                r".*?<td>.*?>(.*?)<.*?</td>",
                r".*?<td>正常</td>",
            )),
            election_profile: re(
                r"/eams/stdElectCourse!defaultPage\.action\?electionProfile\.id=(\d+)",
            ),
            election_semester: re(r"&semesterId=(\d+)"),
            elected_ids: re(r#"electedIds\["l(\d+)"\] = true;"#),
            electable_course: re(
                r"(?s)id:(\d+),no:'(\d+)',name:'(.*?)',.*?teachers:'(.*?)'.*?rooms:'(.*?)'",
            ),
            election_message: re(r"(?s)<div.*?>(.+?\[\d+\].+?)</br>.*?</div>"),
            election_settled: re("成功|已经选过|冲突"),
        }
    }
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(Patterns::new)
}

/// Start of a course-info match, with the fields captured from it.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorMatch {
    /// Byte offset of the match start in the page text.
    pub offset: usize,
    pub name: String,
    pub room: String,
}

/// All semesters listed by the `semesterCalendar` data query.
pub fn semester_infos(text: &str) -> Vec<SemesterInfo> {
    patterns()
        .semester_calendar
        .captures_iter(text)
        .filter_map(|caps| {
            let id = caps[1].trim().parse::<i64>().ok()?;
            Some(SemesterInfo {
                id,
                school_year: caps[2].to_string(),
                ordinal: caps[3].to_string(),
            })
        })
        .collect()
}

/// Find the semester id carried in `Set-Cookie` header values.
pub fn semester_cookie<S: AsRef<str>>(set_cookies: &[S]) -> Option<String> {
    set_cookies.iter().find_map(|header| {
        patterns()
            .semester_cookie
            .captures(header.as_ref())
            .map(|caps| caps[1].to_string())
    })
}

pub fn course_table_ids(text: &str) -> Option<String> {
    patterns()
        .course_table_ids
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Teacher names, one per course activity, in page order.
pub fn teacher_names(text: &str) -> Vec<String> {
    patterns()
        .teachers
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Course descriptor strings with the byte offset each one starts at.
pub fn course_descriptors(text: &str) -> Vec<DescriptorMatch> {
    let matches: Vec<DescriptorMatch> = patterns()
        .course_info
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(DescriptorMatch {
                offset: whole.start(),
                name: caps[1].to_string(),
                room: caps[2].to_string(),
            })
        })
        .collect();

    debug!(descriptors = matches.len(), "Extracted course descriptors");
    matches
}

pub fn student_detail(text: &str) -> Option<StudentDetail> {
    patterns().student_detail.captures(text).map(|caps| StudentDetail {
        name: caps[1].trim().to_string(),
        department: caps[2].trim().to_string(),
        major: caps[3].trim().to_string(),
    })
}

pub fn exam_batch_id(text: &str) -> Option<String> {
    patterns()
        .exam_batch
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Exam rows with status `正常`. Placeholder spans for exams that are not
/// arranged yet are collapsed first so their cells come out empty.
pub fn exam_rows(text: &str) -> Vec<ExamRow> {
    let p = patterns();
    let text = p.exam_unarranged.replace_all(text, "><");
    p.exam_row
        .captures_iter(&text)
        .map(|caps| ExamRow {
            course_name: caps[1].to_string(),
            date: caps[2].to_string(),
            time: caps[3].to_string(),
            location: caps[4].to_string(),
        })
        .collect()
}

pub fn election_profile_ids(text: &str) -> Vec<String> {
    patterns()
        .election_profile
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

pub fn election_semester_id(text: &str) -> Option<String> {
    patterns()
        .election_semester
        .captures(text)
        .map(|caps| caps[1].to_string())
}

pub fn elected_ids(text: &str) -> Vec<String> {
    patterns()
        .elected_ids
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

pub fn electable_courses(text: &str) -> Vec<ElectableCourse> {
    patterns()
        .electable_course
        .captures_iter(text)
        .map(|caps| ElectableCourse {
            id: caps[1].to_string(),
            course_no: caps[2].to_string(),
            name: caps[3].to_string(),
            teacher: caps[4].to_string(),
            room: caps[5].to_string(),
        })
        .collect()
}

/// Message of an elect/drop response, if the page carries one.
pub fn election_outcome(text: &str) -> Option<ElectionOutcome> {
    let p = patterns();
    let caps = p.election_message.captures(text)?;
    let message = caps[1].trim().to_string();
    let settled = p.election_settled.is_match(&message);
    Some(ElectionOutcome { message, settled })
}
