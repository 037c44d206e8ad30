//! One workflow per query: fetch the pages, run them through extraction,
//! and render the resulting tables.

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::classify::{self, CategorySelection};
use crate::error::PortalError;
use crate::extract;
use crate::grades;
use crate::models::{normalize_roman, CourseDescriptor, SemesterInfo, SemesterSelector, StudentDetail};
use crate::portal::{Endpoints, PageFetcher};
use crate::render::{Align, Table};
use crate::schedule::{self, ScheduleGrid};

/// Both server-side groupings of a student's enrollment.
const PROJECTS: [u8; 2] = [1, 2];

pub async fn student_detail<F: PageFetcher + ?Sized>(
    fetcher: &F,
    endpoints: &Endpoints,
) -> Result<Option<StudentDetail>> {
    let page = fetcher.get(&endpoints.student_detail()).await?;
    Ok(extract::student_detail(&page.body))
}

pub fn render_student_detail(detail: &StudentDetail) -> String {
    format!(
        "\n姓名:{}\n院系:{}\n专业:{}\n",
        detail.name, detail.department, detail.major
    )
}

#[instrument(skip(fetcher, endpoints), fields(semester = %selector))]
pub async fn resolve_semester<F: PageFetcher + ?Sized>(
    fetcher: &F,
    endpoints: &Endpoints,
    selector: &SemesterSelector,
) -> Result<SemesterInfo> {
    let page = fetcher
        .post(&endpoints.data_query(), &[("dataType", "semesterCalendar")])
        .await?;
    let semesters = extract::semester_infos(&page.body);
    debug!(semesters = semesters.len(), "Semester calendar loaded");

    let info = semesters
        .into_iter()
        .find(|info| selector.matches(info))
        .ok_or_else(|| PortalError::SemesterNotFound(selector.to_string()))?;
    info!(semester_id = info.id, "Semester resolved");
    Ok(info)
}

#[instrument(skip(fetcher, endpoints), fields(categories = %selection.label()))]
pub async fn grade_report<F: PageFetcher + ?Sized>(
    fetcher: &F,
    endpoints: &Endpoints,
    selection: &CategorySelection,
) -> Result<String> {
    let page = fetcher.get(&endpoints.grades()).await?;
    let rows = classify::table_rows(&page.body);
    let categories = classify::classify_all(&rows, selection);

    if categories.iter().all(Vec::is_empty) {
        return Err(PortalError::SessionExpired("grades").into());
    }

    let mut table = Table::new(["课程名称", "学分", "成绩"]).align(2, Align::Left);
    for row in categories.iter().flatten() {
        table.add_row([row.course_name.as_str(), row.credit.as_str(), row.score.as_str()]);
    }
    let summary = grades::aggregate(&categories);
    info!(
        rows = table.len(),
        total_credits = summary.total_credits,
        "Grade table built"
    );

    let label = selection.label();
    Ok(format!(
        "\n{label}类成绩表:\n{table}{label}类已修学分:{:.1}\n{label}类学分绩:{:.4}\n",
        summary.total_credits, summary.weighted_average
    ))
}

/// Courses of one project partition.
async fn project_courses<F: PageFetcher + ?Sized>(
    fetcher: &F,
    endpoints: &Endpoints,
    project: u8,
    semester_id: Option<i64>,
) -> Result<Vec<CourseDescriptor>> {
    fetcher.get(&endpoints.course_table_entry(project)).await?;
    let index = fetcher.get(&endpoints.course_table_index(project)).await?;

    let semester_id = match semester_id {
        Some(id) => id.to_string(),
        None => extract::semester_cookie(&index.set_cookies)
            .ok_or(PortalError::SessionExpired("courses"))?,
    };
    let ids = extract::course_table_ids(&index.body).ok_or(PortalError::NoCourseTableIds(project))?;

    let page = fetcher
        .post(
            &endpoints.course_table(),
            &[
                ("setting.kind", "std"),
                ("semester.id", semester_id.as_str()),
                ("ids", ids.as_str()),
            ],
        )
        .await?;
    let courses = schedule::parse_course_table(&page.body);
    debug!(project, courses = courses.len(), "Project courses parsed");
    Ok(courses)
}

#[instrument(skip(fetcher, endpoints))]
pub async fn course_report<F: PageFetcher + ?Sized>(
    fetcher: &F,
    endpoints: &Endpoints,
    semester_id: Option<i64>,
) -> Result<String> {
    let mut courses = Vec::new();
    for (i, &project) in PROJECTS.iter().enumerate() {
        if i > 0 {
            // The portal keeps the previous project selected until home reloads.
            fetcher.get(&endpoints.home()).await?;
        }
        match project_courses(fetcher, endpoints, project, semester_id).await {
            Ok(found) => courses.extend(found),
            Err(e) => match e.downcast_ref::<PortalError>() {
                Some(PortalError::NoCourseTableIds(_)) => {
                    warn!(project, "No course table ids, skipping project");
                }
                _ => return Err(e),
            },
        }
    }

    if courses.is_empty() {
        return Ok("No courses found for this semester.\n".to_string());
    }

    let grid = ScheduleGrid::build(&courses);
    for overwrite in grid.overwrites() {
        debug!(
            day = overwrite.meeting.day,
            period = overwrite.meeting.period,
            replaced = %overwrite.replaced,
            by = %overwrite.by,
            "Schedule cell overwritten"
        );
    }
    info!(
        courses = courses.len(),
        occupied = grid.occupied(),
        overwrites = grid.overwrites().len(),
        "Course table built"
    );
    Ok(format!("课程表:\n{}", grid.to_table()))
}

#[instrument(skip(fetcher, endpoints))]
pub async fn exam_report<F: PageFetcher + ?Sized>(
    fetcher: &F,
    endpoints: &Endpoints,
    semester_id: Option<i64>,
) -> Result<String> {
    let semester_id = match semester_id {
        Some(id) => id.to_string(),
        None => {
            let index = fetcher.get(&endpoints.exam_index()).await?;
            extract::semester_cookie(&index.set_cookies).ok_or(PortalError::SessionExpired("exams"))?
        }
    };

    fetcher.set_cookie("semester.id", &semester_id);
    let index = fetcher.get(&endpoints.exam_index()).await?;
    let batch_id = extract::exam_batch_id(&index.body).ok_or(PortalError::NoExamBatch)?;

    let page = fetcher.get(&endpoints.exam_table(&batch_id)).await?;
    let exams = extract::exam_rows(&page.body);
    info!(batch_id = %batch_id, exams = exams.len(), "Exam table built");

    if exams.is_empty() {
        return Ok("No exam arrangement found.\n".to_string());
    }

    let mut table = Table::new(["课程名称", "考试日期", "考试时间", "考试地点"]);
    for exam in &exams {
        table.add_row([
            normalize_roman(&exam.course_name),
            exam.date.clone(),
            exam.time.clone(),
            exam.location.clone(),
        ]);
    }
    Ok(format!("考试安排:\n{}", table))
}
