//! Weekly course grid: 14 periods by 7 weekdays.

use tracing::{debug, warn};

use crate::extract;
use crate::models::{normalize_roman, CourseDescriptor, Meeting};
use crate::render::Table;
use crate::timeslot;

pub const PERIODS: usize = 14;
pub const WEEKDAYS: usize = 7;

/// Courses on one course-table page, with their decoded meetings.
///
/// Descriptors are joined with the teacher list by position; each course
/// owns the time-slot formulas between its descriptor and the next one.
pub fn parse_course_table(text: &str) -> Vec<CourseDescriptor> {
    let descriptors = extract::course_descriptors(text);
    let teachers = extract::teacher_names(text);
    if teachers.len() < descriptors.len() {
        warn!(
            descriptors = descriptors.len(),
            teachers = teachers.len(),
            "Fewer teachers than courses on course table"
        );
    }

    let offsets: Vec<usize> = descriptors.iter().map(|d| d.offset).collect();
    let windows = timeslot::windows(&offsets);

    descriptors
        .into_iter()
        .zip(windows)
        .enumerate()
        .map(|(i, (descriptor, window))| CourseDescriptor {
            name: descriptor.name,
            teacher: teachers.get(i).cloned().unwrap_or_default(),
            room: descriptor.room,
            meetings: timeslot::decode_meetings(text, window),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell {
    pub name: String,
    pub teacher: String,
    pub room: String,
}

impl GridCell {
    fn label(&self) -> String {
        format!("{}\n{}@{}", self.name, self.teacher, self.room)
    }
}

/// A placement that replaced an earlier course in the same cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overwrite {
    pub meeting: Meeting,
    pub replaced: String,
    pub by: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleGrid {
    cells: Vec<Vec<Option<GridCell>>>,
    overwrites: Vec<Overwrite>,
}

impl Default for ScheduleGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleGrid {
    pub fn new() -> Self {
        Self {
            cells: vec![vec![None; WEEKDAYS]; PERIODS],
            overwrites: Vec::new(),
        }
    }

    /// Place every meeting of every course, in order. A later course takes
    /// over any cell an earlier one held.
    pub fn build(courses: &[CourseDescriptor]) -> Self {
        let mut grid = Self::new();
        for course in courses {
            for &meeting in &course.meetings {
                grid.place(course, meeting);
            }
        }
        debug!(
            courses = courses.len(),
            occupied = grid.occupied(),
            overwrites = grid.overwrites.len(),
            "Schedule grid built"
        );
        grid
    }

    /// Returns false when the meeting lies outside the grid.
    pub fn place(&mut self, course: &CourseDescriptor, meeting: Meeting) -> bool {
        if meeting.day >= WEEKDAYS || meeting.period >= PERIODS {
            debug!(course = %course.name, day = meeting.day, period = meeting.period, "Meeting outside grid");
            return false;
        }

        let cell = GridCell {
            name: normalize_roman(&course.name),
            teacher: course.teacher.clone(),
            room: course.room.clone(),
        };
        let slot = &mut self.cells[meeting.period][meeting.day];
        if let Some(previous) = slot.replace(cell) {
            self.overwrites.push(Overwrite {
                meeting,
                replaced: previous.name,
                by: normalize_roman(&course.name),
            });
        }
        true
    }

    #[cfg(test)]
    pub fn cell(&self, period: usize, day: usize) -> Option<&GridCell> {
        self.cells.get(period)?.get(day)?.as_ref()
    }

    pub fn overwrites(&self) -> &[Overwrite] {
        &self.overwrites
    }

    pub fn occupied(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// Periods as numbered rows, weekdays 1–7 as columns.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new((1..=WEEKDAYS).map(|d| d.to_string())).with_row_rules();
        for row in &self.cells {
            table.add_row(
                row.iter()
                    .map(|cell| cell.as_ref().map(GridCell::label).unwrap_or_default()),
            );
        }
        table
    }
}
