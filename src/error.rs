use thiserror::Error;

/// Failures reported by the portal workflows.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Failed to find your semester '{0}', please make sure that you've correctly inputed!")]
    SemesterNotFound(String),

    #[error("Failed to get your {0}, please check your username and password!")]
    SessionExpired(&'static str),

    #[error("Sorry, something went wrong while loading course table for project {0}, please close and try again!")]
    NoCourseTableIds(u8),

    #[error(
        "Sorry, there are not any exam arrangement now (or for the semester you just typed in).\n\
         You may try another semester."
    )]
    NoExamBatch,

    #[error("Failed to find the url to elect course, please check that if the system is open!")]
    ElectionClosed,

    #[error("Failed to elect course {0}, please make sure you're able to elect this course!")]
    UnknownCourseNo(String),

    #[error("HTTP error {status} from {url}")]
    HttpStatus { status: u16, url: String },
}
