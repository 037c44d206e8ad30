//! Interactive course election.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::cache::ElectionCache;
use crate::error::PortalError;
use crate::extract;
use crate::models::{ElectableCourse, ElectionOutcome};
use crate::portal::{Endpoints, PageFetcher};

const FAILED_OPERATION: &str = "本次操作失败，请务必确保是正确操作(如不要退选不存在的课程等)！";

/// How many rounds of elect requests to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycles {
    Count(u32),
    /// Keep going until every course is settled.
    Always,
}

impl Cycles {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("always") {
            Some(Cycles::Always)
        } else {
            text.parse().ok().map(Cycles::Count)
        }
    }
}

pub struct Election<'a, F: PageFetcher + ?Sized> {
    fetcher: &'a F,
    endpoints: &'a Endpoints,
    cache: &'a ElectionCache,
}

impl<'a, F: PageFetcher + ?Sized> Election<'a, F> {
    pub fn new(fetcher: &'a F, endpoints: &'a Endpoints, cache: &'a ElectionCache) -> Self {
        Self {
            fetcher,
            endpoints,
            cache,
        }
    }

    /// First election profile currently open.
    async fn profile_id(&self) -> Result<String> {
        let page = self.fetcher.get(&self.endpoints.election_index()).await?;
        extract::election_profile_ids(&page.body)
            .into_iter()
            .next()
            .ok_or_else(|| PortalError::ElectionClosed.into())
    }

    /// Electable courses, loaded once per run through the cache.
    pub async fn electable_courses(&self) -> Result<Vec<ElectableCourse>> {
        if let Some(courses) = self.cache.get()? {
            return Ok(courses);
        }

        let profile = self.profile_id().await?;
        let entry = self.fetcher.get(&self.endpoints.election_page(&profile)).await?;
        if let Some(semester_id) = extract::election_semester_id(&entry.body) {
            debug!(profile = %profile, semester_id = %semester_id, "Election semester");
        }
        let page = self.fetcher.get(&self.endpoints.election_data(&profile)).await?;
        let courses = extract::electable_courses(&page.body);
        info!(profile = %profile, courses = courses.len(), "Electable courses loaded");

        self.cache.put(&courses)?;
        Ok(courses)
    }

    /// Courses the student has already elected.
    pub async fn elected_courses(&self) -> Result<Vec<ElectableCourse>> {
        let courses = self.electable_courses().await?;
        let profile = self.profile_id().await?;
        let page = self.fetcher.get(&self.endpoints.election_page(&profile)).await?;

        Ok(extract::elected_ids(&page.body)
            .iter()
            .filter_map(|id| courses.iter().find(|c| &c.id == id).cloned())
            .collect())
    }

    pub async fn course_id(&self, course_no: &str) -> Result<String> {
        self.electable_courses()
            .await?
            .into_iter()
            .find(|c| c.course_no == course_no)
            .map(|c| c.id)
            .ok_or_else(|| PortalError::UnknownCourseNo(course_no.to_string()).into())
    }

    /// Send one elect (`elect = true`) or drop request.
    #[instrument(skip(self))]
    pub async fn submit(&self, course_id: &str, elect: bool) -> Result<ElectionOutcome> {
        let profile = self.profile_id().await?;
        self.fetcher.get(&self.endpoints.election_page(&profile)).await?;

        let operator = format!("{}:{}", course_id, elect);
        let page = self
            .fetcher
            .post(
                &self.endpoints.election_submit(&profile),
                &[("operator0", operator.as_str())],
            )
            .await?;

        let outcome = extract::election_outcome(&page.body).unwrap_or_else(|| ElectionOutcome {
            message: FAILED_OPERATION.to_string(),
            settled: false,
        });
        debug!(settled = outcome.settled, message = %outcome.message, "Election response");
        Ok(outcome)
    }

    /// Elect every course until it is settled or the cycles run out.
    /// Returns the ids still pending.
    pub async fn elect_all<W: Write>(
        &self,
        mut pending: Vec<String>,
        cycles: Cycles,
        out: &mut W,
    ) -> Result<Vec<String>> {
        let mut round = 0u32;
        while !pending.is_empty() {
            if let Cycles::Count(n) = cycles {
                if round >= n {
                    break;
                }
            }
            round += 1;

            let mut still_pending = Vec::with_capacity(pending.len());
            for id in pending {
                let outcome = self.submit(&id, true).await?;
                writeln!(out, "{}", outcome.message)?;
                if !outcome.settled {
                    still_pending.push(id);
                }
            }
            pending = still_pending;
        }

        info!(rounds = round, pending = pending.len(), "Election finished");
        Ok(pending)
    }

    pub async fn drop_all<W: Write>(&self, ids: &[String], out: &mut W) -> Result<()> {
        for id in ids {
            let outcome = self.submit(id, false).await?;
            writeln!(out, "{}", outcome.message)?;
        }
        Ok(())
    }

    /// Prompt-driven session: show elected courses, read course numbers and
    /// an option, then elect or drop.
    pub async fn interact<R: BufRead, W: Write>(&self, input: &mut R, out: &mut W) -> Result<()> {
        writeln!(out, "\n当前已选课程:\n")?;
        for course in self.elected_courses().await? {
            writeln!(out, "{} {}", course.course_no, course.name)?;
        }

        let numbers = prompt(input, out, "Input course ID (use space to separate):")?;
        let option = prompt(input, out, "input option ([y]:elect course / [n]:drop course):")?;

        let mut ids = Vec::new();
        for course_no in numbers.split_whitespace() {
            ids.push(self.course_id(course_no).await?);
        }

        match option.to_lowercase().as_str() {
            "y" => {
                let answer = prompt(input, out, "input the cycles to elect course:")?;
                let cycles = Cycles::parse(&answer)
                    .with_context(|| format!("Invalid cycle count '{}'", answer))?;
                if cycles == Cycles::Always {
                    writeln!(out, "\n已开启无限刷课模式(刷到自动结束)，如需提前终止请按Ctrl+C\n{}", "=".repeat(60))?;
                } else {
                    writeln!(out, "\n开始选课\n{}", "=".repeat(60))?;
                }
                self.elect_all(ids, cycles, out).await?;
                writeln!(out, "{}\nFinish!", "=".repeat(60))?;
            }
            "n" => self.drop_all(&ids, out).await?,
            _ => writeln!(out, "Please input correct option!")?,
        }
        Ok(())
    }
}

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, message: &str) -> Result<String> {
    write!(out, "{}", message)?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read input")?;
    Ok(line.trim().to_string())
}
