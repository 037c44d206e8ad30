use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::classify::CategorySelection;
use crate::models::SemesterSelector;
use crate::portal::DEFAULT_BASE_URL;

#[derive(Parser, Debug, Clone)]
#[command(name = "eamis")]
#[command(about = "A simple tool to query grades, course tables and exams in NKU-EAMIS, and to elect courses")]
#[command(version)]
#[command(after_help = "Examples:\n  eamis -g BCD\n  eamis -g ABCDE -u your_username -p your_password\n  eamis -c -s 2016-2017:2\n  eamis -e -u your_username -p your_password")]
pub struct Config {
    /// Grade query for the given course categories (any combination of A, B, C, D, E)
    #[arg(short = 'g', long = "grades", value_name = "CATEGORIES")]
    pub grades: Option<String>,

    /// Course table query
    #[arg(short = 'c', long = "courses")]
    pub courses: bool,

    /// Exam query
    #[arg(short = 'e', long = "exams")]
    pub exams: bool,

    /// Semester to query, in '<Year>-<Year>:<Semester>' form (e.g. 2016-2017:2)
    #[arg(short = 's', long, value_name = "SEMESTER")]
    pub semester: Option<String>,

    /// Username (student ID); prompted for when missing
    #[arg(short = 'u', long, env = "EAMIS_USERNAME")]
    pub username: Option<String>,

    /// Password; prompted for when missing
    #[arg(short = 'p', long, env = "EAMIS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Elect or drop courses interactively
    #[arg(long)]
    pub elect_course: bool,

    /// Portal base URL
    #[arg(long, env = "EAMIS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// File holding the electable-course list during a run
    #[arg(long, env = "EAMIS_CACHE_FILE", default_value = "elect_data.json")]
    pub cache_file: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn category_selection(&self) -> Option<CategorySelection> {
        self.grades.as_deref().map(CategorySelection::parse)
    }

    pub fn semester_selector(&self) -> Option<SemesterSelector> {
        self.semester.as_deref().and_then(SemesterSelector::parse)
    }

    pub fn has_action(&self) -> bool {
        self.grades.is_some() || self.courses || self.exams || self.elect_course
    }

    /// Validate the configuration and return errors if invalid
    pub fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            bail!(
                "Invalid base URL '{}': must start with http:// or https://",
                self.base_url
            );
        }

        if !self.has_action() {
            bail!("Nothing to do: use -g <CATEGORIES>, -c, -e or --elect-course (see --help)");
        }

        if let Some(selection) = self.category_selection() {
            if selection.is_empty() {
                bail!(
                    "Invalid course category '{}': only combinations of A, B, C, D, E are allowed",
                    self.grades.as_deref().unwrap_or_default()
                );
            }
        }

        if let Some(ref semester) = self.semester {
            if SemesterSelector::parse(semester).is_none() {
                bail!(
                    "Invalid semester '{}': must be in '<Year>-<Year>:<Semester>' form, e.g. 2016-2017:2",
                    semester
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("eamis").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_combine() {
        let config = config(&["-g", "bcd", "-c", "-e", "-s", "2016-2017:2", "-u", "1610000"]);
        assert!(config.courses && config.exams);
        assert_eq!(config.category_selection().unwrap().label(), "BCD");
        assert_eq!(config.semester_selector().unwrap().to_string(), "2016-2017:2");
        assert_eq!(config.username.as_deref(), Some("1610000"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = config(&["--elect-course"]);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.cache_file, PathBuf::from("elect_data.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_requires_an_action() {
        assert!(config(&[]).validate().is_err());
    }

    #[test]
    fn test_rejects_bad_categories() {
        assert!(config(&["-g", "xyz"]).validate().is_err());
        assert!(config(&["-g", "aXe"]).validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_semester() {
        assert!(config(&["-c", "-s", "2016-2017"]).validate().is_err());
        assert!(config(&["-c", "-s", "2016-2017:3"]).validate().is_err());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(config(&["-c", "--base-url", "eamis.nankai.edu.cn"]).validate().is_err());
    }
}
