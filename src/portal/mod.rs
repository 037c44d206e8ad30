mod http;

pub use http::HttpSession;

use anyhow::Result;
use async_trait::async_trait;

pub const DEFAULT_BASE_URL: &str = "http://eamis.nankai.edu.cn";

/// A fetched page: decoded body plus any `Set-Cookie` values it carried.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub body: String,
    pub set_cookies: Vec<String>,
}

#[cfg(test)]
impl Page {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            set_cookies: Vec::new(),
        }
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.set_cookies.push(cookie.into());
        self
    }
}

/// Source of portal pages that keeps session state between requests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<Page>;

    async fn post(&self, url: &str, form: &[(&str, &str)]) -> Result<Page>;

    /// Add a cookie to every following request.
    fn set_cookie(&self, name: &str, value: &str);
}

/// Portal URLs, all relative to one base.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/eams/{}", self.base, path)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn login(&self) -> String {
        self.url("login.action")
    }

    pub fn home(&self) -> String {
        self.url("home.action")
    }

    pub fn student_detail(&self) -> String {
        self.url("stdDetail!innerIndex.action?projectId=1")
    }

    pub fn grades(&self) -> String {
        self.url("myPlanCompl!innerIndex.action")
    }

    pub fn data_query(&self) -> String {
        self.url("dataQuery.action")
    }

    pub fn course_table_entry(&self, project: u8) -> String {
        self.url(&format!("courseTableForStd.action?projectId={}", project))
    }

    pub fn course_table_index(&self, project: u8) -> String {
        self.url(&format!("courseTableForStd!innerIndex.action?projectId={}", project))
    }

    pub fn course_table(&self) -> String {
        self.url("courseTableForStd!courseTable.action")
    }

    pub fn exam_index(&self) -> String {
        self.url("stdExam.action")
    }

    pub fn exam_table(&self, batch_id: &str) -> String {
        self.url(&format!("stdExam!examTable.action?examBatch.id={}", batch_id))
    }

    pub fn election_index(&self) -> String {
        self.url("stdElectCourse!innerIndex.action?projectId=1")
    }

    pub fn election_page(&self, profile_id: &str) -> String {
        self.url(&format!(
            "stdElectCourse!defaultPage.action?electionProfile.id={}",
            profile_id
        ))
    }

    pub fn election_data(&self, profile_id: &str) -> String {
        self.url(&format!("stdElectCourse!data.action?profileId={}", profile_id))
    }

    pub fn election_submit(&self, profile_id: &str) -> String {
        self.url(&format!(
            "stdElectCourse!batchOperator.action?profileId={}",
            profile_id
        ))
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Probe the portal by loading its login page.
pub async fn check_connection<F: PageFetcher + ?Sized>(fetcher: &F, endpoints: &Endpoints) -> Result<()> {
    fetcher.get(&endpoints.login()).await.map(|_| ())
}

pub async fn log_in<F: PageFetcher + ?Sized>(
    fetcher: &F,
    endpoints: &Endpoints,
    username: &str,
    password: &str,
) -> Result<()> {
    fetcher
        .post(
            &endpoints.login(),
            &[("username", username), ("password", password)],
        )
        .await
        .map(|_| ())
}

#[cfg(test)]
pub mod fake {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use super::{Page, PageFetcher};

    /// Serves canned pages by URL and records every request.
    #[derive(Default)]
    pub struct FakePortal {
        pages: HashMap<String, Page>,
        pub requests: Mutex<Vec<String>>,
        pub forms: Mutex<Vec<Vec<(String, String)>>>,
        pub cookies: Mutex<Vec<(String, String)>>,
    }

    impl FakePortal {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: impl Into<String>, page: Page) -> Self {
            self.pages.insert(url.into(), page);
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        fn serve(&self, url: &str) -> Result<Page> {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow!("no page for {}", url))
        }
    }

    #[async_trait]
    impl PageFetcher for FakePortal {
        async fn get(&self, url: &str) -> Result<Page> {
            self.serve(url)
        }

        async fn post(&self, url: &str, form: &[(&str, &str)]) -> Result<Page> {
            self.forms.lock().unwrap().push(
                form.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            );
            self.serve(url)
        }

        fn set_cookie(&self, name: &str, value: &str) {
            self.cookies
                .lock()
                .unwrap()
                .push((name.to_string(), value.to_string()));
        }
    }
}
