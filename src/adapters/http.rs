use crate::core::projection::project_taught_courses;
use crate::domain::model::{RawTaughtCourses, TaughtCourses};
use crate::domain::ports::{ConfigProvider, CourseApi};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.udemy.com";
pub const DEFAULT_COMPONENTS: &str = "curriculum_context";

/// 以 reqwest 實作的課程 API 客戶端。每次請求都帶固定的標頭組。
pub struct HttpCourseApi {
    client: Client,
    base_url: Url,
}

impl HttpCourseApi {
    pub fn new(
        base_url: &str,
        timeout_seconds: Option<u64>,
        extra_headers: &HashMap<String, String>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| EtlError::InvalidConfigValueError {
            field: "source.base_url".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        let mut builder = Client::builder().default_headers(build_headers(extra_headers)?);

        // 未設定時不限制等待時間
        if let Some(timeout) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(
            config.base_url(),
            config.timeout_seconds(),
            config.extra_headers(),
        )
    }

    pub fn taught_courses_url(&self, profile_id: &str) -> Result<Url> {
        let mut url = self.endpoint(&["users", profile_id, "taught-profile-courses", ""])?;
        url.set_query(Some("learn_url"));
        Ok(url)
    }

    pub fn curriculum_url(&self, course_id: &str, components: &str) -> Result<Url> {
        let mut url =
            self.endpoint(&["course-landing-components", course_id, "me", ""])?;
        url.query_pairs_mut().append_pair("components", components);
        Ok(url)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| EtlError::InvalidConfigValueError {
                field: "source.base_url".to_string(),
                value: self.base_url.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            })?
            .pop_if_empty()
            .push("api-2.0")
            .extend(segments);
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<serde_json::Value> {
        tracing::debug!("📡 GET {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        tracing::debug!("📡 API response status: {}", status);

        if !status.is_success() {
            return Err(EtlError::HttpStatusError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json().await?)
    }
}

fn build_headers(extra_headers: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert("x-udemy-cache-device", HeaderValue::from_static("None"));
    headers.insert("x-udemy-cache-language", HeaderValue::from_static("en"));

    for (key, value) in extra_headers {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            EtlError::InvalidConfigValueError {
                field: "source.headers".to_string(),
                value: key.clone(),
                reason: format!("Invalid header name: {}", e),
            }
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| EtlError::InvalidConfigValueError {
            field: format!("source.headers.{}", key),
            value: value.clone(),
            reason: format!("Invalid header value: {}", e),
        })?;
        headers.insert(name, value);
    }

    Ok(headers)
}

#[async_trait]
impl CourseApi for HttpCourseApi {
    async fn fetch_taught_courses(&self, profile_id: &str) -> Result<TaughtCourses> {
        let url = self.taught_courses_url(profile_id)?;
        let raw: RawTaughtCourses = serde_json::from_value(self.get_json(url).await?)?;
        Ok(project_taught_courses(&raw))
    }

    async fn fetch_course_curriculum(
        &self,
        course_id: &str,
        components: &str,
    ) -> Result<serde_json::Value> {
        let url = self.curriculum_url(course_id, components)?;
        self.get_json(url).await
    }
}
