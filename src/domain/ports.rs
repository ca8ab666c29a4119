use crate::domain::model::TaughtCourses;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 對使用者顯示的完整路徑
    fn display_path(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn components(&self) -> &str;
    fn timeout_seconds(&self) -> Option<u64>;
    fn extra_headers(&self) -> &HashMap<String, String>;
    fn output_path(&self) -> &str;
    fn taught_courses_file(&self) -> &str;
    fn curriculums_file(&self) -> &str;
}

/// 課程平台 API 的唯讀操作
#[async_trait]
pub trait CourseApi: Send + Sync {
    async fn fetch_taught_courses(&self, profile_id: &str) -> Result<TaughtCourses>;

    /// 回傳未經投影的原始 JSON
    async fn fetch_course_curriculum(
        &self,
        course_id: &str,
        components: &str,
    ) -> Result<serde_json::Value>;
}
