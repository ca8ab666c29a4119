use crate::core::projection::project_curriculum;
use crate::domain::model::{
    CourseDescriptor, CurriculumFile, CurriculumRecord, FailureKind, ItemFailure,
    RawCurriculumResponse, RunReport, StageReport, TaughtCoursesFile,
};
use crate::domain::ports::{ConfigProvider, CourseApi, Storage};
use crate::utils::error::{EtlError, Result};
use chrono::Utc;
use serde::Serialize;

pub const TAUGHT_COURSES_STAGE: &str = "taught_courses";
pub const CURRICULUMS_STAGE: &str = "curriculums";

/// 兩階段批次流程：講師 → 課程清單，課程 → 課綱。
///
/// 逐筆依序呼叫 API；單筆失敗只記錄在報告中，不中斷整批。
/// 每個階段結束時一次寫出 JSON 檔，寫檔失敗同樣記錄在報告中。
pub struct BatchOrchestrator<A: CourseApi, S: Storage, C: ConfigProvider> {
    api: A,
    storage: S,
    config: C,
}

impl<A: CourseApi, S: Storage, C: ConfigProvider> BatchOrchestrator<A, S, C> {
    pub fn new(api: A, storage: S, config: C) -> Self {
        Self {
            api,
            storage,
            config,
        }
    }

    pub async fn run(&self, profile_ids: &[String], include_curriculums: bool) -> RunReport {
        let started_at = Utc::now();
        tracing::info!("🚀 Starting run for {} profile(s)", profile_ids.len());

        let (taught, taught_report) = self
            .fetch_and_save_taught_courses(profile_ids, self.config.taught_courses_file())
            .await;

        let curriculums = if include_curriculums {
            let courses = course_descriptors(&taught);
            let (_, report) = self
                .fetch_and_save_curriculums(&courses, self.config.curriculums_file())
                .await;
            Some(report)
        } else {
            tracing::info!("⏭️ Skipping curriculum stage");
            None
        };

        RunReport {
            started_at,
            finished_at: Utc::now(),
            taught_courses: taught_report,
            curriculums,
        }
    }

    pub async fn fetch_taught_courses(
        &self,
        profile_ids: &[String],
    ) -> (TaughtCoursesFile, StageReport) {
        let mut all_taught_courses = TaughtCoursesFile::new();
        let mut report = StageReport::new(TAUGHT_COURSES_STAGE);

        for profile_id in profile_ids {
            if all_taught_courses.contains_key(profile_id) {
                tracing::debug!("Profile ID {} already fetched, ignoring duplicate", profile_id);
                continue;
            }

            tracing::info!("📡 Fetching courses for profile ID {}...", profile_id);
            match self.api.fetch_taught_courses(profile_id).await {
                Ok(data) => {
                    tracing::debug!(
                        "Profile ID {}: {} course(s) by {}",
                        profile_id,
                        data.results.len(),
                        data.instructor
                    );
                    all_taught_courses.insert(profile_id.clone(), data);
                    report.succeeded.push(profile_id.clone());
                }
                Err(e) => {
                    tracing::warn!("⚠️ Skipping profile ID {} due to an error: {}", profile_id, e);
                    report.failed.push(item_failure(profile_id, &e));
                }
            }
        }

        (all_taught_courses, report)
    }

    pub async fn fetch_and_save_taught_courses(
        &self,
        profile_ids: &[String],
        output_file: &str,
    ) -> (TaughtCoursesFile, StageReport) {
        let (all_taught_courses, mut report) = self.fetch_taught_courses(profile_ids).await;
        self.save_stage(&all_taught_courses, output_file, &mut report)
            .await;
        (all_taught_courses, report)
    }

    pub async fn fetch_curriculums(
        &self,
        courses: &[CourseDescriptor],
    ) -> (CurriculumFile, StageReport) {
        let mut all_curriculums = CurriculumFile::new();
        let mut report = StageReport::new(CURRICULUMS_STAGE);

        for course in courses {
            let Some(course_id) = course.key() else {
                let e = EtlError::MissingCourseIdError {
                    title: course.title.clone(),
                };
                tracing::warn!("⚠️ Skipping course: {}", e);
                report.failed.push(item_failure("<missing>", &e));
                continue;
            };

            if all_curriculums.contains_key(&course_id) {
                tracing::debug!("Course ID {} already fetched, ignoring duplicate", course_id);
                continue;
            }

            tracing::info!("📡 Fetching curriculum for course ID {}...", course_id);
            match self.fetch_curriculum(&course_id, course).await {
                Ok(record) => {
                    tracing::debug!(
                        "Course ID {}: {} section(s)",
                        course_id,
                        record.sections().len()
                    );
                    all_curriculums.insert(course_id.clone(), record);
                    report.succeeded.push(course_id);
                }
                Err(e) => {
                    tracing::warn!("⚠️ Skipping course ID {} due to an error: {}", course_id, e);
                    report.failed.push(item_failure(&course_id, &e));
                }
            }
        }

        (all_curriculums, report)
    }

    pub async fn fetch_and_save_curriculums(
        &self,
        courses: &[CourseDescriptor],
        output_file: &str,
    ) -> (CurriculumFile, StageReport) {
        let (all_curriculums, mut report) = self.fetch_curriculums(courses).await;
        self.save_stage(&all_curriculums, output_file, &mut report)
            .await;
        (all_curriculums, report)
    }

    async fn fetch_curriculum(
        &self,
        course_id: &str,
        course: &CourseDescriptor,
    ) -> Result<CurriculumRecord> {
        let raw_data = self
            .api
            .fetch_course_curriculum(course_id, self.config.components())
            .await?;

        if is_empty_payload(&raw_data) {
            return Err(EtlError::EmptyPayloadError {
                id: course_id.to_string(),
            });
        }

        let raw: RawCurriculumResponse = serde_json::from_value(raw_data)?;
        Ok(project_curriculum(&raw, course, &course.instructor_title))
    }

    /// 寫出報告檔，回傳完整路徑
    pub async fn save_report(&self, report: &RunReport, output_file: &str) -> Result<String> {
        self.storage
            .write_file(output_file, &to_pretty_json(report)?)
            .await?;
        Ok(self.storage.display_path(output_file))
    }

    async fn save_stage<T: Serialize>(
        &self,
        value: &T,
        output_file: &str,
        report: &mut StageReport,
    ) {
        let path = self.storage.display_path(output_file);
        report.output_file = Some(path.clone());

        let result = match to_pretty_json(value) {
            Ok(bytes) => self.storage.write_file(output_file, &bytes).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => tracing::info!("💾 {} data saved to {}", report.stage, path),
            Err(e) => {
                tracing::error!("❌ Error saving {} data to {}: {}", report.stage, path, e);
                report.save_error = Some(e.to_string());
            }
        }
    }
}

/// 把第一階段結果攤平成第二階段的輸入，並帶上各講師名稱
pub fn course_descriptors(taught: &TaughtCoursesFile) -> Vec<CourseDescriptor> {
    taught
        .values()
        .flat_map(|courses| {
            courses
                .results
                .iter()
                .map(|summary| CourseDescriptor::from_summary(summary, &courses.instructor))
        })
        .collect()
}

/// 4 格縮排的 JSON
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(buffer)
}

fn is_empty_payload(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn item_failure(id: &str, error: &EtlError) -> ItemFailure {
    let kind = match error {
        EtlError::ApiError(e) if e.is_decode() => FailureKind::Decode,
        EtlError::ApiError(_) => FailureKind::Transport,
        EtlError::HttpStatusError { .. } => FailureKind::HttpStatus,
        EtlError::EmptyPayloadError { .. } => FailureKind::EmptyPayload,
        EtlError::MissingCourseIdError { .. } => FailureKind::MissingCourseId,
        EtlError::SerializationError(_) => FailureKind::Decode,
        _ => FailureKind::Other,
    };

    ItemFailure {
        id: id.to_string(),
        kind,
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EtlConfig;
    use crate::domain::model::{CourseSummary, TaughtCourses, UNKNOWN_INSTRUCTOR};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        fail_writes: bool,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
                fail_writes: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail_writes: true,
                ..Self::new()
            }
        }

        async fn get_json(&self, path: &str) -> Option<serde_json::Value> {
            let files = self.files.lock().await;
            files
                .get(path)
                .map(|bytes| serde_json::from_slice(bytes).unwrap())
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            if self.fail_writes {
                return Err(EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only storage",
                )));
            }
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        fn display_path(&self, path: &str) -> String {
            format!("mock/{}", path)
        }
    }

    /// 以 ID 查表回應；查不到視為 HTTP 404
    #[derive(Default)]
    struct MockApi {
        taught: HashMap<String, TaughtCourses>,
        curriculums: HashMap<String, serde_json::Value>,
        calls: std::sync::Mutex<Vec<String>>,
    }

    impl MockApi {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl CourseApi for MockApi {
        async fn fetch_taught_courses(&self, profile_id: &str) -> Result<TaughtCourses> {
            self.calls.lock().unwrap().push(format!("profile:{}", profile_id));
            self.taught
                .get(profile_id)
                .cloned()
                .ok_or_else(|| EtlError::HttpStatusError {
                    status: 404,
                    url: format!("mock://users/{}", profile_id),
                })
        }

        async fn fetch_course_curriculum(
            &self,
            course_id: &str,
            components: &str,
        ) -> Result<serde_json::Value> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("course:{}:{}", course_id, components));
            self.curriculums
                .get(course_id)
                .cloned()
                .ok_or_else(|| EtlError::HttpStatusError {
                    status: 404,
                    url: format!("mock://courses/{}", course_id),
                })
        }
    }

    fn taught(instructor: &str, ids: &[u64]) -> TaughtCourses {
        TaughtCourses {
            instructor: instructor.to_string(),
            count: json!(ids.len()),
            results: ids
                .iter()
                .map(|id| CourseSummary {
                    id: Some(json!(id)),
                    title: Some(json!(format!("Course {}", id))),
                    url: Some(json!(format!("/course/{}/", id))),
                })
                .collect(),
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_failed_profile_is_skipped_and_reported() {
        let mut api = MockApi::default();
        api.taught.insert("jane".to_string(), taught("Jane Doe", &[1]));
        let storage = MockStorage::new();
        let orchestrator = BatchOrchestrator::new(api, storage.clone(), EtlConfig::default());

        let (data, report) = orchestrator
            .fetch_and_save_taught_courses(&ids(&["jane", "ghost"]), "taught.json")
            .await;

        assert_eq!(data.len(), 1);
        assert_eq!(report.succeeded, vec!["jane"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, "ghost");
        assert_eq!(report.failed[0].kind, FailureKind::HttpStatus);
        assert!(report.is_saved());

        let saved = storage.get_json("taught.json").await.unwrap();
        assert!(saved.get("jane").is_some());
        assert!(saved.get("ghost").is_none());
        assert_eq!(saved["jane"]["instructor"], "Jane Doe");
    }

    #[tokio::test]
    async fn test_duplicate_profile_ids_fetched_once() {
        let mut api = MockApi::default();
        api.taught.insert("jane".to_string(), taught("Jane Doe", &[]));
        let orchestrator = BatchOrchestrator::new(api, MockStorage::new(), EtlConfig::default());

        let (data, report) = orchestrator
            .fetch_taught_courses(&ids(&["jane", "jane"]))
            .await;

        assert_eq!(data.len(), 1);
        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(orchestrator.api.calls(), vec!["profile:jane"]);
    }

    #[tokio::test]
    async fn test_course_descriptors_carry_instructor() {
        let mut taught_file = TaughtCoursesFile::new();
        taught_file.insert("jane".to_string(), taught("Jane Doe", &[1, 2]));
        taught_file.insert("john".to_string(), taught("John Roe", &[3]));

        let courses = course_descriptors(&taught_file);

        assert_eq!(courses.len(), 3);
        assert_eq!(courses[0].id, Some(json!(1)));
        assert_eq!(courses[0].instructor_title, "Jane Doe");
        assert_eq!(courses[2].instructor_title, "John Roe");
        assert_eq!(courses[2].title, "Course 3");
    }

    #[tokio::test]
    async fn test_curriculum_stage_classifies_failures() {
        let mut api = MockApi::default();
        api.curriculums.insert(
            "1".to_string(),
            serde_json::json!({"curriculum_context": {"data": {"sections": [
                {"title": "Intro", "content_length_text": "05:00", "lecture_count": 1, "items": []}
            ]}}}),
        );
        api.curriculums.insert("2".to_string(), serde_json::json!({}));
        let storage = MockStorage::new();
        let orchestrator = BatchOrchestrator::new(api, storage.clone(), EtlConfig::default());

        let mut courses: Vec<CourseDescriptor> = course_descriptors(&{
            let mut file = TaughtCoursesFile::new();
            file.insert("jane".to_string(), taught("Jane Doe", &[1, 2, 3]));
            file
        });
        courses.push(CourseDescriptor {
            id: None,
            title: "Orphan".to_string(),
            url: String::new(),
            instructor_title: UNKNOWN_INSTRUCTOR.to_string(),
        });

        let (data, report) = orchestrator
            .fetch_and_save_curriculums(&courses, "curriculums.json")
            .await;

        assert_eq!(data.len(), 1);
        assert_eq!(report.succeeded, vec!["1"]);

        let kinds: Vec<FailureKind> = report.failed.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FailureKind::EmptyPayload,
                FailureKind::HttpStatus,
                FailureKind::MissingCourseId
            ]
        );

        let saved = storage.get_json("curriculums.json").await.unwrap();
        let sections = &saved["1"]["curriculum_context"]["data"]["sections"];
        assert_eq!(sections[0]["instructor"], "Intro");
        assert_eq!(saved["1"]["instructor"], "Jane Doe");
        assert_eq!(saved["1"]["curriculum_context"]["data"]["course_title"], "Course 1");
    }

    #[tokio::test]
    async fn test_components_from_config_are_requested() {
        let mut api = MockApi::default();
        api.curriculums
            .insert("7".to_string(), serde_json::json!({"curriculum_context": {}}));
        let config = EtlConfig {
            components: "curriculum_context,price_text".to_string(),
            ..EtlConfig::default()
        };
        let orchestrator = BatchOrchestrator::new(api, MockStorage::new(), config);

        let courses = vec![CourseDescriptor {
            id: Some(json!(7)),
            title: "Seven".to_string(),
            url: "/course/7/".to_string(),
            instructor_title: "Jane Doe".to_string(),
        }];
        let (data, _) = orchestrator.fetch_curriculums(&courses).await;

        assert!(data["7"].sections().is_empty());
        assert_eq!(
            orchestrator.api.calls(),
            vec!["course:7:curriculum_context,price_text"]
        );
    }

    #[tokio::test]
    async fn test_unexpected_field_types_do_not_drop_course() {
        let mut api = MockApi::default();
        api.curriculums.insert(
            "1".to_string(),
            json!({"curriculum_context": {"data": {"sections": [{
                "title": "Intro",
                "lecture_count": "2",
                "items": [{"object_index": 1}, {"object_index": "2a"}]
            }]}}}),
        );
        let storage = MockStorage::new();
        let orchestrator = BatchOrchestrator::new(api, storage.clone(), EtlConfig::default());
        let courses = vec![CourseDescriptor {
            id: Some(json!(1)),
            title: "One".to_string(),
            url: "/course/1/".to_string(),
            instructor_title: "Jane Doe".to_string(),
        }];

        let (data, report) = orchestrator
            .fetch_and_save_curriculums(&courses, "curriculums.json")
            .await;

        assert_eq!(data.len(), 1);
        assert_eq!(report.succeeded, vec!["1"]);
        assert!(report.failed.is_empty());

        let saved = storage.get_json("curriculums.json").await.unwrap();
        let section = &saved["1"]["curriculum_context"]["data"]["sections"][0];
        assert_eq!(section["lecture_count"], "2");
        assert_eq!(section["items"][0]["object_index"], 1);
        assert_eq!(section["items"][1]["object_index"], "2a");
    }

    #[tokio::test]
    async fn test_string_course_id_is_used_as_key() {
        let mut api = MockApi::default();
        api.curriculums.insert(
            "rust-101".to_string(),
            json!({"curriculum_context": {"data": {"sections": []}}}),
        );
        let orchestrator = BatchOrchestrator::new(api, MockStorage::new(), EtlConfig::default());
        let courses = vec![CourseDescriptor {
            id: Some(json!("rust-101")),
            title: "Rust 101".to_string(),
            url: String::new(),
            instructor_title: "Jane Doe".to_string(),
        }];

        let (data, report) = orchestrator.fetch_curriculums(&courses).await;

        assert!(data.contains_key("rust-101"));
        assert_eq!(report.succeeded, vec!["rust-101"]);
        assert_eq!(orchestrator.api.calls(), vec!["course:rust-101:curriculum_context"]);
    }

    #[tokio::test]
    async fn test_save_failure_is_recorded_not_fatal() {
        let mut api = MockApi::default();
        api.taught.insert("jane".to_string(), taught("Jane Doe", &[]));
        let orchestrator =
            BatchOrchestrator::new(api, MockStorage::failing(), EtlConfig::default());

        let report = orchestrator.run(&ids(&["jane"]), true).await;

        assert_eq!(report.taught_courses.succeeded, vec!["jane"]);
        assert!(!report.taught_courses.is_saved());
        assert!(report
            .taught_courses
            .save_error
            .as_deref()
            .unwrap()
            .contains("read-only storage"));
        let curriculums = report.curriculums.unwrap();
        assert!(curriculums.succeeded.is_empty());
        assert!(curriculums.save_error.is_some());
    }

    #[tokio::test]
    async fn test_run_without_curriculums() {
        let mut api = MockApi::default();
        api.taught.insert("jane".to_string(), taught("Jane Doe", &[1]));
        let storage = MockStorage::new();
        let orchestrator = BatchOrchestrator::new(api, storage.clone(), EtlConfig::default());

        let report = orchestrator.run(&ids(&["jane"]), false).await;

        assert!(report.curriculums.is_none());
        assert_eq!(report.total_failures(), 0);
        assert!(storage.get_json("taught_courses.json").await.is_some());
        assert!(storage.get_json("curriculums.json").await.is_none());
    }

    #[test]
    fn test_pretty_json_uses_four_space_indent() {
        let bytes = to_pretty_json(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "{\n    \"a\": 1\n}");
    }
}
