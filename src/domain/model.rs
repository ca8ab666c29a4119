use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UNKNOWN_INSTRUCTOR: &str = "Unknown Instructor";
pub const UNKNOWN_COURSE: &str = "Unknown Course";

// 欄位缺漏時使用的 sentinel 值
pub const MISSING_LEARN_URL: &str = "ERROR404";
pub const MISSING_ITEM_TYPE: &str = "ERROR400";
pub const MISSING_INDEX: i64 = -1;

// ---------------------------------------------------------------------------
// API 原始回應：缺漏或 null 一律視為 None。
// 葉節點欄位不限型別，來源給什麼就保留什麼；只有巢狀結構本身有型別要求。
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTaughtCourses {
    pub count: Option<Value>,
    pub results: Option<Vec<RawCourse>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCourse {
    pub id: Option<Value>,
    pub title: Option<Value>,
    pub url: Option<Value>,
    pub visible_instructors: Option<Vec<RawInstructor>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInstructor {
    pub title: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCurriculumResponse {
    pub curriculum_context: Option<RawCurriculumContext>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCurriculumContext {
    pub data: Option<RawCurriculumData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCurriculumData {
    pub sections: Option<Vec<RawSection>>,
    pub estimated_content_length_text: Option<Value>,
    pub num_of_published_lectures: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSection {
    pub title: Option<Value>,
    pub content_length_text: Option<Value>,
    pub lecture_count: Option<Value>,
    pub items: Option<Vec<RawItem>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawItem {
    pub title: Option<Value>,
    pub content_summary: Option<Value>,
    pub learn_url: Option<Value>,
    pub object_index: Option<Value>,
    pub item_type: Option<Value>,
}

// ---------------------------------------------------------------------------
// 投影後的輸出格式（寫入 taught_courses.json / curriculums.json）
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSummary {
    pub id: Option<Value>,
    pub title: Option<Value>,
    pub url: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaughtCourses {
    pub instructor: String,
    pub count: Value,
    pub results: Vec<CourseSummary>,
}

/// 第二階段的輸入：課程摘要加上所屬講師名稱
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseDescriptor {
    pub id: Option<Value>,
    pub title: String,
    pub url: String,
    pub instructor_title: String,
}

impl CourseDescriptor {
    pub fn from_summary(summary: &CourseSummary, instructor_title: &str) -> Self {
        Self {
            id: summary.id.clone(),
            title: summary.title.as_ref().map(value_text).unwrap_or_default(),
            url: summary.url.as_ref().map(value_text).unwrap_or_default(),
            instructor_title: instructor_title.to_string(),
        }
    }

    /// 作為 curriculums.json 鍵值的課程 ID
    pub fn key(&self) -> Option<String> {
        self.id.as_ref().map(value_text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurriculumRecord {
    #[serde(default = "unknown_instructor")]
    pub instructor: String,
    #[serde(default)]
    pub curriculum_context: CurriculumContext,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurriculumContext {
    #[serde(default)]
    pub data: CurriculumData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumData {
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default = "empty_text")]
    pub estimated_content_length_text: Value,
    #[serde(default = "zero")]
    pub num_of_published_lectures: Value,
    #[serde(default)]
    pub course_title: Option<String>,
    #[serde(default)]
    pub course_url: Option<String>,
}

impl Default for CurriculumData {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
            estimated_content_length_text: empty_text(),
            num_of_published_lectures: zero(),
            course_title: None,
            course_url: None,
        }
    }
}

/// 課程章節。`heading` 是章節標題，為了與既有輸出檔相容，序列化欄位名稱為 `instructor`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// 投影時一定會填入；保持可選是因為讀取的存檔可能缺少此鍵，報表的預設值依此判斷。
    #[serde(
        rename = "instructor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub heading: Option<Value>,
    /// 同上，缺少時報表以 `00:00` 代替。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length_text: Option<Value>,
    #[serde(default = "missing_index")]
    pub lecture_count: Value,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Section {
    pub fn heading_text(&self) -> Option<String> {
        self.heading.as_ref().map(value_text)
    }

    pub fn length_text(&self) -> Option<String> {
        self.content_length_text.as_ref().map(value_text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default = "empty_text")]
    pub title: Value,
    #[serde(default = "empty_text")]
    pub content_summary: Value,
    #[serde(default = "missing_learn_url")]
    pub learn_url: Value,
    #[serde(default = "missing_index")]
    pub object_index: Value,
    #[serde(default = "missing_item_type")]
    pub item_type: Value,
}

impl CurriculumRecord {
    pub fn course_title(&self) -> &str {
        self.curriculum_context
            .data
            .course_title
            .as_deref()
            .unwrap_or(UNKNOWN_COURSE)
    }

    pub fn sections(&self) -> &[Section] {
        &self.curriculum_context.data.sections
    }
}

/// 字串原樣取出，其他型別以 JSON 文字表示
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn unknown_instructor() -> String {
    UNKNOWN_INSTRUCTOR.to_string()
}

pub(crate) fn empty_text() -> Value {
    Value::from("")
}

pub(crate) fn zero() -> Value {
    Value::from(0)
}

pub(crate) fn missing_learn_url() -> Value {
    Value::from(MISSING_LEARN_URL)
}

pub(crate) fn missing_item_type() -> Value {
    Value::from(MISSING_ITEM_TYPE)
}

pub(crate) fn missing_index() -> Value {
    Value::from(MISSING_INDEX)
}

/// profile ID → 講授課程，保留輸入順序
pub type TaughtCoursesFile = IndexMap<String, TaughtCourses>;

/// course ID → 課綱，保留輸入順序
pub type CurriculumFile = IndexMap<String, CurriculumRecord>;

// ---------------------------------------------------------------------------
// 執行報告
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    HttpStatus,
    EmptyPayload,
    MissingCourseId,
    Decode,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub id: String,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: String,
    pub succeeded: Vec<String>,
    pub failed: Vec<ItemFailure>,
    pub output_file: Option<String>,
    pub save_error: Option<String>,
}

impl StageReport {
    pub fn new(stage: &str) -> Self {
        Self {
            stage: stage.to_string(),
            ..Default::default()
        }
    }

    pub fn is_saved(&self) -> bool {
        self.output_file.is_some() && self.save_error.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub taught_courses: StageReport,
    pub curriculums: Option<StageReport>,
}

impl RunReport {
    pub fn total_failures(&self) -> usize {
        self.taught_courses.failed.len()
            + self
                .curriculums
                .as_ref()
                .map(|stage| stage.failed.len())
                .unwrap_or(0)
    }
}
