//! 把 API 原始回應投影成固定、精簡的輸出格式。
//!
//! 所有函式都是純函式：不做 I/O，缺漏的欄位以 sentinel 值補上，
//! 章節與單元的順序與輸入一致。葉節點的值不檢查型別，原樣帶到輸出。

use crate::domain::model::{
    empty_text, missing_index, missing_item_type, missing_learn_url, value_text, zero,
    CourseDescriptor, CourseSummary, CurriculumContext, CurriculumData, CurriculumRecord, Item,
    RawCourse, RawCurriculumResponse, RawItem, RawSection, RawTaughtCourses, Section,
    TaughtCourses, UNKNOWN_INSTRUCTOR,
};
use serde_json::Value;

/// 講師名稱取自第一門課的第一位可見講師
pub fn project_taught_courses(raw: &RawTaughtCourses) -> TaughtCourses {
    let results = raw.results.as_deref().unwrap_or_default();

    let instructor = results
        .first()
        .and_then(|course| course.visible_instructors.as_deref())
        .and_then(|instructors| instructors.first())
        .and_then(|instructor| instructor.title.as_ref())
        .map(value_text)
        .unwrap_or_else(|| UNKNOWN_INSTRUCTOR.to_string());

    TaughtCourses {
        instructor,
        count: or_default(&raw.count, zero),
        results: results.iter().map(project_course).collect(),
    }
}

fn project_course(course: &RawCourse) -> CourseSummary {
    CourseSummary {
        id: course.id.clone(),
        title: course.title.clone(),
        url: course.url.clone(),
    }
}

pub fn project_curriculum(
    raw: &RawCurriculumResponse,
    course_info: &CourseDescriptor,
    instructor_title: &str,
) -> CurriculumRecord {
    let data = raw
        .curriculum_context
        .as_ref()
        .and_then(|context| context.data.as_ref());

    let sections = data
        .and_then(|data| data.sections.as_deref())
        .unwrap_or_default()
        .iter()
        .map(project_section)
        .collect();

    CurriculumRecord {
        instructor: instructor_title.to_string(),
        curriculum_context: CurriculumContext {
            data: CurriculumData {
                sections,
                estimated_content_length_text: data
                    .and_then(|data| data.estimated_content_length_text.clone())
                    .unwrap_or_else(empty_text),
                num_of_published_lectures: data
                    .and_then(|data| data.num_of_published_lectures.clone())
                    .unwrap_or_else(zero),
                course_title: Some(course_info.title.clone()),
                course_url: Some(course_info.url.clone()),
            },
        },
    }
}

fn project_section(section: &RawSection) -> Section {
    Section {
        heading: Some(or_default(&section.title, empty_text)),
        content_length_text: Some(or_default(&section.content_length_text, empty_text)),
        lecture_count: or_default(&section.lecture_count, missing_index),
        items: section
            .items
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(project_item)
            .collect(),
    }
}

fn project_item(item: &RawItem) -> Item {
    Item {
        title: or_default(&item.title, empty_text),
        content_summary: or_default(&item.content_summary, empty_text),
        learn_url: or_default(&item.learn_url, missing_learn_url),
        object_index: or_default(&item.object_index, missing_index),
        item_type: or_default(&item.item_type, missing_item_type),
    }
}

fn or_default(value: &Option<Value>, default: fn() -> Value) -> Value {
    value.clone().unwrap_or_else(default)
}
