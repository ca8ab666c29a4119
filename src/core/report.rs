//! 讀取已存檔的 curriculums.json，輸出章節清單、Markdown 待辦清單或 CSV。

use crate::domain::model::{value_text, CurriculumFile, Section, UNKNOWN_INSTRUCTOR};
use crate::domain::ports::Storage;
use crate::utils::duration::format_duration;
use crate::utils::error::Result;
use serde::Serialize;
use std::fmt::Write;

pub const MARKDOWN_FILE: &str = "curriculum_todo.md";
pub const SECTIONS_CSV_FILE: &str = "curriculum_sections.csv";

const DEFAULT_SECTION_LENGTH: &str = "00:00";
const SEPARATOR: &str = "---------------------";

pub async fn load_curriculum_file<S: Storage>(storage: &S, path: &str) -> Result<CurriculumFile> {
    let content = storage.read_file(path).await?;
    Ok(serde_json::from_slice(&content)?)
}

/// 依課程分組列出章節標題；沒有標題的章節略過。
pub fn render_section_listing(file: &CurriculumFile, include_course_title: bool) -> String {
    let mut output = String::new();

    for (course_id, course) in file {
        let _ = writeln!(output, "\nCourse ID: {}", course_id);
        if include_course_title {
            let _ = writeln!(output, "Course: {}", course.course_title());
        }
        let _ = writeln!(output, "{}", SEPARATOR);

        for heading in course.sections().iter().filter_map(Section::heading_text) {
            let _ = writeln!(output, "{}", heading);
        }
    }

    output
}

pub fn render_markdown_checklist(file: &CurriculumFile) -> String {
    let mut output = String::from("# 📌 Course Progress Tracker\n\n");
    output.push_str("**Track your progress easily with this TODO list.**\n\n");
    output.push_str("---\n\n");

    for (course_id, course) in file {
        let _ = writeln!(output, "## 🎯 {}", course.course_title());
        let _ = writeln!(output, "**Course ID:** `{}`\n", course_id);
        output.push_str("### Sections\n");

        for section in course.sections() {
            let heading = section
                .heading_text()
                .unwrap_or_else(|| UNKNOWN_INSTRUCTOR.to_string());
            let _ = writeln!(
                output,
                "- [ ] **{}** ({})",
                heading,
                section_duration(section)
            );
        }

        output.push_str("\n---\n\n");
    }

    output
}

fn section_duration(section: &Section) -> String {
    let length = section
        .length_text()
        .unwrap_or_else(|| DEFAULT_SECTION_LENGTH.to_string());
    format_duration(&length)
}

#[derive(Debug, Serialize)]
struct SectionRow<'a> {
    course_id: &'a str,
    course_title: &'a str,
    section: String,
    lecture_count: String,
    duration: String,
}

pub fn render_section_csv(file: &CurriculumFile) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for (course_id, course) in file {
        for section in course.sections() {
            writer.serialize(SectionRow {
                course_id,
                course_title: course.course_title(),
                section: section.heading_text().unwrap_or_default(),
                lecture_count: value_text(&section.lecture_count),
                duration: section_duration(section),
            })?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| crate::utils::error::EtlError::IoError(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
