//! Study guide generation
//!
//! Currently a deterministic placeholder: the guide structure (title plus
//! fixed sections) is what a model-backed generator will fill in later.

use crate::canvas::types::{StudyGuide, StudyGuideRequest, StudyGuideSection};

/// Build the study guide for a request.
///
/// The output shape is stable; only the section content is placeholder.
// TODO: replace placeholder sections once a generation backend exists
pub fn build_study_guide(request: &StudyGuideRequest) -> StudyGuide {
    StudyGuide {
        title: format!("Study Guide for Course {}", request.course_id),
        sections: vec![
            StudyGuideSection {
                title: "Key Concepts".to_string(),
                content: "This would contain key concepts from the course.".to_string(),
            },
            StudyGuideSection {
                title: "Important Definitions".to_string(),
                content: "This would contain important definitions.".to_string(),
            },
            StudyGuideSection {
                title: "Practice Questions".to_string(),
                content: "This would contain practice questions.".to_string(),
            },
        ],
    }
}
