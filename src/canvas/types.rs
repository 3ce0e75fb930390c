//! Typed Canvas models used by the gateway
//!
//! Passthrough endpoints forward raw Canvas JSON untouched, so only the
//! handful of entities the gateway itself inspects are modeled here, and
//! only down to the fields it reads. Unknown fields are ignored and
//! optional fields default, mirroring how Canvas payloads vary between
//! course configurations.

use serde::{Deserialize, Serialize};

/// A Canvas course, as returned by `GET /api/v1/courses`
#[derive(Debug, Clone, Deserialize)]
pub struct Course {
    /// Canvas course ID
    pub id: i64,
    /// Course display name (absent for date-restricted enrollments)
    #[serde(default)]
    pub name: String,
}

/// A Canvas assignment with its submission, as returned by
/// `GET /api/v1/courses/{id}/assignments?include=submission`
#[derive(Debug, Clone, Deserialize)]
pub struct Assignment {
    /// Canvas assignment ID
    pub id: i64,
    /// Assignment display name
    #[serde(default)]
    pub name: String,
    /// Due date in ISO-8601, if one is set
    #[serde(default)]
    pub due_at: Option<String>,
    /// Maximum score, if the assignment is graded
    #[serde(default)]
    pub points_possible: Option<f64>,
    /// The caller's submission, present only when requested via `include`
    #[serde(default)]
    pub submission: Option<Submission>,
}

/// The submission sub-object attached to an assignment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Submission {
    /// Whether Canvas has flagged the submission as missing
    #[serde(default)]
    pub missing: bool,
}

/// One row of the missing-assignments report
#[derive(Debug, Clone, Serialize)]
pub struct MissingAssignment {
    /// Name of the course the assignment belongs to
    pub course_name: String,
    /// Canvas course ID
    pub course_id: i64,
    /// Assignment display name
    pub assignment_name: String,
    /// Canvas assignment ID
    pub assignment_id: i64,
    /// Due date in ISO-8601, if one was set
    pub due_date: Option<String>,
    /// Maximum score, if the assignment is graded
    pub points_possible: Option<f64>,
}

/// Request body for `POST /generate_study_guide`
#[derive(Debug, Clone, Deserialize)]
pub struct StudyGuideRequest {
    /// Course to build the guide for
    pub course_id: i64,
    /// Restrict the guide to specific modules
    #[serde(default)]
    pub module_ids: Option<Vec<i64>>,
    /// Free-form topic hint
    #[serde(default)]
    pub topic: Option<String>,
}

/// A generated study guide
#[derive(Debug, Clone, Serialize)]
pub struct StudyGuide {
    /// Guide title
    pub title: String,
    /// Ordered guide sections
    pub sections: Vec<StudyGuideSection>,
}

/// One section of a study guide
#[derive(Debug, Clone, Serialize)]
pub struct StudyGuideSection {
    /// Section heading
    pub title: String,
    /// Section body text
    pub content: String,
}

impl Assignment {
    /// Whether the caller's submission for this assignment is missing
    pub fn is_missing(&self) -> bool {
        self.submission.as_ref().map(|s| s.missing).unwrap_or(false)
    }
}
