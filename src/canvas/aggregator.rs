//! Cross-course aggregation
//!
//! The missing-assignments view fans out over every active course, pulls
//! assignments with their submission attached, and keeps the ones Canvas
//! has flagged as missing. A course whose assignment fetch fails is
//! skipped rather than failing the whole report.

use crate::canvas::client::CanvasClient;
use crate::canvas::types::{Assignment, Course, MissingAssignment};
use crate::core::error::CanvasError;
use tracing::warn;

/// Collect every missing assignment across the caller's active courses.
///
/// Failing to list courses aborts the report; failing to fetch one
/// course's assignments only drops that course from it.
pub async fn collect_missing_assignments(
    client: &CanvasClient,
    institute_url: &str,
    token: &str,
) -> Result<Vec<MissingAssignment>, CanvasError> {
    let courses = client.list_courses(institute_url, token, "active").await?;

    let mut missing = Vec::new();
    for course in &courses {
        let assignments = match client
            .course_assignments_with_submissions(institute_url, token, course.id)
            .await
        {
            Ok(assignments) => assignments,
            Err(e) => {
                warn!(
                    "Skipping course {} ({}) in missing-assignments report: {}",
                    course.id, course.name, e
                );
                continue;
            }
        };

        missing.extend(missing_from_course(course, assignments));
    }

    Ok(missing)
}

/// Filter one course's assignments down to the missing ones, carrying the
/// course context each row needs to stand alone.
fn missing_from_course(course: &Course, assignments: Vec<Assignment>) -> Vec<MissingAssignment> {
    assignments
        .into_iter()
        .filter(Assignment::is_missing)
        .map(|a| MissingAssignment {
            course_name: course.name.clone(),
            course_id: course.id,
            assignment_name: a.name,
            assignment_id: a.id,
            due_date: a.due_at,
            points_possible: a.points_possible,
        })
        .collect()
}
