//! # API Module
//!
//! This module provides the HTTP interface of the Canvas gateway: every
//! Canvas-backed endpoint authenticates with `institute_url` and `token`
//! query parameters and answers with the standard `CanvasResponse`
//! envelope.
//!
//! ## Endpoints Overview
//!
//! ### Course Operations
//! - `GET /courses` - List the caller's courses (filtered by enrollment state)
//! - `GET /courses/{course_id}` - Get course details
//!
//! ### Assignment Operations
//! - `GET /courses/{course_id}/assignments` - List assignments for a course
//! - `GET /courses/{course_id}/assignments/{assignment_id}` - Get assignment details
//! - `GET /missing_assignments` - Missing assignments across all active courses
//!
//! ### Module Operations
//! - `GET /courses/{course_id}/modules` - List modules for a course
//! - `GET /courses/{course_id}/modules/{module_id}/items` - List items in a module
//!
//! ### Course Content
//! - `GET /courses/{course_id}/files` - List files for a course
//! - `GET /courses/{course_id}/announcements` - List announcements for a course
//! - `GET /courses/{course_id}/grades` - Get grades for a course
//!
//! ### Study Guides
//! - `POST /generate_study_guide` - Generate a study guide for a course
//!
//! ### System Essentials
//! - `GET /` - Service description
//! - `GET /health` - Health check
//! - `GET /metrics` - Prometheus metrics

pub mod handlers;
pub mod server;

// Re-export commonly used items
pub use handlers::CanvasResponse;
pub use server::{create_app, start_server, AppState};
