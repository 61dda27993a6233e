use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Processing,
    Ready,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmsInfo {
    pub platform: String,
    pub version: String,
    pub institution_id: String,
    #[serde(default)]
    pub course_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentUpload {
    pub title: String,
    /// Base64-encoded document bytes.
    pub content: String,
    pub mime_type: String,
    pub course_id: String,
    #[serde(default)]
    pub module_id: Option<String>,
    pub lms_info: LmsInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct LmsDocument {
    pub id: String,
    pub title: String,
    pub status: DocumentStatus,
    pub upload_date: DateTime<Utc>,
    pub course_id: String,
    pub module_id: Option<String>,
    pub processed_chunks: u32,
    pub total_size_mb: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    pub document_ids: Vec<String>,
    pub student_id: String,
    pub course_id: String,
    #[serde(default)]
    pub context: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LmsAnswer {
    pub answer: String,
    pub confidence: f64,
    pub sources: Vec<String>,
    pub response_time_ms: u64,
    pub tokens_used: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentProgress {
    pub student_id: String,
    pub course_id: String,
    pub questions_asked: u32,
    pub documents_accessed: Vec<String>,
    pub last_activity: DateTime<Utc>,
    pub engagement_score: f64,
    pub topics_studied: Vec<String>,
}

impl StudentProgress {
    pub fn new(student_id: &str, course_id: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            course_id: course_id.to_string(),
            questions_asked: 0,
            documents_accessed: Vec::new(),
            last_activity: Utc::now(),
            engagement_score: 0.0,
            topics_studied: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseAnalytics {
    pub course_id: String,
    pub total_questions: u32,
    pub active_students: u32,
    pub most_accessed_documents: Vec<Value>,
    pub common_topics: Vec<Value>,
    pub average_response_time_ms: f64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiUsage {
    pub api_key: String,
    pub calls_this_month: i64,
    pub calls_limit: i64,
    pub overage_cost: f64,
    pub next_billing_date: NaiveDate,
}
