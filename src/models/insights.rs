//! Aggregates returned by the insights endpoints.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleHours {
    pub role_id: i64,
    pub role_name: String,
    pub total_hours: f64,
    pub total_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleHoursReport {
    pub role_hours: Vec<RoleHours>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagCount {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub color: String,
    pub session_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagDistribution {
    pub tag_distribution: Vec<TagCount>,
    pub sessions_without_tags: u64,
    pub total_sessions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourCount {
    pub hour: u32,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCount {
    pub day: String,
    pub day_number: u32,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patterns {
    pub hour_distribution: Vec<HourCount>,
    pub day_distribution: Vec<DayCount>,
}
