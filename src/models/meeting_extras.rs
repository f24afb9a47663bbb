//! Meeting satellite records: versions, links, permissions, participants,
//! action items, and templates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::UserSummary;

// ==================== VERSIONS ====================

/// Immutable content snapshot of a meeting. Version numbers increase
/// monotonically per meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingVersion {
    pub id: String,
    pub meeting_id: String,
    pub content: Value,
    pub version: i64,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<String>,
    pub created_at: String,
}

/// Request body for snapshotting a meeting's content.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVersionRequest {
    pub content: Value,
    #[serde(default)]
    pub description: Option<String>,
}

// ==================== LINKS ====================

/// Directed edge between two meetings, unique per ordered pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingLink {
    pub id: String,
    pub source_meeting_id: String,
    pub target_meeting_id: String,
    pub created_at: String,
}

/// One endpoint of a link as shown to the client: the link id plus the
/// meeting on the other side of the edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkEndpoint {
    pub id: String,
    pub meeting_id: String,
    pub title: String,
}

/// Outbound and inbound edges of a meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingLinks {
    pub outbound: Vec<LinkEndpoint>,
    pub inbound: Vec<LinkEndpoint>,
}

/// Request body for linking a meeting to another.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    pub target_meeting_id: String,
}

// ==================== PERMISSIONS ====================

/// Access level granted on a meeting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    Read,
    Write,
    Admin,
}

impl PermissionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Read => "read",
            PermissionLevel::Write => "write",
            PermissionLevel::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "read" => Some(PermissionLevel::Read),
            "write" => Some(PermissionLevel::Write),
            "admin" => Some(PermissionLevel::Admin),
            _ => None,
        }
    }
}

/// A flat grant: user-or-team x meeting x level. No inheritance is
/// computed server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingPermission {
    pub id: String,
    pub meeting_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    pub permission: PermissionLevel,
    pub created_at: String,
}

/// Request body for granting access to a meeting. At least one of
/// `userId` / `teamId` must be present.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPermissionRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    pub permission: PermissionLevel,
}

// ==================== PARTICIPANTS ====================

/// Role of a user in a meeting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Host,
    Participant,
    Viewer,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Host => "host",
            ParticipantRole::Participant => "participant",
            ParticipantRole::Viewer => "viewer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "host" => Some(ParticipantRole::Host),
            "participant" => Some(ParticipantRole::Participant),
            "viewer" => Some(ParticipantRole::Viewer),
            _ => None,
        }
    }
}

/// A user attached to a meeting, unique per (meeting, user).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingParticipant {
    pub id: String,
    pub meeting_id: String,
    pub user_id: String,
    pub role: ParticipantRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

/// Request body for adding a participant.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddParticipantRequest {
    pub user_id: String,
    #[serde(default)]
    pub role: Option<ParticipantRole>,
}

// ==================== ACTION ITEMS ====================

/// A task derived from a meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub id: String,
    pub meeting_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub created_at: String,
}

/// Request body for creating an action item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActionItemRequest {
    pub description: String,
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Request body for updating an action item. Completing stamps
/// `completedAt`; un-completing clears it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActionItemRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

// ==================== TEMPLATES ====================

/// Reusable starting content for new meetings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub content: Value,
    pub is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: String,
}

/// Request body for creating a template.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    pub name: String,
    pub content: Value,
    #[serde(default)]
    pub is_default: Option<bool>,
}

/// Request body for updating a template.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub is_default: Option<bool>,
}
