//! Audit log entries recorded by the backend

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// One audited action
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: i64,
    /// Actor; `None` for system actions
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub action_type: String,
    #[serde(default)]
    pub entity_type: String,
    #[serde(default)]
    pub entity_id: Option<i64>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub created_at: Option<NaiveDateTime>,
}

impl AuditLog {
    pub fn actor(&self) -> &str {
        self.user_email.as_deref().unwrap_or("System")
    }

    pub fn created_date(&self) -> Option<NaiveDate> {
        self.created_at.map(|dt| dt.date())
    }
}

/// Aggregates served by `/admin/audit-logs/stats`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogStats {
    #[serde(default)]
    pub total_logs: u64,
    #[serde(default)]
    pub unique_users: u64,
    #[serde(default)]
    pub today_logs: u64,
    #[serde(default)]
    pub most_common_action: Option<String>,
}

/// Server-side search parameters for `/admin/audit-logs/search`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLogQuery {
    pub user_email: Option<String>,
    pub action_type: Option<String>,
    pub entity_type: Option<String>,
    pub date: Option<NaiveDate>,
}

impl AuditLogQuery {
    /// Query string pairs for the non-empty parameters
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let mut push = |key: &'static str, value: Option<&str>| {
            if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
                params.push((key, v.to_string()));
            }
        };
        push("userEmail", self.user_email.as_deref());
        push("actionType", self.action_type.as_deref());
        push("entityType", self.entity_type.as_deref());
        if let Some(date) = self.date {
            params.push(("date", date.format("%Y-%m-%d").to_string()));
        }
        params
    }

    pub fn is_empty(&self) -> bool {
        self.to_params().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_audit_log() {
        let log: AuditLog = serde_json::from_str(
            r#"{"id": 11, "userEmail": null, "actionType": "LOGIN", "entityType": "USER",
                "entityId": 3, "ipAddress": "10.0.0.1", "createdAt": "2025-02-01T08:00:00"}"#,
        )
        .unwrap();
        assert_eq!(log.actor(), "System");
        assert_eq!(log.entity_id, Some(3));
        assert_eq!(log.created_date(), NaiveDate::from_ymd_opt(2025, 2, 1));
    }

    #[test]
    fn test_stats_defaults() {
        let stats: AuditLogStats = serde_json::from_str(r#"{"totalLogs": 42}"#).unwrap();
        assert_eq!(stats.total_logs, 42);
        assert_eq!(stats.unique_users, 0);
        assert!(stats.most_common_action.is_none());
    }

    #[test]
    fn test_query_params_skip_blank() {
        let query = AuditLogQuery {
            user_email: Some("  ".to_string()),
            action_type: Some("LOGIN".to_string()),
            entity_type: None,
            date: NaiveDate::from_ymd_opt(2025, 3, 4),
        };
        assert_eq!(
            query.to_params(),
            vec![
                ("actionType", "LOGIN".to_string()),
                ("date", "2025-03-04".to_string())
            ]
        );
        assert!(AuditLogQuery::default().is_empty());
    }
}
