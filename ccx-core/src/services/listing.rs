//! Filter, sort and paginate pipeline for the admin list views
//!
//! Every active filter must match (logical AND). Sorting is by creation
//! time; records without a timestamp always go last. Pages are 1-indexed.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::domain::{AuditLog, Role, Transaction, TransactionStatus, TransactionType, UserSummary};

/// Page size of the user list
pub const DEFAULT_USERS_PER_PAGE: usize = 10;
/// Page size of the transaction list
pub const DEFAULT_TRANSACTIONS_PER_PAGE: usize = 15;
/// Page size of the audit log list
pub const DEFAULT_LOGS_PER_PAGE: usize = 20;

/// Requested page (1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl PageRequest {
    /// `per_page` is clamped to at least 1
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page,
            per_page: per_page.max(1),
        }
    }

    pub fn first(per_page: usize) -> Self {
        Self::new(1, per_page)
    }
}

/// One page of a filtered listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// 1-based position of the first item shown, 0 when the page is empty
    pub fn first_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.page - 1) * self.per_page + 1
        }
    }

    /// 1-based position of the last item shown, 0 when the page is empty
    pub fn last_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            self.first_index() + self.items.len() - 1
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub fn total_pages(total_items: usize, per_page: usize) -> usize {
    total_items.div_ceil(per_page.max(1))
}

/// Slice one page out of `items`
///
/// Returns `min(per_page, remaining)` items for pages within range and an
/// empty page for page 0 or pages past the end.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let per_page = request.per_page.max(1);
    let total_items = items.len();
    let total_pages = total_pages(total_items, per_page);

    let page_items = if request.page == 0 || request.page > total_pages {
        Vec::new()
    } else {
        let start = (request.page - 1) * per_page;
        items.into_iter().skip(start).take(per_page).collect()
    };

    Page {
        items: page_items,
        page: request.page,
        per_page,
        total_items,
        total_pages,
    }
}

/// Sort direction by creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Newest first
    #[default]
    Desc,
    Asc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "desc" | "newest" => Some(SortOrder::Desc),
            "asc" | "oldest" => Some(SortOrder::Asc),
            _ => None,
        }
    }
}

/// Sort in place by a timestamp key, undated records last
pub fn sort_by_created<T, F>(items: &mut [T], order: SortOrder, key: F)
where
    F: Fn(&T) -> Option<NaiveDateTime>,
{
    items.sort_by(|a, b| match (key(a), key(b)) {
        (Some(x), Some(y)) => match order {
            SortOrder::Desc => y.cmp(&x),
            SortOrder::Asc => x.cmp(&y),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Case-insensitive substring match against any of the candidates
fn matches_term(term: &str, candidates: &[Option<&str>]) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    candidates
        .iter()
        .flatten()
        .any(|c| c.to_lowercase().contains(&needle))
}

fn matches_date(filter: Option<NaiveDate>, created: Option<NaiveDate>) -> bool {
    match filter {
        Some(day) => created == Some(day),
        None => true,
    }
}

/// Filters for the transaction list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Matches reference, user name and user e-mail
    pub search: Option<String>,
    pub tx_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    pub date: Option<NaiveDate>,
}

impl TransactionFilter {
    pub fn is_active(&self) -> bool {
        self.search.as_deref().is_some_and(|s| !s.trim().is_empty())
            || self.tx_type.is_some()
            || self.status.is_some()
            || self.date.is_some()
    }

    pub fn matches(
        &self,
        tx: &Transaction,
        user_name: Option<&str>,
        user_email: Option<&str>,
    ) -> bool {
        if let Some(term) = &self.search {
            if !matches_term(
                term,
                &[tx.transaction_ref.as_deref(), user_name, user_email],
            ) {
                return false;
            }
        }
        if let Some(t) = &self.tx_type {
            if &tx.tx_type != t {
                return false;
            }
        }
        if let Some(s) = &self.status {
            if &tx.status != s {
                return false;
            }
        }
        matches_date(self.date, tx.created_date())
    }
}

/// Filters for the user list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Matches full name, e-mail and phone number
    pub search: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
    /// Admin accounts are hidden unless set
    pub include_admins: bool,
}

impl UserFilter {
    pub fn matches(&self, user: &UserSummary) -> bool {
        if user.role == Role::Admin && !self.include_admins {
            return false;
        }
        if let Some(term) = &self.search {
            if !matches_term(
                term,
                &[
                    user.full_name.as_deref(),
                    Some(user.email.as_str()),
                    user.phone_number.as_deref(),
                ],
            ) {
                return false;
            }
        }
        if let Some(role) = self.role {
            if user.role != role {
                return false;
            }
        }
        match self.active {
            Some(active) => user.is_active == active,
            None => true,
        }
    }
}

/// Filters for the audit log list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLogFilter {
    /// Matches actor e-mail, action type, entity type and IP address
    pub search: Option<String>,
    pub action_type: Option<String>,
    pub entity_type: Option<String>,
    pub date: Option<NaiveDate>,
}

impl AuditLogFilter {
    pub fn matches(&self, log: &AuditLog) -> bool {
        if let Some(term) = &self.search {
            if !matches_term(
                term,
                &[
                    log.user_email.as_deref(),
                    Some(log.action_type.as_str()),
                    Some(log.entity_type.as_str()),
                    log.ip_address.as_deref(),
                ],
            ) {
                return false;
            }
        }
        if let Some(action) = &self.action_type {
            if &log.action_type != action {
                return false;
            }
        }
        if let Some(entity) = &self.entity_type {
            if &log.entity_type != entity {
                return false;
            }
        }
        matches_date(self.date, log.created_date())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConversionDirection, Currency};

    fn tx(id: i64, reference: &str, tx_type: &str, status: &str, created: Option<&str>) -> Transaction {
        let created = created.map(|c| format!(r#""{}""#, c)).unwrap_or_else(|| "null".into());
        serde_json::from_str(&format!(
            r#"{{"id": {}, "transactionRef": "{}", "type": "{}", "status": "{}", "createdAt": {}}}"#,
            id, reference, tx_type, status, created
        ))
        .unwrap()
    }

    #[test]
    fn test_paginate_in_range() {
        let items: Vec<i32> = (1..=57).collect();
        let page = paginate(items.clone(), PageRequest::new(2, 20));
        assert_eq!(page.items.len(), 20);
        assert_eq!(page.items[0], 21);
        assert_eq!(page.total_pages, 3);
        assert_eq!((page.first_index(), page.last_index()), (21, 40));

        let last = paginate(items, PageRequest::new(3, 20));
        assert_eq!(last.items.len(), 17);
        assert_eq!(last.last_index(), 57);
        assert!(!last.has_next());
        assert!(last.has_previous());
    }

    #[test]
    fn test_paginate_out_of_range() {
        let items: Vec<i32> = (1..=5).collect();
        assert!(paginate(items.clone(), PageRequest::new(0, 2)).is_empty());
        assert!(paginate(items.clone(), PageRequest::new(4, 2)).is_empty());
        let empty = paginate(Vec::<i32>::new(), PageRequest::first(10));
        assert_eq!(empty.total_pages, 0);
        assert_eq!(empty.first_index(), 0);
    }

    #[test]
    fn test_paginate_every_page_size() {
        for total in 0..30usize {
            for per_page in 1..8usize {
                let items: Vec<usize> = (0..total).collect();
                let pages = total_pages(total, per_page);
                for page in 0..=pages + 1 {
                    let got = paginate(items.clone(), PageRequest::new(page, per_page));
                    let expected = if page == 0 || page > pages {
                        0
                    } else {
                        per_page.min(total - (page - 1) * per_page)
                    };
                    assert_eq!(got.items.len(), expected, "total={} per_page={} page={}", total, per_page, page);
                }
            }
        }
    }

    #[test]
    fn test_per_page_clamped() {
        assert_eq!(PageRequest::new(1, 0).per_page, 1);
    }

    #[test]
    fn test_sort_undated_last() {
        let mut txs = vec![
            tx(1, "A", "MAD_TO_RWF", "COMPLETED", Some("2025-01-01T10:00:00")),
            tx(2, "B", "MAD_TO_RWF", "COMPLETED", None),
            tx(3, "C", "MAD_TO_RWF", "COMPLETED", Some("2025-01-03T10:00:00")),
        ];
        sort_by_created(&mut txs, SortOrder::Desc, |t| t.created_at);
        assert_eq!(txs.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 1, 2]);

        sort_by_created(&mut txs, SortOrder::Asc, |t| t.created_at);
        assert_eq!(txs.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3, 2]);
    }

    #[test]
    fn test_transaction_filters_compose_as_and() {
        let t = tx(1, "TX-ABC", "MAD_TO_RWF", "COMPLETED", Some("2025-01-15T10:30:00"));
        let day = NaiveDate::from_ymd_opt(2025, 1, 15);

        let by_all = TransactionFilter {
            search: Some("abc".to_string()),
            tx_type: Some(TransactionType::Conversion(ConversionDirection::MadToRwf)),
            status: Some(TransactionStatus::Completed),
            date: day,
        };
        assert!(by_all.matches(&t, None, None));

        let wrong_date = TransactionFilter {
            date: NaiveDate::from_ymd_opt(2025, 1, 16),
            ..by_all.clone()
        };
        assert!(!wrong_date.matches(&t, None, None));

        let wrong_type = TransactionFilter {
            tx_type: Some(TransactionType::Deposit(Currency::MAD)),
            ..by_all.clone()
        };
        assert!(!wrong_type.matches(&t, None, None));

        let by_email = TransactionFilter {
            search: Some("SARA@".to_string()),
            ..Default::default()
        };
        assert!(by_email.matches(&t, Some("Sara"), Some("sara@bank.ma")));
        assert!(!by_email.matches(&t, Some("Unknown"), Some("N/A")));
        assert!(!TransactionFilter::default().is_active());
        assert!(by_email.is_active());
    }

    #[test]
    fn test_user_filter_hides_admins() {
        let admin: UserSummary = serde_json::from_str::<crate::domain::User>(
            r#"{"id": 1, "email": "root@bank.ma", "role": "ADMIN", "isActive": true}"#,
        )
        .unwrap()
        .into();
        let user: UserSummary = serde_json::from_str::<crate::domain::User>(
            r#"{"id": 2, "email": "sara@bank.ma", "phoneNumber": "0611", "role": "USER", "isActive": false}"#,
        )
        .unwrap()
        .into();

        let default = UserFilter::default();
        assert!(!default.matches(&admin));
        assert!(default.matches(&user));

        let with_admins = UserFilter {
            include_admins: true,
            ..Default::default()
        };
        assert!(with_admins.matches(&admin));

        let active_only = UserFilter {
            active: Some(true),
            ..Default::default()
        };
        assert!(!active_only.matches(&user));

        let by_phone = UserFilter {
            search: Some("0611".to_string()),
            ..Default::default()
        };
        assert!(by_phone.matches(&user));
    }

    #[test]
    fn test_audit_log_filter() {
        let log: AuditLog = serde_json::from_str(
            r#"{"id": 1, "userEmail": "sara@bank.ma", "actionType": "LOGIN", "entityType": "USER",
                "ipAddress": "192.168.1.4", "createdAt": "2025-01-15T10:00:00"}"#,
        )
        .unwrap();

        let by_ip = AuditLogFilter {
            search: Some("192.168".to_string()),
            ..Default::default()
        };
        assert!(by_ip.matches(&log));

        let mismatched = AuditLogFilter {
            search: Some("192.168".to_string()),
            action_type: Some("LOGOUT".to_string()),
            ..Default::default()
        };
        assert!(!mismatched.matches(&log));

        let by_date = AuditLogFilter {
            date: NaiveDate::from_ymd_opt(2025, 1, 15),
            entity_type: Some("USER".to_string()),
            ..Default::default()
        };
        assert!(by_date.matches(&log));
    }
}
