//! Task query translation: filter parameters -> typed predicate + page bounds.
//!
//! This module lives in `core` (zero internal deps, no I/O) so the
//! repository layer executes exactly what is validated here and the
//! translation is unit-testable without a database.
//!
//! Filter semantics:
//!
//! - The legacy `completed` flag restricts on completion state alone and,
//!   when present, suppresses the named filter's date-window logic entirely.
//! - Named filters combine completion state with a due-date window computed
//!   for "today" in a reference time zone. No per-user zone is stored; the
//!   zone is injected by the caller (from configuration) so a per-user
//!   setting can be slotted in later without touching the algorithm.
//! - A due-date disjunction (`upcoming`) and a search disjunction (title OR
//!   notes) are independent conjuncts of the predicate: both groups must
//!   hold on their own.

use chrono::{Duration, LocalResult, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Default page size for task listing.
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Maximum page size for task listing.
pub const MAX_PAGE_SIZE: i64 = 200;

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Priority column type matching SMALLINT in the database.
pub type PriorityId = i16;

/// Task priority. Discriminants match the stored SMALLINT values and the
/// wire format (1/2/3).
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Priority {
    /// Return the database priority ID.
    pub fn id(self) -> PriorityId {
        self as PriorityId
    }
}

impl From<Priority> for PriorityId {
    fn from(value: Priority) -> Self {
        value as PriorityId
    }
}

impl TryFrom<PriorityId> for Priority {
    type Error = CoreError;

    fn try_from(value: PriorityId) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Low),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::High),
            other => Err(CoreError::Validation(format!(
                "Invalid priority: {other} (expected 1-3)"
            ))),
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i16(self.id())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = PriorityId::deserialize(deserializer)?;
        Priority::try_from(value).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Named filters
// ---------------------------------------------------------------------------

/// A predefined task-view preset combining completion state and a due-date
/// window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedFilter {
    Today,
    Upcoming,
    Past,
    Completed,
}

impl NamedFilter {
    /// All known named filters.
    pub const ALL: [NamedFilter; 4] = [
        NamedFilter::Today,
        NamedFilter::Upcoming,
        NamedFilter::Past,
        NamedFilter::Completed,
    ];

    /// The wire name of this filter.
    pub fn as_str(self) -> &'static str {
        match self {
            NamedFilter::Today => "today",
            NamedFilter::Upcoming => "upcoming",
            NamedFilter::Past => "past",
            NamedFilter::Completed => "completed",
        }
    }

    fn parse(name: &str) -> Option<NamedFilter> {
        match name {
            "today" => Some(NamedFilter::Today),
            "upcoming" => Some(NamedFilter::Upcoming),
            "past" => Some(NamedFilter::Past),
            "completed" => Some(NamedFilter::Completed),
            _ => None,
        }
    }
}

/// The set of named filters a deployment accepts.
///
/// Whether `past` (and the rest) are part of the contract varies by
/// deployment, so the set is configuration rather than a hardcoded
/// enumeration. `completed` is always enabled.
#[derive(Debug, Clone)]
pub struct EnabledFilters(Vec<NamedFilter>);

impl EnabledFilters {
    /// All four named filters (the default).
    pub fn all() -> Self {
        Self(NamedFilter::ALL.to_vec())
    }

    /// Parse a comma-separated list, e.g. `"today,upcoming,completed"`.
    ///
    /// Unknown names are rejected; `completed` is added if missing.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let mut filters = Vec::new();
        for name in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let filter = NamedFilter::parse(name).ok_or_else(|| {
                CoreError::Validation(format!("Unknown task filter: {name}"))
            })?;
            if !filters.contains(&filter) {
                filters.push(filter);
            }
        }
        if !filters.contains(&NamedFilter::Completed) {
            filters.push(NamedFilter::Completed);
        }
        Ok(Self(filters))
    }

    pub fn contains(&self, filter: NamedFilter) -> bool {
        self.0.contains(&filter)
    }
}

impl Default for EnabledFilters {
    fn default() -> Self {
        Self::all()
    }
}

// ---------------------------------------------------------------------------
// Filter parameters (wire format)
// ---------------------------------------------------------------------------

/// Query parameters for `GET /tasks`.
///
/// All fields are optional. The owner id comes from the authentication
/// layer and is deliberately not part of this struct.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListParams {
    pub project_id: Option<DbId>,
    /// Legacy completion flag. Takes precedence over `filter` when present.
    pub completed: Option<bool>,
    pub filter: Option<NamedFilter>,
    pub priority: Option<Priority>,
    /// Free-text search over title and notes.
    pub q: Option<String>,
    /// 1-based page number.
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

// ---------------------------------------------------------------------------
// Day window
// ---------------------------------------------------------------------------

/// Inclusive start/end instants of "today" in the reference zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Resolve local midnight for `date`, stepping past any DST gap.
fn local_day_start(tz: Tz, date: chrono::NaiveDate) -> chrono::DateTime<Tz> {
    let mut candidate = date.and_time(NaiveTime::MIN);
    // A DST transition can make midnight nonexistent in some zones; step
    // forward until the local time resolves (gaps are bounded).
    loop {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(instant) => return instant,
            LocalResult::Ambiguous(earliest, _) => return earliest,
            LocalResult::None => candidate += Duration::minutes(15),
        }
    }
}

/// Compute today's inclusive [start, end] window for `now` in `tz`.
///
/// The end bound is the last representable microsecond of the local day
/// (timestamptz resolution), so a due date exactly at either bound falls
/// inside the window. Local-day length is honoured across DST transitions.
pub fn day_window(now: Timestamp, tz: Tz) -> DayWindow {
    let today = now.with_timezone(&tz).date_naive();
    let tomorrow = today.succ_opt().expect("calendar overflow");

    let start = local_day_start(tz, today).with_timezone(&Utc);
    let end = local_day_start(tz, tomorrow).with_timezone(&Utc) - Duration::microseconds(1);

    DayWindow { start, end }
}

// ---------------------------------------------------------------------------
// Predicate
// ---------------------------------------------------------------------------

/// Completion-state constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionClause {
    Complete,
    Incomplete,
}

/// Due-date constraint. `AfterOrUnset` is a disjunction group: the due date
/// is strictly after the instant OR the task has no due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueClause {
    Within(DayWindow),
    Before(Timestamp),
    AfterOrUnset(Timestamp),
}

/// The conjunction of typed clauses a task must satisfy.
///
/// Every predicate restricts to `owner_id`. The due-date clause and the
/// search clause are separate conjuncts, so when both carry a disjunction
/// each group must hold on its own (AND of two ORs, never one flattened
/// OR-group).
#[derive(Debug, Clone, PartialEq)]
pub struct TaskPredicate {
    pub owner_id: DbId,
    pub project_id: Option<DbId>,
    pub completion: Option<CompletionClause>,
    pub due: Option<DueClause>,
    pub priority: Option<PriorityId>,
    /// LIKE-escaped substring matched case-insensitively against title OR
    /// notes.
    pub search: Option<String>,
}

/// Validated pagination bounds (1-based page).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    pub page: i64,
    pub page_size: i64,
}

impl PageBounds {
    /// Validate raw page / pageSize values, applying defaults.
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Result<Self, CoreError> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page < 1 {
            return Err(CoreError::Validation(format!(
                "page must be >= 1, got {page}"
            )));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(CoreError::Validation(format!(
                "pageSize must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }

        Ok(Self { page, page_size })
    }

    /// Rows to skip before the page window.
    pub fn offset(self) -> i64 {
        (self.page - 1) * self.page_size
    }

    /// Maximum rows in the page window.
    pub fn limit(self) -> i64 {
        self.page_size
    }
}

/// Escape LIKE/ILIKE metacharacters so user text matches literally.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Translate filter parameters into a typed predicate plus page bounds.
///
/// `owner_id` comes from the verified session, never from the caller.
/// `now` and `tz` pin the "today" window; `enabled` is the deployment's
/// accepted named-filter set.
pub fn translate(
    owner_id: DbId,
    params: &TaskListParams,
    now: Timestamp,
    tz: Tz,
    enabled: &EnabledFilters,
) -> Result<(TaskPredicate, PageBounds), CoreError> {
    let bounds = PageBounds::new(params.page, params.page_size)?;

    let mut predicate = TaskPredicate {
        owner_id,
        project_id: params.project_id,
        completion: None,
        due: None,
        priority: params.priority.map(Priority::id),
        search: None,
    };

    match params.completed {
        // The legacy flag wins outright; any named filter is ignored.
        Some(true) => predicate.completion = Some(CompletionClause::Complete),
        Some(false) => predicate.completion = Some(CompletionClause::Incomplete),
        None => {
            if let Some(filter) = params.filter {
                if !enabled.contains(filter) {
                    return Err(CoreError::Validation(format!(
                        "Task filter not enabled: {}",
                        filter.as_str()
                    )));
                }
                match filter {
                    NamedFilter::Completed => {
                        predicate.completion = Some(CompletionClause::Complete);
                    }
                    NamedFilter::Today => {
                        predicate.completion = Some(CompletionClause::Incomplete);
                        predicate.due = Some(DueClause::Within(day_window(now, tz)));
                    }
                    NamedFilter::Upcoming => {
                        predicate.completion = Some(CompletionClause::Incomplete);
                        predicate.due = Some(DueClause::AfterOrUnset(day_window(now, tz).end));
                    }
                    NamedFilter::Past => {
                        predicate.completion = Some(CompletionClause::Incomplete);
                        predicate.due = Some(DueClause::Before(day_window(now, tz).start));
                    }
                }
            }
        }
    }

    if let Some(q) = params.q.as_deref() {
        let trimmed = q.trim();
        if !trimmed.is_empty() {
            predicate.search = Some(escape_like(trimmed));
        }
    }

    Ok((predicate, bounds))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
