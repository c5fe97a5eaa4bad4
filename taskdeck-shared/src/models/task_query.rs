/// Task query engine: filtered, paginated listing of one owner's tasks
///
/// A [`TaskQuery`] turns the listing parameters into two statements that share
/// the same `WHERE` clause:
///
/// 1. a row fetch ordered newest first with `LIMIT`/`OFFSET`
/// 2. a `COUNT(*)` used for `total` and `total_pages`
///
/// The owner filter is always the first predicate, so no combination of
/// status and search can reach another user's rows.
///
/// Pages past the end return an empty list; there is no clamping.
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::task_query::TaskQuery;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let query = TaskQuery::from_params(42, Some("completed"), Some("report"), Some(2), Some(10))?;
/// let page = query.execute(&pool).await?;
/// println!("{} of {} tasks", page.tasks.len(), page.total);
/// # Ok(())
/// # }
/// ```

use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::task::{Task, TaskStatus, UnknownStatus, TASK_COLUMNS};

/// Page used when none is given
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when none is given
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest accepted page size
pub const MAX_LIMIT: i64 = 100;

/// Rejected listing parameters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("page must be at least 1")]
    InvalidPage,

    #[error("limit must be between 1 and {}", MAX_LIMIT)]
    InvalidLimit,

    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),
}

/// Status filter; `All` applies no predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl StatusFilter {
    /// Parses a query-string value; missing, empty, and `all` mean no filter
    pub fn parse(value: Option<&str>) -> Result<Self, UnknownStatus> {
        match value {
            None | Some("") | Some("all") => Ok(StatusFilter::All),
            Some(other) => Ok(StatusFilter::Only(other.parse()?)),
        }
    }
}

/// One page of tasks plus totals
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

/// `ceil(total / limit)`; zero when there is nothing to show
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

/// Escapes `LIKE` metacharacters so the search term matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Validated listing parameters for a single owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    owner_id: i64,
    status: StatusFilter,
    search: Option<String>,
    page: i64,
    limit: i64,
}

impl TaskQuery {
    /// Unfiltered first page for `owner_id`
    pub fn new(owner_id: i64) -> Self {
        Self {
            owner_id,
            status: StatusFilter::All,
            search: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Builds a query from raw request parameters, applying defaults
    ///
    /// # Errors
    ///
    /// - `QueryError::UnknownStatus` for a status other than `todo`,
    ///   `completed`, or `all`
    /// - `QueryError::InvalidPage` for `page < 1`
    /// - `QueryError::InvalidLimit` for `limit` outside `1..=MAX_LIMIT`
    pub fn from_params(
        owner_id: i64,
        status: Option<&str>,
        search: Option<&str>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Self, QueryError> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        if page < 1 {
            return Err(QueryError::InvalidPage);
        }

        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(QueryError::InvalidLimit);
        }

        Ok(Self {
            owner_id,
            status: StatusFilter::parse(status)?,
            search: search.filter(|s| !s.is_empty()).map(str::to_owned),
            page,
            limit,
        })
    }

    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Rows skipped before this page; `None` when it does not fit in an `i64`
    pub fn offset(&self) -> Option<i64> {
        (self.page - 1).checked_mul(self.limit)
    }

    fn push_filters(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        qb.push(" WHERE user_id = ").push_bind(self.owner_id);

        if let StatusFilter::Only(status) = self.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }

        if let Some(search) = &self.search {
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    /// Filtered, ordered, paginated row fetch
    pub fn rows_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM tasks", TASK_COLUMNS));
        self.push_filters(&mut qb);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(self.limit)
            .push(" OFFSET ")
            .push_bind(self.offset().unwrap_or(i64::MAX));
        qb
    }

    /// Same filters, no pagination
    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM tasks");
        self.push_filters(&mut qb);
        qb
    }

    /// Runs both statements and assembles the page
    ///
    /// A page whose offset overflows is past the end by definition, so only
    /// the count runs.
    pub async fn execute(&self, pool: &PgPool) -> Result<TaskPage, sqlx::Error> {
        let tasks = match self.offset() {
            Some(_) => {
                self.rows_query()
                    .build_query_as::<Task>()
                    .fetch_all(pool)
                    .await?
            }
            None => Vec::new(),
        };

        let total: i64 = self
            .count_query()
            .build_query_scalar()
            .fetch_one(pool)
            .await?;

        debug!(
            owner_id = self.owner_id,
            page = self.page,
            returned = tasks.len(),
            total,
            "Listed tasks"
        );

        Ok(TaskPage {
            tasks,
            total,
            page: self.page,
            total_pages: total_pages(total, self.limit),
        })
    }
}
