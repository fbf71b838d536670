//! Store-side metrics.
//!
//! Query latency per named statement, time spent waiting on a form's row
//! lock, and connection pool gauges.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::{Duration, Instant};

/// Histogram of statement latency, labelled by statement name.
pub const QUERY_DURATION: &str = "database_query_duration_seconds";

/// Histogram of time spent acquiring `SELECT ... FOR UPDATE` on a form.
pub const FORM_LOCK_WAIT: &str = "form_lock_wait_seconds";

pub fn record_query_duration(query: &'static str, elapsed: Duration) {
    histogram!(QUERY_DURATION, "query" => query).record(elapsed.as_secs_f64());
}

/// Contention on a single form shows up here before it shows up as
/// request latency.
pub fn record_lock_wait(elapsed: Duration) {
    histogram!(FORM_LOCK_WAIT).record(elapsed.as_secs_f64());
}

/// Called from the readiness probe.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("database_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times one named statement.
///
/// ```ignore
/// let timer = QueryTimer::new("find_form_by_id");
/// let row = sqlx::query_as::<_, FormEntity>(sql).fetch_optional(&pool).await;
/// timer.record();
/// ```
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn record(self) {
        record_query_duration(self.query, self.start.elapsed());
    }
}
