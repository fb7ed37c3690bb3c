//! Timing hooks applied around every executor call.
//!
//! The pool carries an `Arc<dyn QueryObserver>`; [`TracingObserver`] is the default and
//! [`NoopObserver`] turns timing off without touching call sites.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::PgMiddlewareError;

/// Receives one event per completed helper call.
pub trait QueryObserver: Send + Sync {
    /// `label` is the SQL text (or a short description for composite calls).
    fn on_complete(&self, label: &str, elapsed: Duration, error: Option<&PgMiddlewareError>);
}

/// Emits one `info` event per call; failures add an `error` field.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl QueryObserver for TracingObserver {
    fn on_complete(&self, label: &str, elapsed: Duration, error: Option<&PgMiddlewareError>) {
        match error {
            None => tracing::info!(sql = %label, ?elapsed, "executed query"),
            Some(err) => tracing::info!(sql = %label, ?elapsed, error = %err, "query failed"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl QueryObserver for NoopObserver {
    fn on_complete(&self, _label: &str, _elapsed: Duration, _error: Option<&PgMiddlewareError>) {}
}

/// Await `fut` and report its wall-clock duration to `observer`, success or failure.
pub async fn timed<T, F>(
    observer: &dyn QueryObserver,
    label: &str,
    fut: F,
) -> Result<T, PgMiddlewareError>
where
    F: Future<Output = Result<T, PgMiddlewareError>>,
{
    let start = Instant::now();
    let result = fut.await;
    observer.on_complete(label, start.elapsed(), result.as_ref().err());
    result
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<(String, bool)>>,
    }

    impl QueryObserver for Recording {
        fn on_complete(&self, label: &str, _elapsed: Duration, error: Option<&PgMiddlewareError>) {
            self.events
                .lock()
                .unwrap()
                .push((label.to_string(), error.is_some()));
        }
    }

    #[tokio::test]
    async fn reports_success_and_failure() {
        let obs = Recording::default();

        let ok = timed(&obs, "SELECT 1", async { Ok::<_, PgMiddlewareError>(1) }).await;
        assert_eq!(ok.unwrap(), 1);

        let err = timed(&obs, "SELECT broken", async {
            Err::<(), _>(PgMiddlewareError::NoRows)
        })
        .await;
        assert!(matches!(err, Err(PgMiddlewareError::NoRows)));

        let events = obs.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                ("SELECT 1".to_string(), false),
                ("SELECT broken".to_string(), true)
            ]
        );
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn tracing_observer_logs_one_info_line_per_call() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            TracingObserver.on_complete("SELECT 1", Duration::from_millis(3), None);
            TracingObserver.on_complete(
                "SELECT broken",
                Duration::from_millis(4),
                Some(&PgMiddlewareError::NoRows),
            );
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2, "{output}");
        assert!(lines.iter().all(|l| l.contains(" INFO ")), "{output}");
        assert!(lines[0].contains("executed query") && lines[0].contains("SELECT 1"));
        assert!(lines[1].contains("query failed") && lines[1].contains("error="));
    }

    #[tokio::test]
    async fn noop_passes_result_through() {
        let out = timed(&NoopObserver, "x", async { Ok::<_, PgMiddlewareError>("v") }).await;
        assert_eq!(out.unwrap(), "v");
    }
}
