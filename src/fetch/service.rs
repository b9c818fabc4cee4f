//! Fetch service seam and background dispatch.
//!
//! [`ResilientFetcher`] is the crate's door to the executor. It admits one
//! fetch at a time; the device never has a reason to run two, and the legacy
//! hardware cannot afford to. [`FetchSubscription`] runs a fetch on a
//! background task and hands the single terminal result to whoever is still
//! listening; a subscriber that went away just means the result is dropped.

use super::executor;
use super::types::FetchRequest;
use crate::error::FetchResult;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};

/// Object-safe fetch seam; lets callers substitute a canned implementation.
pub trait FetchService: Send + Sync {
    fn fetch(
        &self,
        request: FetchRequest,
    ) -> Pin<Box<dyn Future<Output = FetchResult> + Send + '_>>;
}

/// Default implementation running the secure-then-fallback executor.
#[derive(Default)]
pub struct ResilientFetcher {
    // Held across the whole two-attempt sequence: one fetch in flight.
    in_flight: Mutex<()>,
}

impl ResilientFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl FetchService for ResilientFetcher {
    fn fetch(
        &self,
        request: FetchRequest,
    ) -> Pin<Box<dyn Future<Output = FetchResult> + Send + '_>> {
        Box::pin(async move {
            let _guard = self.in_flight.lock().await;
            executor::fetch(&request).await
        })
    }
}

/// A fetch running on a background task, with single-consumer delivery.
///
/// Replaces the weak back-reference the device UI used: when the subscription
/// is dropped before the fetch finishes, the result is silently discarded;
/// [`cancel`](Self::cancel) aborts the task outright, and teardown of any open
/// connection happens as the task's state unwinds.
pub struct FetchSubscription {
    rx: oneshot::Receiver<FetchResult>,
    task: tokio::task::JoinHandle<()>,
}

impl FetchSubscription {
    pub fn spawn(service: Arc<dyn FetchService>, request: FetchRequest) -> Self {
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let outcome = service.fetch(request).await;
            if tx.send(outcome).is_err() {
                tracing::debug!("fetch completed after its subscriber went away, discarding result");
            }
        });
        Self { rx, task }
    }

    /// Waits for the terminal result. `None` means the fetch task was
    /// cancelled before it could deliver.
    pub async fn recv(self) -> Option<FetchResult> {
        self.rx.await.ok()
    }

    /// Aborts the in-flight fetch.
    pub fn cancel(self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    struct CannedFetchService {
        body: String,
    }

    impl FetchService for CannedFetchService {
        fn fetch(
            &self,
            _request: FetchRequest,
        ) -> Pin<Box<dyn Future<Output = FetchResult> + Send + '_>> {
            let body = self.body.clone();
            Box::pin(async move { Ok(body) })
        }
    }

    struct StalledFetchService;

    impl FetchService for StalledFetchService {
        fn fetch(
            &self,
            _request: FetchRequest,
        ) -> Pin<Box<dyn Future<Output = FetchResult> + Send + '_>> {
            Box::pin(async move {
                tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                Err(FetchError::Read("unreachable".to_string()))
            })
        }
    }

    #[tokio::test]
    async fn subscription_delivers_the_result() {
        let service: Arc<dyn FetchService> = Arc::new(CannedFetchService {
            body: "{\"ok\":true}".to_string(),
        });

        let sub = FetchSubscription::spawn(service, FetchRequest::get("https://example.com/api"));
        let outcome = sub.recv().await.expect("task should deliver");
        assert_eq!(outcome.unwrap(), "{\"ok\":true}");
    }

    #[tokio::test]
    async fn cancelled_subscription_yields_nothing() {
        let service: Arc<dyn FetchService> = Arc::new(StalledFetchService);

        let sub = FetchSubscription::spawn(service, FetchRequest::get("https://example.com/api"));
        sub.cancel();
        // Nothing to assert beyond "no panic": the aborted task must not
        // deliver or leak. Give the runtime a tick to reap it.
        tokio::task::yield_now().await;
    }

    #[tokio::test]
    async fn dropped_subscriber_discards_the_result() {
        let service: Arc<dyn FetchService> = Arc::new(CannedFetchService {
            body: "late".to_string(),
        });

        let sub = FetchSubscription::spawn(service, FetchRequest::get("https://example.com/api"));
        let task = sub.task;
        drop(sub.rx);
        // The task side must complete cleanly even with no receiver.
        task.await.unwrap();
    }

    /// Serves one connection, delaying the reply by `delay`.
    async fn one_shot_server(delay: std::time::Duration, body: &str) -> std::net::SocketAddr {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                tokio::time::sleep(delay).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn fetches_run_one_at_a_time() {
        // A slow fetch is started first; a fast one right behind it must not
        // complete until the slow one has released the in-flight guard, so
        // the completion order is slow-then-fast.
        let slow_addr = one_shot_server(std::time::Duration::from_millis(250), "slow").await;
        let fast_addr = one_shot_server(std::time::Duration::ZERO, "fast").await;

        let fetcher = ResilientFetcher::arc();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let slow = {
            let fetcher = fetcher.clone();
            let order = order.clone();
            async move {
                let body = fetcher
                    .fetch(FetchRequest::get(format!("http://{}/api", slow_addr)))
                    .await
                    .unwrap();
                order.lock().unwrap().push(body);
            }
        };
        let fast = {
            let fetcher = fetcher.clone();
            let order = order.clone();
            async move {
                let body = fetcher
                    .fetch(FetchRequest::get(format!("http://{}/api", fast_addr)))
                    .await
                    .unwrap();
                order.lock().unwrap().push(body);
            }
        };

        tokio::join!(slow, fast);
        assert_eq!(*order.lock().unwrap(), vec!["slow", "fast"]);
    }
}
