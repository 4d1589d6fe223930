use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::time::timeout;
use url::Url;

use crate::{
    db::{BlacklistStore, StorageError},
    domain::Verdict,
    heuristics::ContentHeuristics,
    web_content::{FetchError, PageFetcher},
};

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("invalid url `{url}`: {reason}")]
    InvalidInput { url: String, reason: String },
    #[error(transparent)]
    StorageUnavailable(#[from] StorageError),
    /// The page was judged phishing but the blacklist write failed.
    #[error("verdict `{}` could not be persisted: {source}", .verdict.label())]
    Unpersisted {
        verdict: Verdict,
        #[source]
        source: StorageError,
    },
}

impl ClassifyError {
    /// The verdict reached before the failure, if any.
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            Self::Unpersisted { verdict, .. } => Some(verdict),
            _ => None,
        }
    }
}

/// Blacklist lookup, page fetch, heuristics and blacklist update for one URL at a time.
pub struct Classifier {
    store: Arc<dyn BlacklistStore>,
    fetcher: Arc<dyn PageFetcher>,
    heuristics: ContentHeuristics,
    fetch_timeout: Duration,
}

impl Classifier {
    pub fn new(
        store: Arc<dyn BlacklistStore>,
        fetcher: Arc<dyn PageFetcher>,
        heuristics: ContentHeuristics,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            store,
            fetcher,
            heuristics,
            fetch_timeout,
        }
    }

    pub async fn classify(&self, url: &str) -> Result<Verdict, ClassifyError> {
        validate_url(url)?;

        if self.store.contains(url).await? {
            tracing::info!(target: "pipeline", url, "url is blacklisted");
            return Ok(Verdict::Blacklisted);
        }

        let fetched = match timeout(self.fetch_timeout, self.fetcher.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
        };
        let metadata = match fetched {
            Ok(metadata) => metadata,
            Err(err) => {
                tracing::warn!(target: "pipeline", url, error = %err, "page fetch failed");
                return Ok(Verdict::FetchFailed {
                    reason: err.to_string(),
                });
            }
        };

        let Some(hit) = self.heuristics.evaluate(url, &metadata) else {
            tracing::info!(target: "pipeline", url, "no phishing signature found");
            return Ok(Verdict::Unclassified);
        };

        tracing::warn!(target: "pipeline", url, reason = %hit, "phishing signature matched");
        let verdict = Verdict::Phishing(hit);
        if let Err(source) = self.store.insert(url).await {
            tracing::error!(target: "pipeline", url, error = %source, "failed to blacklist phishing url");
            return Err(ClassifyError::Unpersisted { verdict, source });
        }
        Ok(verdict)
    }

    /// Adds the URL to the blacklist without looking at it.
    pub async fn manual_block(&self, url: &str) -> Result<(), ClassifyError> {
        validate_url(url)?;
        self.store.insert(url).await?;
        tracing::info!(target: "pipeline", url, "url manually blocked");
        Ok(())
    }
}

fn validate_url(url: &str) -> Result<(), ClassifyError> {
    if url.trim().is_empty() {
        return Err(ClassifyError::InvalidInput {
            url: url.to_string(),
            reason: "url is empty".to_string(),
        });
    }
    Url::parse(url).map_err(|err| ClassifyError::InvalidInput {
        url: url.to_string(),
        reason: err.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        collections::{HashMap, HashSet},
        sync::atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::{
        config::HeuristicsConfig,
        domain::{FieldKind, FormDescriptor, HeuristicMatch, PageMetadata},
    };

    #[derive(Default)]
    struct MemoryStore {
        urls: Mutex<HashSet<String>>,
        fail_reads: bool,
        fail_writes: bool,
    }

    impl MemoryStore {
        fn has(&self, url: &str) -> bool {
            self.urls.lock().contains(url)
        }
    }

    #[async_trait]
    impl BlacklistStore for MemoryStore {
        async fn contains(&self, url: &str) -> Result<bool, StorageError> {
            if self.fail_reads {
                return Err(StorageError::Unavailable(sqlx::Error::PoolClosed));
            }
            Ok(self.has(url))
        }

        async fn insert(&self, url: &str) -> Result<bool, StorageError> {
            if self.fail_writes {
                return Err(StorageError::Unavailable(sqlx::Error::PoolClosed));
            }
            Ok(self.urls.lock().insert(url.to_string()))
        }
    }

    enum Page {
        Ok(PageMetadata),
        Unreachable,
        Hang,
    }

    #[derive(Default)]
    struct FakeFetcher {
        pages: HashMap<String, Page>,
        calls: AtomicUsize,
    }

    impl FakeFetcher {
        fn with(mut self, url: &str, page: Page) -> Self {
            self.pages.insert(url.to_string(), page);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<PageMetadata, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.pages.get(url) {
                Some(Page::Ok(meta)) => Ok(meta.clone()),
                Some(Page::Hang) => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(PageMetadata::default())
                }
                Some(Page::Unreachable) | None => Err(FetchError::Status(
                    reqwest::StatusCode::SERVICE_UNAVAILABLE,
                )),
            }
        }
    }

    fn classifier(store: Arc<MemoryStore>, fetcher: Arc<FakeFetcher>) -> Classifier {
        Classifier::new(
            store,
            fetcher,
            ContentHeuristics::new(&HeuristicsConfig::default()),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn manually_blocked_url_is_blacklisted_without_fetch() {
        let store = Arc::new(MemoryStore::default());
        let fetcher = Arc::new(FakeFetcher::default());
        let classifier = classifier(store.clone(), fetcher.clone());

        classifier.manual_block("http://example.com").await.unwrap();
        let verdict = classifier.classify("http://example.com").await.unwrap();

        assert_eq!(verdict, Verdict::Blacklisted);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn brand_title_is_phishing_and_stored() {
        let url = "http://fake-facebook-login.com";
        let store = Arc::new(MemoryStore::default());
        let fetcher = Arc::new(FakeFetcher::default().with(
            url,
            Page::Ok(PageMetadata::new("Facebook — Log In", vec![])),
        ));
        let classifier = classifier(store.clone(), fetcher.clone());

        let verdict = classifier.classify(url).await.unwrap();
        assert_eq!(
            verdict,
            Verdict::Phishing(HeuristicMatch::BrandTitle {
                brand: "Facebook".to_string()
            })
        );
        assert!(store.has(url));

        let second = classifier.classify(url).await.unwrap();
        assert_eq!(second, Verdict::Blacklisted);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn credential_form_is_phishing() {
        let url = "http://login.test";
        let form = FormDescriptor::from_kinds([FieldKind::Text, FieldKind::Password]);
        let store = Arc::new(MemoryStore::default());
        let fetcher =
            Arc::new(FakeFetcher::default().with(url, Page::Ok(PageMetadata::new("", vec![form]))));
        let classifier = classifier(store.clone(), fetcher);

        let verdict = classifier.classify(url).await.unwrap();
        assert_eq!(
            verdict,
            Verdict::Phishing(HeuristicMatch::CredentialForm { form_index: 0 })
        );
        assert!(store.has(url));
    }

    #[tokio::test]
    async fn plain_page_is_unclassified_and_not_stored() {
        let url = "http://example.com";
        let store = Arc::new(MemoryStore::default());
        let fetcher = Arc::new(
            FakeFetcher::default().with(url, Page::Ok(PageMetadata::new("Example Domain", vec![]))),
        );
        let classifier = classifier(store.clone(), fetcher);

        assert_eq!(classifier.classify(url).await.unwrap(), Verdict::Unclassified);
        assert!(!store.has(url));
    }

    #[tokio::test]
    async fn unreachable_page_is_fetch_failed_and_not_stored() {
        let url = "http://unreachable.test";
        let store = Arc::new(MemoryStore::default());
        let fetcher = Arc::new(FakeFetcher::default().with(url, Page::Unreachable));
        let classifier = classifier(store.clone(), fetcher);

        let verdict = classifier.classify(url).await.unwrap();
        assert!(matches!(verdict, Verdict::FetchFailed { .. }));
        assert!(!store.has(url));
    }

    #[tokio::test]
    async fn slow_page_times_out_as_fetch_failed() {
        let url = "http://slow.test";
        let store = Arc::new(MemoryStore::default());
        let fetcher = Arc::new(FakeFetcher::default().with(url, Page::Hang));
        let classifier = classifier(store.clone(), fetcher);

        let verdict = classifier.classify(url).await.unwrap();
        match verdict {
            Verdict::FetchFailed { reason } => assert!(reason.contains("no response")),
            other => panic!("unexpected verdict {other:?}"),
        }
        assert!(!store.has(url));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_io() {
        let store = Arc::new(MemoryStore {
            fail_reads: true,
            fail_writes: true,
            ..MemoryStore::default()
        });
        let fetcher = Arc::new(FakeFetcher::default());
        let classifier = classifier(store, fetcher.clone());

        for url in ["", "   ", "not a url"] {
            assert!(matches!(
                classifier.classify(url).await,
                Err(ClassifyError::InvalidInput { .. })
            ));
            assert!(matches!(
                classifier.manual_block(url).await,
                Err(ClassifyError::InvalidInput { .. })
            ));
        }
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn storage_failure_is_not_treated_as_clean() {
        let store = Arc::new(MemoryStore {
            fail_reads: true,
            ..MemoryStore::default()
        });
        let fetcher = Arc::new(FakeFetcher::default());
        let classifier = classifier(store, fetcher.clone());

        let err = classifier.classify("http://example.com").await.unwrap_err();
        assert!(matches!(err, ClassifyError::StorageUnavailable(_)));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn failed_insert_still_reports_phishing() {
        let url = "http://fake-twitter.test";
        let store = Arc::new(MemoryStore {
            fail_writes: true,
            ..MemoryStore::default()
        });
        let fetcher = Arc::new(
            FakeFetcher::default().with(url, Page::Ok(PageMetadata::new("Twitter", vec![]))),
        );
        let classifier = classifier(store, fetcher);

        let err = classifier.classify(url).await.unwrap_err();
        assert!(matches!(err, ClassifyError::Unpersisted { .. }));
        assert!(matches!(err.verdict(), Some(Verdict::Phishing(_))));
    }

    #[tokio::test]
    async fn concurrent_classifications_share_one_store() {
        let store = Arc::new(MemoryStore::default());
        let mut fetcher = FakeFetcher::default();
        for i in 0..10 {
            let title = if i % 2 == 0 { "LinkedIn" } else { "Weather" };
            fetcher = fetcher.with(
                &format!("http://site-{i}.test"),
                Page::Ok(PageMetadata::new(title, vec![])),
            );
        }
        let classifier = Arc::new(classifier(store.clone(), Arc::new(fetcher)));

        let verdicts = futures::future::join_all((0..10).map(|i| {
            let classifier = classifier.clone();
            async move { classifier.classify(&format!("http://site-{i}.test")).await }
        }))
        .await;

        let blocked = verdicts
            .into_iter()
            .map(Result::unwrap)
            .filter(Verdict::is_blocked)
            .count();
        assert_eq!(blocked, 5);
        assert_eq!(store.urls.lock().len(), 5);
    }
}
