use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use tokio::time::timeout;

use crate::{
    cli::Command,
    config::AppConfig,
    db::{self, blacklist::BlacklistRepository},
    domain::Verdict,
    heuristics::ContentHeuristics,
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    pipeline::{ClassifyError, Classifier},
    web_content::HttpPageFetcher,
};

pub struct PhishGuardApp {
    repository: Arc<BlacklistRepository>,
    classifier: Arc<Classifier>,
    config: Arc<AppConfig>,
    shutdown: Shutdown,
}

impl PhishGuardApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let pool = db::init_pool(&paths.db_path)
            .await
            .with_context(|| format!("failed to open blacklist at {}", paths.db_path.display()))?;
        let repository = Arc::new(BlacklistRepository::new(pool));

        let http_client = Client::builder()
            .user_agent(config.fetch.user_agent.clone())
            .connect_timeout(config.fetch.timeout)
            .build()?;
        let fetcher = Arc::new(HttpPageFetcher::new(http_client, config.fetch.clone()));

        let classifier = Arc::new(Classifier::new(
            repository.clone(),
            fetcher,
            ContentHeuristics::new(&config.heuristics),
            config.fetch.timeout,
        ));

        Ok(Self {
            repository,
            classifier,
            config,
            shutdown,
        })
    }

    pub async fn run(self, command: Command) -> Result<()> {
        let result = match command {
            Command::Check { urls, json } => self.check(urls, json).await,
            Command::Block { url } => self.block(&url).await,
            Command::List { json } => self.list(json).await,
        };

        let close_timeout = Duration::from_secs(5);
        if timeout(close_timeout, self.repository.close()).await.is_err() {
            tracing::warn!(
                target: "db",
                "blacklist database did not close within {:?}",
                close_timeout
            );
        }
        result
    }

    async fn check(&self, urls: Vec<String>, json: bool) -> Result<()> {
        let total = urls.len();
        let limit = self.config.pipeline.max_concurrent_checks;
        tracing::info!(target: "cli", total, limit, "checking urls");

        let mut results = stream::iter(urls)
            .map(|url| {
                let classifier = self.classifier.clone();
                async move {
                    let outcome = classifier.classify(&url).await;
                    (url, outcome)
                }
            })
            .buffer_unordered(limit);

        let mut shutdown = self.shutdown.subscribe();
        let mut failures = 0usize;
        let mut completed = 0usize;
        let mut blocked = 0usize;
        while !shutdown.is_triggered() {
            let next = tokio::select! {
                next = results.next() => next,
                _ = shutdown.notified() => {
                    tracing::warn!(target: "cli", completed, total, "shutdown requested; abandoning remaining checks");
                    break;
                }
            };
            let Some((url, outcome)) = next else { break };
            completed += 1;

            match outcome {
                Ok(verdict) => {
                    if verdict.is_blocked() {
                        blocked += 1;
                    }
                    print_verdict(&url, &verdict, json)?;
                }
                Err(err) => {
                    failures += 1;
                    if let Some(verdict) = err.verdict() {
                        print_verdict(&url, verdict, json)?;
                    }
                    eprintln!("{url}: {}", describe_error(&err));
                    tracing::error!(target: "cli", url = %url, error = %err, "check failed");
                }
            }
        }

        tracing::info!(target: "cli", completed, blocked, failures, "checks finished");
        if completed < total {
            bail!("interrupted after {completed} of {total} checks");
        }
        if failures > 0 {
            bail!("{failures} of {total} checks failed");
        }
        Ok(())
    }

    async fn block(&self, url: &str) -> Result<()> {
        self.classifier
            .manual_block(url)
            .await
            .with_context(|| format!("failed to block {url}"))?;
        println!("The URL has been manually blocked.");
        Ok(())
    }

    async fn list(&self, json: bool) -> Result<()> {
        let entries = self.repository.list().await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }
        for entry in &entries {
            println!("{}\t{}", entry.added_at.format("%Y-%m-%d %H:%M:%S"), entry.url);
        }
        let total = self.repository.count().await?;
        println!("{total} blacklisted URL(s)");
        Ok(())
    }
}

fn print_verdict(url: &str, verdict: &Verdict, json: bool) -> Result<()> {
    if json {
        let line = serde_json::json!({ "url": url, "result": verdict });
        println!("{}", serde_json::to_string(&line)?);
    } else {
        println!("{url}: {}", describe_verdict(verdict));
    }
    Ok(())
}

pub fn describe_verdict(verdict: &Verdict) -> String {
    match verdict {
        Verdict::Blacklisted => "The URL is blacklisted and has been blocked.".to_string(),
        Verdict::Phishing(hit) => {
            format!("The URL is a possible phishing site and has been blocked ({hit}).")
        }
        Verdict::Unclassified => {
            "The URL is not blacklisted or a phishing site. Proceed with caution.".to_string()
        }
        Verdict::FetchFailed { reason } => {
            format!("The URL could not be checked ({reason}). Proceed with caution.")
        }
    }
}

fn describe_error(err: &ClassifyError) -> String {
    match err {
        ClassifyError::InvalidInput { reason, .. } => format!("not a valid URL: {reason}"),
        ClassifyError::StorageUnavailable(source) => format!("blacklist unavailable: {source}"),
        ClassifyError::Unpersisted { source, .. } => {
            format!("flagged, but the blacklist could not be updated: {source}")
        }
    }
}
