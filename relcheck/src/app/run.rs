//! Release verification run

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::app::options::{ArtifactSource, DeployOptions, DownloadOptions};
use crate::artifacts::download::BlobDownloader;
use crate::artifacts::locator::ArtifactLocator;
use crate::deploy::integration::IntegrationTestRunner;
use crate::deploy::pipeline::DeploymentPipeline;
use crate::deploy::reaper::ResourceReaper;
use crate::deploy::runner::ProcessRunner;
use crate::errors::VerifyError;
use crate::http::ci_api::CiApi;
use crate::settings::Settings;

/// Fetches a release artifact from CI, deploys it, tests it and tears it down
pub struct Verifier<C: CiApi + ?Sized, R: ProcessRunner + ?Sized> {
    locator: ArtifactLocator<C>,
    downloader: BlobDownloader<C>,
    pipeline: DeploymentPipeline,
    tests: IntegrationTestRunner,
    reaper: ResourceReaper,
    runner: Arc<R>,
}

impl<C: CiApi + ?Sized, R: ProcessRunner + ?Sized> Verifier<C, R> {
    pub fn new(settings: &Settings, ci: Arc<C>, runner: Arc<R>) -> Result<Self, VerifyError> {
        Ok(Self {
            locator: ArtifactLocator::new(ci.clone(), settings.github.per_page),
            downloader: BlobDownloader::new(ci)?,
            pipeline: DeploymentPipeline::new(&settings.deploy),
            tests: IntegrationTestRunner::new(&settings.deploy),
            reaper: ResourceReaper,
            runner,
        })
    }

    /// Deploy and test, then always delete the environment unless
    /// `skip_cleanup` is set.
    ///
    /// `shutdown_signal` interrupts the deploy and test steps; cleanup still
    /// runs afterwards. When both the run and the cleanup fail, the run's
    /// error is returned and the cleanup failure is logged.
    pub async fn run(
        &self,
        options: &DeployOptions,
        workdir: &Path,
        shutdown_signal: impl Future<Output = ()>,
    ) -> Result<(), VerifyError> {
        info!("Running from within {}", workdir.display());

        let outcome = tokio::select! {
            result = self.deploy_and_test(options, workdir) => result,
            _ = shutdown_signal => {
                warn!("Shutdown signal received, abandoning remaining steps");
                Err(VerifyError::Interrupted)
            }
        };

        if let Err(e) = &outcome {
            error!("Release verification failed: {}", e);
        }

        if options.skip_cleanup {
            warn!("Skipping cleanup, {} is left running", options.instance.name);
            return outcome;
        }

        let cleanup = self.reaper.cleanup(&*self.runner, &options.instance).await;
        match (outcome, cleanup) {
            (Err(e), Err(cleanup_err)) => {
                error!("Cleanup of {} also failed: {}", options.instance.name, cleanup_err);
                Err(e)
            }
            (Ok(()), Err(cleanup_err)) => Err(cleanup_err),
            (outcome, Ok(())) => outcome,
        }
    }

    async fn deploy_and_test(&self, options: &DeployOptions, workdir: &Path) -> Result<(), VerifyError> {
        let url = self.resolve(&options.source).await?;

        info!("Getting {}", options.source.artifact_name);
        self.downloader
            .download_artifact(url.as_str(), &workdir.join(&options.archive_name))
            .await?;

        self.pipeline
            .deploy(&*self.runner, &options.archive_name, &options.instance)
            .await?;
        self.tests.run_tests(&*self.runner, &options.instance).await?;

        info!("Release from {} verified on {}", options.source.branch, options.instance.name);
        Ok(())
    }

    async fn resolve(&self, source: &ArtifactSource) -> Result<url::Url, VerifyError> {
        self.locator
            .resolve_artifact_url(
                &source.repo,
                &source.workflow,
                &source.branch,
                &source.artifact_name,
            )
            .await
    }
}

/// Resolve and download an artifact without deploying it
pub async fn download<C: CiApi + ?Sized>(
    settings: &Settings,
    ci: Arc<C>,
    options: &DownloadOptions,
) -> Result<u64, VerifyError> {
    let locator = ArtifactLocator::new(ci.clone(), settings.github.per_page);
    let downloader = BlobDownloader::new(ci)?;

    let source = &options.source;
    info!("Getting {}", source.artifact_name);
    let url = locator
        .resolve_artifact_url(&source.repo, &source.workflow, &source.branch, &source.artifact_name)
        .await?;
    downloader
        .download_artifact(url.as_str(), &options.destination)
        .await
}
