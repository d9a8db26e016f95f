//! Waiting for a new build to roll out

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

use crate::errors::VerifyError;
use crate::service::client::{BuildVersion, ServiceApi};
use crate::wait::{wait_until, PollResult, WaitPolicy};

/// Record the version `component` reports now, then poll until it reports
/// a different one. Returns the new version.
pub async fn wait_for_version_change<A, S, F>(
    service: &A,
    component: &str,
    policy: &WaitPolicy,
    sleep_fn: S,
) -> Result<BuildVersion, VerifyError>
where
    A: ServiceApi + ?Sized,
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    let baseline = service.info().await?.version_of(component)?.clone();
    info!(
        "Baseline {} version: {} (build {}, git {})",
        component, baseline.version, baseline.build, baseline.git
    );

    let changed = wait_until(
        || check_version(service, component, &baseline),
        policy,
        sleep_fn,
    )
    .await?;

    info!(
        "{} changed to {} (build {}, git {})",
        component, changed.version, changed.build, changed.git
    );
    Ok(changed)
}

async fn check_version<A: ServiceApi + ?Sized>(
    service: &A,
    component: &str,
    baseline: &BuildVersion,
) -> PollResult<BuildVersion> {
    let info = match service.info().await {
        Ok(info) => info,
        Err(e) => return PollResult::failed(e),
    };
    match info.version_of(component) {
        Ok(current) if current != baseline => PollResult::ready(current.clone()),
        Ok(_) => {
            debug!("{} still at baseline", component);
            PollResult::pending()
        }
        Err(e) => PollResult::failed(e),
    }
}
