use crate::config::cli::ImportArgs;
use crate::config::settings::Settings;
use crate::core::pipeline::IngestionPipeline;
use crate::domain::model::ImportSummary;
use crate::domain::ports::{Connector, ProgressObserver};
use crate::utils::error::Result;

/// Runs one `import` invocation against whatever store `connector` produces.
///
/// Everything that can be checked locally (extension, file type, credentials)
/// is checked before the connector is asked for a store.
pub async fn run_import<C: Connector>(
    args: &ImportArgs,
    settings: &Settings,
    connector: &C,
    progress: Box<dyn ProgressObserver>,
) -> Result<ImportSummary> {
    let job = args.to_job()?;
    let credentials = args.credential_options(settings).resolve()?;
    tracing::debug!("Resolved credentials: {:?}", credentials);

    let store = connector.connect(&credentials)?;
    IngestionPipeline::new(store)
        .with_progress(progress)
        .run(&job)
        .await
}
