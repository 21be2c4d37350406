use crate::core::source::{RecordSource, SourceRecord};
use crate::domain::model::{FileType, ImportJob, ImportSummary};
use crate::domain::ports::{Collection, Database, DocumentStore, ProgressObserver};
use crate::utils::error::{CadetError, Result};
use crate::utils::progress::{format_bytes, NoopProgress};
use crate::utils::validation::{validate_file_extension, validate_path};

/// Drives one source file into one collection, stopping at the first failed upsert.
pub struct IngestionPipeline<S: DocumentStore> {
    store: S,
    progress: Box<dyn ProgressObserver>,
}

impl<S: DocumentStore> IngestionPipeline<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            progress: Box::new(NoopProgress),
        }
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressObserver>) -> Self {
        self.progress = progress;
        self
    }

    pub async fn run(self, job: &ImportJob) -> Result<ImportSummary> {
        validate_path("source", &job.source)?;
        validate_file_extension("source", &job.source, &FileType::EXTENSIONS)?;

        tracing::info!(
            "🔗 Resolving collection '{}' in database '{}'",
            job.target.collection,
            job.target.database
        );
        let database = self.store.database(&job.target.database).await?;
        let collection = database.collection(&job.target.collection).await?;

        let source = RecordSource::from_path(&job.source, job.file_type, job.row_policy)?;
        tracing::info!("Starting the upload of {} ({})", job.source.display(), job.file_type);
        if job.file_type.is_delimited() {
            tracing::info!(
                "Source file total size is: {} bytes ({})",
                source.total(),
                format_bytes(source.total())
            );
        } else {
            tracing::info!("Source file holds {} documents", source.total());
        }

        let mut summary = ImportSummary {
            units_total: source.total(),
            ..Default::default()
        };
        self.progress.start(summary.units_total);

        for item in source {
            let SourceRecord { record, units } = item?;
            let number = summary.records_upserted + 1;

            if let Err(e) = collection.upsert(&record).await {
                tracing::error!("❌ Upsert of record {} failed: {}", number, e);
                return Err(CadetError::UpsertError {
                    record: number,
                    message: e.to_string(),
                });
            }

            summary.records_upserted = number;
            summary.units_completed += units;
            self.progress.advance(units);
            tracing::trace!("Upserted record {}", number);
        }

        self.progress.finish();
        tracing::info!("✅ Upserted {} records", summary.records_upserted);
        Ok(summary)
    }
}
