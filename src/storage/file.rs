use crate::env;
use crate::job::{Answer, Job, JobId, JobStatus, MetricRecord, NewAnswer, NewJob, NewMetricRecord};
use crate::storage::{
    Storage, StorageError, apply_transition, ensure_unique_provider, page_newest_first,
};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// One directory per job under `<data_dir>/jobs`, holding `job.json`,
/// `answers.json` and `metrics.json`.
///
/// Files are replaced atomically (write to a temp file, then rename) and all
/// mutations in this process are serialized by a single lock.
#[derive(Debug)]
pub struct JsonFileStorage {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl JsonFileStorage {
    /// Open (and create if missing) a store rooted at `data_dir`
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        let jobs_dir = env::jobs_dir_path(&data_dir);
        async_fs::create_dir_all(&jobs_dir)
            .await
            .map_err(|e| io_error(&jobs_dir, e))?;

        debug!(data_dir = %data_dir.display(), "opened file storage");
        Ok(Self {
            data_dir,
            write_lock: Mutex::new(()),
        })
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
        match async_fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(path, e)),
        }
    }

    async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
        let data = serde_json::to_vec_pretty(value)?;
        let temp_path = path.with_extension(env::storage::TEMP_SUFFIX);

        let mut file = async_fs::File::create(&temp_path)
            .await
            .map_err(|e| io_error(&temp_path, e))?;
        file.write_all(&data)
            .await
            .map_err(|e| io_error(&temp_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| io_error(&temp_path, e))?;
        drop(file);

        async_fs::rename(&temp_path, path)
            .await
            .map_err(|e| io_error(path, e))
    }

    async fn load_job(&self, id: JobId) -> Result<Option<Job>, StorageError> {
        Self::read_json(&env::job_file_path(&self.data_dir, &id.to_string())).await
    }

    async fn load_answers(&self, job_id: JobId) -> Result<Vec<Answer>, StorageError> {
        Ok(
            Self::read_json(&env::answers_file_path(&self.data_dir, &job_id.to_string()))
                .await?
                .unwrap_or_default(),
        )
    }

    async fn load_metrics(&self, job_id: JobId) -> Result<Vec<MetricRecord>, StorageError> {
        Ok(
            Self::read_json(&env::metrics_file_path(&self.data_dir, &job_id.to_string()))
                .await?
                .unwrap_or_default(),
        )
    }

    async fn require_job(&self, id: JobId) -> Result<Job, StorageError> {
        self.load_job(id)
            .await?
            .ok_or(StorageError::JobNotFound(id))
    }
}

#[async_trait]
impl Storage for JsonFileStorage {
    async fn create_job(&self, new_job: NewJob) -> Result<Job, StorageError> {
        let job = new_job.into_job();
        let id = job.id.to_string();
        let job_dir = env::job_dir_path(&self.data_dir, &id);

        let _guard = self.write_lock.lock().await;
        async_fs::create_dir_all(&job_dir)
            .await
            .map_err(|e| io_error(&job_dir, e))?;
        Self::write_json(&env::job_file_path(&self.data_dir, &id), &job).await?;

        debug!(job_id = %job.id, "created job");
        Ok(job)
    }

    async fn get_job(&self, id: JobId) -> Result<Option<Job>, StorageError> {
        self.load_job(id).await
    }

    async fn set_job_status(&self, id: JobId, status: JobStatus) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().await;
        let Some(mut job) = self.load_job(id).await? else {
            return Ok(false);
        };
        apply_transition(&mut job, status)?;
        Self::write_json(&env::job_file_path(&self.data_dir, &id.to_string()), &job).await?;
        Ok(true)
    }

    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer, StorageError> {
        let _guard = self.write_lock.lock().await;
        let job_id = answer.job_id;
        self.require_job(job_id).await?;

        let mut answers = self.load_answers(job_id).await?;
        ensure_unique_provider(&answers, &answer)?;
        let stored = answer.into_answer();
        answers.push(stored.clone());
        Self::write_json(
            &env::answers_file_path(&self.data_dir, &job_id.to_string()),
            &answers,
        )
        .await?;
        Ok(stored)
    }

    async fn get_answers(&self, job_id: JobId) -> Result<Vec<Answer>, StorageError> {
        self.load_answers(job_id).await
    }

    async fn create_metric(&self, record: NewMetricRecord) -> Result<MetricRecord, StorageError> {
        let _guard = self.write_lock.lock().await;
        let job_id = record.job_id;
        self.require_job(job_id).await?;

        let mut metrics = self.load_metrics(job_id).await?;
        let stored = record.into_record();
        metrics.push(stored.clone());
        Self::write_json(
            &env::metrics_file_path(&self.data_dir, &job_id.to_string()),
            &metrics,
        )
        .await?;
        Ok(stored)
    }

    async fn get_metrics(&self, job_id: JobId) -> Result<Vec<MetricRecord>, StorageError> {
        self.load_metrics(job_id).await
    }

    async fn list_jobs(&self, limit: usize, offset: usize) -> Result<Vec<Job>, StorageError> {
        let jobs_dir = env::jobs_dir_path(&self.data_dir);
        let mut entries = async_fs::read_dir(&jobs_dir)
            .await
            .map_err(|e| io_error(&jobs_dir, e))?;

        let mut jobs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&jobs_dir, e))?
        {
            let job_file = entry.path().join(env::storage::JOB_FILE_NAME);
            match Self::read_json::<Job>(&job_file).await {
                Ok(Some(job)) => jobs.push(job),
                Ok(None) => {}
                Err(e) => warn!(path = %job_file.display(), error = %e, "skipping unreadable job"),
            }
        }

        Ok(page_newest_first(jobs, limit, offset))
    }
}
