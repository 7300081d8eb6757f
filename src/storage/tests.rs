use super::*;
use crate::llm::{ProviderReply, ProviderResponse};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

async fn backends() -> Vec<(Arc<dyn Storage>, Option<TempDir>)> {
    let dir = TempDir::new().unwrap();
    let file = JsonFileStorage::open(dir.path().join("data")).await.unwrap();
    vec![
        (Arc::new(InMemoryStorage::new()), None),
        (Arc::new(file), Some(dir)),
    ]
}

fn answer_for(job_id: JobId, provider: &str, text: &str) -> NewAnswer {
    let reply = ProviderReply {
        text: text.to_string(),
        tokens_used: 5,
        metadata: HashMap::from([("model".to_string(), serde_json::json!("m"))]),
    };
    NewAnswer::from_response(job_id, provider, "m", ProviderResponse::success(reply, 42))
}

#[tokio::test]
async fn test_job_lifecycle_is_enforced() {
    for (storage, _dir) in backends().await {
        let job = storage
            .create_job(NewJob::new("What is SEO?", "technical").with_providers(["openai"]))
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Pending);

        assert!(storage
            .set_job_status(job.id, JobStatus::Processing)
            .await
            .unwrap());
        assert!(storage
            .set_job_status(job.id, JobStatus::Completed)
            .await
            .unwrap());

        let err = storage
            .set_job_status(job.id, JobStatus::Failed)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidTransition {
                from: JobStatus::Completed,
                to: JobStatus::Failed,
                ..
            }
        ));

        let stored = storage.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert!(stored.updated_at >= stored.created_at);
    }
}

#[tokio::test]
async fn test_unknown_job() {
    for (storage, _dir) in backends().await {
        let missing = Uuid::new_v4();
        assert!(storage.get_job(missing).await.unwrap().is_none());
        assert!(!storage
            .set_job_status(missing, JobStatus::Processing)
            .await
            .unwrap());
        assert!(storage.get_answers(missing).await.unwrap().is_empty());
        assert!(matches!(
            storage.create_answer(answer_for(missing, "openai", "hi")).await,
            Err(StorageError::JobNotFound(id)) if id == missing
        ));
    }
}

#[tokio::test]
async fn test_answers_are_unique_per_provider_and_ordered() {
    for (storage, _dir) in backends().await {
        let job = storage
            .create_job(NewJob::new("q", "content"))
            .await
            .unwrap();

        let first = storage
            .create_answer(answer_for(job.id, "openai", "first"))
            .await
            .unwrap();
        storage
            .create_answer(answer_for(job.id, "anthropic", "second"))
            .await
            .unwrap();

        let duplicate = storage
            .create_answer(answer_for(job.id, "openai", "again"))
            .await;
        assert!(matches!(duplicate, Err(StorageError::DuplicateAnswer { .. })));

        let answers = storage.get_answers(job.id).await.unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0], first);
        assert_eq!(answers[1].provider, "anthropic");
        assert_eq!(answers[1].latency_ms, Some(42));
    }
}

#[tokio::test]
async fn test_metrics_round_trip() {
    for (storage, _dir) in backends().await {
        let job = storage
            .create_job(NewJob::new("q", "analytics"))
            .await
            .unwrap();
        let answer = storage
            .create_answer(answer_for(job.id, "openai", "traffic traffic"))
            .await
            .unwrap();

        let record = NewMetricRecord {
            job_id: job.id,
            answer_id: answer.id,
            provider: "openai".to_string(),
            model: "m".to_string(),
            similarity_matrix: vec![vec![1.0]],
            similarity_answer_ids: vec![answer.id],
            average_similarity: 1.0,
            originality_score: 1.0,
            factuality_score: 0.0,
            readability_score: 0.75,
            keywords: vec!["traffic".to_string()],
            tool_mentions: Vec::new(),
            domain_terms: vec!["traffic".to_string()],
            response_length: 15,
            response_complexity: 2.0,
        };
        let stored = storage.create_metric(record).await.unwrap();
        assert_eq!(stored.analysis_version, crate::evaluation::ANALYSIS_VERSION);

        let metrics = storage.get_metrics(job.id).await.unwrap();
        assert_eq!(metrics, vec![stored]);
    }
}

#[tokio::test]
async fn test_list_jobs_newest_first_with_paging() {
    for (storage, _dir) in backends().await {
        let mut ids = Vec::new();
        for i in 0..3 {
            let job = storage
                .create_job(NewJob::new(format!("prompt {}", i), "technical"))
                .await
                .unwrap();
            ids.push(job.id);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let all = storage.list_jobs(10, 0).await.unwrap();
        let listed: Vec<_> = all.iter().map(|j| j.id).collect();
        assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);

        let page = storage.list_jobs(1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, ids[1]);
    }
}

#[tokio::test]
async fn test_file_storage_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let job_id = {
        let storage = JsonFileStorage::open(dir.path()).await.unwrap();
        let job = storage
            .create_job(NewJob::new("persist me", "technical"))
            .await
            .unwrap();
        storage
            .create_answer(answer_for(job.id, "google", "kept"))
            .await
            .unwrap();
        job.id
    };

    let reopened = JsonFileStorage::open(dir.path()).await.unwrap();
    let job = reopened.get_job(job_id).await.unwrap().unwrap();
    assert_eq!(job.prompt, "persist me");
    assert_eq!(reopened.get_answers(job_id).await.unwrap()[0].text, "kept");

    let job_dir = crate::env::job_dir_path(dir.path(), &job_id.to_string());
    assert!(job_dir.join("job.json").exists());
    assert!(job_dir.join("answers.json").exists());
    assert!(!job_dir.join("answers.tmp").exists());
}
