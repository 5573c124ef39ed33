
use serde_json::json;

use fixture::{extraction_reply, session_start, turns, Fixture};
use persona_memory::ai::mock::MockBehavior;
use persona_memory::memory::StepStatus;
use persona_memory::store::BlobStore;
use persona_memory::types::{conversation_id, transcript_key, TranscriptBlob};

#[tokio::test]
async fn too_few_turns_skips_everything() {
    let fx = Fixture::new();

    let outcome = fx
        .manager
        .persist_conversation("u1", "rumi", &turns(1), session_start())
        .await;

    assert!(outcome.skipped);
    assert_eq!(fx.generator.get_call_count(), 0);
    assert!(fx.conversation_items().is_empty());
    assert!(fx.fact_items().is_empty());
    assert_eq!(fx.blobs.blob_count(), 0);
}

#[tokio::test]
async fn full_save_writes_transcript_record_and_facts() {
    let fx = Fixture::scripted([extraction_reply()]);
    fx.create_user("u1").await;

    let start = session_start();
    let outcome = fx
        .manager
        .persist_conversation("u1", "rumi", &turns(6), start)
        .await;

    assert!(!outcome.skipped);
    assert!(outcome.extraction_ok);
    assert_eq!(outcome.transcript, StepStatus::Ok);
    assert_eq!(outcome.record, StepStatus::Ok);
    assert_eq!(outcome.facts_written, 2);
    assert_eq!(outcome.facts_failed, 0);

    let records = fx.conversation_items();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["summary"], json!("사용자가 콘서트 계획을 이야기했다."));
    assert_eq!(records[0]["user_sentiment"], json!("positive"));
    assert_eq!(records[0]["keywords"], records[0]["topics_discussed"]);
    assert_eq!(records[0]["message_count"], json!(6));

    let facts = fx.fact_items();
    assert_eq!(facts.len(), 2);
    for fact in &facts {
        assert_eq!(fact["active"], json!(true));
        let scope = fact["character"].as_str().unwrap();
        assert!(fact["memory_id"].as_str().unwrap().starts_with(scope));
    }

    let key = transcript_key("u1", &conversation_id("rumi", start));
    let bytes = fx.blobs.get(&key).await.unwrap().unwrap();
    let blob: TranscriptBlob = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(blob.message_count, 6);
    assert!(blob.session_end.is_some());
}

#[tokio::test]
async fn malformed_extraction_still_writes_record() {
    let fx = Fixture::with_behavior(MockBehavior::Reply {
        text: "응, 전부 기억할게!".to_string(),
    });

    let outcome = fx
        .manager
        .persist_conversation("u1", "rumi", &turns(4), session_start())
        .await;

    assert!(!outcome.extraction_ok);
    assert_eq!(outcome.transcript, StepStatus::Ok);
    assert_eq!(outcome.record, StepStatus::Ok);
    assert_eq!(outcome.facts_written, 0);

    let records = fx.conversation_items();
    assert_eq!(records[0]["summary"], json!(""));
    assert_eq!(records[0]["user_sentiment"], json!("neutral"));
    assert!(fx.fact_items().is_empty());
}

#[tokio::test]
async fn extraction_call_failure_degrades_the_same_way() {
    let fx = Fixture::with_behavior(MockBehavior::AlwaysFail);

    let outcome = fx
        .manager
        .persist_conversation("u1", "rumi", &turns(4), session_start())
        .await;

    assert!(!outcome.extraction_ok);
    assert_eq!(outcome.record, StepStatus::Ok);
    assert_eq!(fx.conversation_items().len(), 1);
}

#[tokio::test]
async fn blob_failure_does_not_block_the_record_or_facts() {
    let fx = Fixture::scripted([extraction_reply()]);
    fx.blobs.set_fail_puts(true);

    let outcome = fx
        .manager
        .persist_conversation("u1", "rumi", &turns(6), session_start())
        .await;

    assert_eq!(outcome.transcript, StepStatus::Failed);
    assert_eq!(outcome.record, StepStatus::Ok);
    assert_eq!(outcome.facts_written, 2);
    assert_eq!(fx.blobs.blob_count(), 0);
}

#[tokio::test]
async fn document_failure_still_writes_the_transcript() {
    let fx = Fixture::scripted([extraction_reply()]);
    fx.documents.set_fail_puts(true);

    let outcome = fx
        .manager
        .persist_conversation("u1", "rumi", &turns(6), session_start())
        .await;

    assert_eq!(outcome.transcript, StepStatus::Ok);
    assert_eq!(outcome.record, StepStatus::Failed);
    assert_eq!(outcome.facts_written, 0);
    assert_eq!(outcome.facts_failed, 2);
    assert_eq!(fx.blobs.blob_count(), 1);
}

#[tokio::test]
async fn incremental_save_is_idempotent() {
    let fx = Fixture::new();
    let start = session_start();
    let session = turns(3);
    let key = transcript_key("u1", &conversation_id("rumi", start));

    fx.manager
        .persist_incremental("u1", "rumi", &session, start)
        .await;
    let first = fx.blobs.get(&key).await.unwrap().unwrap();

    fx.manager
        .persist_incremental("u1", "rumi", &session, start)
        .await;
    let second = fx.blobs.get(&key).await.unwrap().unwrap();

    assert_eq!(fx.blobs.blob_count(), 1);
    assert_eq!(first, second);
    // No model call, no document writes on the incremental path.
    assert_eq!(fx.generator.get_call_count(), 0);
    assert!(fx.conversation_items().is_empty());

    let blob: TranscriptBlob = serde_json::from_slice(&second).unwrap();
    assert!(blob.session_end.is_none());
}

#[tokio::test]
async fn incremental_save_ignores_empty_sessions() {
    let fx = Fixture::new();
    fx.manager
        .persist_incremental("u1", "rumi", &[], session_start())
        .await;
    assert_eq!(fx.blobs.blob_count(), 0);
}

#[tokio::test]
async fn out_of_range_importance_is_clamped_at_the_write_boundary() {
    let reply = json!({
        "summary": "요약",
        "keywords": [],
        "user_sentiment": "neutral",
        "new_user_info": {},
        "memories": [
            {"character": "global", "category": "fact", "content": "a", "importance": 99},
            {"character": "rumi", "category": "fact", "content": "b", "importance": 0},
        ],
    })
    .to_string();
    let fx = Fixture::scripted([reply]);

    fx.manager
        .persist_conversation("u1", "rumi", &turns(4), session_start())
        .await;

    let mut importances: Vec<u64> = fx
        .fact_items()
        .iter()
        .map(|fact| fact["importance"].as_u64().unwrap())
        .collect();
    importances.sort_unstable();
    assert_eq!(importances, vec![1, 5]);
}

#[tokio::test]
async fn recognized_new_info_merges_into_the_profile() {
    let reply = json!({
        "summary": "요약",
        "keywords": [],
        "user_sentiment": "positive",
        "new_user_info": {"favorite_group": "ATEEZ", "nickname": "미나"},
        "memories": [],
    })
    .to_string();
    let fx = Fixture::scripted([reply]);
    fx.create_user("u1").await;

    let outcome = fx
        .manager
        .persist_conversation("u1", "rumi", &turns(6), session_start())
        .await;
    assert_eq!(outcome.profile, StepStatus::Ok);

    let profile = fx.manager.get_user_profile("u1").await.unwrap();
    assert_eq!(profile.nickname, "미나");
    assert_eq!(
        profile.kpop_preferences.get("favorite_group"),
        Some(&json!("ATEEZ"))
    );
}

#[rstest::rstest]
#[case(0, false)]
#[case(5, false)]
#[case(6, true)]
#[case(12, true)]
fn full_save_threshold_comes_from_config(#[case] turns_since: usize, #[case] due: bool) {
    let fx = Fixture::new();
    assert_eq!(fx.manager.full_save_due(turns_since), due);
}
