
use serde_json::{json, Map, Value};

use fixture::{turns, Fixture};
use persona_memory::ai::mock::MockBehavior;

fn step_updates(step: u8) -> Map<String, Value> {
    let mut updates = Map::new();
    updates.insert("onboarding_step".to_string(), json!(step));
    updates
}

#[tokio::test]
async fn first_step_advances_when_judged_complete() {
    let fx = Fixture::scripted([
        json!({"nickname": "미나", "step_complete": true}).to_string(),
    ]);
    fx.create_user("u1").await;

    let new_step = fx.manager.process_onboarding_turn("u1", &turns(2), 0).await;
    assert_eq!(new_step, 1);

    let profile = fx.manager.get_user_profile("u1").await.unwrap();
    assert_eq!(profile.nickname, "미나");
    assert_eq!(profile.onboarding_step, 1);
    assert!(!profile.onboarding_complete);
}

#[tokio::test]
async fn incomplete_judgment_holds_the_step() {
    let fx = Fixture::scripted([json!({"step_complete": false}).to_string()]);
    fx.create_user("u1").await;

    assert_eq!(fx.manager.process_onboarding_turn("u1", &turns(2), 0).await, 0);

    let profile = fx.manager.get_user_profile("u1").await.unwrap();
    assert_eq!(profile.onboarding_step, 0);
    assert!(profile.nickname.is_empty());
}

#[tokio::test]
async fn judgment_failure_holds_the_step() {
    let fx = Fixture::with_behavior(MockBehavior::AlwaysFail);
    fx.create_user("u1").await;

    assert_eq!(fx.manager.process_onboarding_turn("u1", &turns(2), 2).await, 2);
}

#[tokio::test]
async fn unparseable_judgment_holds_the_step() {
    let fx = Fixture::with_behavior(MockBehavior::Reply {
        text: "네, 알겠어요!".to_string(),
    });
    fx.create_user("u1").await;

    assert_eq!(fx.manager.process_onboarding_turn("u1", &turns(2), 0).await, 0);
}

#[tokio::test]
async fn step_can_advance_without_a_captured_value() {
    // The judge may mark the step answered without extracting a usable
    // value; the step still moves on rather than re-asking forever.
    let fx = Fixture::scripted([json!({"step_complete": true}).to_string()]);
    fx.create_user("u1").await;

    assert_eq!(fx.manager.process_onboarding_turn("u1", &turns(2), 1).await, 2);

    let profile = fx.manager.get_user_profile("u1").await.unwrap();
    assert_eq!(profile.onboarding_step, 2);
    assert!(profile.birthday.is_empty());
}

#[tokio::test]
async fn final_step_sets_the_complete_flag() {
    let fx = Fixture::scripted([
        json!({"preferred_topics": ["연애", "일상"], "step_complete": true}).to_string(),
    ]);
    fx.create_user("u1").await;
    fx.manager.update_user_profile("u1", step_updates(4)).await;

    let new_step = fx.manager.process_onboarding_turn("u1", &turns(2), 4).await;
    assert_eq!(new_step, 5);

    let profile = fx.manager.get_user_profile("u1").await.unwrap();
    assert!(profile.onboarding_complete);
    assert_eq!(profile.onboarding_step, 5);
    assert_eq!(profile.preferred_topics, vec!["연애", "일상"]);

    assert_eq!(fx.manager.onboarding_prompt_addition("u1", "rumi").await, "");
}

#[tokio::test]
async fn out_of_range_step_is_a_no_op() {
    let fx = Fixture::new();
    fx.create_user("u1").await;

    assert_eq!(fx.manager.process_onboarding_turn("u1", &turns(2), 5).await, 5);
    assert_eq!(fx.manager.process_onboarding_turn("u1", &turns(2), 9).await, 9);
    assert_eq!(fx.generator.get_call_count(), 0);
}

#[tokio::test]
async fn profile_write_failure_holds_the_step() {
    let fx = Fixture::scripted([
        json!({"nickname": "미나", "step_complete": true}).to_string(),
    ]);
    fx.create_user("u1").await;
    fx.documents.set_fail_updates(true);

    assert_eq!(fx.manager.process_onboarding_turn("u1", &turns(2), 0).await, 0);
}

#[tokio::test]
async fn prompt_addition_names_the_current_step() {
    let fx = Fixture::scripted([
        json!({"nickname": "미나", "step_complete": true}).to_string(),
    ]);
    fx.create_user("u1").await;

    let addition = fx.manager.onboarding_prompt_addition("u1", "rumi").await;
    assert!(addition.contains("[온보딩 지시]"));
    assert!(addition.contains("0/4"));
    assert!(addition.contains("닉네임"));

    fx.manager.process_onboarding_turn("u1", &turns(2), 0).await;
    let addition = fx.manager.onboarding_prompt_addition("u1", "rumi").await;
    assert!(addition.contains("1/4"));
    assert!(addition.contains("생년월일"));
}

#[tokio::test]
async fn unknown_users_get_no_prompt_addition() {
    let fx = Fixture::new();
    assert_eq!(fx.manager.onboarding_prompt_addition("ghost", "rumi").await, "");
}
