// End-to-end magic link scenarios against mock collaborators
use magiclink::testing::constants::{TEST_CALLBACK_URL, TEST_PROMPT_MESSAGE, TEST_SECRET};
use magiclink::testing::{MockPromptClient, MockVerifyUser, TestFixtures};
use magiclink::token;
use magiclink::{
    AuthOptions, AuthOutcome, AuthRequest, MagicLinkError, MagicLinkStrategy, TokenError, VerifyFn,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[tokio::test]
async fn test_request_token_delivers_once_to_contact() {
    let client = Arc::new(MockPromptClient::new());
    let users = Arc::new(MockVerifyUser::returning(json!({"id": 1, "email": "a@b.com"})));
    let strategy = TestFixtures::strategy(client.clone(), users.clone());

    let outcome = strategy
        .authenticate(
            &AuthRequest::from_body(json!({"email": "a@b.com"})),
            &AuthOptions::request_token(),
        )
        .await;

    assert!(matches!(outcome, AuthOutcome::Pass { .. }), "got {outcome:?}");

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    let prompt = &requests[0];
    assert_eq!(prompt.user, "a@b.com");
    assert_eq!(prompt.approve_text, "Log In");
    assert_eq!(prompt.body, TEST_PROMPT_MESSAGE);
    assert_eq!(prompt.expires_in, 600);

    // The delivered link carries a token that redeems to the verified user
    let token = prompt
        .approve_redirect_url
        .strip_prefix(&format!("{TEST_CALLBACK_URL}?token="))
        .expect("token appended to the callback URL");
    assert_eq!(
        token::verify(token, TEST_SECRET).unwrap(),
        json!({"id": 1, "email": "a@b.com"})
    );
}

#[tokio::test]
async fn test_missing_contact_never_calls_verify_user() {
    let client = Arc::new(MockPromptClient::new());
    let users = Arc::new(MockVerifyUser::returning(TestFixtures::identity()));
    let strategy = TestFixtures::strategy(client.clone(), users.clone());

    let outcome = strategy
        .authenticate(
            &AuthRequest::new(json!({"name": "Al"}), json!({"ref": "mail"})),
            &AuthOptions::request_token(),
        )
        .await;

    assert!(matches!(
        &outcome,
        AuthOutcome::Fail { message, .. } if message == "contact information missing"
    ));
    assert!(users.calls().is_empty());
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn test_token_minted_eleven_minutes_ago_is_expired() {
    let client = Arc::new(MockPromptClient::new());
    let users = Arc::new(MockVerifyUser::empty());
    let strategy = TestFixtures::strategy(client, users);

    let stale =
        token::mint_at(&TestFixtures::identity(), 600, TEST_SECRET, now() - 11 * 60).unwrap();
    assert!(matches!(
        token::verify(&stale, TEST_SECRET),
        Err(TokenError::Expired { .. })
    ));

    let outcome = strategy
        .authenticate(
            &AuthRequest::from_query(json!({"token": stale})),
            &AuthOptions::accept_token(),
        )
        .await;

    match outcome {
        AuthOutcome::Fail { message, status } => {
            assert!(message.contains("expired"), "message was {message:?}");
            assert_eq!(status, None);
        }
        other => panic!("expected Fail, got {other:?}"),
    }
}

#[tokio::test]
async fn test_default_action_accepts_token_from_body() {
    let client = Arc::new(MockPromptClient::new());
    let users = Arc::new(MockVerifyUser::empty());
    let strategy = TestFixtures::strategy(client, users);
    let identity = json!({"id": 42, "email": "x@y.com", "nested": {"roles": ["a", "b"]}});
    let token = token::mint(&identity, 600, TEST_SECRET).unwrap();

    let outcome = strategy
        .authenticate(
            &AuthRequest::from_body(json!({"token": token})),
            &AuthOptions::default(),
        )
        .await;

    assert_eq!(outcome.identity(), Some(&identity));
}

#[tokio::test]
async fn test_token_from_another_secret_fails() {
    let client = Arc::new(MockPromptClient::new());
    let users = Arc::new(MockVerifyUser::empty());
    let strategy = TestFixtures::strategy(client, users);
    let token = token::mint(&TestFixtures::identity(), 600, "a-different-secret").unwrap();

    let outcome = strategy
        .authenticate_with_action(
            &AuthRequest::from_query(json!({"token": token})),
            Some("acceptToken"),
            None,
        )
        .await;

    assert!(matches!(outcome, AuthOutcome::Fail { .. }));
}

#[tokio::test]
async fn test_unreachable_provider_is_an_error_outcome() {
    let client = Arc::new(MockPromptClient::unreachable());
    let users = Arc::new(MockVerifyUser::returning(TestFixtures::identity()));
    let strategy = TestFixtures::strategy(client, users);

    let outcome = strategy
        .authenticate(
            &AuthRequest::from_body(json!({"email": "test@example.com"})),
            &AuthOptions::request_token(),
        )
        .await;

    assert!(matches!(outcome, AuthOutcome::Error(MagicLinkError::Delivery(_))));
}

#[tokio::test]
async fn test_closure_verify_user_and_nested_contact_field() {
    let client = Arc::new(MockPromptClient::new());
    let config = TestFixtures::config_builder()
        .contact_field("contact.email")
        .callback_url("https://x.com/cb?ref=1")
        .ttl_seconds(120)
        .build()
        .unwrap();
    let verify_user = VerifyFn(
        |fields: &serde_json::Map<String, Value>| -> anyhow::Result<Option<Value>> {
            Ok(fields
                .get("contact.email")
                .map(|email| json!({"id": 5, "contact": {"email": email}})))
        },
    );
    let strategy = MagicLinkStrategy::new(config, client.clone(), Arc::new(verify_user));

    let outcome = strategy
        .authenticate(
            &AuthRequest::from_body(json!({"contact": {"email": "n@b.com"}})),
            &AuthOptions::request_token(),
        )
        .await;

    assert!(matches!(outcome, AuthOutcome::Pass { .. }), "got {outcome:?}");
    let requests = client.requests();
    let prompt = &requests[0];
    assert_eq!(prompt.user, "n@b.com");
    assert_eq!(prompt.expires_in, 120);
    assert!(prompt.approve_redirect_url.starts_with("https://x.com/cb?ref=1&token="));
}
