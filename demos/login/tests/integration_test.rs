//! Integration tests for the login reactor running in a store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use futures::future::BoxFuture;
use login_demo::{
    Account, ContactService, InMemoryContacts, LOGIN_FAILED_MESSAGE, LoginAction, LoginEffect,
    LoginReactor, LoginState,
};
use rxreactor_runtime::Store;
use rxreactor_testing::{DEFAULT_TIMEOUT, ReactorTest, Recorder};
use std::time::Duration;

const LOGIN_DELAY: Duration = Duration::from_millis(20);

fn reactor() -> LoginReactor {
    LoginReactor::new(InMemoryContacts::new(["joe@example.com", "kamala@example.com"]))
        .with_login_delay(LOGIN_DELAY)
}

fn filled(username: &str, password: &str) -> LoginState {
    LoginState {
        username: username.to_string(),
        password: password.to_string(),
        ..LoginState::default()
    }
}

#[tokio::test]
async fn test_valid_credentials_log_in() {
    ReactorTest::new(reactor())
        .given_state(filled("joe@example.com", "hello"))
        .when_action(LoginAction::Login)
        .expect_states(3)
        .then_states(|states| {
            let busy: Vec<bool> = states.iter().map(|state| state.is_busy).collect();
            assert_eq!(busy, [false, true, false]);
        })
        .then_effects(|effects| {
            assert_eq!(effects, [LoginEffect::LoggedIn(Account {
                name: "joe@example.com".to_string(),
            })]);
        })
        .run()
        .await;
}

#[tokio::test]
async fn test_typed_credentials_log_in() {
    ReactorTest::new(reactor())
        .given_state(LoginState::default())
        .when_actions([
            LoginAction::UsernameChanged("joe@example.com".to_string()),
            LoginAction::PasswordChanged("hello".to_string()),
            LoginAction::Login,
        ])
        .expect_states(5)
        .then_states(|states| {
            let busy: Vec<bool> = states.iter().map(|state| state.is_busy).collect();
            assert_eq!(busy, [false, false, false, true, false]);
            assert!(states[2].login_enabled());
        })
        .then_effects(|effects| {
            assert_eq!(effects, [LoginEffect::LoggedIn(Account {
                name: "joe@example.com".to_string(),
            })]);
        })
        .run()
        .await;
}

#[tokio::test]
async fn test_typed_wrong_password_shows_error() {
    let store = Store::new(reactor(), LoginState::default());
    let effects = Recorder::record(store.observe_effect());

    store.submit(LoginAction::UsernameChanged("kamala@example.com".to_string()));
    store.submit(LoginAction::PasswordChanged("hello".to_string()));
    store.submit(LoginAction::Login);

    assert_eq!(
        effects.wait_for(1, DEFAULT_TIMEOUT).await.unwrap(),
        [LoginEffect::ShowError(LOGIN_FAILED_MESSAGE.to_string())]
    );
}

#[tokio::test]
async fn test_invalid_credentials_show_error() {
    ReactorTest::new(reactor())
        .given_state(filled("kamala@example.com", "hello"))
        .when_action(LoginAction::Login)
        .expect_states(3)
        .then_effects(|effects| {
            assert_eq!(effects, [LoginEffect::ShowError(LOGIN_FAILED_MESSAGE.to_string())]);
        })
        .run()
        .await;
}

#[tokio::test]
async fn test_effect_arrives_before_busy_clears() {
    let reactor = reactor().with_login_delay(Duration::from_millis(200));
    let store = Store::new(reactor, filled("kamala@example.com", "world"));
    let states = Recorder::record(store.observe_state());
    let effects = Recorder::record(store.observe_effect());

    store.submit(LoginAction::Login);

    states.wait_for(2, DEFAULT_TIMEOUT).await.unwrap();
    assert!(store.current_state().is_busy);
    assert!(effects.is_empty());

    effects.wait_for(1, DEFAULT_TIMEOUT).await.unwrap();
    let states = states.wait_for(3, DEFAULT_TIMEOUT).await.unwrap();
    assert!(!states[2].is_busy);
}

#[tokio::test]
async fn test_editing_fields_updates_validity() {
    ReactorTest::new(reactor())
        .given_state(LoginState::default())
        .when_actions([
            LoginAction::EnterScreen,
            LoginAction::UsernameChanged("joe@example.com".to_string()),
            LoginAction::PasswordChanged(" ".to_string()),
        ])
        .expect_states(3)
        .then_states(|states| {
            let last = states.last().unwrap();
            assert_eq!(last.username, "joe@example.com");
            assert!(!last.is_password_valid);
            assert!(!last.login_enabled());
        })
        .run()
        .await;
}

#[tokio::test]
async fn test_auto_complete_is_populated() {
    ReactorTest::new(reactor())
        .given_state(LoginState::default())
        .when_action(LoginAction::PopulateAutoComplete)
        .expect_states(2)
        .then_states(|states| {
            assert_eq!(
                states[1].auto_complete_emails,
                Some(vec!["joe@example.com".to_string(), "kamala@example.com".to_string()])
            );
        })
        .run()
        .await;
}

struct BrokenContacts;

impl ContactService for BrokenContacts {
    fn load_emails(&self) -> BoxFuture<'static, anyhow::Result<Vec<String>>> {
        Box::pin(async { Err(anyhow::anyhow!("contacts unavailable")) })
    }
}

#[tokio::test]
async fn test_failing_contact_service_does_not_break_the_screen() {
    let reactor = LoginReactor::new(BrokenContacts).with_login_delay(LOGIN_DELAY);

    ReactorTest::new(reactor)
        .given_state(LoginState::default())
        .when_actions([
            LoginAction::PopulateAutoComplete,
            LoginAction::UsernameChanged("joe@example.com".to_string()),
        ])
        .expect_states(2)
        .then_states(|states| {
            assert_eq!(states[1].username, "joe@example.com");
            assert_eq!(states[1].auto_complete_emails, None);
        })
        .run()
        .await;
}
