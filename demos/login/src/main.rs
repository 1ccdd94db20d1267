//! Login example binary
//!
//! Drives the login reactor through a failed and a successful login.

use futures::stream::StreamExt;
use login_demo::{InMemoryContacts, LoginAction, LoginEffect, LoginReactor, LoginState};
use rxreactor_runtime::{ReactorConfig, Store};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "login_demo=info,rxreactor_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Login Example: RxReactor Architecture ===\n");

    let contacts = InMemoryContacts::new(["joe@example.com", "kamala@example.com"]);
    let reactor = LoginReactor::new(contacts).with_login_delay(Duration::from_millis(500));
    let store = Store::with_config(reactor, LoginState::default(), ReactorConfig::new("login"))?;

    let mut states = store.observe_state();
    tokio::spawn(async move {
        while let Some(state) = states.next().await {
            println!(
                "state: username={:?} busy={} login_enabled={} suggestions={:?}",
                state.username,
                state.is_busy,
                state.login_enabled(),
                state.auto_complete_emails
            );
        }
    });
    let mut effects = store.observe_effect();

    store.submit(LoginAction::EnterScreen);
    store.submit(LoginAction::PopulateAutoComplete);

    println!("\n>>> Logging in with a wrong password");
    store.submit(LoginAction::UsernameChanged("joe@example.com".to_string()));
    store.submit(LoginAction::PasswordChanged("wrong".to_string()));
    wait_until(&store, |state| state.password == "wrong").await;
    store.submit(LoginAction::Login);
    report(effects.next().await);

    println!("\n>>> Logging in with the right password");
    store.submit(LoginAction::PasswordChanged("hello".to_string()));
    wait_until(&store, |state| state.password == "hello" && !state.is_busy).await;
    store.submit(LoginAction::Login);
    report(effects.next().await);

    wait_until(&store, |state| !state.is_busy).await;
    store.clear_subscriptions();

    println!("\n=== Architecture Demonstration Complete ===");
    println!("\nKey concepts demonstrated:");
    println!("  • Action: LoginAction (what the user did)");
    println!("  • Mutation: LoginMutation (what changes, possibly later)");
    println!("  • State: LoginState (replayed to every new observer)");
    println!("  • Effect: LoginEffect (one-shot, never replayed)");
    Ok(())
}

fn report(effect: Option<LoginEffect>) {
    match effect {
        Some(LoginEffect::LoggedIn(account)) => println!("effect: logged in as {}", account.name),
        Some(LoginEffect::ShowError(message)) => println!("effect: error \"{message}\""),
        None => println!("effect stream completed"),
    }
}

/// Poll the current state until `done` holds.
async fn wait_until<F>(store: &Store<LoginReactor>, done: F)
where
    F: Fn(&LoginState) -> bool,
{
    while !store.state(&done) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
