//! # Login Example
//!
//! A login screen demonstrating the RxReactor architecture.
//!
//! This example showcases:
//! - Synchronous mutations (editing the form)
//! - An asynchronous, multi-step mutation stream (busy → check → not busy)
//! - Effects for one-shot outcomes (logged in, error message)
//! - An injected service whose failure does not end the state stream
//!
//! ## Example
//!
//! ```no_run
//! use login_demo::{InMemoryContacts, LoginAction, LoginReactor, LoginState};
//! use rxreactor_runtime::Store;
//!
//! # async fn example() {
//! let reactor = LoginReactor::new(InMemoryContacts::new(["joe@example.com"]));
//! let store = Store::new(reactor, LoginState::default());
//!
//! store.submit(LoginAction::UsernameChanged("joe@example.com".into()));
//! store.submit(LoginAction::PasswordChanged("hello".into()));
//! store.submit(LoginAction::Login);
//! # }
//! ```

use futures::future::BoxFuture;
use futures::stream::StreamExt;
use rxreactor_core::mutation::{self, MutationStream};
use rxreactor_core::{Context, Reactor, ReactorError};
use std::sync::Arc;
use std::time::Duration;

/// Credentials accepted by the fake login, as `username:password`.
pub const DUMMY_CREDENTIALS: [&str; 2] = ["joe@example.com:hello", "kamala@example.com:world"];

/// Default time the fake login takes.
pub const DEFAULT_LOGIN_DELAY: Duration = Duration::from_secs(3);

/// Message shown when the credentials are rejected.
pub const LOGIN_FAILED_MESSAGE: &str = "Some error message";

/// Source of e-mail addresses for auto-completion.
pub trait ContactService: Send + Sync {
    /// Load every known e-mail address.
    fn load_emails(&self) -> BoxFuture<'static, anyhow::Result<Vec<String>>>;
}

/// Contact service backed by a fixed list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContacts {
    emails: Vec<String>,
}

impl InMemoryContacts {
    /// Create a service returning `emails`.
    #[must_use]
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            emails: emails.into_iter().map(Into::into).collect(),
        }
    }
}

impl ContactService for InMemoryContacts {
    fn load_emails(&self) -> BoxFuture<'static, anyhow::Result<Vec<String>>> {
        let emails = self.emails.clone();
        Box::pin(async move { Ok(emails) })
    }
}

/// Account of a logged-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Account name
    pub name: String,
}

/// Login actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginAction {
    /// The screen became visible
    EnterScreen,
    /// The username field changed
    UsernameChanged(String),
    /// The password field changed
    PasswordChanged(String),
    /// The login button was pressed
    Login,
    /// Fill the auto-complete list from the contact service
    PopulateAutoComplete,
}

/// Login mutations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginMutation {
    /// Store the username and its validity
    SetUsername(String),
    /// Store the password and its validity
    SetPassword(String),
    /// Show or hide the progress indicator
    SetBusy(bool),
    /// Store the auto-complete suggestions
    SetAutoCompleteEmails(Vec<String>),
}

/// Login screen state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginState {
    /// Username as typed
    pub username: String,
    /// Password as typed
    pub password: String,
    /// Whether the username is acceptable
    pub is_username_valid: bool,
    /// Whether the password is acceptable
    pub is_password_valid: bool,
    /// Whether a login is in progress
    pub is_busy: bool,
    /// Auto-complete suggestions, once loaded
    pub auto_complete_emails: Option<Vec<String>>,
}

impl Default for LoginState {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            is_username_valid: true,
            is_password_valid: true,
            is_busy: false,
            auto_complete_emails: None,
        }
    }
}

impl LoginState {
    /// Whether the login button should be enabled
    #[must_use]
    pub fn login_enabled(&self) -> bool {
        self.is_username_valid
            && !self.username.is_empty()
            && self.is_password_valid
            && !self.password.is_empty()
    }
}

/// Login effects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginEffect {
    /// Tell the user something went wrong
    ShowError(String),
    /// Navigate away, the user is logged in
    LoggedIn(Account),
}

/// Login screen reactor
///
/// Accepts the two [`DUMMY_CREDENTIALS`] after [`DEFAULT_LOGIN_DELAY`].
pub struct LoginReactor {
    contacts: Arc<dyn ContactService>,
    login_delay: Duration,
}

impl LoginReactor {
    /// Create a login reactor using `contacts` for auto-completion
    #[must_use]
    pub fn new(contacts: impl ContactService + 'static) -> Self {
        Self {
            contacts: Arc::new(contacts),
            login_delay: DEFAULT_LOGIN_DELAY,
        }
    }

    /// Change how long the fake login takes
    #[must_use]
    pub const fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = delay;
        self
    }

    fn login(&self, context: &Context<LoginState, LoginEffect>) -> MutationStream<LoginMutation> {
        let state = context.current_state();
        let credentials = format!("{}:{}", state.username, state.password);
        let accepted = DUMMY_CREDENTIALS.contains(&credentials.as_str());
        let username = state.username;
        let delay = self.login_delay;
        let context = context.clone();

        tracing::info!(username = %username, "Logging in");

        async_stream::stream! {
            yield Ok::<_, ReactorError>(LoginMutation::SetBusy(true));
            tokio::time::sleep(delay).await;
            if accepted {
                tracing::info!(username = %username, "Login accepted");
                context.emit_effect(LoginEffect::LoggedIn(Account { name: username }));
            } else {
                tracing::warn!(username = %username, "Login rejected");
                context.emit_effect(LoginEffect::ShowError(LOGIN_FAILED_MESSAGE.to_string()));
            }
            yield Ok(LoginMutation::SetBusy(false));
        }
        .boxed()
    }

    fn load_emails(&self) -> MutationStream<LoginMutation> {
        let emails = self.contacts.load_emails();
        mutation::from_future(async move {
            emails
                .await
                .map(LoginMutation::SetAutoCompleteEmails)
                .map_err(|error| ReactorError::mutation(format!("loading contacts failed: {error}")))
        })
    }
}

impl Reactor for LoginReactor {
    type Action = LoginAction;
    type Mutation = LoginMutation;
    type State = LoginState;
    type Effect = LoginEffect;

    fn mutate(
        &self,
        action: LoginAction,
        context: &Context<LoginState, LoginEffect>,
    ) -> MutationStream<LoginMutation> {
        match action {
            LoginAction::EnterScreen => mutation::empty(),
            LoginAction::UsernameChanged(username) => {
                mutation::just(LoginMutation::SetUsername(username))
            },
            LoginAction::PasswordChanged(password) => {
                mutation::just(LoginMutation::SetPassword(password))
            },
            LoginAction::Login => self.login(context),
            LoginAction::PopulateAutoComplete => self.load_emails(),
        }
    }

    fn reduce(
        &self,
        state: &LoginState,
        mutation: LoginMutation,
    ) -> Result<LoginState, ReactorError> {
        let next = match mutation {
            LoginMutation::SetUsername(username) => LoginState {
                is_username_valid: !username.trim().is_empty(),
                username,
                ..state.clone()
            },
            LoginMutation::SetPassword(password) => LoginState {
                is_password_valid: !password.trim().is_empty(),
                password,
                ..state.clone()
            },
            LoginMutation::SetBusy(is_busy) => LoginState {
                is_busy,
                ..state.clone()
            },
            LoginMutation::SetAutoCompleteEmails(emails) => LoginState {
                auto_complete_emails: Some(emails),
                ..state.clone()
            },
        };
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxreactor_testing::ReduceTest;

    #[test]
    fn test_blank_username_is_invalid() {
        ReduceTest::new(LoginReactor::new(InMemoryContacts::default()))
            .given_state(LoginState::default())
            .when_mutation(LoginMutation::SetUsername("   ".to_string()))
            .then_state(|state| {
                assert!(!state.is_username_valid);
                assert!(!state.login_enabled());
            })
            .run();
    }

    #[test]
    fn test_login_enabled_with_both_fields() {
        ReduceTest::new(LoginReactor::new(InMemoryContacts::default()))
            .given_state(LoginState::default())
            .when_mutations([
                LoginMutation::SetUsername("joe@example.com".to_string()),
                LoginMutation::SetPassword("hello".to_string()),
            ])
            .then_state(|state| assert!(state.login_enabled()))
            .run();
    }

    #[tokio::test]
    async fn test_enter_screen_produces_nothing() {
        let reactor = LoginReactor::new(InMemoryContacts::default());
        let context = Context::detached(LoginState::default());
        let mutations: Vec<_> = reactor.mutate(LoginAction::EnterScreen, &context).collect().await;
        assert!(mutations.is_empty());
    }
}
