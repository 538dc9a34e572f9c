//! The `/` route: one permission check per request.

use crate::config::CheckErrorPolicy;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pdp_check_authz::{Action, PermissionCheck, Resource, User};
use std::fmt;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    /// Decision source, usually a `PdpClient`.
    pub checker: Arc<dyn PermissionCheck>,
    /// Placeholder user, action and resource.
    pub template: CheckTemplate,
    /// Behaviour when no decision is available.
    pub on_error: CheckErrorPolicy,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        checker: Arc<dyn PermissionCheck>,
        template: CheckTemplate,
        on_error: CheckErrorPolicy,
    ) -> Self {
        Self {
            checker,
            template,
            on_error,
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("template", &self.template)
            .field("on_error", &self.on_error)
            .finish_non_exhaustive()
    }
}

/// The user, action and resource checked on each request.
///
/// A real service would derive these from the authenticated session and
/// the request itself; this example uses configured placeholders.
#[derive(Debug, Clone)]
pub struct CheckTemplate {
    pub user: User,
    pub action: Action,
    pub resource: Resource,
}

/// Result of handling one request.
#[derive(Debug)]
pub enum CheckOutcome {
    Permitted(String),
    Denied(String),
    Unavailable(CheckErrorPolicy),
}

impl CheckOutcome {
    /// Builds the outcome for a decision the PDP did return.
    pub fn decided(permitted: bool, user: &User, action: &Action, resource: &Resource) -> Self {
        let verdict = if permitted {
            "PERMITTED"
        } else {
            "NOT PERMITTED"
        };
        let message = format!(
            "{} {} is {verdict} to {action} {}!",
            user.first_name(),
            user.last_name(),
            resource.resource_type
        );

        if permitted {
            Self::Permitted(message)
        } else {
            Self::Denied(message)
        }
    }
}

impl IntoResponse for CheckOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Permitted(message) => (StatusCode::OK, message).into_response(),
            Self::Denied(message) => (StatusCode::FORBIDDEN, message).into_response(),
            Self::Unavailable(CheckErrorPolicy::InternalError) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "authorization check failed",
            )
                .into_response(),
            Self::Unavailable(CheckErrorPolicy::Silent) => StatusCode::OK.into_response(),
        }
    }
}

/// Checks the placeholder user against the PDP and reports the decision.
pub async fn check_access(State(state): State<Arc<AppState>>) -> CheckOutcome {
    let user = state.template.user.clone();
    let resource = state.template.resource.clone();
    let action = &state.template.action;

    match state.checker.check(&user, action, &resource).await {
        Ok(permitted) => {
            tracing::debug!(user = %user.key, permitted, "decision received");
            CheckOutcome::decided(permitted, &user, action, &resource)
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                user = %user.key,
                action = %action,
                resource = %resource.resource_type,
                "Permission check failed"
            );
            CheckOutcome::Unavailable(state.on_error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckConfig;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use pdp_check_authz::AuthzError;
    use rootcause::prelude::Report;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Answers every check with a fixed result and records what it was asked.
    struct FakeChecker {
        answer: Result<bool, AuthzError>,
        calls: Mutex<Vec<(User, Action, Resource)>>,
    }

    impl FakeChecker {
        fn new(answer: Result<bool, AuthzError>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PermissionCheck for FakeChecker {
        async fn check(
            &self,
            user: &User,
            action: &Action,
            resource: &Resource,
        ) -> Result<bool, Report<AuthzError>> {
            self.calls.lock().expect("lock poisoned").push((
                user.clone(),
                action.clone(),
                resource.clone(),
            ));
            self.answer.clone().map_err(Into::into)
        }
    }

    fn state(checker: Arc<FakeChecker>, on_error: CheckErrorPolicy) -> Arc<AppState> {
        let template = CheckConfig::default().template().expect("default template");
        Arc::new(AppState::new(checker, template, on_error))
    }

    async fn get(state: Arc<AppState>, method: Method) -> (StatusCode, String) {
        let response = crate::router(state)
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn unavailable() -> AuthzError {
        AuthzError::ConnectionFailed {
            endpoint: "http://localhost:7766/allowed".to_string(),
            details: "connection refused".to_string(),
        }
    }

    #[tokio::test]
    async fn permitted_check_returns_200() {
        let checker = FakeChecker::new(Ok(true));
        let (status, body) = get(state(checker, CheckErrorPolicy::default()), Method::GET).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Jane Doe is PERMITTED to read document!");
    }

    #[tokio::test]
    async fn denied_check_returns_403() {
        let checker = FakeChecker::new(Ok(false));
        let (status, body) = get(state(checker, CheckErrorPolicy::default()), Method::GET).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, "Jane Doe is NOT PERMITTED to read document!");
    }

    #[tokio::test]
    async fn any_method_is_checked() {
        let checker = FakeChecker::new(Ok(true));
        let (status, _) = get(
            state(checker.clone(), CheckErrorPolicy::default()),
            Method::POST,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(checker.calls.lock().expect("lock poisoned").len(), 1);
    }

    #[tokio::test]
    async fn check_receives_placeholder_subject_and_resource() {
        let checker = FakeChecker::new(Ok(true));
        let app = state(checker.clone(), CheckErrorPolicy::default());
        get(app.clone(), Method::GET).await;
        get(app, Method::GET).await;

        let calls = checker.calls.lock().expect("lock poisoned");
        assert_eq!(calls.len(), 2);
        let (user, action, resource) = &calls[0];
        assert_eq!(user.key, "jane.doe@example.com");
        assert_eq!(user.email.as_deref(), Some("jane.doe@example.com"));
        assert_eq!(action.as_str(), "read");
        assert_eq!(resource.resource_type, "document");
    }

    #[tokio::test]
    async fn failed_check_returns_500_by_default() {
        let checker = FakeChecker::new(Err(unavailable()));
        let state = state(checker, CheckErrorPolicy::InternalError);
        let (status, body) = get(state, Method::GET).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "authorization check failed");
        assert!(!body.contains("connection refused"));
    }

    #[tokio::test]
    async fn failed_check_writes_nothing_when_silent() {
        let checker = FakeChecker::new(Err(unavailable()));
        let (status, body) = get(state(checker, CheckErrorPolicy::Silent), Method::GET).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
    }

    #[test]
    fn message_uses_resource_type_not_key() {
        let user = User::new("u1").with_first_name("Jane").with_last_name("Doe");
        let resource = Resource::new("document").with_key("doc-1");
        let outcome = CheckOutcome::decided(false, &user, &Action::from("read"), &resource);

        match outcome {
            CheckOutcome::Denied(message) => {
                assert_eq!(message, "Jane Doe is NOT PERMITTED to read document!");
            }
            other => panic!("expected denial, got {other:?}"),
        }
    }
}
