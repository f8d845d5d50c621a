use crate::config::{CLIENT_ID_PLACEHOLDER, GoogleConfig, is_unset};
use crate::error::{AppError, Result};
use crate::oauth::location::{Location, origin_and_path};
use crate::oauth::tokens::{AccessToken, TokenStore};
use google_sheets4::api::Scope as SheetsScope;
use oauth2::{AuthUrl, ClientId, CsrfToken, EndpointSet, RedirectUrl, Scope, basic::BasicClient};
use std::collections::HashMap;
use tracing::{debug, info, instrument};
use url::Url;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

// Read/write access to the user's spreadsheets
pub(crate) const AUTH_SCOPE: SheetsScope = SheetsScope::Spreadsheet;

// Only the authorization endpoint is needed; there is no code exchange
type ImplicitClient = BasicClient<EndpointSet>;

/// An authorization redirect the caller has to follow.
///
/// Following it ends the current run; the flow resumes from the URL the
/// provider sends the browser back to.
#[must_use]
#[derive(Debug)]
pub struct Redirect {
    pub url: Url,
}

#[derive(Debug)]
pub enum Completion {
    Authenticated,
    RedirectRequired(Redirect),
}

/// What the provider put in the fragment of the redirect-back URL.
#[derive(Debug, PartialEq)]
enum ReturnedFragment {
    Token {
        access_token: String,
        expires_in: Option<i64>,
        state: Option<String>,
    },
    Error {
        code: String,
        description: Option<String>,
    },
}

impl ReturnedFragment {
    fn parse(url: &Url) -> Option<Self> {
        let fragment = url.fragment()?;
        let mut params: HashMap<String, String> = url::form_urlencoded::parse(fragment.as_bytes())
            .into_owned()
            .collect();

        if let Some(code) = params.remove("error") {
            return Some(Self::Error {
                code,
                description: params.remove("error_description"),
            });
        }

        let access_token = params.remove("access_token").filter(|t| !t.is_empty())?;
        Some(Self::Token {
            access_token,
            expires_in: params.get("expires_in").and_then(|s| s.parse().ok()),
            state: params.remove("state"),
        })
    }
}

/// Drives the implicit-grant redirect flow.
///
/// `Unauthenticated → (redirect) → PendingReturn → (fragment parsed) → Authenticated`.
/// `PendingReturn` is never held in memory: it is re-derived from the location
/// every time the app starts.
#[derive(Debug)]
pub struct AuthFlow {
    client_id: ClientId,
    auth_url: AuthUrl,
    tokens: TokenStore,
}

impl AuthFlow {
    pub fn new(config: &GoogleConfig, tokens: TokenStore) -> Result<Self> {
        if is_unset(&config.client_id, CLIENT_ID_PLACEHOLDER) {
            return Err(AppError::Config("OAuth client ID is not configured".to_string()));
        }

        let auth_url = AuthUrl::new(GOOGLE_AUTH_URL.to_string())
            .map_err(|e| AppError::Config(format!("Invalid auth URL: {}", e)))?;

        Ok(Self {
            client_id: ClientId::new(config.client_id.clone()),
            auth_url,
            tokens,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_authenticated()
    }

    pub fn credential(&self) -> Option<&AccessToken> {
        self.tokens.current()
    }

    /// Authorization URL that returns to the current origin and path.
    pub fn build_authorization_url(&self, location: &impl Location) -> (Url, CsrfToken) {
        self.authorization_request(location, CsrfToken::new_random)
    }

    fn authorization_request<S>(&self, location: &impl Location, state_fn: S) -> (Url, CsrfToken)
    where
        S: FnOnce() -> CsrfToken,
    {
        let redirect_url = RedirectUrl::from_url(origin_and_path(location.current()));
        let client: ImplicitClient = BasicClient::new(self.client_id.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(redirect_url);

        client
            .authorize_url(state_fn)
            .use_implicit_flow()
            .add_scope(Scope::new(AUTH_SCOPE.as_ref().to_string()))
            .add_extra_param("include_granted_scopes", "true")
            .url()
    }

    /// Whether this load is the return leg of an authorization redirect.
    pub fn has_returned_token(location: &impl Location) -> bool {
        matches!(
            ReturnedFragment::parse(location.current()),
            Some(ReturnedFragment::Token { .. })
        )
    }

    /// Start a sign-in. Never authenticates by itself; the redirect must be followed.
    #[instrument(name = "Starting Google sign-in", skip_all)]
    pub fn initiate_sign_in(&mut self, location: &impl Location) -> Result<Redirect> {
        let (url, state) = self.build_authorization_url(location);
        self.tokens.remember_pending_state(state.secret())?;
        debug!(redirect_uri = %origin_and_path(location.current()), "Built authorization URL");
        Ok(Redirect { url })
    }

    /// Pick up the token from the location the provider redirected back to.
    ///
    /// The fragment is stripped from the visible location whether it carried a
    /// token or an error. Without either, a redirect is required unless a
    /// still-valid credential is already held.
    #[instrument(name = "Completing Google sign-in", skip_all)]
    pub fn complete_authentication(&mut self, location: &mut impl Location) -> Result<Completion> {
        let Some(returned) = ReturnedFragment::parse(location.current()) else {
            if self.is_authenticated() {
                return Ok(Completion::Authenticated);
            }
            return Ok(Completion::RedirectRequired(self.initiate_sign_in(location)?));
        };

        let stripped = origin_and_path(location.current());
        location.replace(stripped);
        let expected_state = self.tokens.take_pending_state()?;

        match returned {
            ReturnedFragment::Error { code, description } => {
                let message = match description {
                    Some(description) => format!("{}: {}", code, description),
                    None => code,
                };
                Err(AppError::Auth(format!(
                    "Provider refused authorization: {}",
                    message
                )))
            }
            ReturnedFragment::Token {
                access_token,
                expires_in,
                state,
            } => {
                if let Some(expected) = expected_state
                    && state.as_deref() != Some(expected.as_str())
                {
                    return Err(AppError::Auth(
                        "OAuth state mismatch - possible CSRF attack".to_string(),
                    ));
                }

                self.tokens.set(AccessToken::new(access_token, expires_in))?;
                info!("Signed in to Google Sheets");
                Ok(Completion::Authenticated)
            }
        }
    }

    /// Local-only sign-out; the token is not revoked with the provider.
    pub fn sign_out(&mut self) -> Result<()> {
        self.tokens.clear()?;
        info!("Signed out of Google Sheets");
        Ok(())
    }
}
