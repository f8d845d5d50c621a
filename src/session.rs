use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Transaction, TransactionDraft};
use crate::oauth::{AuthFlow, Completion, Location, Redirect, TokenStore};
use crate::sheets::{Authorizer, HttpTransport, SheetAdapter, SheetTransport};
use chrono::Utc;
use rand::Rng;
use tracing::{debug, warn};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// Builds an adapter for a credential; called again after every sign-in.
pub type Connector<T> = Box<dyn Fn(&Config, Authorizer) -> Result<SheetAdapter<T>>>;

/// Outcome of asking to be signed in.
#[derive(Debug)]
pub enum SignIn {
    Authenticated,
    /// The browser has to visit this URL; the run ends here.
    Redirect(Redirect),
}

/// The ledger as seen by a user: one spreadsheet, one credential, the last
/// fetched list and the last error.
pub struct Ledger<T> {
    config: Config,
    configured: bool,
    auth: Option<AuthFlow>,
    adapter: Option<SheetAdapter<T>>,
    connect: Connector<T>,
    transactions: Vec<Transaction>,
    error: Option<String>,
}

impl Ledger<HttpTransport> {
    /// Signed-in access, resuming a stored token if there is one.
    pub fn open(config: Config, tokens: TokenStore) -> Self {
        Self::with_connector(config, tokens, Box::new(SheetAdapter::<HttpTransport>::connect))
    }

    /// Read access with the configured API key; no sign-in involved.
    pub fn open_read_only(config: Config) -> Self {
        Self::read_only_with_connector(config, Box::new(SheetAdapter::<HttpTransport>::connect))
    }
}

impl<T> Ledger<T>
where
    T: SheetTransport + Sync,
{
    pub fn with_connector(config: Config, tokens: TokenStore, connect: Connector<T>) -> Self {
        let mut ledger = Self::unconnected(config, connect);

        let auth = ledger
            .config
            .google
            .validate_oauth()
            .and_then(|()| AuthFlow::new(&ledger.config.google, tokens));
        match auth {
            Ok(auth) => {
                ledger.configured = true;
                let authenticated = auth.is_authenticated();
                ledger.auth = Some(auth);
                if authenticated {
                    let result = ledger.reconnect();
                    let _ = ledger.track(result);
                }
            }
            Err(e) => ledger.error = Some(e.to_string()),
        }
        ledger
    }

    pub fn read_only_with_connector(config: Config, connect: Connector<T>) -> Self {
        let mut ledger = Self::unconnected(config, connect);

        let adapter = ledger
            .config
            .google
            .validate_api_key()
            .map(|key| Authorizer::ApiKey(key.to_string()))
            .and_then(|authorizer| (ledger.connect)(&ledger.config, authorizer));
        match adapter {
            Ok(adapter) => {
                ledger.configured = true;
                ledger.adapter = Some(adapter);
            }
            Err(e) => ledger.error = Some(e.to_string()),
        }
        ledger
    }

    fn unconnected(config: Config, connect: Connector<T>) -> Self {
        Self {
            config,
            configured: false,
            auth: None,
            adapter: None,
            connect,
            transactions: Vec::new(),
            error: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.as_ref().is_some_and(AuthFlow::is_authenticated)
    }

    /// The most recent failure, cleared by the next success.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The list as of the last fetch.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Report an existing session or hand back the redirect that starts one.
    pub fn sign_in(&mut self, location: &impl Location) -> Result<SignIn> {
        let result = match self.auth.as_mut() {
            None => Err(not_configured()),
            Some(auth) if auth.is_authenticated() => Ok(SignIn::Authenticated),
            Some(auth) => auth.initiate_sign_in(location).map(SignIn::Redirect),
        };
        self.track(result)
    }

    /// Finish a sign-in from the location the provider sent the browser back to.
    pub fn complete_sign_in(&mut self, location: &mut impl Location) -> Result<SignIn> {
        let completion = match self.auth.as_mut() {
            None => Err(not_configured()),
            Some(auth) => auth.complete_authentication(location),
        };
        let result = match completion {
            Ok(Completion::Authenticated) => self.reconnect().map(|()| SignIn::Authenticated),
            Ok(Completion::RedirectRequired(redirect)) => Ok(SignIn::Redirect(redirect)),
            Err(e) => Err(e),
        };
        self.track(result)
    }

    pub fn sign_out(&mut self) -> Result<()> {
        self.adapter = None;
        self.transactions.clear();
        let result = match self.auth.as_mut() {
            Some(auth) => auth.sign_out(),
            None => Ok(()),
        };
        self.track(result)
    }

    /// Fetch the list again and keep it.
    pub async fn refresh(&mut self) -> Result<&[Transaction]> {
        let result = self.fetch().await;
        self.track(result)?;
        Ok(&self.transactions)
    }

    pub async fn list_all(&mut self) -> Result<Vec<Transaction>> {
        self.refresh().await.map(<[Transaction]>::to_vec)
    }

    /// Give the draft a fresh identifier and store it.
    pub async fn add(&mut self, draft: TransactionDraft) -> Result<Transaction> {
        let transaction = draft.with_id(generate_id());
        let result = match self.adapter() {
            Ok(adapter) => adapter.add(&transaction).await,
            Err(e) => Err(e),
        };
        self.settle(result).await?;
        Ok(transaction)
    }

    /// Replace the stored transaction that has the same identifier.
    pub async fn update(&mut self, transaction: Transaction) -> Result<()> {
        let result = match self.adapter() {
            Ok(adapter) => adapter.update(&transaction.id, &transaction).await,
            Err(e) => Err(e),
        };
        self.settle(result).await
    }

    pub async fn delete(&mut self, id: &str) -> Result<()> {
        let result = match self.adapter() {
            Ok(adapter) => adapter.delete(id).await,
            Err(e) => Err(e),
        };
        self.settle(result).await
    }

    pub async fn clear_all(&mut self) -> Result<()> {
        let result = match self.adapter() {
            Ok(adapter) => adapter.clear_all().await,
            Err(e) => Err(e),
        };
        self.settle(result).await
    }

    pub async fn initialize(&mut self) -> Result<()> {
        let result = match self.adapter() {
            Ok(adapter) => adapter.initialize().await,
            Err(e) => Err(e),
        };
        self.settle(result).await
    }

    pub async fn check_access(&self) -> Result<bool> {
        Ok(self.adapter()?.check_access().await)
    }

    fn adapter(&self) -> Result<&SheetAdapter<T>> {
        if !self.configured {
            return Err(not_configured());
        }
        self.adapter
            .as_ref()
            .ok_or_else(|| AppError::Auth("Please sign in to Google Sheets first".to_string()))
    }

    async fn fetch(&mut self) -> Result<()> {
        let transactions = self.adapter()?.list_all().await?;
        debug!(count = transactions.len(), "Refreshed transactions");
        self.transactions = transactions;
        Ok(())
    }

    /// Record a mutation's outcome and refresh after a successful one.
    ///
    /// The write has already landed by the time the refresh runs, so a failed
    /// refresh only shows up in `error()`.
    async fn settle(&mut self, result: Result<()>) -> Result<()> {
        self.track(result)?;
        let refreshed = self.fetch().await;
        let _ = self.track(refreshed);
        Ok(())
    }

    /// Build a new adapter around the current credential.
    fn reconnect(&mut self) -> Result<()> {
        let token = self
            .auth
            .as_ref()
            .and_then(AuthFlow::credential)
            .filter(|token| !token.is_expired())
            .cloned()
            .ok_or_else(|| AppError::Auth("Please sign in to Google Sheets first".to_string()))?;

        self.adapter = Some((self.connect)(&self.config, Authorizer::Bearer(token))?);
        Ok(())
    }

    fn track<R>(&mut self, result: Result<R>) -> Result<R> {
        match &result {
            Ok(_) => self.error = None,
            Err(e) => {
                warn!("{}", e);
                self.error = Some(e.to_string());
            }
        }
        result
    }
}

fn not_configured() -> AppError {
    AppError::Config("Google Sheets is not configured".to_string())
}

/// Millisecond timestamp followed by random base-36 characters.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", Utc::now().timestamp_millis(), suffix)
}
