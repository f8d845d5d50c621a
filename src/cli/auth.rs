use crate::config::Config;
use crate::error::{AppError, Result};
use crate::oauth::{AuthFlow, CapturedLocation, TokenStore};
use crate::session::{Ledger, SignIn};
use crate::sheets::HttpTransport;
use anyhow::anyhow;
use clap::Subcommand;
use dialoguer::Input;
use tracing::{info, warn};

#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Sign in to Google Sheets through the browser
    Signin {
        /// Print the sign-in URL without opening a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Finish signing in from the URL the browser was sent back to
    Complete { url: String },
    /// Forget the stored Google token
    Signout,
    /// Show whether a usable token is stored
    Status,
}

impl AuthAction {
    pub async fn execute(&self) -> Result<()> {
        let config = Config::load()?;
        config.google.validate_oauth()?;
        let mut ledger = Ledger::open(config, TokenStore::persisted()?);

        match self {
            AuthAction::Signin { no_browser } => sign_in(&mut ledger, *no_browser).await,
            AuthAction::Complete { url } => complete(&mut ledger, url).await,
            AuthAction::Signout => ledger.sign_out(),
            AuthAction::Status => status(&ledger).await,
        }
    }
}

async fn sign_in(ledger: &mut Ledger<HttpTransport>, no_browser: bool) -> Result<()> {
    let location = CapturedLocation::parse(&ledger.config().google.redirect_url)?;

    let redirect = match ledger.sign_in(&location)? {
        SignIn::Authenticated => {
            info!("Already signed in to Google Sheets");
            return Ok(());
        }
        SignIn::Redirect(redirect) => redirect,
    };

    println!("Open this URL to sign in:\n\n  {}\n", redirect.url);
    if !no_browser {
        if let Err(e) = open::that(redirect.url.as_str()) {
            warn!("Failed to open browser: {}", e);
        }
    }

    // The token comes back in the URL fragment, which never reaches a server
    let returned: String = Input::new()
        .with_prompt("Paste the URL the browser was sent back to")
        .interact_text()
        .map_err(|e| anyhow!("Failed to read redirect URL: {}", e))?;

    complete(ledger, &returned).await
}

async fn complete(ledger: &mut Ledger<HttpTransport>, url: &str) -> Result<()> {
    let mut location = CapturedLocation::parse(url.trim())?;
    if !AuthFlow::has_returned_token(&location) {
        warn!("The pasted URL carries no access token");
    }

    match ledger.complete_sign_in(&mut location)? {
        SignIn::Authenticated => {
            if ledger.check_access().await? {
                info!("Signed in to Google Sheets");
            } else {
                warn!("Signed in, but the spreadsheet could not be reached");
            }
            Ok(())
        }
        SignIn::Redirect(redirect) => Err(AppError::Auth(format!(
            "No access token in the pasted URL. Sign in again at {}",
            redirect.url
        ))),
    }
}

async fn status(ledger: &Ledger<HttpTransport>) -> Result<()> {
    if !ledger.is_authenticated() {
        info!("Not signed in to Google Sheets");
        return Ok(());
    }

    let reachable = ledger.check_access().await?;
    info!(reachable, sheet_id = %ledger.config().google.sheet_id, "Signed in to Google Sheets");
    Ok(())
}
