use crate::error::{AppError, Result};
use url::Url;

/// The navigation URL the app was loaded from.
///
/// After an authorization redirect the provider hands the token back in this
/// URL's fragment; it is the only state that survives the round trip.
pub trait Location {
    fn current(&self) -> &Url;

    /// Swap the visible URL without navigating (history replace).
    fn replace(&mut self, url: Url);
}

/// A location captured as a value, e.g. a redirect-back URL pasted by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedLocation {
    url: Url,
}

impl CapturedLocation {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input.trim())
            .map_err(|e| AppError::Auth(format!("Failed to parse redirect URL: {}", e)))?;
        Ok(Self::new(url))
    }
}

impl Location for CapturedLocation {
    fn current(&self) -> &Url {
        &self.url
    }

    fn replace(&mut self, url: Url) {
        self.url = url;
    }
}

/// Origin and path of `url`, which is where the provider should send the browser back to.
pub(crate) fn origin_and_path(url: &Url) -> Url {
    let mut target = url.clone();
    target.set_query(None);
    target.set_fragment(None);
    target
}
