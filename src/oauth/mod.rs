mod flow;
mod location;
mod tokens;

pub use flow::{AuthFlow, Completion, Redirect};
pub use location::{CapturedLocation, Location};
pub use tokens::{AccessToken, TokenStore};
