mod csrf;
mod signing_key;

pub use csrf::{issue, verify, CsrfFailure, IssuedCsrfToken, CSRF_COOKIE_NAME};
pub use signing_key::SigningKey;

use base64::{
    alphabet,
    engine::{self, general_purpose},
};

lazy_static::lazy_static! {
    // Base64 engine shared by token signing and verification
    pub(crate) static ref BASE64_ENGINE: engine::GeneralPurpose =
        engine::GeneralPurpose::new(&alphabet::URL_SAFE, general_purpose::NO_PAD);
}
