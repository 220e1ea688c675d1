//! Anti-CSRF state tokens for the OAuth redirect round trip.

use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::AppError;

/// Number of random bytes drawn, and number of characters returned.
pub const STATE_TOKEN_LEN: usize = 16;

/// Generate a fresh state token from the OS entropy source.
///
/// # Errors
/// Returns `AppError::Randomness` if the entropy source fails. There is no
/// fallback value: a login attempt without a random state must not proceed.
pub fn generate_state() -> Result<String, AppError> {
    state_from_rng(&mut OsRng)
}

fn state_from_rng<R: RngCore>(rng: &mut R) -> Result<String, AppError> {
    let mut buffer = [0u8; STATE_TOKEN_LEN];
    rng.try_fill_bytes(&mut buffer)
        .map_err(|e| AppError::Randomness(e.to_string()))?;

    let mut state = general_purpose::URL_SAFE.encode(buffer);
    state.truncate(STATE_TOKEN_LEN);
    Ok(state)
}
