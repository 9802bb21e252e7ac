use rand::Rng;

use crate::utils::constants::TEMP_PASSWORD_LENGTH;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()-_=+";

/// Throwaway password for a new account; the user sets their own through the reset email.
pub fn generate_temp_password() -> String {
    generate_password(TEMP_PASSWORD_LENGTH)
}

pub fn generate_password(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}
