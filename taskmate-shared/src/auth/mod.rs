/// Authentication utilities
///
/// - `jwt`: bearer-token creation and validation (HS256)
/// - `password`: Argon2id hashing and the signup strength check
/// - `middleware`: the authenticated-request context injected by the API
pub mod jwt;
pub mod middleware;
pub mod password;
