/// Share token generation
///
/// A token is the only thing standing between a stranger and a photo, so
/// it comes from the OS random source (UUID v4, 122 random bits) and never
/// from a counter or the clock.

use uuid::Uuid;

/// Length of a generated token in its hyphenated form
pub const GENERATED_TOKEN_LEN: usize = 36;

/// Fresh random share token, e.g. `0f8fad5b-d9cb-469f-a165-70867728950e`
pub fn generate_token() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// Treat an absent or blank client token as "generate one"
pub(crate) fn normalize_requested(token: Option<&str>) -> Option<String> {
    token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
