/// Fixed prefix shared by every individual-account SteamID64.
pub const STEAM_ID64_PREFIX: &str = "7656119";

/// Total length of a SteamID64 string.
pub const STEAM_ID64_LENGTH: usize = 17;

/// Validate a SteamID64. Must be exactly 17 ASCII digits starting with the
/// individual-account prefix.
pub fn validate_steam_id(id: &str) -> Result<(), String> {
    if id.len() != STEAM_ID64_LENGTH {
        return Err(format!(
            "A SteamID is exactly {STEAM_ID64_LENGTH} digits long"
        ));
    }
    if !id.chars().all(|c| c.is_ascii_digit()) {
        return Err("A SteamID contains only digits".into());
    }
    if !id.starts_with(STEAM_ID64_PREFIX) {
        return Err(format!("A SteamID starts with '{STEAM_ID64_PREFIX}'"));
    }
    Ok(())
}
