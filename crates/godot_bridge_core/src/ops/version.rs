use crate::{types::GodotVersion, BridgeError, OperationExecutor, Result};

/// First version whose headless tooling understands resource UIDs.
pub const MIN_UID_VERSION: (u32, u32) = (4, 4);

pub async fn godot_version(executor: &OperationExecutor) -> Result<GodotVersion> {
    let raw = executor.godot_version().await?;
    let (major, minor) =
        parse_version(&raw).ok_or_else(|| BridgeError::UnrecognizedVersion(raw.clone()))?;
    Ok(GodotVersion { raw, major, minor })
}

/// Leading `major.minor` of strings like `4.4.1.stable.official.49a5bc7b6`.
pub fn parse_version(raw: &str) -> Option<(u32, u32)> {
    let mut parts = raw.trim().split('.');
    let major = leading_number(parts.next()?)?;
    let minor = parts.next().and_then(leading_number).unwrap_or(0);
    Some((major, minor))
}

fn leading_number(part: &str) -> Option<u32> {
    let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

pub fn supports_uids(version: &GodotVersion) -> bool {
    (version.major, version.minor) >= MIN_UID_VERSION
}
