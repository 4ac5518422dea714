// Input validation for registration APIs
//
// Last-resort limits to guard against abuse. These are hard limits, not
// configurable. Everything here runs before any storage call.

use eventdesk_core::{RegistrationError, Result, MAX_BULK_IDS};
use uuid::Uuid;

/// Maximum size of a free-text reason attached to a status change.
pub const MAX_REASON_BYTES: usize = 2 * 1024; // 2 KB

/// Parse a request id list. Count limits are enforced here so an oversized
/// list is rejected before any id is parsed.
pub fn parse_ids(raw: &[String]) -> Result<Vec<Uuid>> {
    if raw.is_empty() {
        return Err(RegistrationError::validation("At least one id is required"));
    }
    if raw.len() > MAX_BULK_IDS {
        return Err(RegistrationError::validation(format!(
            "At most {MAX_BULK_IDS} ids may be processed at once"
        )));
    }
    raw.iter()
        .map(|s| {
            Uuid::parse_str(s.trim())
                .map_err(|_| RegistrationError::validation(format!("Invalid id: {s}")))
        })
        .collect()
}

/// Trim a reason and drop it when blank
pub fn normalize_reason(reason: Option<String>) -> Result<Option<String>> {
    let Some(reason) = reason else {
        return Ok(None);
    };
    if reason.len() > MAX_REASON_BYTES {
        tracing::warn!(
            "Reason exceeds limit: {} bytes (max: {})",
            reason.len(),
            MAX_REASON_BYTES
        );
        return Err(RegistrationError::validation("Reason is too long"));
    }
    let trimmed = reason.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids() {
        let id = Uuid::now_v7();
        assert_eq!(parse_ids(&[id.to_string()]).unwrap(), vec![id]);
        assert!(parse_ids(&[]).is_err());
        assert!(parse_ids(&["not-a-uuid".to_string()]).is_err());

        let too_many: Vec<String> = (0..=MAX_BULK_IDS).map(|_| Uuid::now_v7().to_string()).collect();
        let err = parse_ids(&too_many).unwrap_err();
        assert!(matches!(err, RegistrationError::Validation(_)));
    }

    #[test]
    fn test_normalize_reason() {
        assert_eq!(normalize_reason(None).unwrap(), None);
        assert_eq!(normalize_reason(Some("   ".to_string())).unwrap(), None);
        assert_eq!(
            normalize_reason(Some(" Full house ".to_string())).unwrap(),
            Some("Full house".to_string())
        );
        assert!(normalize_reason(Some("x".repeat(MAX_REASON_BYTES + 1))).is_err());
    }
}
