use super::ApiError;
use crate::domain::FieldErrors;

/// Ids are positive; anything else cannot name an existing row.
pub fn validate_resource_id(resource: &str, id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::not_found(resource, id));
    }
    Ok(id)
}

pub fn validate_image_upload(bytes: &[u8], max_bytes: usize) -> Result<&[u8], ApiError> {
    if bytes.is_empty() {
        return Err(FieldErrors::single("image", "The submitted file is empty.").into());
    }

    if bytes.len() > max_bytes {
        return Err(FieldErrors::single(
            "image",
            format!("Ensure the file is at most {max_bytes} bytes (it has {}).", bytes.len()),
        )
        .into());
    }

    Ok(bytes)
}

/// Pulls the token out of `Authorization: Bearer <t>` / `Authorization: Token <t>`.
pub fn parse_authorization(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !(scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token")) {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_resource_id() {
        assert!(validate_resource_id("Recipe", 1).is_ok());
        assert!(validate_resource_id("Recipe", 0).is_err());
        assert!(validate_resource_id("Recipe", -5).is_err());
    }

    #[test]
    fn test_validate_image_upload() {
        assert!(validate_image_upload(b"abc", 10).is_ok());
        assert!(validate_image_upload(b"", 10).is_err());
        assert!(validate_image_upload(&[0u8; 11], 10).is_err());
    }

    #[test]
    fn test_parse_authorization() {
        assert_eq!(parse_authorization("Bearer abc"), Some("abc"));
        assert_eq!(parse_authorization("Token abc "), Some("abc"));
        assert_eq!(parse_authorization("bearer   abc"), Some("abc"));
        assert_eq!(parse_authorization("Basic abc"), None);
        assert_eq!(parse_authorization("Bearer "), None);
        assert_eq!(parse_authorization("abc"), None);
    }
}
