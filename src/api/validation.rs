use super::ApiError;

const MAX_CITY_NAME_CHARS: usize = 100;

pub fn validate_city_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("City name cannot be empty"));
    }

    if trimmed.chars().count() > MAX_CITY_NAME_CHARS {
        return Err(ApiError::validation(format!(
            "City name must be {} characters or less",
            MAX_CITY_NAME_CHARS
        )));
    }

    Ok(trimmed)
}

/// Autocomplete accepts short or empty input, only oversized queries are rejected.
pub fn validate_autocomplete_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.chars().count() > MAX_CITY_NAME_CHARS {
        return Err(ApiError::validation(format!(
            "Query must be {} characters or less",
            MAX_CITY_NAME_CHARS
        )));
    }
    Ok(trimmed)
}

pub fn validate_credentials<'a>(
    username: &'a str,
    password: &'a str,
) -> Result<(&'a str, &'a str), ApiError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }
    Ok((username, password))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_city_name() {
        assert_eq!(validate_city_name("  Berlin ").unwrap(), "Berlin");
        assert!(validate_city_name("São Paulo").is_ok());
        assert!(validate_city_name("").is_err());
        assert!(validate_city_name("   ").is_err());
        assert!(validate_city_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_autocomplete_query() {
        assert_eq!(validate_autocomplete_query("").unwrap(), "");
        assert_eq!(validate_autocomplete_query(" b ").unwrap(), "b");
        assert!(validate_autocomplete_query(&"y".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_credentials() {
        assert!(validate_credentials("admin", "password").is_ok());
        assert!(validate_credentials(" ", "password").is_err());
        assert!(validate_credentials("admin", "").is_err());
    }
}
