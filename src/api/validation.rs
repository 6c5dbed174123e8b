use super::ApiError;
use crate::services::register_service::RegistrationRequest;

const MAX_NAME_LEN: usize = 100;
const MAX_DOCUMENT_NAME_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Email cannot be empty"));
    }

    let mut parts = trimmed.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ApiError::validation(format!(
            "Invalid email address: {trimmed}"
        )));
    }

    Ok(trimmed)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(password)
}

pub fn validate_account_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Account name cannot be empty"));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(ApiError::validation(format!(
            "Account name must be {MAX_NAME_LEN} characters or less"
        )));
    }
    Ok(trimmed)
}

pub fn validate_person_name(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} cannot be empty")));
    }
    if value.len() > MAX_NAME_LEN {
        return Err(ApiError::validation(format!(
            "{field} must be {MAX_NAME_LEN} characters or less"
        )));
    }
    Ok(())
}

pub fn validate_document_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Document name cannot be empty"));
    }
    if trimmed.len() > MAX_DOCUMENT_NAME_LEN {
        return Err(ApiError::validation(format!(
            "Document name must be {MAX_DOCUMENT_NAME_LEN} characters or less"
        )));
    }
    Ok(trimmed)
}

pub fn validate_token(token: &str) -> Result<&str, ApiError> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Token cannot be empty"));
    }
    Ok(trimmed)
}

pub fn validate_registration(request: &RegistrationRequest) -> Result<(), ApiError> {
    validate_email(&request.user.email)?;
    validate_password(&request.user.password)?;
    validate_person_name("First name", &request.user.first_name)?;
    validate_person_name("Last name", &request.user.last_name)?;
    validate_account_name(&request.account.name)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_email_without_domain() {
        assert!(validate_email("nobody@").is_err());
        assert!(validate_email("nobody@localhost").is_err());
        assert!(validate_email("nobody@example.com").is_ok());
    }

    #[test]
    fn rejects_short_passwords() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn trims_account_names() {
        assert_eq!(validate_account_name("  acme  ").unwrap(), "acme");
        assert!(validate_account_name("   ").is_err());
    }
}
