use crate::errors::ServiceError;

/// Largest accepted page size for list endpoints.
pub const MAX_PER_PAGE: u64 = 100;

pub(crate) fn default_page() -> u64 {
    1
}

pub(crate) fn default_per_page() -> u64 {
    20
}

/// Rejects page/per_page values the paginator cannot serve.
pub fn validate_pagination(page: u64, per_page: u64) -> Result<(), ServiceError> {
    if page < 1 {
        return Err(ServiceError::ValidationError(
            "page must be at least 1".to_string(),
        ));
    }
    if per_page < 1 {
        return Err(ServiceError::ValidationError(
            "per_page must be at least 1".to_string(),
        ));
    }
    if per_page > MAX_PER_PAGE {
        return Err(ServiceError::ValidationError(format!(
            "per_page must be at most {}",
            MAX_PER_PAGE
        )));
    }
    Ok(())
}
