use garde::Validate;

use crate::error::AppError;

/// garde のカスタムルール: 簡易的なメール形式チェック（@ が含まれているか）
pub fn email_format(value: &str, _ctx: &()) -> garde::Result {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(garde::Error::new("有効なメールアドレスを入力してください")),
    }
}

/// リクエストボディを検証し、失敗時は `AppError::Validation` に変換
pub fn validate_request<T>(request: &T) -> Result<(), AppError>
where
    T: Validate<Context = ()>,
{
    request
        .validate()
        .map_err(|report| AppError::Validation(report.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_format() {
        assert!(email_format("test@example.com", &()).is_ok());
        assert!(email_format("", &()).is_err());
        assert!(email_format("invalid-email", &()).is_err());
        assert!(email_format("@example.com", &()).is_err());
        assert!(email_format("user@", &()).is_err());
    }
}
