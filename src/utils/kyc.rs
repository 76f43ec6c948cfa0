use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, AppResult};

static IFSC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{4}0[A-Z0-9]{6}$").expect("IFSC pattern is valid")
});

static ACCOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{9,18}$").expect("account pattern is valid"));

/// Bank details as stored for a seller. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankDetails {
    pub holder: Option<String>,
    pub account: Option<String>,
    pub ifsc: Option<String>,
}

/// 验证 IFSC 格式（4 位字母 + 0 + 6 位字母或数字）
pub fn validate_ifsc(ifsc: &str) -> AppResult<()> {
    if !IFSC_RE.is_match(ifsc) {
        return Err(AppError::KycIncomplete(
            "IFSC code is malformed (expected e.g. HDFC0001234)".to_string(),
        ));
    }
    Ok(())
}

/// 验证银行账号（9 到 18 位数字）
pub fn validate_account_number(account: &str) -> AppResult<()> {
    if !ACCOUNT_RE.is_match(account) {
        return Err(AppError::KycIncomplete(
            "Bank account number must be 9 to 18 digits".to_string(),
        ));
    }
    Ok(())
}

impl BankDetails {
    fn field<'a>(value: &'a Option<String>, name: &str) -> AppResult<&'a str> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::KycIncomplete(format!("{name} is missing")))
    }

    /// Ok when holder, account and IFSC are all present and well-formed.
    pub fn validate(&self) -> AppResult<()> {
        Self::field(&self.holder, "Account holder name")?;
        validate_account_number(Self::field(&self.account, "Bank account number")?)?;
        validate_ifsc(&Self::field(&self.ifsc, "IFSC code")?.to_ascii_uppercase())?;
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(holder: &str, account: &str, ifsc: &str) -> BankDetails {
        BankDetails {
            holder: Some(holder.to_string()),
            account: Some(account.to_string()),
            ifsc: Some(ifsc.to_string()),
        }
    }

    #[test]
    fn test_validate_ifsc() {
        assert!(validate_ifsc("HDFC0001234").is_ok());
        assert!(validate_ifsc("SBIN0ABC123").is_ok());
        assert!(validate_ifsc("HDFC1001234").is_err());
        assert!(validate_ifsc("HDF00001234").is_err());
        assert!(validate_ifsc("HDFC000123").is_err());
    }

    #[test]
    fn test_validate_account_number() {
        assert!(validate_account_number("123456789").is_ok());
        assert!(validate_account_number("123456789012345678").is_ok());
        assert!(validate_account_number("12345678").is_err());
        assert!(validate_account_number("1234567890123456789").is_err());
        assert!(validate_account_number("12345678a").is_err());
    }

    #[test]
    fn test_bank_details_complete() {
        assert!(details("Asha Stores", "001122334455", "hdfc0001234").is_complete());
        assert!(!details("  ", "001122334455", "HDFC0001234").is_complete());
        assert!(!details("Asha", "0011", "HDFC0001234").is_complete());
        assert!(!BankDetails::default().is_complete());
    }
}
