use subtle::{Choice, ConstantTimeEq};
use talentdesk_core::AppResult;
use talentdesk_domain::EmailAddress;

/// Operator accounts that are always resolved as administrators, regardless
/// of the persisted role store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowlist {
    emails: Vec<EmailAddress>,
}

impl AdminAllowlist {
    /// Creates an allowlist from validated addresses.
    #[must_use]
    pub fn new(emails: impl IntoIterator<Item = EmailAddress>) -> Self {
        let mut emails: Vec<EmailAddress> = emails.into_iter().collect();
        emails.sort_by(|left, right| left.as_str().cmp(right.as_str()));
        emails.dedup();
        Self { emails }
    }

    /// Parses a comma-separated list of addresses. Blank entries are skipped.
    pub fn parse(value: &str) -> AppResult<Self> {
        let emails = value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(EmailAddress::new)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self::new(emails))
    }

    /// Returns whether no operator is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    /// Returns the number of configured operators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    /// Returns whether the email belongs to a configured operator.
    ///
    /// Every entry is compared in constant time and the scan never stops
    /// early, so timing does not reveal which entry matched.
    #[must_use]
    pub fn contains(&self, email: &str) -> bool {
        let candidate = email.trim().to_lowercase();
        let matched = self
            .emails
            .iter()
            .fold(Choice::from(0), |matched, entry| {
                matched | entry.as_str().as_bytes().ct_eq(candidate.as_bytes())
            });

        bool::from(matched)
    }
}

#[cfg(test)]
mod tests {
    use talentdesk_core::AppResult;

    use super::AdminAllowlist;

    #[test]
    fn parse_skips_blank_entries_and_normalizes_case() -> AppResult<()> {
        let allowlist = AdminAllowlist::parse(" Ops@Example.com, ,hr@example.com,ops@example.com")?;
        assert_eq!(allowlist.len(), 2);
        assert!(allowlist.contains("ops@example.com"));
        assert!(allowlist.contains("  HR@EXAMPLE.COM "));
        Ok(())
    }

    #[test]
    fn parse_rejects_malformed_address() {
        assert!(AdminAllowlist::parse("ops@example.com,not-an-email").is_err());
    }

    #[test]
    fn empty_allowlist_matches_nobody() -> AppResult<()> {
        let allowlist = AdminAllowlist::parse("")?;
        assert!(allowlist.is_empty());
        assert!(!allowlist.contains(""));
        assert!(!allowlist.contains("ops@example.com"));
        Ok(())
    }

    #[test]
    fn prefix_of_an_entry_does_not_match() -> AppResult<()> {
        let allowlist = AdminAllowlist::parse("ops@example.com")?;
        assert!(!allowlist.contains("ops@example.co"));
        Ok(())
    }
}
