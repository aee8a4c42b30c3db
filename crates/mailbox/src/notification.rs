//! Unseen email counter for the user menu badge

use anyhow::Result;

use crate::models::{OrganizationId, UserId};
use crate::repository::EmailUserRepository;

/// Badge cap used when no configuration is given
pub const DEFAULT_BADGE_CAP: usize = 10;

/// Number of unseen rows for a user
pub fn count_unseen(
    repository: &EmailUserRepository,
    user: UserId,
    organization: OrganizationId,
) -> Result<usize> {
    repository
        .find_unseen_user_email(user, organization)
        .count(repository.store())
}

/// Badge text for an unseen count: empty, `(n)`, or `(cap+)` above the cap
pub fn format_badge(count: usize, cap: usize) -> String {
    match count {
        0 => String::new(),
        n if n > cap => format!("({}+)", cap),
        n => format!("({})", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_badge() {
        assert_eq!(format_badge(0, DEFAULT_BADGE_CAP), "");
        assert_eq!(format_badge(3, DEFAULT_BADGE_CAP), "(3)");
        assert_eq!(format_badge(10, DEFAULT_BADGE_CAP), "(10)");
        assert_eq!(format_badge(11, DEFAULT_BADGE_CAP), "(10+)");
        assert_eq!(format_badge(100, 99), "(99+)");
    }
}
