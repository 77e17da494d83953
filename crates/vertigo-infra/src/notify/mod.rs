//! Recovery notification dispatchers.

mod log;

pub use log::LogDispatcher;

#[cfg(feature = "mailgun")]
mod mailgun;
#[cfg(feature = "mailgun")]
pub use mailgun::{MailgunConfig, MailgunDispatcher};

use uuid::Uuid;

/// Password reset link for a recovery token.
///
/// A bare hostname is served over https.
pub fn recovery_link(hostname: &str, account_id: Uuid, token: &str) -> String {
    let base = hostname.trim().trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{base}/user/reset/{account_id}/{token}")
    } else {
        format!("https://{base}/user/reset/{account_id}/{token}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_link() {
        let id = Uuid::nil();

        assert_eq!(
            recovery_link("example.com", id, "abc"),
            format!("https://example.com/user/reset/{id}/abc")
        );
        assert_eq!(
            recovery_link("http://localhost:3000/", id, "abc"),
            format!("http://localhost:3000/user/reset/{id}/abc")
        );
    }
}
