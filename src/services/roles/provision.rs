/*
 * Responsibility
 * - 未登録ユーザーの自動作成に使う初期パスワードと注記の生成
 * - 実際の作成は UserStore::create が担当する
 */
use rand::{Rng, distributions::Alphanumeric, rngs::OsRng};

pub const INITIAL_PASSWORD_LEN: usize = 30;

/// Random alphanumeric credential for a provisioned account.
///
/// Nobody is told this password; the account is only reachable through the identity provider.
pub fn generate_initial_password() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(INITIAL_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

pub fn provisioning_note(user_name: &str) -> String {
    format!("Autogenerated user {user_name} from the identity provider")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_thirty_alphanumeric_chars() {
        let password = generate_initial_password();

        assert_eq!(password.len(), INITIAL_PASSWORD_LEN);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn passwords_differ_between_calls() {
        assert_ne!(generate_initial_password(), generate_initial_password());
    }

    #[test]
    fn note_names_the_user() {
        assert_eq!(
            provisioning_note("alice"),
            "Autogenerated user alice from the identity provider"
        );
    }
}
