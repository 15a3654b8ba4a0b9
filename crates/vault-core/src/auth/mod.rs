//! Account authentication and session tokens

mod accounts;
mod authority;
mod password;
mod token;

pub use accounts::{Account, AccountService};
pub use authority::CredentialAuthority;
pub use password::{hash_password, PasswordHasher, PasswordScheme};
pub use token::{
    issue_token, verify_token, Claims, TokenSigner, TOKEN_HEADER, TOKEN_TTL_SECS,
};
