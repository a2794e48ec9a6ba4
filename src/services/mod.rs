pub mod auth;
pub mod cleanup;
pub mod email;
pub mod password;
pub mod password_reset;

pub use auth::AuthService;
pub use email::{LogMailer, Mailer};
pub use password::{CredentialHasher, HashCost};
pub use password_reset::PasswordResetService;
