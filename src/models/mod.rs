pub mod password_reset_record;
pub mod user;

pub use password_reset_record::PasswordResetRecord;
pub use user::User;
