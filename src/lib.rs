//! shopgate: ストア API の認証・パスワードリセット基盤
//!
//! - HMAC 署名のアクセストークン発行・検証（`token`）
//! - 保護ルート用の認証ミドルウェア（`middleware`）
//! - パスワードリセット（`services::password_reset`）
//! - argon2id によるパスワードハッシュ（`services::password`）

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod router;
pub mod services;
pub mod state;
pub mod token;
