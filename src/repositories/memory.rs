//! テスト用インメモリストア

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::{NewUser, PasswordResetStore, StoreError, UserStore};
use crate::models::{PasswordResetRecord, User};

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn password_hash_of(&self, user_id: i32) -> Option<String> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.password_hash.clone())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::UniqueViolation("users_email_key".to_string()));
        }

        let now = OffsetDateTime::now_utc();
        let user = User {
            id: users.len() as i32 + 1,
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_password(
        &self,
        user_id: i32,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.lock().unwrap();
        Ok(users.iter_mut().find(|u| u.id == user_id).map(|u| {
            u.password_hash = password_hash.to_string();
            u.updated_at = OffsetDateTime::now_utc();
            u.clone()
        }))
    }
}

#[derive(Default)]
pub struct InMemoryPasswordResetStore {
    records: Mutex<Vec<PasswordResetRecord>>,
}

impl InMemoryPasswordResetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<PasswordResetRecord> {
        self.records.lock().unwrap().clone()
    }

    /// 有効期限を書き換える（期限切れの再現用）
    pub fn set_expires_at(&self, id: i32, expires_at: OffsetDateTime) {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.iter_mut().find(|r| r.id == id) {
            record.expires_at = expires_at;
        }
    }
}

#[async_trait]
impl PasswordResetStore for InMemoryPasswordResetStore {
    async fn create(
        &self,
        user_id: i32,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<PasswordResetRecord, StoreError> {
        let mut records = self.records.lock().unwrap();
        let record = PasswordResetRecord {
            id: records.iter().map(|r| r.id).max().unwrap_or(0) + 1,
            user_id,
            token_hash: token_hash.to_string(),
            expires_at,
            used_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.token_hash == token_hash).cloned())
    }

    async fn mark_as_used(&self, id: i32) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.id == id && r.used_at.is_none()) {
            Some(record) => {
                record.used_at = Some(OffsetDateTime::now_utc());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn supersede_older(&self, user_id: i32, keep_id: i32) -> Result<u64, StoreError> {
        let mut records = self.records.lock().unwrap();
        let now = OffsetDateTime::now_utc();
        let mut count = 0;
        for record in records
            .iter_mut()
            .filter(|r| r.user_id == user_id && r.id < keep_id && r.used_at.is_none())
        {
            record.used_at = Some(now);
            count += 1;
        }
        Ok(count)
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let mut records = self.records.lock().unwrap();
        let now = OffsetDateTime::now_utc();
        let before = records.len();
        records.retain(|r| r.expires_at >= now);
        Ok((before - records.len()) as u64)
    }
}
