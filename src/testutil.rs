//! In-memory substitutes for the external collaborators, used by the service
//! and middleware tests.

use crate::config::config::Config;
use crate::models::account::{Account, AccountFilter, Profile};
use crate::models::image::Image;
use crate::models::post::Post;
use crate::repository::database::{
    AccountStore, ImageStore, PostStore, ProfileStore, StoreError,
};
use crate::repository::redis::{CacheError, CacheStore};
use crate::service::auth::AuthService;
use crate::service::image::ImageService;
use crate::service::post::PostService;
use crate::service::profile::ProfileService;
use crate::util::send_email::{MailError, MailSender};
use crate::util::token::TokenCodec;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<HashMap<String, Account>>,
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get_account(&self, filter: AccountFilter) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.lock().unwrap();
        let found = match filter {
            AccountFilter::Id(id) => accounts.get(&id).cloned(),
            AccountFilter::Email(email) => {
                accounts.values().find(|a| a.email == email).cloned()
            }
        };
        Ok(found)
    }

    async fn insert_account(&self, account: Account) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::DuplicateEmail);
        }
        accounts.insert(account.account_id.clone(), account.clone());
        Ok(account)
    }

    async fn update_is_verified(&self, account_id: &str, verified: bool) -> Result<(), StoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.get_mut(account_id) {
            account.is_verified = verified;
        }
        Ok(())
    }

    async fn update_salt_and_password(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(stored) = accounts.get_mut(&account.account_id) {
            stored.salt = account.salt.clone();
            stored.password = account.password.clone();
        }
        Ok(())
    }
}

impl MemoryAccountStore {
    pub fn remove(&self, account_id: &str) {
        self.accounts.lock().unwrap().remove(account_id);
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<Vec<Profile>>,
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        self.profiles.lock().unwrap().push(profile.clone());
        Ok(())
    }

    async fn get_profile(&self, account_id: &str) -> Result<Option<Profile>, StoreError> {
        let profiles = self.profiles.lock().unwrap();
        Ok(profiles.iter().find(|p| p.account_id == account_id).cloned())
    }

    async fn update_full_name(
        &self,
        account_id: &str,
        full_name: &str,
    ) -> Result<usize, StoreError> {
        let mut profiles = self.profiles.lock().unwrap();
        let mut updated = 0;
        for profile in profiles.iter_mut().filter(|p| p.account_id == account_id) {
            profile.full_name = full_name.to_string();
            updated += 1;
        }
        Ok(updated)
    }
}

impl MemoryProfileStore {
    pub fn len(&self) -> usize {
        self.profiles.lock().unwrap().len()
    }
}

#[derive(Default)]
pub struct MemoryPostStore {
    posts: Mutex<Vec<Post>>,
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn insert_post(&self, post: Post) -> Result<Post, StoreError> {
        self.posts.lock().unwrap().push(post.clone());
        Ok(post)
    }

    async fn list_posts(
        &self,
        account_id: &str,
        limit: i64,
        before: Option<NaiveDateTime>,
    ) -> Result<Vec<Post>, StoreError> {
        let posts = self.posts.lock().unwrap();
        let mut matched: Vec<Post> = posts
            .iter()
            .filter(|p| p.account_id == account_id)
            .filter(|p| before.map_or(true, |cursor| p.date < cursor))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.date.cmp(&a.date));
        matched.truncate(limit as usize);
        Ok(matched)
    }

    async fn delete_post(&self, post_id: &str, account_id: &str) -> Result<usize, StoreError> {
        let mut posts = self.posts.lock().unwrap();
        let len_before = posts.len();
        posts.retain(|p| !(p.post_id == post_id && p.account_id == account_id));
        Ok(len_before - posts.len())
    }
}

impl MemoryPostStore {
    /// Rewrites a post's date so listing-order tests do not depend on clock
    /// resolution.
    pub fn backdate(&self, post_id: &str, date: NaiveDateTime) {
        let mut posts = self.posts.lock().unwrap();
        if let Some(post) = posts.iter_mut().find(|p| p.post_id == post_id) {
            post.date = date;
        }
    }
}

#[derive(Default)]
pub struct MemoryImageStore {
    images: Mutex<Vec<Image>>,
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn insert_image(&self, image: &Image) -> Result<(), StoreError> {
        self.images.lock().unwrap().push(image.clone());
        Ok(())
    }
}

impl MemoryImageStore {
    pub fn len(&self) -> usize {
        self.images.lock().unwrap().len()
    }
}

/// Entries expire the same way redis evicts them: a get past the expiry
/// behaves as a miss.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, i64)>>,
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn set(&self, key: &str, value: &str, expire_at_unix: i64) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), expire_at_unix));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.get(key).and_then(|(value, expire_at)| {
            if *expire_at > 0 && Utc::now().timestamp() >= *expire_at {
                None
            } else {
                Some(value.clone())
            }
        }))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

impl MemoryCache {
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn overwrite(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(key) {
            entry.0 = value.to_string();
        }
    }
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn send_mail(&self, to: &[String], subject: &str, body: &str) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_vec(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        redis_url: "redis://unused".to_string(),
        jwt_secret: "test-secret".to_string(),
        host: "http://localhost:8080".to_string(),
        access_token_max_age: 15,
        refresh_token_max_age: 60,
        email_token_max_age: 15,
        reset_token_max_age: 24 * 60,
        smtp_host: "localhost".to_string(),
        smtp_port: 2525,
        smtp_username: "unused".to_string(),
        smtp_password: "unused".to_string(),
        smtp_from: "Blog <noreply@blog.test>".to_string(),
        email_verification_subject: "Verify your email".to_string(),
        reset_password_subject: "Reset your password".to_string(),
        upload_dir: std::env::temp_dir()
            .join(format!("blog-upload-{}", Uuid::new_v4()))
            .to_string_lossy()
            .into_owned(),
    }
}

pub struct TestHarness {
    pub auth: AuthService,
    pub posts: PostService,
    pub profile: ProfileService,
    pub images: ImageService,
    pub accounts: Arc<MemoryAccountStore>,
    pub profiles: Arc<MemoryProfileStore>,
    pub post_store: Arc<MemoryPostStore>,
    pub image_store: Arc<MemoryImageStore>,
    pub cache: Arc<MemoryCache>,
    pub mailer: Arc<RecordingMailer>,
    pub codec: TokenCodec,
    pub config: Config,
}

pub fn test_harness() -> TestHarness {
    let config = test_config();
    let accounts = Arc::new(MemoryAccountStore::default());
    let profiles = Arc::new(MemoryProfileStore::default());
    let post_store = Arc::new(MemoryPostStore::default());
    let image_store = Arc::new(MemoryImageStore::default());
    let cache = Arc::new(MemoryCache::default());
    let mailer = Arc::new(RecordingMailer::default());
    let codec = TokenCodec::new(&config.jwt_secret);

    let auth = AuthService::new(
        accounts.clone(),
        profiles.clone(),
        cache.clone(),
        mailer.clone(),
        codec.clone(),
        config.clone(),
    );
    let posts = PostService::new(post_store.clone());
    let profile = ProfileService::new(accounts.clone(), profiles.clone());
    let images = ImageService::new(image_store.clone(), &config);

    TestHarness {
        auth,
        posts,
        profile,
        images,
        accounts,
        profiles,
        post_store,
        image_store,
        cache,
        mailer,
        codec,
        config,
    }
}
