use crate::config::config::Config;
use crate::models::account::{Account, AccountFilter, Profile};
use crate::models::image::Image;
use crate::models::post::Post;
use crate::models::schema::{accounts, images, posts, profiles};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use deadpool::managed::Object;
use diesel::result::DatabaseErrorKind;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::{
    pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager},
    AsyncPgConnection, RunQueryDsl,
};
use thiserror::Error;

pub type DBPool = deadpool::managed::Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("email has already been used")]
    DuplicateEmail,
    #[error("database error : {0}")]
    Database(diesel::result::Error),
    #[error("could not get database connection from pool : {0}")]
    Pool(diesel_async::pooled_connection::deadpool::PoolError),
}

/// CRUD contract over persisted account records. The session manager and the
/// verification flow only ever see this trait, never the database.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get_account(&self, filter: AccountFilter) -> Result<Option<Account>>;
    async fn insert_account(&self, account: Account) -> Result<Account>;
    async fn update_is_verified(&self, account_id: &str, verified: bool) -> Result<()>;
    async fn update_salt_and_password(&self, account: &Account) -> Result<()>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn insert_profile(&self, profile: &Profile) -> Result<()>;
    async fn get_profile(&self, account_id: &str) -> Result<Option<Profile>>;
    /// Returns the number of rows touched so callers can tell a missing
    /// profile from a successful update.
    async fn update_full_name(&self, account_id: &str, full_name: &str) -> Result<usize>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: Post) -> Result<Post>;
    /// Newest first, strictly older than `before` when a cursor is given.
    async fn list_posts(
        &self,
        account_id: &str,
        limit: i64,
        before: Option<NaiveDateTime>,
    ) -> Result<Vec<Post>>;
    /// Scoped to the owning account; returns the number of rows deleted.
    async fn delete_post(&self, post_id: &str, account_id: &str) -> Result<usize>;
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn insert_image(&self, image: &Image) -> Result<()>;
}

pub struct Database {
    pool: DBPool,
}

impl Database {
    pub fn new(config: &Config) -> Self {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(
            config.database_url.to_owned(),
        );
        let pool = Pool::builder(manager)
            .build()
            .expect("Failed to create pool.");
        Database { pool }
    }

    async fn get_db_conn(&self) -> Result<Object<AsyncDieselConnectionManager<AsyncPgConnection>>> {
        self.pool.get().await.map_err(StoreError::Pool)
    }
}

#[async_trait]
impl AccountStore for Database {
    async fn get_account(&self, filter: AccountFilter) -> Result<Option<Account>> {
        let mut conn = self.get_db_conn().await?;

        let found = match filter {
            AccountFilter::Id(id) => {
                accounts::table
                    .filter(accounts::account_id.eq(id))
                    .first::<Account>(&mut conn)
                    .await
            }
            AccountFilter::Email(email) => {
                accounts::table
                    .filter(accounts::email.eq(email))
                    .first::<Account>(&mut conn)
                    .await
            }
        };

        found.optional().map_err(StoreError::Database)
    }

    async fn insert_account(&self, account: Account) -> Result<Account> {
        let mut conn = self.get_db_conn().await?;

        diesel::insert_into(accounts::table)
            .values(&account)
            .execute(&mut conn)
            .await
            .map_err(|err| match err {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    StoreError::DuplicateEmail
                }
                err => {
                    log::error!("error inserting account: {:?}", err);
                    StoreError::Database(err)
                }
            })?;

        Ok(account)
    }

    async fn update_is_verified(&self, account_id: &str, verified: bool) -> Result<()> {
        let mut conn = self.get_db_conn().await?;

        diesel::update(accounts::table.filter(accounts::account_id.eq(account_id)))
            .set((
                accounts::is_verified.eq(verified),
                accounts::updated_at.eq(Some(Utc::now().naive_utc())),
            ))
            .execute(&mut conn)
            .await
            .map_err(StoreError::Database)?;

        Ok(())
    }

    async fn update_salt_and_password(&self, account: &Account) -> Result<()> {
        let mut conn = self.get_db_conn().await?;

        diesel::update(accounts::table.filter(accounts::account_id.eq(&account.account_id)))
            .set((
                accounts::password.eq(&account.password),
                accounts::salt.eq(&account.salt),
                accounts::updated_at.eq(Some(Utc::now().naive_utc())),
            ))
            .execute(&mut conn)
            .await
            .map_err(StoreError::Database)?;

        Ok(())
    }
}

#[async_trait]
impl ProfileStore for Database {
    async fn insert_profile(&self, profile: &Profile) -> Result<()> {
        let mut conn = self.get_db_conn().await?;

        diesel::insert_into(profiles::table)
            .values(profile)
            .execute(&mut conn)
            .await
            .map_err(StoreError::Database)?;

        Ok(())
    }

    async fn get_profile(&self, account_id: &str) -> Result<Option<Profile>> {
        let mut conn = self.get_db_conn().await?;

        profiles::table
            .filter(profiles::account_id.eq(account_id))
            .first::<Profile>(&mut conn)
            .await
            .optional()
            .map_err(StoreError::Database)
    }

    async fn update_full_name(&self, account_id: &str, full_name: &str) -> Result<usize> {
        let mut conn = self.get_db_conn().await?;

        diesel::update(profiles::table.filter(profiles::account_id.eq(account_id)))
            .set(profiles::full_name.eq(full_name))
            .execute(&mut conn)
            .await
            .map_err(StoreError::Database)
    }
}

#[async_trait]
impl PostStore for Database {
    async fn insert_post(&self, post: Post) -> Result<Post> {
        let mut conn = self.get_db_conn().await?;

        diesel::insert_into(posts::table)
            .values(&post)
            .execute(&mut conn)
            .await
            .map_err(StoreError::Database)?;

        Ok(post)
    }

    async fn list_posts(
        &self,
        account_id: &str,
        limit: i64,
        before: Option<NaiveDateTime>,
    ) -> Result<Vec<Post>> {
        let mut conn = self.get_db_conn().await?;

        let rows = match before {
            Some(cursor) => {
                posts::table
                    .filter(posts::account_id.eq(account_id))
                    .filter(posts::date.lt(cursor))
                    .order(posts::date.desc())
                    .limit(limit)
                    .load::<Post>(&mut conn)
                    .await
            }
            None => {
                posts::table
                    .filter(posts::account_id.eq(account_id))
                    .order(posts::date.desc())
                    .limit(limit)
                    .load::<Post>(&mut conn)
                    .await
            }
        };

        rows.map_err(StoreError::Database)
    }

    async fn delete_post(&self, post_id: &str, account_id: &str) -> Result<usize> {
        let mut conn = self.get_db_conn().await?;

        diesel::delete(
            posts::table
                .filter(posts::post_id.eq(post_id))
                .filter(posts::account_id.eq(account_id)),
        )
        .execute(&mut conn)
        .await
        .map_err(StoreError::Database)
    }
}

#[async_trait]
impl ImageStore for Database {
    async fn insert_image(&self, image: &Image) -> Result<()> {
        let mut conn = self.get_db_conn().await?;

        diesel::insert_into(images::table)
            .values(image)
            .execute(&mut conn)
            .await
            .map_err(StoreError::Database)?;

        Ok(())
    }
}
