use std::{
    ops::{Deref, DerefMut},
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use diesel::{
    SqliteConnection,
    connection::{SimpleConnection, TransactionManager},
    r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection},
};
use diesel_migrations::MigrationHarness;
use tokio::task::spawn_blocking;

use crate::{
    MIGRATIONS,
    auth::token::TokenKeys,
    live::{chat::ChatBroadcaster, relay::RelayRegistry},
    util_resp::FailureResponse,
};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

type PooledConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Everything the handlers share. Both socket registries live here (rather
/// than in globals) so that each server instance owns its own connections.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub keys: TokenKeys,
    pub relay: RelayRegistry,
    pub chat: ChatBroadcaster,
}

impl AppState {
    pub fn new(pool: DbPool, keys: TokenKeys) -> Self {
        Self {
            pool,
            keys,
            relay: RelayRegistry::new(),
            chat: ChatBroadcaster::new(),
        }
    }

    /// Drops every registered socket, which closes them.
    pub async fn close_sockets(&self) {
        let relay = self.relay.close_all().await;
        let chat = self.chat.close_all().await;
        tracing::info!(relay, chat, "closed live connections");
    }
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl FromRef<AppState> for RelayRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.relay.clone()
    }
}

impl FromRef<AppState> for ChatBroadcaster {
    fn from_ref(state: &AppState) -> Self {
        state.chat.clone()
    }
}

/// Applied to every pooled connection. SQLite does not enforce foreign keys
/// unless asked to, per connection.
#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error>
    for SqlitePragmas
{
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn make_pool(db_url: &str) -> Result<DbPool, diesel::r2d2::PoolError> {
    // every in-memory connection is its own database, so there must only
    // ever be one of them
    let max_size = if db_url == ":memory:" { 1 } else { 10 };

    Pool::builder()
        .max_size(max_size)
        .connection_timeout(Duration::from_secs(30))
        .connection_customizer(Box::new(SqlitePragmas))
        .build(ConnectionManager::<SqliteConnection>::new(db_url))
}

pub fn run_migrations(
    pool: &DbPool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    for version in conn.run_pending_migrations(MIGRATIONS)? {
        tracing::info!(%version, "applied migration");
    }
    Ok(())
}

/// Holds the transactional connection of the current request, if one has
/// been opened. Inserted by [`tx_commit`] and filled in lazily by the
/// [`Conn`] extractor.
#[derive(Clone, Default)]
struct TxSlot(Arc<Mutex<Option<ThreadSafeConn<true>>>>);

impl TxSlot {
    fn get(&self) -> Option<ThreadSafeConn<true>> {
        self.0.lock().ok().and_then(|slot| slot.clone())
    }

    fn set(&self, conn: ThreadSafeConn<true>) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(conn);
        }
    }

    fn take(&self) -> Option<ThreadSafeConn<true>> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Commits the transaction opened during a request once the handler has
/// produced a response. Anything other than a successful (or redirecting)
/// response rolls the transaction back instead.
pub async fn tx_commit(mut req: Request, next: Next) -> Response {
    let slot = TxSlot::default();
    req.extensions_mut().insert(slot.clone());

    let res = next.run(req).await;

    let conn = match slot.take() {
        Some(conn) => conn,
        None => return res,
    };

    let mut conn = conn.inner.lock().await;
    let keep = res.status().is_success()
        || res.status().is_redirection()
        || res.status().is_informational();

    let outcome = if keep {
        <PooledConn as diesel::Connection>::TransactionManager::commit_transaction(
            &mut *conn,
        )
    } else {
        <PooledConn as diesel::Connection>::TransactionManager::rollback_transaction(
            &mut *conn,
        )
    };

    match outcome {
        Ok(()) => res,
        Err(e) => {
            tracing::error!(commit = keep, "failed to finish transaction: {e}");
            FailureResponse::ServerError(()).into_response()
        }
    }
}

pub struct Conn<const TX: bool> {
    inner: tokio::sync::OwnedMutexGuard<PooledConn>,
}

impl<const TX: bool> Deref for Conn<TX> {
    type Target = PooledConn;

    fn deref(&self) -> &Self::Target {
        self.inner.deref()
    }
}

impl<const TX: bool> DerefMut for Conn<TX> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.deref_mut()
    }
}

#[async_trait]
impl<const TX: bool, S> FromRequestParts<S> for Conn<TX>
where
    S: Send + Sync,
    DbPool: FromRef<S>,
{
    type Rejection = FailureResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let conn = ThreadSafeConn::<TX>::from_request_parts(parts, state).await?;

        let inner = conn.inner.try_lock_owned().map_err(|_| {
            tracing::error!("request connection is already in use");
            FailureResponse::ServerError(())
        })?;

        Ok(Conn { inner })
    }
}

/// A pooled connection shared between the extractors of one request. With
/// `TX = true` a transaction is opened as soon as the connection is checked
/// out.
#[derive(Clone)]
pub struct ThreadSafeConn<const TX: bool> {
    pub inner: Arc<tokio::sync::Mutex<PooledConn>>,
}

impl<const TX: bool> ThreadSafeConn<TX> {
    async fn checkout(pool: DbPool) -> Result<Self, FailureResponse> {
        let mut conn = spawn_blocking(move || pool.get()).await??;

        if TX {
            <PooledConn as diesel::Connection>::TransactionManager::begin_transaction(
                &mut conn,
            )?;
        }

        Ok(ThreadSafeConn {
            inner: Arc::new(tokio::sync::Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl<const TX: bool, S> FromRequestParts<S> for ThreadSafeConn<TX>
where
    S: Send + Sync,
    DbPool: FromRef<S>,
{
    type Rejection = FailureResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        if TX {
            let slot = match parts.extensions.get::<TxSlot>() {
                Some(slot) => slot.clone(),
                None => {
                    tracing::error!(
                        "transactional connection requested on a route \
                         without the `tx_commit` layer"
                    );
                    return Err(FailureResponse::ServerError(()));
                }
            };

            if let Some(conn) = slot.get() {
                return Ok(ThreadSafeConn { inner: conn.inner });
            }

            let conn =
                ThreadSafeConn::<true>::checkout(DbPool::from_ref(state)).await?;
            slot.set(conn.clone());
            Ok(ThreadSafeConn { inner: conn.inner })
        } else {
            if let Some(conn) = parts.extensions.get::<ThreadSafeConn<TX>>() {
                return Ok(conn.clone());
            }

            let conn = Self::checkout(DbPool::from_ref(state)).await?;
            parts.extensions.insert(conn.clone());
            Ok(conn)
        }
    }
}
