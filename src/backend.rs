//! The seam between the harness and the store under test.
//!
//! Suites only ever talk to a [`Connection`]; any backend that speaks the
//! same command surface can stand in for the redis-backed one below.

#![allow(async_fn_in_trait)]

use std::future::Future;
use std::time::Duration;

use redis::aio::{MultiplexedConnection, PubSub};
use redis::{FromRedisValue, RedisResult, Value};
use tracing::debug;

use crate::config::Target;
use crate::error::{BackendError, BackendResult};

/// A live handle to the backend under test.
pub trait Connection {
    /// Send one command and return the raw reply.
    async fn invoke(&mut self, command: &str, args: &[&str]) -> BackendResult<Value>;

    /// Subscribe a dedicated listener to `channel`.
    async fn subscribe(&mut self, channel: &str) -> BackendResult<()>;

    /// Drop the listener created by [`Connection::subscribe`].
    async fn unsubscribe(&mut self, channel: &str) -> BackendResult<()>;

    /// Send one command and convert the reply.
    async fn query<T: FromRedisValue>(&mut self, command: &str, args: &[&str]) -> BackendResult<T> {
        let value = self.invoke(command, args).await?;
        Ok(redis::from_redis_value(&value)?)
    }

    async fn ping(&mut self) -> bool {
        matches!(self.query::<String>("PING", &[]).await, Ok(reply) if reply == "PONG")
    }
}

/// Opens connections to a [`Target`].
pub trait Connector {
    type Conn: Connection;

    async fn connect(&self, target: &Target, timeout: Duration) -> BackendResult<Self::Conn>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RedisConnector;

impl Connector for RedisConnector {
    type Conn = RedisBackend;

    async fn connect(&self, target: &Target, timeout: Duration) -> BackendResult<RedisBackend> {
        let info = redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(target.host.clone(), target.port),
            redis: redis::RedisConnectionInfo {
                db: target.db,
                password: target.password.clone(),
                ..Default::default()
            },
        };
        let client = redis::Client::open(info)?;
        let conn = within(timeout, client.get_multiplexed_async_connection()).await?;
        Ok(RedisBackend {
            client,
            conn,
            subscriber: None,
            timeout,
        })
    }
}

pub struct RedisBackend {
    client: redis::Client,
    conn: MultiplexedConnection,
    subscriber: Option<PubSub>,
    timeout: Duration,
}

impl Connection for RedisBackend {
    async fn invoke(&mut self, command: &str, args: &[&str]) -> BackendResult<Value> {
        debug!(command, ?args, "invoke");
        let mut cmd = redis::cmd(command);
        for arg in args {
            cmd.arg(*arg);
        }
        let conn = &mut self.conn;
        within(self.timeout, async move {
            let reply: Value = cmd.query_async(conn).await?;
            Ok(reply)
        })
        .await
    }

    async fn subscribe(&mut self, channel: &str) -> BackendResult<()> {
        if self.subscriber.is_none() {
            let pubsub = within(self.timeout, self.client.get_async_pubsub()).await?;
            self.subscriber = Some(pubsub);
        }
        match self.subscriber.as_mut() {
            Some(pubsub) => within(self.timeout, pubsub.subscribe(channel)).await,
            None => Err(BackendError::unexpected("SUBSCRIBE", "no subscriber connection")),
        }
    }

    async fn unsubscribe(&mut self, channel: &str) -> BackendResult<()> {
        let Some(mut pubsub) = self.subscriber.take() else {
            return Ok(());
        };
        within(self.timeout, pubsub.unsubscribe(channel)).await
    }
}

async fn within<T>(timeout: Duration, fut: impl Future<Output = RedisResult<T>>) -> BackendResult<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(BackendError::Timeout(timeout)),
    }
}
