use std::sync::Arc;
use std::thread;

use diesel::{Connection, SqliteConnection};
use log::{debug, error};
use tokio::sync::{mpsc, oneshot};

use boracrm_core::{Error, Result};

use super::{get_connection, DbPool};
use crate::errors::StorageError;

type Job = Box<dyn FnOnce(&mut SqliteConnection) + Send + 'static>;

/// Cloneable handle to the database writer.
///
/// Every job runs on the writer's own connection inside one transaction, and
/// jobs run strictly one after another.
#[derive(Clone)]
pub struct WriteHandle {
    sender: mpsc::UnboundedSender<Job>,
}

enum TxError {
    Diesel(diesel::result::Error),
    Job(Error),
}

impl From<diesel::result::Error> for TxError {
    fn from(err: diesel::result::Error) -> Self {
        TxError::Diesel(err)
    }
}

impl WriteHandle {
    pub async fn exec<F, R>(&self, job: F) -> Result<R>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let (reply, outcome) = oneshot::channel();
        let boxed: Job = Box::new(move |conn| {
            let result = conn
                .transaction::<R, TxError, _>(|tx| job(tx).map_err(TxError::Job))
                .map_err(|err| match err {
                    TxError::Diesel(e) => StorageError::from(e).into(),
                    TxError::Job(e) => e,
                });
            let _ = reply.send(result);
        });

        self.sender
            .send(boxed)
            .map_err(|_| StorageError::WriterUnavailable("writer thread stopped".to_string()))?;
        outcome.await.map_err(|_| {
            Error::from(StorageError::WriterUnavailable(
                "writer dropped the job without replying".to_string(),
            ))
        })?
    }
}

/// Starts the writer on a dedicated thread holding one pooled connection.
pub fn spawn_writer(pool: Arc<DbPool>) -> Result<WriteHandle> {
    let mut conn = get_connection(&pool)?;
    let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();

    thread::Builder::new()
        .name("sqlite-writer".to_string())
        .spawn(move || {
            debug!("SQLite writer started");
            while let Some(job) = receiver.blocking_recv() {
                if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| job(&mut *conn)))
                    .is_err()
                {
                    error!("SQLite writer job panicked; continuing with next job");
                }
            }
            debug!("SQLite writer stopped");
        })
        .map_err(StorageError::from)?;

    Ok(WriteHandle { sender })
}
