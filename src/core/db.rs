use std::path::PathBuf;

use sqlx::{
    migrate::MigrateDatabase, sqlite::Sqlite, sqlite::SqlitePoolOptions, types::time, SqlitePool,
};

use crate::error::Error;

use super::{
    participant::Participant,
    round::{ParticipantRound, Round},
};

/// Storage handle for the registration service.
///
/// Owned by the process and passed explicitly into every operation; there is
/// no module-level client. Uniqueness of participant email and code is
/// enforced by unique indexes, so constraint violations on insert are the
/// authoritative conflict signal.
pub struct RegistrationDb {
    db: SqlitePool,
}

fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

/// Maps a participant insert failure onto the service taxonomy by inspecting
/// which unique index was violated.
fn map_participant_insert_error(e: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let msg = db_err.message();
            if msg.contains("participants.email") {
                return Error::Conflict("Email already registered".to_string());
            }
            if msg.contains("participants.code") {
                return Error::CodeCollision;
            }
        }
    }
    Error::Database(e)
}

impl RegistrationDb {
    pub async fn init(file: &PathBuf) -> Result<Self, Error> {
        let url = format!("sqlite://{}", file.display());
        Sqlite::create_database(&url).await?;

        let db = SqlitePool::connect(&url).await?;
        Self::create_schema(&db).await?;
        Ok(RegistrationDb { db })
    }

    pub async fn load(file: &PathBuf) -> Result<Self, Error> {
        let url = format!("sqlite://{}", file.display());
        let db = SqlitePool::connect(&url).await?;
        Ok(RegistrationDb { db })
    }

    /// In-memory store, used by tests. A single connection keeps every
    /// query on the same SQLite database.
    pub async fn init_in_memory() -> Result<Self, Error> {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::create_schema(&db).await?;
        Ok(RegistrationDb { db })
    }

    async fn create_schema(db: &SqlitePool) -> Result<(), Error> {
        sqlx::query(
            "create table participants(
                        id integer primary key autoincrement,
                        name text not null,
                        email text not null unique collate nocase,
                        phone text,
                        college text,
                        code text not null unique,
                        qr_path text not null default '',
                        created_at integer not null
                    );",
        )
        .execute(db)
        .await?;

        sqlx::query(
            "create table rounds(
                        id integer primary key autoincrement,
                        name text not null,
                        status text not null,
                        created_at integer not null
                    );",
        )
        .execute(db)
        .await?;

        sqlx::query(
            "create table participant_rounds(
                        id integer primary key autoincrement,
                        participant_id integer not null,
                        round_id integer not null,
                        status text not null,
                        created_at integer not null,
                        foreign key(participant_id) references participants(id) on delete cascade,
                        foreign key(round_id) references rounds(id) on delete cascade
                    );",
        )
        .execute(db)
        .await?;

        Ok(())
    }

    pub async fn code_exists(&self, code: &str) -> Result<bool, Error> {
        let count: u32 = sqlx::query_scalar("select count(*) from participants where code = ?")
            .bind(code)
            .fetch_one(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn find_participant_by_code(&self, code: &str) -> Result<Participant, Error> {
        sqlx::query_as("select * from participants where code = ? limit 1")
            .bind(code)
            .fetch_optional(&self.db)
            .await?
            .ok_or(Error::NotFound("Participant not found".to_string()))
    }

    pub async fn find_participant_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Participant>, Error> {
        Ok(
            sqlx::query_as("select * from participants where email = ? limit 1")
                .bind(email)
                .fetch_optional(&self.db)
                .await?,
        )
    }

    pub async fn get_participant(&self, id: i64) -> Result<Participant, Error> {
        sqlx::query_as("select * from participants where id = ? limit 1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(Error::NotFound("Participant not found".to_string()))
    }

    /// Inserts a participant with a freshly issued code. A duplicate email is
    /// a [`Error::Conflict`]; a duplicate code is a [`Error::CodeCollision`]
    /// the caller is expected to retry with a new code.
    pub async fn insert_participant(
        &self,
        name: &str,
        email: &str,
        phone: Option<&str>,
        college: Option<&str>,
        code: &str,
    ) -> Result<Participant, Error> {
        log::debug!("Creating participant {} with code {}", name, code);
        let result = sqlx::query(
            "insert into participants(name, email, phone, college, code, created_at)
                        values(?, ?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(college)
        .bind(code)
        .bind(now_unix())
        .execute(&self.db)
        .await
        .map_err(map_participant_insert_error)?;

        self.get_participant(result.last_insert_rowid()).await
    }

    pub async fn set_participant_qr_path(&self, id: i64, qr_path: &str) -> Result<(), Error> {
        sqlx::query("update participants set qr_path = ? where id = ?")
            .bind(qr_path)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    pub async fn get_participants(&self) -> Result<Vec<Participant>, Error> {
        Ok(
            sqlx::query_as("select * from participants order by created_at desc, id desc")
                .fetch_all(&self.db)
                .await?,
        )
    }

    pub async fn insert_round(&self, name: &str, status: &str) -> Result<Round, Error> {
        log::debug!("Creating round {}", name);
        let result = sqlx::query("insert into rounds(name, status, created_at) values(?, ?, ?)")
            .bind(name)
            .bind(status)
            .bind(now_unix())
            .execute(&self.db)
            .await?;

        self.get_round(result.last_insert_rowid()).await
    }

    pub async fn get_round(&self, id: i64) -> Result<Round, Error> {
        sqlx::query_as("select * from rounds where id = ? limit 1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(Error::NotFound("Round not found".to_string()))
    }

    /// Records a participant in a round. Duplicate (participant, round) pairs
    /// are allowed; re-assignment creates a second join-record.
    pub async fn insert_participant_round(
        &self,
        participant_id: i64,
        round_id: i64,
        status: &str,
    ) -> Result<ParticipantRound, Error> {
        let result = sqlx::query(
            "insert into participant_rounds(participant_id, round_id, status, created_at)
                        values(?, ?, ?, ?)",
        )
        .bind(participant_id)
        .bind(round_id)
        .bind(status)
        .bind(now_unix())
        .execute(&self.db)
        .await?;

        Ok(
            sqlx::query_as("select * from participant_rounds where id = ? limit 1")
                .bind(result.last_insert_rowid())
                .fetch_one(&self.db)
                .await?,
        )
    }
}
