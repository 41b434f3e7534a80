//! SQLite ticket store implementation.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use entities::{
    normalize_technician, DeviceType, Priority, RepairTicket, Role, TicketMessage, TicketStatus,
    TicketUpdate, TicketWithOwner, User, UserSummary,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{FromRow, Pool, Sqlite};
use uuid::Uuid;

use crate::{TicketFilter, TicketStore, TicketStoreError, TicketStoreResult};

/// Schema applied on every open. Statements are idempotent.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'user',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tickets (
    id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL REFERENCES users(id),
    device_type TEXT NOT NULL,
    description TEXT NOT NULL,
    priority TEXT NOT NULL DEFAULT 'Low',
    status TEXT NOT NULL DEFAULT 'Submitted',
    technician TEXT,
    estimated_cost REAL NOT NULL DEFAULT 0,
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tickets_user_id ON tickets(user_id);

CREATE TABLE IF NOT EXISTS ticket_messages (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_id TEXT NOT NULL REFERENCES tickets(id),
    sender TEXT NOT NULL,
    text TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ticket_messages_ticket ON ticket_messages(ticket_id, seq);
"#;

const USER_COLUMNS: &str = "id, name, username, email, password_hash, role, created_at";

const TICKET_COLUMNS: &str = "t.id, t.user_id, t.device_type, t.description, t.priority, \
     t.status, t.technician, t.estimated_cost, t.notes, t.created_at";

/// Database row for User
#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: String,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = TicketStoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().unwrap_or_else(|_| {
            tracing::warn!(user_id = %row.id, role = %row.role, "Unknown stored role, treating as user");
            Role::User
        });

        Ok(User {
            id: parse_uuid(&row.id)?,
            name: row.name,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

/// Database row for RepairTicket (without messages)
#[derive(Debug, FromRow)]
struct TicketRow {
    id: String,
    user_id: String,
    device_type: String,
    description: String,
    priority: String,
    status: String,
    technician: Option<String>,
    estimated_cost: f64,
    notes: Option<String>,
    created_at: String,
}

impl TicketRow {
    fn into_ticket(self, messages: Vec<TicketMessage>) -> TicketStoreResult<RepairTicket> {
        let device_type = DeviceType::parse(&self.device_type).unwrap_or_else(|| {
            tracing::warn!(ticket_id = %self.id, device_type = %self.device_type, "Unknown stored device type");
            DeviceType::Other
        });
        let priority = Priority::parse(&self.priority).unwrap_or_else(|| {
            tracing::warn!(ticket_id = %self.id, priority = %self.priority, "Unknown stored priority");
            Priority::default()
        });
        if TicketStatus::parse(&self.status).is_none() {
            tracing::warn!(ticket_id = %self.id, status = %self.status, "Unknown stored status, using fallback stage");
        }

        Ok(RepairTicket {
            id: parse_uuid(&self.id)?,
            user: parse_uuid(&self.user_id)?,
            device_type,
            description: self.description,
            priority,
            status: TicketStatus::resolve(&self.status),
            technician: self.technician,
            estimated_cost: self.estimated_cost,
            notes: self.notes,
            messages,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

/// Database row for a ticket joined with its owner
#[derive(Debug, FromRow)]
struct TicketOwnerRow {
    #[sqlx(flatten)]
    ticket: TicketRow,
    owner_name: Option<String>,
    owner_email: Option<String>,
}

/// Database row for TicketMessage
#[derive(Debug, FromRow)]
struct MessageRow {
    ticket_id: String,
    sender: String,
    text: String,
    created_at: String,
}

impl TryFrom<MessageRow> for TicketMessage {
    type Error = TicketStoreError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let sender = row
            .sender
            .parse::<Role>()
            .map_err(|e| TicketStoreError::Corrupt(format!("message on {}: {e}", row.ticket_id)))?;

        Ok(TicketMessage {
            sender,
            text: row.text,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

fn parse_uuid(value: &str) -> TicketStoreResult<Uuid> {
    value
        .parse()
        .map_err(|_| TicketStoreError::Corrupt(format!("invalid id: {value}")))
}

fn parse_timestamp(value: &str) -> TicketStoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| TicketStoreError::Corrupt(format!("invalid timestamp: {value}")))
}

fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Groups message rows by ticket, preserving append order.
fn group_messages(
    rows: Vec<MessageRow>,
) -> TicketStoreResult<HashMap<String, Vec<TicketMessage>>> {
    let mut grouped: HashMap<String, Vec<TicketMessage>> = HashMap::new();
    for row in rows {
        let ticket_id = row.ticket_id.clone();
        grouped
            .entry(ticket_id)
            .or_default()
            .push(TicketMessage::try_from(row)?);
    }
    Ok(grouped)
}

/// Ticket store backed by a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteTicketStore {
    pool: Pool<Sqlite>,
}

impl SqliteTicketStore {
    /// Opens (creating if needed) the database at `database_url`.
    pub async fn connect(database_url: &str, acquire_timeout: Duration) -> TicketStoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(acquire_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;

        tracing::info!(url = %database_url, "Ticket database opened");

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Opens a private in-memory database that lives as long as the store.
    pub async fn open_in_memory() -> TicketStoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // A single connection that is never recycled, or the data would vanish.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn run_migrations(&self) -> TicketStoreResult<()> {
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| TicketStoreError::Database(format!("migration failed: {e}")))?;
        Ok(())
    }

    async fn load_messages(&self, ticket_id: &str) -> TicketStoreResult<Vec<TicketMessage>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT ticket_id, sender, text, created_at FROM ticket_messages \
             WHERE ticket_id = ? ORDER BY seq",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TicketMessage::try_from).collect()
    }

    async fn load_messages_for(
        &self,
        filter: &TicketFilter,
    ) -> TicketStoreResult<HashMap<String, Vec<TicketMessage>>> {
        let owner = filter.owner.map(|id| id.to_string());
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT m.ticket_id, m.sender, m.text, m.created_at FROM ticket_messages m \
             JOIN tickets t ON t.id = m.ticket_id \
             WHERE (? IS NULL OR t.user_id = ?) ORDER BY m.seq",
        )
        .bind(owner.clone())
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        group_messages(rows)
    }
}

#[async_trait]
impl TicketStore for SqliteTicketStore {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, user: User) -> TicketStoreResult<User> {
        sqlx::query(
            "INSERT INTO users (id, name, username, email, password_hash, role, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(format_timestamp(&user.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                TicketStoreError::already_exists("User", user.username.clone())
            }
            _ => TicketStoreError::from(e),
        })?;

        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> TicketStoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> TicketStoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn list_users(&self) -> TicketStoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, rowid");
        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    // =========================================================================
    // Ticket operations
    // =========================================================================

    async fn create_ticket(&self, ticket: RepairTicket) -> TicketStoreResult<RepairTicket> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO tickets (id, user_id, device_type, description, priority, status, \
             technician, estimated_cost, notes, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(ticket.id.to_string())
        .bind(ticket.user.to_string())
        .bind(ticket.device_type.as_str())
        .bind(&ticket.description)
        .bind(ticket.priority.as_str())
        .bind(ticket.status.as_str())
        .bind(&ticket.technician)
        .bind(ticket.estimated_cost)
        .bind(&ticket.notes)
        .bind(format_timestamp(&ticket.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                TicketStoreError::already_exists("Ticket", ticket.id.to_string())
            }
            _ => TicketStoreError::from(e),
        })?;

        for message in &ticket.messages {
            sqlx::query(
                "INSERT INTO ticket_messages (ticket_id, sender, text, created_at) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(ticket.id.to_string())
            .bind(message.sender.as_str())
            .bind(&message.text)
            .bind(format_timestamp(&message.created_at))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(ticket)
    }

    async fn get_ticket(&self, id: Uuid) -> TicketStoreResult<Option<RepairTicket>> {
        let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets t WHERE t.id = ?");
        let row = sqlx::query_as::<_, TicketRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let messages = self.load_messages(&row.id).await?;
                row.into_ticket(messages).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn list_tickets(&self, filter: TicketFilter) -> TicketStoreResult<Vec<RepairTicket>> {
        let owner = filter.owner.map(|id| id.to_string());
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets t \
             WHERE (? IS NULL OR t.user_id = ?) ORDER BY t.created_at, t.rowid"
        );
        let rows = sqlx::query_as::<_, TicketRow>(&sql)
            .bind(owner.clone())
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;

        let mut messages = self.load_messages_for(&filter).await?;
        rows.into_iter()
            .map(|row| {
                let log = messages.remove(&row.id).unwrap_or_default();
                row.into_ticket(log)
            })
            .collect()
    }

    async fn list_tickets_with_owner(
        &self,
        filter: TicketFilter,
    ) -> TicketStoreResult<Vec<TicketWithOwner>> {
        let owner = filter.owner.map(|id| id.to_string());
        let sql = format!(
            "SELECT {TICKET_COLUMNS}, u.name AS owner_name, u.email AS owner_email \
             FROM tickets t LEFT JOIN users u ON u.id = t.user_id \
             WHERE (? IS NULL OR t.user_id = ?) ORDER BY t.created_at, t.rowid"
        );
        let rows = sqlx::query_as::<_, TicketOwnerRow>(&sql)
            .bind(owner.clone())
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;

        let mut messages = self.load_messages_for(&filter).await?;
        rows.into_iter()
            .map(|row| {
                let log = messages.remove(&row.ticket.id).unwrap_or_default();
                let ticket = row.ticket.into_ticket(log)?;
                let owner = match (row.owner_name, row.owner_email) {
                    (Some(name), Some(email)) => Some(UserSummary {
                        id: ticket.user,
                        name,
                        email,
                    }),
                    _ => None,
                };
                Ok(TicketWithOwner { ticket, owner })
            })
            .collect()
    }

    async fn append_message(
        &self,
        ticket_id: Uuid,
        message: TicketMessage,
    ) -> TicketStoreResult<RepairTicket> {
        // One statement: the existence check and the insert cannot interleave
        // with another writer, and nothing is read back and rewritten.
        let result = sqlx::query(
            "INSERT INTO ticket_messages (ticket_id, sender, text, created_at) \
             SELECT ?, ?, ?, ? WHERE EXISTS (SELECT 1 FROM tickets WHERE id = ?)",
        )
        .bind(ticket_id.to_string())
        .bind(message.sender.as_str())
        .bind(&message.text)
        .bind(format_timestamp(&message.created_at))
        .bind(ticket_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TicketStoreError::not_found("Ticket", ticket_id.to_string()));
        }

        self.get_ticket(ticket_id)
            .await?
            .ok_or_else(|| TicketStoreError::not_found("Ticket", ticket_id.to_string()))
    }

    async fn update_ticket(
        &self,
        id: Uuid,
        update: TicketUpdate,
    ) -> TicketStoreResult<RepairTicket> {
        let technician = update.technician.as_deref().and_then(normalize_technician);

        let result = sqlx::query(
            "UPDATE tickets SET \
             status = COALESCE(?, status), \
             technician = CASE WHEN ? THEN ? ELSE technician END, \
             estimated_cost = COALESCE(?, estimated_cost), \
             notes = COALESCE(?, notes) \
             WHERE id = ?",
        )
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.technician.is_some())
        .bind(technician)
        .bind(update.estimated_cost)
        .bind(update.notes.as_deref())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TicketStoreError::not_found("Ticket", id.to_string()));
        }

        self.get_ticket(id)
            .await?
            .ok_or_else(|| TicketStoreError::not_found("Ticket", id.to_string()))
    }
}
