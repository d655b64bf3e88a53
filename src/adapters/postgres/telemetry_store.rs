//! PostgreSQL implementation of TelemetryStore.
//!
//! Each transaction wraps a `sqlx::Transaction`. `lock_device` issues
//! `SELECT ... FOR UPDATE`, so concurrent patches of one device queue on the
//! row lock until the holder commits or rolls back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::domain::foundation::{
    AuthenticatedIdentity, DeviceId, DomainError, ErrorCode, IdentityId, TelemetryEventId,
    Timestamp,
};
use crate::domain::telemetry::{BatteryLevel, Device, NoiseLevel, TelemetryEvent, TimeRange};
use crate::ports::{TelemetryStore, TelemetryTransaction};

/// PostgreSQL implementation of TelemetryStore.
#[derive(Clone)]
pub struct PostgresTelemetryStore {
    pool: PgPool,
}

impl PostgresTelemetryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TelemetryStore for PostgresTelemetryStore {
    async fn begin(&self) -> Result<Box<dyn TelemetryTransaction>, DomainError> {
        let tx = self.pool.begin().await.map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to begin transaction: {}", e),
            )
        })?;

        Ok(Box::new(PostgresTelemetryTransaction { tx }))
    }

    async fn ensure_identity(&self, identity: &AuthenticatedIdentity) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO identities (id, email, display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(identity.id.as_str())
        .bind(identity.email.as_deref())
        .bind(identity.display_name.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to upsert identity: {}", e),
            )
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_devices_by_owner(&self, owner: &IdentityId) -> Result<Vec<Device>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, name, device_type, battery_level, is_connected,
                   last_connected, created_at
            FROM devices
            WHERE owner_id = $1
            "#,
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to fetch devices: {}", e),
            )
        })?;

        rows.into_iter().map(row_to_device).collect()
    }

    async fn find_events_by_owner(
        &self,
        owner: &IdentityId,
        range: Option<TimeRange>,
        limit: Option<u32>,
    ) -> Result<Vec<TelemetryEvent>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, device_id, noise_level, recorded_at, location
            FROM telemetry_events
            WHERE owner_id = $1
              AND ($2::timestamptz IS NULL OR recorded_at >= $2)
              AND ($3::timestamptz IS NULL OR recorded_at <= $3)
            ORDER BY recorded_at DESC
            LIMIT $4
            "#,
        )
        .bind(owner.as_str())
        .bind(range.map(|r| *r.start().as_datetime()))
        .bind(range.map(|r| *r.end().as_datetime()))
        .bind(limit.map(i64::from))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to fetch telemetry events: {}", e),
            )
        })?;

        rows.into_iter().map(row_to_event).collect()
    }
}

/// A PostgreSQL transaction. Dropped uncommitted, sqlx rolls it back.
pub struct PostgresTelemetryTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TelemetryTransaction for PostgresTelemetryTransaction {
    async fn create_device(&mut self, device: &Device) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO devices (
                id, owner_id, name, device_type, battery_level, is_connected,
                last_connected, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(device.id().as_uuid())
        .bind(device.owner().as_str())
        .bind(device.name())
        .bind(device.device_type())
        .bind(device.battery_level().map(|b| i16::from(b.value())))
        .bind(device.is_connected())
        .bind(device.last_connected().as_datetime())
        .bind(device.created_at().as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to insert device: {}", e),
            )
        })?;

        Ok(())
    }

    async fn lock_device(
        &mut self,
        id: &DeviceId,
        owner: &IdentityId,
    ) -> Result<Option<Device>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, name, device_type, battery_level, is_connected,
                   last_connected, created_at
            FROM devices
            WHERE id = $1 AND owner_id = $2
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .bind(owner.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to lock device: {}", e),
            )
        })?;

        row.map(row_to_device).transpose()
    }

    async fn update_device(&mut self, device: &Device) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE devices SET
                battery_level = $2,
                is_connected = $3,
                last_connected = $4
            WHERE id = $1
            "#,
        )
        .bind(device.id().as_uuid())
        .bind(device.battery_level().map(|b| i16::from(b.value())))
        .bind(device.is_connected())
        .bind(device.last_connected().as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update device: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::DeviceNotFound,
                format!("Device not found: {}", device.id()),
            )
            .with_detail("device_id", device.id().to_string()));
        }

        Ok(())
    }

    async fn create_event(&mut self, event: &TelemetryEvent) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO telemetry_events (
                id, owner_id, device_id, noise_level, category, recorded_at, location
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.id().as_uuid())
        .bind(event.owner().as_str())
        .bind(event.device_id().map(|d| *d.as_uuid()))
        .bind(event.noise_level().value())
        .bind(event.category().as_str())
        .bind(event.recorded_at().as_datetime())
        .bind(event.location())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to insert telemetry event: {}", e),
            )
        })?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx.commit().await.map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to commit transaction: {}", e),
            )
        })
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.tx.rollback().await.map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to roll back transaction: {}", e),
            )
        })
    }
}

fn decode_err(column: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Failed to read column '{}': {}", column, e),
    )
}

fn row_to_device(row: PgRow) -> Result<Device, DomainError> {
    let id: Uuid = row.try_get("id").map_err(|e| decode_err("id", e))?;
    let owner: String = row.try_get("owner_id").map_err(|e| decode_err("owner_id", e))?;
    let name: String = row.try_get("name").map_err(|e| decode_err("name", e))?;
    let device_type: String = row
        .try_get("device_type")
        .map_err(|e| decode_err("device_type", e))?;
    let battery: Option<i16> = row
        .try_get("battery_level")
        .map_err(|e| decode_err("battery_level", e))?;
    let is_connected: bool = row
        .try_get("is_connected")
        .map_err(|e| decode_err("is_connected", e))?;
    let last_connected: DateTime<Utc> = row
        .try_get("last_connected")
        .map_err(|e| decode_err("last_connected", e))?;
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| decode_err("created_at", e))?;

    let battery_level = battery
        .map(|b| BatteryLevel::try_new(i64::from(b)))
        .transpose()?;

    Ok(Device::reconstitute(
        DeviceId::from_uuid(id),
        IdentityId::new(owner)?,
        name,
        device_type,
        battery_level,
        is_connected,
        Timestamp::from_datetime(last_connected),
        Timestamp::from_datetime(created_at),
    ))
}

fn row_to_event(row: PgRow) -> Result<TelemetryEvent, DomainError> {
    let id: Uuid = row.try_get("id").map_err(|e| decode_err("id", e))?;
    let owner: String = row.try_get("owner_id").map_err(|e| decode_err("owner_id", e))?;
    let device_id: Option<Uuid> = row
        .try_get("device_id")
        .map_err(|e| decode_err("device_id", e))?;
    let noise_level: f64 = row
        .try_get("noise_level")
        .map_err(|e| decode_err("noise_level", e))?;
    let recorded_at: DateTime<Utc> = row
        .try_get("recorded_at")
        .map_err(|e| decode_err("recorded_at", e))?;
    let location: String = row.try_get("location").map_err(|e| decode_err("location", e))?;

    Ok(TelemetryEvent::reconstitute(
        TelemetryEventId::from_uuid(id),
        IdentityId::new(owner)?,
        device_id.map(DeviceId::from_uuid),
        NoiseLevel::new(noise_level)?,
        Timestamp::from_datetime(recorded_at),
        Some(location),
    ))
}
