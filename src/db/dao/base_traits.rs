use sea_orm::entity::prelude::DateTimeWithTimeZone;

/// Implemented by `#[base_entity]` for every entity.
pub trait HasCreatedAtColumn: sea_orm::EntityTrait {
    fn created_at_column() -> Self::Column;
}

pub trait HasIdActiveModel {
    fn set_id(&mut self, id: uuid::Uuid);
}

/// `set_updated_at` is a no-op for append-only entities declared with
/// `#[base_entity(timestamps = "created")]`.
pub trait TimestampedActiveModel {
    fn set_created_at(&mut self, ts: DateTimeWithTimeZone);
    fn set_updated_at(&mut self, ts: DateTimeWithTimeZone);
}
