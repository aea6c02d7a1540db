use uuid::Uuid;

use crate::{db::dao::NotificationDao, db::entities::notification, error::AppError};

#[derive(Clone)]
pub struct NotificationService {
    notification_dao: NotificationDao,
}

impl NotificationService {
    pub fn new(notification_dao: NotificationDao) -> Self {
        Self { notification_dao }
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<u64, AppError> {
        Ok(self.notification_dao.count_unread(user_id).await?)
    }

    /// Newest first. Everything unread is marked read after the list is taken, so the
    /// returned rows still show what was new.
    pub async fn open_inbox(&self, user_id: Uuid) -> Result<Vec<notification::Model>, AppError> {
        let items = self.notification_dao.list_for_user(user_id).await?;
        let marked = self.notification_dao.mark_all_read(user_id).await?;
        tracing::debug!(%user_id, marked, "notifications marked read");
        Ok(items)
    }
}
