use sea_orm::TransactionTrait;
use tracing::info;
use uuid::Uuid;

use crate::{
    db::dao::{DaoBase, FollowDao, HobbyDao, MessageDao, NotificationDao, UserDao},
    db::entities::{hobby, notification, user},
    domain::visibility::{self, FollowState, Privacy, Visibility},
    error::AppError,
    forms::validators::validate_message_body,
};

const SEARCH_LIMIT: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
    SelfFollow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Sent,
    SelfMessage,
    NotAllowed,
    InvalidBody(&'static str),
}

/// Everything the public profile page shows about a target.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub visibility: Visibility,
    pub mutual_followers: Vec<user::Model>,
    pub followers_count: u64,
    pub following_count: u64,
    pub hobbies: Vec<hobby::Model>,
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub user: user::Model,
    pub is_self: bool,
    pub is_following: bool,
    pub can_message: bool,
}

#[derive(Clone)]
pub struct SocialService {
    user_dao: UserDao,
    follow_dao: FollowDao,
    message_dao: MessageDao,
    hobby_dao: HobbyDao,
}

impl SocialService {
    pub fn new(
        user_dao: UserDao,
        follow_dao: FollowDao,
        message_dao: MessageDao,
        hobby_dao: HobbyDao,
    ) -> Self {
        Self {
            user_dao,
            follow_dao,
            message_dao,
            hobby_dao,
        }
    }

    async fn follow_state(
        &self,
        viewer_id: Uuid,
        target_id: Uuid,
    ) -> Result<FollowState, AppError> {
        Ok(FollowState {
            viewer_follows_target: self.follow_dao.exists(viewer_id, target_id).await?,
            target_follows_viewer: self.follow_dao.exists(target_id, viewer_id).await?,
        })
    }

    /// Edges are only looked up for a signed-in viewer who is not the target.
    pub async fn visibility(
        &self,
        viewer: Option<&user::Model>,
        target: &user::Model,
    ) -> Result<Visibility, AppError> {
        let viewer_id = viewer.map(|viewer| viewer.id);
        let follows = match viewer_id {
            Some(id) if id != target.id => self.follow_state(id, target.id).await?,
            _ => FollowState::default(),
        };
        Ok(visibility::resolve(
            viewer_id,
            target.id,
            Privacy::of(&target.privacy),
            follows,
        ))
    }

    pub async fn counts(&self, user_id: Uuid) -> Result<(u64, u64), AppError> {
        Ok((
            self.follow_dao.count_followers(user_id).await?,
            self.follow_dao.count_following(user_id).await?,
        ))
    }

    pub async fn profile_view(
        &self,
        viewer: Option<&user::Model>,
        target: &user::Model,
    ) -> Result<ProfileView, AppError> {
        let visibility = self.visibility(viewer, target).await?;

        let mutual_followers = match viewer {
            Some(viewer) if !visibility.is_owner => {
                let target_followers = self.follow_dao.follower_ids(target.id).await?;
                let viewer_following = self.follow_dao.followed_ids(viewer.id).await?;
                let ids = visibility::mutual_followers(&target_followers, &viewer_following);
                self.user_dao.find_many(ids).await?
            }
            _ => Vec::new(),
        };

        let (followers_count, following_count) = self.counts(target.id).await?;
        let hobbies = self.hobby_dao.for_user(target.id).await?;

        Ok(ProfileView {
            visibility,
            mutual_followers,
            followers_count,
            following_count,
            hobbies,
        })
    }

    pub async fn followers(&self, target: &user::Model) -> Result<Vec<user::Model>, AppError> {
        let ids = self.follow_dao.follower_ids(target.id).await?;
        Ok(self.user_dao.find_many(ids).await?)
    }

    pub async fn following(&self, target: &user::Model) -> Result<Vec<user::Model>, AppError> {
        let ids = self.follow_dao.followed_ids(target.id).await?;
        Ok(self.user_dao.find_many(ids).await?)
    }

    /// Inserts the edge and the target's notification together. Re-following is a no-op.
    pub async fn follow(
        &self,
        actor: &user::Model,
        target: &user::Model,
    ) -> Result<FollowOutcome, AppError> {
        if actor.id == target.id {
            return Ok(FollowOutcome::SelfFollow);
        }
        if self.follow_dao.exists(actor.id, target.id).await? {
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        let text = format!("{} followed you.", actor.public_name());
        let txn = self.follow_dao.db().begin().await?;
        FollowDao::insert_on(&txn, actor.id, target.id).await?;
        NotificationDao::push_on(&txn, target.id, notification::KIND_FOLLOW, &text).await?;
        txn.commit().await?;

        info!(follower = %actor.id, followed = %target.id, "follow created");
        Ok(FollowOutcome::Followed)
    }

    /// `true` when an edge was removed; only then is the target notified.
    pub async fn unfollow(
        &self,
        actor: &user::Model,
        target: &user::Model,
    ) -> Result<bool, AppError> {
        let txn = self.follow_dao.db().begin().await?;
        let removed = FollowDao::remove_on(&txn, actor.id, target.id).await?;
        if removed > 0 {
            let text = format!("{} unfollowed you.", actor.public_name());
            NotificationDao::push_on(&txn, target.id, notification::KIND_UNFOLLOW, &text).await?;
        }
        txn.commit().await?;

        if removed > 0 {
            info!(follower = %actor.id, followed = %target.id, "follow removed");
        }
        Ok(removed > 0)
    }

    pub async fn send_message(
        &self,
        sender: &user::Model,
        target: &user::Model,
        raw_body: &str,
    ) -> Result<MessageOutcome, AppError> {
        if sender.id == target.id {
            return Ok(MessageOutcome::SelfMessage);
        }
        let follows = self.follow_state(sender.id, target.id).await?;
        if !visibility::can_message(Privacy::of(&target.privacy), follows) {
            return Ok(MessageOutcome::NotAllowed);
        }
        let body = match validate_message_body(raw_body) {
            Ok(body) => body,
            Err(message) => return Ok(MessageOutcome::InvalidBody(message)),
        };

        self.message_dao.send(sender.id, target.id, body).await?;
        info!(sender = %sender.id, receiver = %target.id, "message sent");
        Ok(MessageOutcome::Sent)
    }

    /// Case-insensitive match on username or display name. The viewer's own row is
    /// flagged rather than dropped.
    pub async fn search(
        &self,
        viewer: &user::Model,
        query: &str,
    ) -> Result<Vec<SearchHit>, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let users = self.user_dao.search(query, SEARCH_LIMIT).await?;
        let following = self.follow_dao.followed_ids(viewer.id).await?;
        let followers = self.follow_dao.follower_ids(viewer.id).await?;

        Ok(users
            .into_iter()
            .map(|user| {
                let is_self = user.id == viewer.id;
                let follows = FollowState {
                    viewer_follows_target: following.contains(&user.id),
                    target_follows_viewer: followers.contains(&user.id),
                };
                SearchHit {
                    is_self,
                    is_following: !is_self && follows.viewer_follows_target,
                    can_message: !is_self
                        && visibility::can_message(Privacy::of(&user.privacy), follows),
                    user,
                }
            })
            .collect())
    }
}
