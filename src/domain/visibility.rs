//! Who may see what on a profile. Pure over a snapshot of the follow graph; recomputed on
//! every request.

use uuid::Uuid;

use crate::db::entities::user;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privacy {
    Public,
    Private,
}

impl Privacy {
    /// Anything other than `private` is treated as public.
    pub fn of(value: &str) -> Self {
        if value == user::PRIVACY_PRIVATE {
            Self::Private
        } else {
            Self::Public
        }
    }
}

/// Follow edges between a viewer and a target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowState {
    pub viewer_follows_target: bool,
    pub target_follows_viewer: bool,
}

impl FollowState {
    pub fn is_mutual(&self) -> bool {
        self.viewer_follows_target && self.target_follows_viewer
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visibility {
    pub is_owner: bool,
    pub is_following: bool,
    pub is_followed_by: bool,
    pub can_message: bool,
    pub private_view: bool,
    pub can_view_connections: bool,
}

pub fn can_message(target: Privacy, follows: FollowState) -> bool {
    target == Privacy::Public || follows.is_mutual()
}

/// Follower lists are stricter than messaging: mutual followers of a private profile may
/// message its owner but still cannot list its connections.
pub fn can_view_connections(target: Privacy, is_owner: bool) -> bool {
    target == Privacy::Public || is_owner
}

/// `follows` is ignored for anonymous viewers and for the owner.
pub fn resolve(
    viewer: Option<Uuid>,
    target_id: Uuid,
    target: Privacy,
    follows: FollowState,
) -> Visibility {
    let is_owner = viewer == Some(target_id);
    let relationship = match viewer {
        Some(_) if !is_owner => follows,
        _ => FollowState::default(),
    };
    let is_member = viewer.is_some() && !is_owner;

    Visibility {
        is_owner,
        is_following: relationship.viewer_follows_target,
        is_followed_by: relationship.target_follows_viewer,
        can_message: is_member && can_message(target, relationship),
        private_view: target == Privacy::Private && !is_owner,
        can_view_connections: can_view_connections(target, is_owner),
    }
}

/// Users who follow the target and are followed by the viewer, in target-follower order.
pub fn mutual_followers(target_followers: &[Uuid], viewer_following: &[Uuid]) -> Vec<Uuid> {
    target_followers
        .iter()
        .filter(|id| viewer_following.contains(id))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn follows(viewer_follows_target: bool, target_follows_viewer: bool) -> FollowState {
        FollowState {
            viewer_follows_target,
            target_follows_viewer,
        }
    }

    #[test]
    fn can_message_truth_table() {
        for (privacy, a, b, expected) in [
            (Privacy::Public, false, false, true),
            (Privacy::Public, true, false, true),
            (Privacy::Private, false, false, false),
            (Privacy::Private, true, false, false),
            (Privacy::Private, false, true, false),
            (Privacy::Private, true, true, true),
        ] {
            assert_eq!(
                can_message(privacy, follows(a, b)),
                expected,
                "{privacy:?} follows=({a},{b})"
            );
        }
    }

    #[test]
    fn mutual_followers_of_private_profile_can_message_but_not_list() {
        let viewer = Uuid::new_v4();
        let target = Uuid::new_v4();
        let view = resolve(Some(viewer), target, Privacy::Private, follows(true, true));

        assert!(view.can_message);
        assert!(!view.can_view_connections);
        assert!(view.private_view);
        assert!(view.is_following && view.is_followed_by);
    }

    #[test]
    fn owner_sees_everything_but_cannot_message_self() {
        let me = Uuid::new_v4();
        let view = resolve(Some(me), me, Privacy::Private, follows(true, true));

        assert!(view.is_owner);
        assert!(!view.private_view);
        assert!(view.can_view_connections);
        assert!(!view.can_message);
        assert!(!view.is_following);
    }

    #[test]
    fn anonymous_viewer_gets_no_relationship() {
        let target = Uuid::new_v4();
        let view = resolve(None, target, Privacy::Public, follows(true, true));

        assert!(!view.is_owner);
        assert!(!view.is_following);
        assert!(!view.can_message);
        assert!(view.can_view_connections);
        assert!(!view.private_view);
    }

    #[test]
    fn two_strangers_with_public_profiles_can_message_each_other() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(resolve(Some(a), b, Privacy::Public, FollowState::default()).can_message);
        assert!(resolve(Some(b), a, Privacy::Public, FollowState::default()).can_message);
        assert!(!resolve(Some(a), b, Privacy::Private, FollowState::default()).can_message);
    }

    #[test]
    fn mutual_followers_is_an_intersection() {
        let (x, y, z) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(mutual_followers(&[x, y, z], &[z, x]), vec![x, z]);
        assert!(mutual_followers(&[x], &[]).is_empty());
    }

    #[test]
    fn unknown_privacy_values_read_as_public() {
        assert_eq!(Privacy::of("private"), Privacy::Private);
        assert_eq!(Privacy::of("public"), Privacy::Public);
        assert_eq!(Privacy::of(""), Privacy::Public);
    }
}
