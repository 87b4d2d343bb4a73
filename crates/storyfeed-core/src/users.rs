use std::sync::Arc;

use serde::Serialize;
use storyfeed_gate::RecordGate;
use storyfeed_store::{DocumentStore, Query, UserFilter, UserPatch, UserSort};
use storyfeed_types::{EntityKind, RecordId, User, UserView};
use tracing::info;

use crate::error::{FeedError, FeedResult};
use crate::password::PasswordHasher;
use crate::request::{present, NewUser, UserUpdate};
use crate::sweep::{SweepReport, Sweeper};

const NAME_CHARS: std::ops::RangeInclusive<usize> = 2..=50;
const MAX_EMAIL_CHARS: usize = 50;

/// Result of a user deletion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedUser {
    pub id: RecordId,
    pub username: String,
    #[serde(flatten)]
    pub sweep: SweepReport,
}

impl DeletedUser {
    pub fn message(&self) -> String {
        format!(
            "user {} ({}) deleted; {} stories and {} comments updated",
            self.username, self.id, self.sweep.stories_updated, self.sweep.comments_updated
        )
    }
}

/// User CRUD. Deletion runs the sweeper first.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn DocumentStore<User>>,
    gate: RecordGate,
    sweeper: Sweeper,
    hasher: Arc<dyn PasswordHasher>,
}

/// Required profile fields after trimming.
struct Profile<'a> {
    name: &'a str,
    username: &'a str,
    email: &'a str,
}

impl<'a> Profile<'a> {
    fn parse(
        name: &'a Option<String>,
        username: &'a Option<String>,
        email: &'a Option<String>,
    ) -> FeedResult<Self> {
        let (Some(name), Some(username), Some(email)) =
            (present(name), present(username), present(email))
        else {
            return Err(FeedError::invalid_payload("name, username and email are required"));
        };
        if !NAME_CHARS.contains(&name.chars().count()) {
            return Err(FeedError::invalid_payload("name must be 2 to 50 characters"));
        }
        if !NAME_CHARS.contains(&username.chars().count()) {
            return Err(FeedError::invalid_payload("username must be 2 to 50 characters"));
        }
        if email.chars().count() > MAX_EMAIL_CHARS {
            return Err(FeedError::invalid_payload("email must be at most 50 characters"));
        }
        Ok(Self {
            name,
            username,
            email,
        })
    }
}

impl UserService {
    pub fn new(
        users: Arc<dyn DocumentStore<User>>,
        gate: RecordGate,
        sweeper: Sweeper,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            users,
            gate,
            sweeper,
            hasher,
        }
    }

    pub async fn list_users(&self) -> FeedResult<Vec<UserView>> {
        let users = self.users.find(&Query::all().sorted(UserSort::Username)).await?;
        if users.is_empty() {
            return Err(FeedError::NoMatches(EntityKind::User));
        }
        Ok(users.iter().map(UserView::from).collect())
    }

    pub async fn find_by_username(&self, username: &str) -> FeedResult<Vec<UserView>> {
        let filter = UserFilter::Username(username.trim().to_string());
        let users = self.users.find(&Query::filtered(filter)).await?;
        if users.is_empty() {
            return Err(FeedError::NoMatches(EntityKind::User));
        }
        Ok(users.iter().map(UserView::from).collect())
    }

    pub async fn create_user(&self, req: NewUser) -> FeedResult<UserView> {
        let profile = Profile::parse(&req.name, &req.username, &req.email)?;
        let Some(password) = present(&req.password) else {
            return Err(FeedError::invalid_payload("password is required"));
        };
        self.ensure_username_free(profile.username, None).await?;

        let mut user = User::new(
            profile.name,
            profile.username,
            self.hash(password).await?,
            profile.email,
        );
        user.age = req.age;
        user.picture = req.picture.clone();

        let user = self.users.create(user).await?;
        info!(user = %user.id, username = %user.username, "user created");
        Ok(user.view())
    }

    /// Replace a user's profile. The password hash only changes when a new
    /// password is supplied.
    pub async fn update_user(&self, req: UserUpdate) -> FeedResult<UserView> {
        let Some(raw) = present(&req.id) else {
            return Err(FeedError::invalid_payload("user id is required"));
        };
        let profile = Profile::parse(&req.name, &req.username, &req.email)?;
        let user = self.gate.existing_user(raw).await?;
        self.ensure_username_free(profile.username, Some(user.id)).await?;

        let password_hash = match present(&req.password) {
            Some(password) => Some(self.hash(password).await?),
            None => None,
        };
        let patch = UserPatch {
            name: profile.name.to_string(),
            username: profile.username.to_string(),
            email: profile.email.to_string(),
            age: req.age,
            picture: req.picture.clone(),
            password_hash,
        };
        let updated = self
            .users
            .update_by_id(&user.id, &patch)
            .await?
            .ok_or(FeedError::NotFound {
                kind: EntityKind::User,
                id: user.id,
            })?;
        Ok(updated.view())
    }

    /// Sweep every reference to the user, then delete the user record.
    ///
    /// A failed sweep leaves the user in place.
    pub async fn delete_user(&self, raw: Option<&str>) -> FeedResult<DeletedUser> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Err(FeedError::invalid_payload("user id is required"));
        };
        let user = self.gate.existing_user(raw).await?;

        let sweep = self.sweeper.sweep_user_references(user.id).await?;
        self.users
            .delete_by_id(&user.id)
            .await?
            .ok_or(FeedError::NotFound {
                kind: EntityKind::User,
                id: user.id,
            })?;

        let deleted = DeletedUser {
            id: user.id,
            username: user.username,
            sweep,
        };
        info!(
            user = %deleted.id,
            username = %deleted.username,
            stories = sweep.stories_updated,
            comments = sweep.comments_updated,
            "user deleted"
        );
        Ok(deleted)
    }

    async fn ensure_username_free(&self, username: &str, owner: Option<RecordId>) -> FeedResult<()> {
        let existing = self
            .users
            .find_one(&UserFilter::Username(username.to_string()))
            .await?;
        match existing {
            Some(other) if Some(other.id) != owner => Err(FeedError::DuplicateKey(username.to_string())),
            _ => Ok(()),
        }
    }

    async fn hash(&self, password: &str) -> FeedResult<String> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| FeedError::Internal(format!("hashing task failed: {e}")))?
    }
}
