//! User filters, patches and sort orders.

use std::cmp::Ordering;

use storyfeed_types::{EntityKind, RecordId, User};

use crate::traits::Document;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserFilter {
    Username(String),
}

/// Full profile replacement.
///
/// `age` and `picture` are replaced as given, so `None` clears them. The
/// password hash only changes when `password_hash` is `Some`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserPatch {
    pub name: String,
    pub username: String,
    pub email: String,
    pub age: Option<u32>,
    pub picture: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UserSort {
    #[default]
    Username,
}

impl Document for User {
    type Filter = UserFilter;
    type Patch = UserPatch;
    type Sort = UserSort;

    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> RecordId {
        self.id
    }

    fn matches(&self, filter: &UserFilter) -> bool {
        match filter {
            UserFilter::Username(username) => &self.username == username,
        }
    }

    fn apply(&mut self, patch: &UserPatch) -> usize {
        let before = self.clone();
        self.name.clone_from(&patch.name);
        self.username.clone_from(&patch.username);
        self.email.clone_from(&patch.email);
        self.age = patch.age;
        self.picture.clone_from(&patch.picture);
        if let Some(hash) = &patch.password_hash {
            self.password_hash.clone_from(hash);
        }
        usize::from(*self != before)
    }

    fn compare(a: &Self, b: &Self, sort: &UserSort) -> Ordering {
        match sort {
            UserSort::Username => a.username.cmp(&b.username),
        }
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.username.clone())
    }
}
