use crate::model::ids::UserId;

/// The signed-in identity returned by the auth provider.
///
/// The row-store owns authentication entirely; this is just the shape the
/// application reads back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    email: Option<String>,
}

impl User {
    #[must_use]
    pub fn new(id: UserId, email: Option<String>) -> Self {
        let email = email
            .map(|e| e.trim().to_owned())
            .filter(|e| !e.is_empty());
        Self { id, email }
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}
