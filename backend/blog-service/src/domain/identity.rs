use super::models::Author;
use crate::error::AuthorizationError;

/// Who is making the request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(Author),
}

impl Identity {
    pub fn author(&self) -> Option<&Author> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(author) => Some(author),
        }
    }

    /// The authenticated author, or an authorization failure for anonymous callers.
    pub fn require_author(&self) -> Result<&Author, AuthorizationError> {
        match self {
            Identity::Anonymous => Err(AuthorizationError::Anonymous),
            Identity::Authenticated(author) => Ok(author),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated(_))
    }
}

impl From<Author> for Identity {
    fn from(author: Author) -> Self {
        Identity::Authenticated(author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn anonymous_cannot_act_as_author() {
        let identity = Identity::Anonymous;
        assert!(identity.author().is_none());
        assert!(matches!(
            identity.require_author(),
            Err(AuthorizationError::Anonymous)
        ));
    }

    #[test]
    fn authenticated_yields_author() {
        let author = Author {
            id: Uuid::new_v4(),
            username: "leo".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            date_joined: Utc::now(),
        };
        let identity = Identity::from(author.clone());
        assert!(identity.is_authenticated());
        assert_eq!(identity.require_author().unwrap(), &author);
    }
}
