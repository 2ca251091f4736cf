// src/comments/permission.rs

// Who may change what. The client calls these to decide which controls to
// show and `CommentService` calls the same functions before committing.

use crate::models::{comment::Comment, user::Principal};

/// True iff someone is signed in and is either the comment's author or an
/// administrator.
pub fn can_modify_comment(principal: Option<&Principal>, comment: &Comment) -> bool {
    match principal {
        Some(p) => p.id == comment.author.id || p.is_admin(),
        None => false,
    }
}

/// Post CRUD and comment pinning are reserved to administrators.
pub fn can_manage_posts(principal: Option<&Principal>) -> bool {
    principal.is_some_and(Principal::is_admin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{comment::CommentAuthor, user::Role};

    fn principal(id: i64, role: Role) -> Principal {
        Principal {
            id,
            name: format!("user {}", id),
            role,
            image: None,
        }
    }

    fn authored_by(author_id: i64) -> Comment {
        let now = chrono::Utc::now();
        Comment {
            id: 1,
            post_id: 1,
            text: "hello".to_string(),
            is_pinned: false,
            parent_id: None,
            author: CommentAuthor {
                id: author_id,
                name: "author".to_string(),
                image: None,
                role: Role::User,
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn author_may_modify_own_comment() {
        let p = principal(1, Role::User);
        assert!(can_modify_comment(Some(&p), &authored_by(1)));
    }

    #[test]
    fn regular_user_may_not_modify_others() {
        let p = principal(1, Role::User);
        assert!(!can_modify_comment(Some(&p), &authored_by(2)));
    }

    #[test]
    fn admin_may_modify_any_comment() {
        let p = principal(3, Role::Admin);
        assert!(can_modify_comment(Some(&p), &authored_by(2)));
    }

    #[test]
    fn anonymous_may_modify_nothing() {
        assert!(!can_modify_comment(None, &authored_by(1)));
        assert!(!can_modify_comment(None, &authored_by(2)));
    }

    #[test]
    fn only_admins_manage_posts() {
        assert!(can_manage_posts(Some(&principal(1, Role::Admin))));
        assert!(!can_manage_posts(Some(&principal(1, Role::User))));
        assert!(!can_manage_posts(None));
    }
}
