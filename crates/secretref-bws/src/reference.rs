//! bws reference classification
//!
//! Two addressing schemes share one string space:
//! - `project/<projectName>/key/<keyName>` addresses a secret by names
//! - anything else is an opaque secret ID

/// A classified bws reference borrowing from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BwsRef<'a> {
    /// Opaque backend secret identifier
    Direct(&'a str),
    /// Human-readable project/key pair
    ProjectKey { project: &'a str, key: &'a str },
}

impl<'a> BwsRef<'a> {
    /// Classify an already-trimmed, non-empty reference
    ///
    /// The project/key form is tried first; every other shape is a direct ID.
    pub fn parse(reference: &'a str) -> Self {
        let mut parts = reference.split('/');
        match (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) {
            (Some("project"), Some(project), Some("key"), Some(key), None)
                if !project.is_empty() && !key.is_empty() =>
            {
                BwsRef::ProjectKey { project, key }
            }
            _ => BwsRef::Direct(reference),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_project_key() {
        assert_eq!(
            BwsRef::parse("project/dotenv/key/SUPABASE_ACCESS_TOKEN"),
            BwsRef::ProjectKey {
                project: "dotenv",
                key: "SUPABASE_ACCESS_TOKEN"
            }
        );
    }

    #[test]
    fn test_parse_direct_id() {
        let id = "be8e0ad8-d545-4017-a55a-b02f014d4158";
        assert_eq!(BwsRef::parse(id), BwsRef::Direct(id));
    }

    #[test]
    fn test_parse_falls_back_to_direct() {
        let cases = [
            "project/dotenv/key",
            "project/dotenv/key/TOKEN/extra",
            "project//key/TOKEN",
            "project/dotenv/key/",
            "projects/dotenv/key/TOKEN",
            "project/dotenv/keys/TOKEN",
            "Project/dotenv/key/TOKEN",
            "a/b/c/d",
            "/",
        ];

        for case in cases {
            assert_eq!(BwsRef::parse(case), BwsRef::Direct(case), "case: {}", case);
        }
    }

    #[test]
    fn test_parse_names_may_contain_spaces_and_colons() {
        assert_eq!(
            BwsRef::parse("project/my app/key/db:password"),
            BwsRef::ProjectKey {
                project: "my app",
                key: "db:password"
            }
        );
    }
}
