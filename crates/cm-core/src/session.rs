//! Session-scoped edit capability.
//!
//! A listing is editable only by the runtime that created it. This is an
//! anti-abuse heuristic and not authentication: whoever can edit the stored
//! collection directly can bypass it.

/// Ids of listings created during the current runtime. Append-only.
#[derive(Debug, Clone, Default)]
pub struct SessionOwnership {
    created: Vec<String>,
}

impl SessionOwnership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_created(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.created.contains(&id) {
            self.created.push(id);
        }
    }

    pub fn is_editable(&self, id: &str) -> bool {
        self.created.iter().any(|c| c == id)
    }

    pub fn created_ids(&self) -> &[String] {
        &self.created
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_marked_ids_are_editable() {
        let mut session = SessionOwnership::new();
        assert!(!session.is_editable("abc"));
        session.mark_created("abc");
        assert!(session.is_editable("abc"));
        assert!(!session.is_editable("abd"));
    }

    #[test]
    fn marking_twice_keeps_one_entry() {
        let mut session = SessionOwnership::new();
        session.mark_created("x");
        session.mark_created("x");
        assert_eq!(session.created_ids(), ["x".to_string()]);
    }
}
