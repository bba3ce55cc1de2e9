use serde::{Deserialize, Serialize};

/// Row of the remote `communities` table. Server-assigned id, never
/// mutated client-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCommunity {
    pub name: String,
    pub description: String,
}

impl NewCommunity {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Community name cannot be empty".to_string());
        }
        if self.name.len() > 100 {
            return Err("Community name must be at most 100 characters".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("Community description cannot be empty".to_string());
        }
        if self.description.len() > 2000 {
            return Err("Community description must be at most 2000 characters".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> NewCommunity {
        NewCommunity {
            name: "rustaceans".to_string(),
            description: "Systems programming talk".to_string(),
        }
    }

    #[test]
    fn valid_community_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn blank_name_rejected() {
        let mut c = valid();
        c.name = "   ".to_string();
        assert!(c.validate().is_err());
    }

    #[test]
    fn oversized_name_rejected() {
        let mut c = valid();
        c.name = "x".repeat(101);
        assert!(c.validate().is_err());
    }

    #[test]
    fn blank_description_rejected() {
        let mut c = valid();
        c.description = String::new();
        assert!(c.validate().is_err());
    }
}
