//! Best-effort grouped writes

/// A single write inside a [`CommandGroup`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupCommand {
    /// Delete a key/value entry
    KvDelete(String),
    /// Add a member to a tag set
    SetAdd { set: String, member: String },
    /// Remove a member from a tag set
    SetRemove { set: String, member: String },
    /// Remove every member of a tag set
    SetClear(String),
}

/// Ordered batch of writes sent to a backend in one go
///
/// Grouping only saves round trips. Backends never execute a group
/// atomically and other clients may observe any prefix of it.
#[derive(Debug, Clone, Default)]
pub struct CommandGroup {
    commands: Vec<GroupCommand>,
}

impl CommandGroup {
    /// Create an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a key/value delete
    pub fn kv_delete(&mut self, key: impl Into<String>) -> &mut Self {
        self.commands.push(GroupCommand::KvDelete(key.into()));
        self
    }

    /// Queue a set member addition
    pub fn set_add(&mut self, set: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.commands.push(GroupCommand::SetAdd {
            set: set.into(),
            member: member.into(),
        });
        self
    }

    /// Queue a set member removal
    pub fn set_remove(&mut self, set: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.commands.push(GroupCommand::SetRemove {
            set: set.into(),
            member: member.into(),
        });
        self
    }

    /// Queue a set clear
    pub fn set_clear(&mut self, set: impl Into<String>) -> &mut Self {
        self.commands.push(GroupCommand::SetClear(set.into()));
        self
    }

    /// Queued commands in execution order
    pub fn commands(&self) -> &[GroupCommand] {
        &self.commands
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl IntoIterator for CommandGroup {
    type Item = GroupCommand;
    type IntoIter = std::vec::IntoIter<GroupCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_keeps_order() {
        let mut group = CommandGroup::new();
        group
            .set_remove("t:old", "id")
            .set_add("t:new", "id")
            .set_clear("r:id")
            .kv_delete("e:id");

        assert_eq!(group.len(), 4);
        assert_eq!(
            group.commands()[0],
            GroupCommand::SetRemove {
                set: "t:old".to_string(),
                member: "id".to_string()
            }
        );
        assert_eq!(group.commands()[3], GroupCommand::KvDelete("e:id".to_string()));
    }

    #[test]
    fn test_empty_group() {
        let group = CommandGroup::new();
        assert!(group.is_empty());
        assert_eq!(group.into_iter().count(), 0);
    }
}
