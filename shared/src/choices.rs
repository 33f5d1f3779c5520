use std::collections::HashSet;

/// Form value that asks for every counter to be zeroed. Never a valid choice.
pub const RESET_VOTE: &str = "reset";
pub const MIN_CHOICES: usize = 1;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("Too few choices (minimum {MIN_CHOICES})")]
    TooFewChoices,
    #[error("Empty choice name")]
    EmptyChoice,
    #[error("Choice name \"{RESET_VOTE}\" is reserved")]
    ReservedChoice,
    #[error("Duplicate choice: {0}")]
    DuplicateChoice(String),
}

/// The fixed, ordered set of ballot options.
///
/// Built once from configuration and never mutated afterwards; a different
/// set of choices requires a restart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceRegistry {
    ordered: Vec<String>,
    members: HashSet<String>,
}

impl ChoiceRegistry {
    pub fn new<I, S>(names: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ordered: Vec<String> = names.into_iter().map(Into::into).collect();
        if ordered.len() < MIN_CHOICES {
            return Err(RegistryError::TooFewChoices);
        }

        let mut members = HashSet::with_capacity(ordered.len());
        for name in &ordered {
            if name.trim().is_empty() {
                return Err(RegistryError::EmptyChoice);
            }
            if name == RESET_VOTE {
                return Err(RegistryError::ReservedChoice);
            }
            if !members.insert(name.clone()) {
                return Err(RegistryError::DuplicateChoice(name.clone()));
            }
        }

        Ok(Self { ordered, members })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    /// Choices in configuration order.
    pub fn all(&self) -> &[String] {
        &self.ordered
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
