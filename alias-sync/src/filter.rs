// alias-sync/src/filter.rs
use alias_client::Alias;
use serde::{Deserialize, Serialize};

/// Which subset of the alias list is on screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    All,
    Active,
    Inactive,
}

impl FilterMode {
    pub const ALL_MODES: [FilterMode; 3] = [Self::All, Self::Active, Self::Inactive];

    /// Tab index used by list screens
    pub fn position(&self) -> usize {
        match self {
            Self::All => 0,
            Self::Active => 1,
            Self::Inactive => 2,
        }
    }

    pub fn from_position(position: usize) -> Option<Self> {
        Self::ALL_MODES.get(position).copied()
    }

    pub fn matches(&self, alias: &Alias) -> bool {
        match self {
            Self::All => true,
            Self::Active => alias.enabled,
            Self::Inactive => !alias.enabled,
        }
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Inactive => "inactive",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" | "enabled" => Ok(Self::Active),
            "inactive" | "disabled" => Ok(Self::Inactive),
            other => Err(format!(
                "unknown filter '{}', expected all, active or inactive",
                other
            )),
        }
    }
}

/// Derive the visible subset of `canonical` for `mode`, keeping server order.
pub fn project(canonical: &[Alias], mode: FilterMode) -> Vec<&Alias> {
    canonical.iter().filter(|a| mode.matches(a)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Alias> {
        vec![
            Alias::new(1, "one@sl.co", true),
            Alias::new(2, "two@sl.co", false),
            Alias::new(3, "three@sl.co", true),
            Alias::new(4, "four@sl.co", false),
        ]
    }

    fn ids(visible: &[&Alias]) -> Vec<u64> {
        visible.iter().map(|a| a.id.0).collect()
    }

    #[test]
    fn test_project_all_keeps_everything_in_order() {
        let aliases = sample();
        assert_eq!(ids(&project(&aliases, FilterMode::All)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_project_active_and_inactive_partition() {
        let aliases = sample();
        assert_eq!(ids(&project(&aliases, FilterMode::Active)), vec![1, 3]);
        assert_eq!(ids(&project(&aliases, FilterMode::Inactive)), vec![2, 4]);
    }

    #[test]
    fn test_project_is_repeatable() {
        let aliases = sample();
        let first = project(&aliases, FilterMode::Inactive);
        let second = project(&aliases, FilterMode::Inactive);
        assert_eq!(first, second);
        assert_eq!(aliases, sample());
    }

    #[test]
    fn test_project_empty_result() {
        let aliases = vec![Alias::new(1, "one@sl.co", false)];
        assert!(project(&aliases, FilterMode::Active).is_empty());
    }

    #[test]
    fn test_positions() {
        for mode in FilterMode::ALL_MODES {
            assert_eq!(FilterMode::from_position(mode.position()), Some(mode));
        }
        assert_eq!(FilterMode::from_position(3), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Active".parse::<FilterMode>().unwrap(), FilterMode::Active);
        assert_eq!("disabled".parse::<FilterMode>().unwrap(), FilterMode::Inactive);
        assert!("pinned".parse::<FilterMode>().is_err());
    }
}
