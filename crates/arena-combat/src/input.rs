//! Logical input symbols consumed by the combat core.
//!
//! Device handling and continuous movement axes live outside the core; by the
//! time input reaches here it is one discrete symbol per combatant per tick.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Rejection;

/// Discrete input symbol for one combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputSymbol {
    /// Step/face left.
    MoveLeft,
    /// Step/face right.
    MoveRight,
    /// Jump (also a jump-cancel chain input).
    Jump,
    /// Light attack button.
    LightAttack,
    /// Heavy attack button.
    HeavyAttack,
    /// Launcher attack button.
    LauncherAttack,
    /// Special attack button.
    SpecialAttack,
    /// Ultimate attack button.
    UltimateAttack,
    /// Dodge button.
    Dodge,
    /// Transformation button.
    Transform,
}

/// Input category used to select combo chain edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputCategory {
    /// Light button.
    Light,
    /// Heavy button.
    Heavy,
    /// Launcher button.
    Launcher,
    /// Special button.
    Special,
    /// Ultimate button.
    Ultimate,
    /// Dodge button.
    Dodge,
    /// Jump button.
    Jump,
}

impl InputSymbol {
    /// All symbols, in a fixed order.
    pub const ALL: [Self; 10] = [
        Self::MoveLeft,
        Self::MoveRight,
        Self::Jump,
        Self::LightAttack,
        Self::HeavyAttack,
        Self::LauncherAttack,
        Self::SpecialAttack,
        Self::UltimateAttack,
        Self::Dodge,
        Self::Transform,
    ];

    /// Parses a symbol name. Accepts the camelCase event names
    /// (`lightAttack`) and the short button names (`light`).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let symbol = match name.trim() {
            "moveLeft" | "left" => Self::MoveLeft,
            "moveRight" | "right" => Self::MoveRight,
            "jump" => Self::Jump,
            "lightAttack" | "light" => Self::LightAttack,
            "heavyAttack" | "heavy" => Self::HeavyAttack,
            "launcherAttack" | "launcher" => Self::LauncherAttack,
            "specialAttack" | "special" => Self::SpecialAttack,
            "ultimateAttack" | "ultimate" => Self::UltimateAttack,
            "dodge" => Self::Dodge,
            "transform" => Self::Transform,
            _ => return None,
        };
        Some(symbol)
    }

    /// Canonical event name of this symbol.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MoveLeft => "moveLeft",
            Self::MoveRight => "moveRight",
            Self::Jump => "jump",
            Self::LightAttack => "lightAttack",
            Self::HeavyAttack => "heavyAttack",
            Self::LauncherAttack => "launcherAttack",
            Self::SpecialAttack => "specialAttack",
            Self::UltimateAttack => "ultimateAttack",
            Self::Dodge => "dodge",
            Self::Transform => "transform",
        }
    }

    /// Chain category of this symbol, if it can start or chain a move.
    #[must_use]
    pub const fn category(self) -> Option<InputCategory> {
        match self {
            Self::LightAttack => Some(InputCategory::Light),
            Self::HeavyAttack => Some(InputCategory::Heavy),
            Self::LauncherAttack => Some(InputCategory::Launcher),
            Self::SpecialAttack => Some(InputCategory::Special),
            Self::UltimateAttack => Some(InputCategory::Ultimate),
            Self::Dodge => Some(InputCategory::Dodge),
            Self::Jump => Some(InputCategory::Jump),
            Self::MoveLeft | Self::MoveRight | Self::Transform => None,
        }
    }
}

impl FromStr for InputSymbol {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| Rejection::InvalidInput(s.to_string()))
    }
}

impl std::fmt::Display for InputSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_both_spellings() {
        assert_eq!(InputSymbol::parse("light"), Some(InputSymbol::LightAttack));
        assert_eq!(InputSymbol::parse("lightAttack"), Some(InputSymbol::LightAttack));
        assert_eq!(InputSymbol::parse("launcher"), Some(InputSymbol::LauncherAttack));
        assert_eq!(InputSymbol::parse("transform"), Some(InputSymbol::Transform));
    }

    #[test]
    fn test_unknown_symbol() {
        assert_eq!(InputSymbol::parse("hadouken"), None);
        let err = "hadouken".parse::<InputSymbol>();
        assert!(matches!(err, Err(Rejection::InvalidInput(_))));
    }

    #[test]
    fn test_names_round_trip() {
        for symbol in InputSymbol::ALL {
            assert_eq!(InputSymbol::parse(symbol.name()), Some(symbol));
        }
    }

    #[test]
    fn test_categories() {
        assert_eq!(InputSymbol::Jump.category(), Some(InputCategory::Jump));
        assert_eq!(InputSymbol::MoveLeft.category(), None);
        assert_eq!(InputSymbol::Transform.category(), None);
    }
}
