//! Field property names

use std::fmt;

/// Every property a mutation may touch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    Value,
    Values,
    InitialValue,
    Errors,
    Warnings,
    EffectErrors,
    EffectWarnings,
    RuleErrors,
    RuleWarnings,
    Editable,
    SelfEditable,
    FormEditable,
    Required,
    Rules,
    Visible,
    Display,
    VisibleCacheValue,
    Mounted,
    Unmounted,
    UnmountRemoveValue,
    Validating,
    Loading,
    Props,
    Initialized,
}

/// Properties compared structurally by the dirty tracker; all others are
/// compared by identity.
pub const DEEP_PROPERTIES: &[Property] = &[
    Property::Props,
    Property::Rules,
    Property::Errors,
    Property::Warnings,
    Property::EffectErrors,
    Property::EffectWarnings,
    Property::RuleErrors,
    Property::RuleWarnings,
];

impl Property {
    pub const ALL: [Property; 24] = [
        Property::Value,
        Property::Values,
        Property::InitialValue,
        Property::Errors,
        Property::Warnings,
        Property::EffectErrors,
        Property::EffectWarnings,
        Property::RuleErrors,
        Property::RuleWarnings,
        Property::Editable,
        Property::SelfEditable,
        Property::FormEditable,
        Property::Required,
        Property::Rules,
        Property::Visible,
        Property::Display,
        Property::VisibleCacheValue,
        Property::Mounted,
        Property::Unmounted,
        Property::UnmountRemoveValue,
        Property::Validating,
        Property::Loading,
        Property::Props,
        Property::Initialized,
    ];

    /// Wire name (camelCase, as accepted in JSON mutations)
    pub fn as_str(&self) -> &'static str {
        match self {
            Property::Value => "value",
            Property::Values => "values",
            Property::InitialValue => "initialValue",
            Property::Errors => "errors",
            Property::Warnings => "warnings",
            Property::EffectErrors => "effectErrors",
            Property::EffectWarnings => "effectWarnings",
            Property::RuleErrors => "ruleErrors",
            Property::RuleWarnings => "ruleWarnings",
            Property::Editable => "editable",
            Property::SelfEditable => "selfEditable",
            Property::FormEditable => "formEditable",
            Property::Required => "required",
            Property::Rules => "rules",
            Property::Visible => "visible",
            Property::Display => "display",
            Property::VisibleCacheValue => "visibleCacheValue",
            Property::Mounted => "mounted",
            Property::Unmounted => "unmounted",
            Property::UnmountRemoveValue => "unmountRemoveValue",
            Property::Validating => "validating",
            Property::Loading => "loading",
            Property::Props => "props",
            Property::Initialized => "initialized",
        }
    }

    pub fn from_name(name: &str) -> Option<Property> {
        Property::ALL.iter().copied().find(|p| p.as_str() == name)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
