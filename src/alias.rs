//! Aliasing flags for caller-owned containers.

use bon::Builder;

/// Five independent tri-state aliasing flags, each `Some(true)`, `Some(false)`,
/// or `None` (unset, deferred to the consumer).
///
/// The flags are an ownership contract, not a lock: a consumer observing
/// `alias_u0 = Some(false)` must defensively copy the initial-state container
/// before mutating it; `Some(true)` grants permission to mutate and reuse it
/// in place.
#[derive(Builder, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AliasSpecifier {
    pub alias_p: Option<bool>,
    pub alias_f: Option<bool>,
    pub alias_u0: Option<bool>,
    pub alias_tstops: Option<bool>,
    pub alias_jumps: Option<bool>,
}

impl AliasSpecifier {
    /// The convenience `alias` shorthand: `Some(flag)` forces all five flags
    /// to `flag`; `None` leaves all five unset.
    pub fn new(alias: Option<bool>) -> Self {
        match alias {
            Some(flag) => Self::all(flag),
            None => Self::default(),
        }
    }

    /// All five flags set to the same value.
    pub fn all(flag: bool) -> Self {
        Self {
            alias_p: Some(flag),
            alias_f: Some(flag),
            alias_u0: Some(flag),
            alias_tstops: Some(flag),
            alias_jumps: Some(flag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_shorthand_forces_all_five() {
        let on = AliasSpecifier::new(Some(true));
        assert_eq!(on.alias_p, Some(true));
        assert_eq!(on.alias_f, Some(true));
        assert_eq!(on.alias_u0, Some(true));
        assert_eq!(on.alias_tstops, Some(true));
        assert_eq!(on.alias_jumps, Some(true));

        let off = AliasSpecifier::new(Some(false));
        assert_eq!(off, AliasSpecifier::all(false));
        assert_eq!(off.alias_u0, Some(false));
    }

    #[test]
    fn no_arguments_leaves_all_unset() {
        let unset = AliasSpecifier::new(None);
        assert_eq!(unset, AliasSpecifier::default());
        assert_eq!(unset.alias_p, None);
        assert_eq!(unset.alias_f, None);
        assert_eq!(unset.alias_u0, None);
        assert_eq!(unset.alias_tstops, None);
        assert_eq!(unset.alias_jumps, None);
    }

    #[test]
    fn builder_sets_individual_flags() {
        let spec = AliasSpecifier::builder().alias_u0(true).build();
        assert_eq!(spec.alias_u0, Some(true));
        assert_eq!(spec.alias_p, None);
    }
}
