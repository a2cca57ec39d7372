//! Newtype IDs for type-safe entity references.
//!
//! Every table in the account schema gets its own ID type, so a `StaffId`
//! can never be passed where a `ManagerId` is expected even though both are
//! `SERIAL` columns.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` as a bare number
/// - `Debug`, `Clone`, `Copy`, `Eq`, `Ord`, `Hash`
/// - `new()` / `as_i32()` and `From` conversions both ways
/// - a transparent `sqlx::Type` (with the `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use plated_core::define_id;
/// define_id!(CourierId);
/// define_id!(KitchenId);
///
/// let courier = CourierId::new(1);
/// let kitchen = KitchenId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: CourierId = kitchen;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw `SERIAL` value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// The raw `SERIAL` value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self::new(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.as_i32()
            }
        }
    };
}

// Account and role record IDs
define_id!(IdentityId);
define_id!(CustomerId);
define_id!(StaffId);
define_id!(ManagerId);
define_id!(DeliveryAgentId);
define_id!(AdminId);
define_id!(RestaurantId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_bare_number() {
        assert_eq!(IdentityId::new(42).to_string(), "42");
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&StaffId::new(7)).unwrap();
        assert_eq!(json, "7");

        let parsed: StaffId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed.as_i32(), 7);
    }

    #[test]
    fn test_i32_conversions() {
        let id = ManagerId::from(3);
        assert_eq!(i32::from(id), 3);
    }
}
