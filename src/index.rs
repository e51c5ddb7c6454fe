//! Index tuples over which parameters, variables and constraints are defined.
use std::fmt::Display;

/// Something that can be used as the index of a parameter, variable or constraint instance.
///
/// The description is used to name constraint instances and in error messages, so that a missing
/// parameter can be traced back to the tuple that needed it.
pub trait IndexKey {
    /// A human-readable description of the index, e.g. `(3, coal, EL)`
    fn describe(&self) -> String;
}

macro_rules! impl_index_key_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: Display),+> IndexKey for ($($name,)+) {
            #[allow(non_snake_case)]
            fn describe(&self) -> String {
                let ($($name,)+) = self;
                let parts = [$($name.to_string()),+];
                format!("({})", parts.join(", "))
            }
        }
    };
}

impl_index_key_for_tuple!(A, B);
impl_index_key_for_tuple!(A, B, C);
impl_index_key_for_tuple!(A, B, C, D);
impl_index_key_for_tuple!(A, B, C, D, E);

macro_rules! impl_index_key_for_scalar {
    ($($t:ty),+) => {
        $(
            impl IndexKey for $t {
                fn describe(&self) -> String {
                    format!("({self})")
                }
            }
        )+
    };
}

impl_index_key_for_scalar!(
    crate::id::PlantID,
    crate::id::NodeID,
    crate::id::CarrierID,
    crate::id::FuelID,
    crate::time_slot::TimeSlot,
    crate::time_slot::Month
);

impl<T: IndexKey + ?Sized> IndexKey for &T {
    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{CarrierID, PlantID};
    use crate::time_slot::TimeSlot;

    #[test]
    fn test_describe() {
        let key = (TimeSlot(3), PlantID::new("coal"), CarrierID::new("EL"));
        assert_eq!(key.describe(), "(3, coal, EL)");
        assert_eq!(PlantID::new("coal").describe(), "(coal)");
    }
}
