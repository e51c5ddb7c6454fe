//! This module defines the physical and monetary quantities used by the formulation.
//!
//! Instantaneous quantities (power) and accumulated quantities (energy) are kept apart: the only
//! way to turn one into the other is to multiply or divide by a duration in [`Hours`].
use serde::{Deserialize, Serialize};

macro_rules! unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Default,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
        )]
        pub struct $name(pub f64);

        impl $name {
            /// Creates a new instance of the unit type from a f64 value.
            pub fn new(val: f64) -> Self {
                Self(val)
            }

            /// Returns the value of the unit type as a f64.
            pub fn value(self) -> f64 {
                self.0
            }

            /// Whether the underlying value is finite
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl std::ops::Neg for $name {
            type Output = $name;
            fn neg(self) -> $name {
                $name(-self.0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

macro_rules! impl_scale {
    ($name:ident) => {
        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 / rhs.0)
            }
        }
    };
}

unit_struct!(Dimensionless);

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

// Base quantities
unit_struct!(Power);
unit_struct!(Energy);
unit_struct!(Hours);
unit_struct!(Money);
unit_struct!(Tonnes);

// Derived quantities
unit_struct!(MoneyPerEnergy);
unit_struct!(MoneyPerPower);
unit_struct!(MoneyPerTonne);
unit_struct!(TonnesPerEnergy);

impl_scale!(Power);
impl_scale!(Energy);
impl_scale!(Hours);
impl_scale!(Money);
impl_scale!(MoneyPerEnergy);
impl_scale!(MoneyPerPower);

// Multiplication rules
impl_mul!(Power, Hours, Energy);
impl_mul!(MoneyPerEnergy, Energy, Money);
impl_mul!(MoneyPerPower, Power, Money);
impl_mul!(TonnesPerEnergy, MoneyPerTonne, MoneyPerEnergy);
impl_mul!(TonnesPerEnergy, Energy, Tonnes);

// Division rules
impl_div!(Energy, Hours, Power);
impl_div!(Energy, Power, Hours);
impl_div!(Money, Energy, MoneyPerEnergy);

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_power_times_hours_is_energy() {
        let energy: Energy = Power(50.0) * Hours(2.0);
        assert_approx_eq!(f64, energy.value(), 100.0);
        let power: Power = energy / Hours(4.0);
        assert_approx_eq!(f64, power.value(), 25.0);
    }

    #[test]
    fn test_emission_cost() {
        let price: MoneyPerEnergy = TonnesPerEnergy(0.3) * MoneyPerTonne(20.0);
        assert_approx_eq!(f64, price.value(), 6.0);
    }
}
