//! Exact rational arithmetic for solver quantities

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::error::RationalError;

/// An arbitrary-precision fraction, always in lowest terms.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rational(BigRational);

impl Rational {
    pub fn new(num: impl Into<BigInt>, den: impl Into<BigInt>) -> Result<Self, RationalError> {
        let den = den.into();
        if den.is_zero() {
            return Err(RationalError::ZeroDenominator);
        }
        Ok(Self(BigRational::new(num.into(), den)))
    }

    /// Builds `num / den` from machine integers.
    ///
    /// # Panics
    ///
    /// Panics if `den` is zero.
    pub fn ratio(num: i64, den: i64) -> Self {
        assert!(den != 0, "rational with zero denominator");
        Self(BigRational::new(BigInt::from(num), BigInt::from(den)))
    }

    pub fn zero() -> Self {
        Self(BigRational::zero())
    }

    pub fn one() -> Self {
        Self(BigRational::one())
    }

    pub fn two() -> Self {
        Self::from(2)
    }

    pub fn minus_one() -> Self {
        Self::from(-1)
    }

    pub fn numer(&self) -> &BigInt {
        self.0.numer()
    }

    pub fn denom(&self) -> &BigInt {
        self.0.denom()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    pub fn checked_div(&self, rhs: &Rational) -> Result<Self, RationalError> {
        if rhs.is_zero() {
            return Err(RationalError::ZeroDenominator);
        }
        Ok(Self(&self.0 / &rhs.0))
    }

    /// Renders the value as a fixed-point decimal with `precision` fractional
    /// digits, rounding half away from zero.
    pub fn to_decimal(&self, precision: usize) -> String {
        let scale = BigInt::from(10u32).pow(precision as u32);
        let (mut digits, rem) = (self.numer().abs() * scale).div_rem(self.denom());
        if rem * 2u32 >= *self.denom() {
            digits += 1u32;
        }

        let mut text = digits.to_string();
        if precision > 0 {
            if text.len() <= precision {
                text = format!("{}{}", "0".repeat(precision + 1 - text.len()), text);
            }
            text.insert(text.len() - precision, '.');
        }
        if self.is_negative() && !digits.is_zero() {
            text.insert(0, '-');
        }
        text
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<i64> for Rational {
    fn from(value: i64) -> Self {
        Self(BigRational::from_integer(BigInt::from(value)))
    }
}

impl From<BigInt> for Rational {
    fn from(value: BigInt) -> Self {
        Self(BigRational::from_integer(value))
    }
}

impl From<BigRational> for Rational {
    fn from(value: BigRational) -> Self {
        Self(value)
    }
}

impl FromStr for Rational {
    type Err = RationalError;

    /// Accepts `"n"`, `"n/d"` and decimal literals such as `"-1.25"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || RationalError::Parse(s.to_string());

        if let Some((n, d)) = text.split_once('/') {
            let num = BigInt::from_str(n.trim()).map_err(|_| invalid())?;
            let den = BigInt::from_str(d.trim()).map_err(|_| invalid())?;
            return Rational::new(num, den);
        }

        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (whole, frac) = body.split_once('.').unwrap_or((body, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let num = BigInt::from_str(&format!("{whole}{frac}")).map_err(|_| invalid())?;
        let value = Rational::new(num, BigInt::from(10u32).pow(frac.len() as u32))?;
        Ok(if negative { -value } else { value })
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

macro_rules! delegate_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<&Rational> for &Rational {
            type Output = Rational;

            fn $method(self, rhs: &Rational) -> Rational {
                Rational((&self.0).$method(&rhs.0))
            }
        }

        impl $imp<Rational> for Rational {
            type Output = Rational;

            fn $method(self, rhs: Rational) -> Rational {
                Rational(self.0.$method(rhs.0))
            }
        }

        impl $imp<&Rational> for Rational {
            type Output = Rational;

            fn $method(self, rhs: &Rational) -> Rational {
                Rational(self.0.$method(&rhs.0))
            }
        }

        impl $imp<Rational> for &Rational {
            type Output = Rational;

            fn $method(self, rhs: Rational) -> Rational {
                Rational((&self.0).$method(rhs.0))
            }
        }
    };
}

delegate_binop!(Add, add);
delegate_binop!(Sub, sub);
delegate_binop!(Mul, mul);
// Division by zero panics, like the primitive integer types.
delegate_binop!(Div, div);

impl AddAssign<&Rational> for Rational {
    fn add_assign(&mut self, rhs: &Rational) {
        self.0 += &rhs.0;
    }
}

impl AddAssign<Rational> for Rational {
    fn add_assign(&mut self, rhs: Rational) {
        self.0 += rhs.0;
    }
}

impl SubAssign<&Rational> for Rational {
    fn sub_assign(&mut self, rhs: &Rational) {
        self.0 -= &rhs.0;
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational(-self.0)
    }
}

impl Neg for &Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational(-&self.0)
    }
}

impl Zero for Rational {
    fn zero() -> Self {
        Rational::zero()
    }

    fn is_zero(&self) -> bool {
        Rational::is_zero(self)
    }
}

impl One for Rational {
    fn one() -> Self {
        Rational::one()
    }
}

impl Sum for Rational {
    fn sum<I: Iterator<Item = Rational>>(iter: I) -> Self {
        Rational(iter.map(|r| r.0).sum())
    }
}

impl<'a> Sum<&'a Rational> for Rational {
    fn sum<I: Iterator<Item = &'a Rational>>(iter: I) -> Self {
        Rational(iter.map(|r| &r.0).sum())
    }
}
