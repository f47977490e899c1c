use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Statement lines carry two fractional digits.
pub(crate) const STATEMENT_DIGITS: u32 = 2;

#[derive(Debug, Error)]
pub enum ConvertAmountError {
    /// Unable to parse decimal string.
    #[error("Unable to parse decimal string")]
    Decimal(#[from] rust_decimal::Error),

    /// Not an ISO 4217 style code.
    #[error("Invalid currency code: `{0}`")]
    CurrencyCode(String),

    /// Exchange rates must be strictly positive.
    #[error("Exchange rate must be positive, got {0}")]
    NonPositiveRate(Decimal),

    /// One of the conversion legs was zero.
    #[error("Conversion leg is zero: {0}")]
    ZeroLeg(Money),
}

/// A three letter currency code such as `USD` or `EUR`.
#[derive(Copy, Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

/// Amount denominated in the account (foreign) currency.
#[derive(Copy, Clone, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct ForeignAmount(Decimal);

/// Amount denominated in the reporting (domestic) currency.
#[derive(Copy, Clone, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct DomesticAmount(Decimal);

/// Foreign units per one domestic unit. Always strictly positive.
#[derive(Copy, Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct ExchangeRate(Decimal);

/// A signed value with its currency, as it appears on the account statement.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Money {
    pub value: Decimal,
    pub currency: CurrencyCode,
}

macro_rules! impl_math_ops {
    ($name:ident) => {
        impl ::std::ops::Add for $name {
            type Output = Self;

            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl ::std::ops::AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl ::std::ops::Neg for $name {
            type Output = Self;

            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl ::std::ops::Sub for $name {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl ::std::ops::SubAssign for $name {
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl ::std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold(Self::default(), |acc, x| acc + x)
            }
        }

        impl $name {
            pub const ZERO: Self = Self(Decimal::ZERO);

            pub fn new(value: Decimal) -> Self {
                Self(value)
            }

            pub fn to_decimal(self) -> Decimal {
                self.0
            }

            pub fn is_zero(self) -> bool {
                self.0.is_zero()
            }

            pub fn is_positive(self) -> bool {
                self.0 > Decimal::ZERO
            }

            pub fn is_negative(self) -> bool {
                self.0 < Decimal::ZERO
            }

            pub fn abs(self) -> Self {
                Self(self.0.abs())
            }
        }

        impl FromStr for $name {
            type Err = ConvertAmountError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

impl_math_ops!(ForeignAmount);
impl_math_ops!(DomesticAmount);

impl ForeignAmount {
    /// Value of this amount in the domestic currency at the given rate.
    pub fn to_domestic(self, rate: ExchangeRate) -> DomesticAmount {
        DomesticAmount(self.0 / rate.0)
    }
}

impl DomesticAmount {
    /// Round to statement precision. Midpoints round away from zero.
    pub fn round_for_statement(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(STATEMENT_DIGITS, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl ExchangeRate {
    /// Create a rate from a strictly positive decimal.
    pub fn new(rate: Decimal) -> Result<Self, ConvertAmountError> {
        if rate > Decimal::ZERO {
            Ok(Self(rate))
        } else {
            Err(ConvertAmountError::NonPositiveRate(rate))
        }
    }

    /// Derive the rate from the two legs of a conversion.
    ///
    /// Leg signs are ignored; the rate is `|foreign| / |domestic|`.
    pub fn from_legs(foreign: &Money, domestic: &Money) -> Result<Self, ConvertAmountError> {
        if domestic.value.is_zero() {
            return Err(ConvertAmountError::ZeroLeg(domestic.clone()));
        }
        if foreign.value.is_zero() {
            return Err(ConvertAmountError::ZeroLeg(foreign.clone()));
        }

        Self::new(foreign.value.abs() / domestic.value.abs())
    }

    pub fn to_decimal(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl CurrencyCode {
    pub const EUR: Self = Self(*b"EUR");
    pub const USD: Self = Self(*b"USD");

    pub fn as_str(&self) -> &str {
        // Only ASCII uppercase letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl FromStr for CurrencyCode {
    type Err = ConvertAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [a, b, c] if s.bytes().all(|byte| byte.is_ascii_uppercase()) => Ok(Self([*a, *b, *c])),
            _ => Err(ConvertAmountError::CurrencyCode(s.to_string())),
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ConvertAmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Money {
    pub fn new(value: Decimal, currency: CurrencyCode) -> Self {
        Self { value, currency }
    }

    /// Parse a statement amount, rejecting unknown currency codes.
    pub fn parse(value: Decimal, currency: &str) -> Result<Self, ConvertAmountError> {
        Ok(Self {
            value,
            currency: currency.parse()?,
        })
    }

    pub fn is_negative(&self) -> bool {
        self.value.is_sign_negative() && !self.value.is_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency, self.value)
    }
}
