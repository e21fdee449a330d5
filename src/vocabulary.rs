//! Closed string vocabularies used by SOFA attributes.
//!
//! Every table maps an enumerated value to its exact, case-sensitive token.
//! The tables are `const` data, so lookups never allocate and are safe to use
//! from any thread.

use std::fmt;
use std::str::FromStr;

use crate::Error;

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $vis:vis enum $ty:ident : $label:literal {
            $($(#[$vmeta:meta])* $variant:ident => $token:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $ty {
            $($(#[$vmeta])* $variant,)+
        }

        impl $ty {
            /// Every value of the vocabulary, in declaration order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant,)+];

            const TABLE: &'static [(&'static str, $ty)] = &[$(($token, $ty::$variant),)+];

            /// Token stored in the file for this value.
            pub const fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $token,)+
                }
            }

            /// Look up a token. Matching is exact and case-sensitive.
            pub fn from_name(name: &str) -> Option<Self> {
                Self::TABLE
                    .iter()
                    .find(|(token, _)| *token == name)
                    .map(|(_, value)| *value)
            }

            pub fn is_valid(name: &str) -> bool {
                Self::from_name(name).is_some()
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_name(s).ok_or_else(|| Error::InvalidEnumToken {
                    vocabulary: $label,
                    token: s.to_owned(),
                })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

vocabulary! {
    /// Order in which spherical harmonic channels are stored along `R`.
    pub enum AmbisonicsChannelOrdering: "AmbisonicsChannelOrdering" {
        Acn => "acn",
        Sid => "sid",
        Fuma => "fuma",
    }
}

vocabulary! {
    /// Normalization applied to the spherical harmonic channels.
    pub enum AmbisonicsNormalization: "AmbisonicsNormalization" {
        Sn3d => "sn3d",
        N3d => "n3d",
        Fuma => "fuma",
        Maxn => "maxn",
    }
}

vocabulary! {
    /// Value of the `Type` attribute on position, up and view variables.
    pub enum CoordinateType: "CoordinateType" {
        Cartesian => "cartesian",
        Spherical => "spherical",
    }
}

vocabulary! {
    pub enum RoomType: "RoomType" {
        FreeField => "free field",
        Reverberant => "reverberant",
        Shoebox => "shoebox",
    }
}

vocabulary! {
    pub enum DataType: "DataType" {
        Fir => "FIR",
        /// Impulse responses per emitter, `Data.IR` is `[M,R,E,N]`
        Fire => "FIRE",
        Tf => "TF",
        Sos => "SOS",
    }
}

vocabulary! {
    pub enum Units: "Units" {
        Meter => "meter",
        CubicMeter => "cubic meter",
        Hertz => "hertz",
        Samples => "samples",
        Kelvin => "kelvin",
        SphericalUnits => "degree, degree, meter",
    }
}
