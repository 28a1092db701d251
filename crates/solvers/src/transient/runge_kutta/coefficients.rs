//! Butcher tableaus of the supported embedded Runge-Kutta pairs.
//!
//! Each table is built on first use and cached for the life of the process.
//! The cache is a [`OnceLock`] per method, so concurrent first accesses from
//! several threads initialize the table exactly once and never observe a
//! partially built table.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// The embedded Runge-Kutta pairs with built-in coefficient tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoefficientSet {
    /// Fehlberg 4(5), 6 stages, propagates the 4th-order solution.
    RungeKuttaFehlberg45,

    /// Fehlberg 5(6), 8 stages, propagates the 5th-order solution.
    RungeKuttaFehlberg56,

    /// Fehlberg 7(8), 13 stages, propagates the 7th-order solution.
    RungeKuttaFehlberg78,

    /// Dormand-Prince 8(7), 13 stages, propagates the 8th-order solution.
    RungeKutta87DormandPrince,
}

impl CoefficientSet {
    /// All supported sets.
    pub const ALL: [Self; 4] = [
        Self::RungeKuttaFehlberg45,
        Self::RungeKuttaFehlberg56,
        Self::RungeKuttaFehlberg78,
        Self::RungeKutta87DormandPrince,
    ];

    /// Returns the canonical identifier of the set.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::RungeKuttaFehlberg45 => "rkf45",
            Self::RungeKuttaFehlberg56 => "rkf56",
            Self::RungeKuttaFehlberg78 => "rkf78",
            Self::RungeKutta87DormandPrince => "dp87",
        }
    }
}

impl fmt::Display for CoefficientSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned for an unrecognized method identifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported Runge-Kutta method `{0}`")]
pub struct UnsupportedMethod(pub String);

impl FromStr for CoefficientSet {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rkf45" | "rungekuttafehlberg45" => Ok(Self::RungeKuttaFehlberg45),
            "rkf56" | "rungekuttafehlberg56" => Ok(Self::RungeKuttaFehlberg56),
            "rkf78" | "rungekuttafehlberg78" => Ok(Self::RungeKuttaFehlberg78),
            "dp87" | "rk87" | "rungekutta87dormandprince" => Ok(Self::RungeKutta87DormandPrince),
            _ => Err(UnsupportedMethod(s.to_owned())),
        }
    }
}

/// Which embedded estimate becomes the propagated state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderToIntegrate {
    Lower,
    Higher,
}

/// An embedded Runge-Kutta tableau.
///
/// `a` is `stages x (stages - 1)` and strictly lower triangular, `b` holds the
/// lower-order weights in row 0 and the higher-order weights in row 1, and
/// `c` holds the stage time fractions.
#[derive(Debug, Clone, PartialEq)]
pub struct RungeKuttaCoefficients {
    pub lower_order: usize,
    pub higher_order: usize,
    pub order_to_integrate: OrderToIntegrate,
    pub a: DMatrix<f64>,
    pub b: DMatrix<f64>,
    pub c: DVector<f64>,
}

impl RungeKuttaCoefficients {
    /// Returns the number of stages.
    #[must_use]
    pub fn stages(&self) -> usize {
        self.c.len()
    }

    /// Returns the row of `b` used for the propagated state.
    #[must_use]
    pub fn integrated_row(&self) -> usize {
        match self.order_to_integrate {
            OrderToIntegrate::Lower => 0,
            OrderToIntegrate::Higher => 1,
        }
    }

    /// Exponent used in step-size control, `1 / (min order + 1)`.
    #[must_use]
    pub fn step_exponent(&self) -> f64 {
        1.0 / (self.lower_order.min(self.higher_order) as f64 + 1.0)
    }
}

/// Returns the cached coefficient table for `set`.
pub fn get(set: CoefficientSet) -> &'static RungeKuttaCoefficients {
    static RKF45: OnceLock<RungeKuttaCoefficients> = OnceLock::new();
    static RKF56: OnceLock<RungeKuttaCoefficients> = OnceLock::new();
    static RKF78: OnceLock<RungeKuttaCoefficients> = OnceLock::new();
    static DP87: OnceLock<RungeKuttaCoefficients> = OnceLock::new();

    match set {
        CoefficientSet::RungeKuttaFehlberg45 => RKF45.get_or_init(fehlberg45),
        CoefficientSet::RungeKuttaFehlberg56 => RKF56.get_or_init(fehlberg56),
        CoefficientSet::RungeKuttaFehlberg78 => RKF78.get_or_init(fehlberg78),
        CoefficientSet::RungeKutta87DormandPrince => DP87.get_or_init(dormand_prince87),
    }
}

/// Looks up a coefficient table by identifier, such as `"rkf78"`.
///
/// # Errors
///
/// Returns [`UnsupportedMethod`] if the identifier is not recognized.
pub fn get_by_name(name: &str) -> Result<&'static RungeKuttaCoefficients, UnsupportedMethod> {
    name.parse().map(get)
}

/// Builds a tableau from sparse `(row, column, value)` entries.
fn tableau(
    (lower_order, higher_order): (usize, usize),
    order_to_integrate: OrderToIntegrate,
    a: &[(usize, usize, f64)],
    b: &[(usize, usize, f64)],
    c: &[f64],
) -> RungeKuttaCoefficients {
    let stages = c.len();
    let mut a_matrix = DMatrix::zeros(stages, stages - 1);
    for &(i, j, value) in a {
        a_matrix[(i, j)] = value;
    }
    let mut b_matrix = DMatrix::zeros(2, stages);
    for &(i, j, value) in b {
        b_matrix[(i, j)] = value;
    }

    RungeKuttaCoefficients {
        lower_order,
        higher_order,
        order_to_integrate,
        a: a_matrix,
        b: b_matrix,
        c: DVector::from_column_slice(c),
    }
}

/// Fehlberg (1968), 4th order with embedded 5th order.
fn fehlberg45() -> RungeKuttaCoefficients {
    tableau(
        (4, 5),
        OrderToIntegrate::Lower,
        &[
            (1, 0, 1.0 / 4.0),
            (2, 0, 3.0 / 32.0),
            (2, 1, 9.0 / 32.0),
            (3, 0, 1932.0 / 2197.0),
            (3, 1, -7200.0 / 2197.0),
            (3, 2, 7296.0 / 2197.0),
            (4, 0, 439.0 / 216.0),
            (4, 1, -8.0),
            (4, 2, 3680.0 / 513.0),
            (4, 3, -845.0 / 4104.0),
            (5, 0, -8.0 / 27.0),
            (5, 1, 2.0),
            (5, 2, -3544.0 / 2565.0),
            (5, 3, 1859.0 / 4104.0),
            (5, 4, -11.0 / 40.0),
        ],
        &[
            (0, 0, 25.0 / 216.0),
            (0, 2, 1408.0 / 2565.0),
            (0, 3, 2197.0 / 4104.0),
            (0, 4, -1.0 / 5.0),
            (1, 0, 16.0 / 135.0),
            (1, 2, 6656.0 / 12825.0),
            (1, 3, 28561.0 / 56430.0),
            (1, 4, -9.0 / 50.0),
            (1, 5, 2.0 / 55.0),
        ],
        &[0.0, 1.0 / 4.0, 3.0 / 8.0, 12.0 / 13.0, 1.0, 1.0 / 2.0],
    )
}

/// Fehlberg (1968), 5th order with embedded 6th order.
fn fehlberg56() -> RungeKuttaCoefficients {
    tableau(
        (5, 6),
        OrderToIntegrate::Lower,
        &[
            (1, 0, 1.0 / 6.0),
            (2, 0, 4.0 / 75.0),
            (2, 1, 16.0 / 75.0),
            (3, 0, 5.0 / 6.0),
            (3, 1, -8.0 / 3.0),
            (3, 2, 5.0 / 2.0),
            (4, 0, -8.0 / 5.0),
            (4, 1, 144.0 / 25.0),
            (4, 2, -4.0),
            (4, 3, 16.0 / 25.0),
            (5, 0, 361.0 / 320.0),
            (5, 1, -18.0 / 5.0),
            (5, 2, 407.0 / 128.0),
            (5, 3, -11.0 / 80.0),
            (5, 4, 55.0 / 128.0),
            (6, 0, -11.0 / 640.0),
            (6, 2, 11.0 / 256.0),
            (6, 3, -11.0 / 160.0),
            (6, 4, 11.0 / 256.0),
            (7, 0, 93.0 / 640.0),
            (7, 1, -18.0 / 5.0),
            (7, 2, 803.0 / 256.0),
            (7, 3, -11.0 / 160.0),
            (7, 4, 99.0 / 256.0),
            (7, 6, 1.0),
        ],
        &[
            (0, 0, 31.0 / 384.0),
            (0, 2, 1125.0 / 2816.0),
            (0, 3, 9.0 / 32.0),
            (0, 4, 125.0 / 768.0),
            (0, 5, 5.0 / 66.0),
            (1, 0, 7.0 / 1408.0),
            (1, 2, 1125.0 / 2816.0),
            (1, 3, 9.0 / 32.0),
            (1, 4, 125.0 / 768.0),
            (1, 6, 5.0 / 66.0),
            (1, 7, 5.0 / 66.0),
        ],
        &[0.0, 1.0 / 6.0, 4.0 / 15.0, 2.0 / 3.0, 4.0 / 5.0, 1.0, 0.0, 1.0],
    )
}

/// Fehlberg (1968), 7th order with embedded 8th order.
fn fehlberg78() -> RungeKuttaCoefficients {
    tableau(
        (7, 8),
        OrderToIntegrate::Lower,
        &[
            (1, 0, 2.0 / 27.0),
            (2, 0, 1.0 / 36.0),
            (2, 1, 1.0 / 12.0),
            (3, 0, 1.0 / 24.0),
            (3, 2, 1.0 / 8.0),
            (4, 0, 5.0 / 12.0),
            (4, 2, -25.0 / 16.0),
            (4, 3, 25.0 / 16.0),
            (5, 0, 1.0 / 20.0),
            (5, 3, 1.0 / 4.0),
            (5, 4, 1.0 / 5.0),
            (6, 0, -25.0 / 108.0),
            (6, 3, 125.0 / 108.0),
            (6, 4, -65.0 / 27.0),
            (6, 5, 125.0 / 54.0),
            (7, 0, 31.0 / 300.0),
            (7, 4, 61.0 / 225.0),
            (7, 5, -2.0 / 9.0),
            (7, 6, 13.0 / 900.0),
            (8, 0, 2.0),
            (8, 3, -53.0 / 6.0),
            (8, 4, 704.0 / 45.0),
            (8, 5, -107.0 / 9.0),
            (8, 6, 67.0 / 90.0),
            (8, 7, 3.0),
            (9, 0, -91.0 / 108.0),
            (9, 3, 23.0 / 108.0),
            (9, 4, -976.0 / 135.0),
            (9, 5, 311.0 / 54.0),
            (9, 6, -19.0 / 60.0),
            (9, 7, 17.0 / 6.0),
            (9, 8, -1.0 / 12.0),
            (10, 0, 2383.0 / 4100.0),
            (10, 3, -341.0 / 164.0),
            (10, 4, 4496.0 / 1025.0),
            (10, 5, -301.0 / 82.0),
            (10, 6, 2133.0 / 4100.0),
            (10, 7, 45.0 / 82.0),
            (10, 8, 45.0 / 164.0),
            (10, 9, 18.0 / 41.0),
            (11, 0, 3.0 / 205.0),
            (11, 5, -6.0 / 41.0),
            (11, 6, -3.0 / 205.0),
            (11, 7, -3.0 / 41.0),
            (11, 8, 3.0 / 41.0),
            (11, 9, 6.0 / 41.0),
            (12, 0, -1777.0 / 4100.0),
            (12, 3, -341.0 / 164.0),
            (12, 4, 4496.0 / 1025.0),
            (12, 5, -289.0 / 82.0),
            (12, 6, 2193.0 / 4100.0),
            (12, 7, 51.0 / 82.0),
            (12, 8, 33.0 / 164.0),
            (12, 9, 12.0 / 41.0),
            (12, 11, 1.0),
        ],
        &[
            (0, 0, 41.0 / 840.0),
            (0, 5, 34.0 / 105.0),
            (0, 6, 9.0 / 35.0),
            (0, 7, 9.0 / 35.0),
            (0, 8, 9.0 / 280.0),
            (0, 9, 9.0 / 280.0),
            (0, 10, 41.0 / 840.0),
            (1, 5, 34.0 / 105.0),
            (1, 6, 9.0 / 35.0),
            (1, 7, 9.0 / 35.0),
            (1, 8, 9.0 / 280.0),
            (1, 9, 9.0 / 280.0),
            (1, 11, 41.0 / 840.0),
            (1, 12, 41.0 / 840.0),
        ],
        &[
            0.0,
            2.0 / 27.0,
            1.0 / 9.0,
            1.0 / 6.0,
            5.0 / 12.0,
            1.0 / 2.0,
            5.0 / 6.0,
            1.0 / 6.0,
            2.0 / 3.0,
            1.0 / 3.0,
            1.0,
            0.0,
            1.0,
        ],
    )
}

/// Prince and Dormand (1981), 8th order with embedded 7th order, as listed in
/// Montenbruck and Gill, "Satellite Orbits" (2005).
fn dormand_prince87() -> RungeKuttaCoefficients {
    tableau(
        (7, 8),
        OrderToIntegrate::Higher,
        &[
            (1, 0, 1.0 / 18.0),
            (2, 0, 1.0 / 48.0),
            (2, 1, 1.0 / 16.0),
            (3, 0, 1.0 / 32.0),
            (3, 2, 3.0 / 32.0),
            (4, 0, 5.0 / 16.0),
            (4, 2, -75.0 / 64.0),
            (4, 3, 75.0 / 64.0),
            (5, 0, 3.0 / 80.0),
            (5, 3, 3.0 / 16.0),
            (5, 4, 3.0 / 20.0),
            (6, 0, 29_443_841.0 / 614_563_906.0),
            (6, 3, 77_736_538.0 / 692_538_347.0),
            (6, 4, -28_693_883.0 / 1_125_000_000.0),
            (6, 5, 23_124_283.0 / 1_800_000_000.0),
            (7, 0, 16_016_141.0 / 946_692_911.0),
            (7, 3, 61_564_180.0 / 158_732_637.0),
            (7, 4, 22_789_713.0 / 633_445_777.0),
            (7, 5, 545_815_736.0 / 2_771_057_229.0),
            (7, 6, -180_193_667.0 / 1_043_307_555.0),
            (8, 0, 39_632_708.0 / 573_591_083.0),
            (8, 3, -433_636_366.0 / 683_701_615.0),
            (8, 4, -421_739_975.0 / 2_616_292_301.0),
            (8, 5, 100_302_831.0 / 723_423_059.0),
            (8, 6, 790_204_164.0 / 839_813_087.0),
            (8, 7, 800_635_310.0 / 3_783_071_287.0),
            (9, 0, 246_121_993.0 / 1_340_847_787.0),
            (9, 3, -37_695_042_795.0 / 15_268_766_246.0),
            (9, 4, -309_121_744.0 / 1_061_227_803.0),
            (9, 5, -12_992_083.0 / 490_766_935.0),
            (9, 6, 6_005_943_493.0 / 2_108_947_869.0),
            (9, 7, 393_006_217.0 / 1_396_673_457.0),
            (9, 8, 123_872_331.0 / 1_001_029_789.0),
            (10, 0, -1_028_468_189.0 / 846_180_014.0),
            (10, 3, 8_478_235_783.0 / 508_512_852.0),
            (10, 4, 1_311_729_495.0 / 1_432_422_823.0),
            (10, 5, -10_304_129_995.0 / 1_701_304_382.0),
            (10, 6, -48_777_925_059.0 / 3_047_939_560.0),
            (10, 7, 15_336_726_248.0 / 1_032_824_649.0),
            (10, 8, -45_442_868_181.0 / 3_398_467_696.0),
            (10, 9, 3_065_993_473.0 / 597_172_653.0),
            (11, 0, 185_892_177.0 / 718_116_043.0),
            (11, 3, -3_185_094_517.0 / 667_107_341.0),
            (11, 4, -477_755_414.0 / 1_098_053_517.0),
            (11, 5, -703_635_378.0 / 230_739_211.0),
            (11, 6, 5_731_566_787.0 / 1_027_545_527.0),
            (11, 7, 5_232_866_602.0 / 850_066_563.0),
            (11, 8, -4_093_664_535.0 / 808_688_257.0),
            (11, 9, 3_962_137_247.0 / 1_805_957_418.0),
            (11, 10, 65_686_358.0 / 487_910_083.0),
            (12, 0, 403_863_854.0 / 491_063_109.0),
            (12, 3, -5_068_492_393.0 / 434_740_067.0),
            (12, 4, -411_421_997.0 / 543_043_805.0),
            (12, 5, 652_783_627.0 / 914_296_604.0),
            (12, 6, 11_173_962_825.0 / 925_320_556.0),
            (12, 7, -13_158_990_841.0 / 6_184_727_034.0),
            (12, 8, 3_936_647_629.0 / 1_978_049_680.0),
            (12, 9, -160_528_059.0 / 685_178_525.0),
            (12, 10, 248_638_103.0 / 1_413_531_060.0),
        ],
        &[
            // 7th-order weights
            (0, 0, 13_451_932.0 / 455_176_623.0),
            (0, 5, -808_719_846.0 / 976_000_145.0),
            (0, 6, 1_757_004_468.0 / 5_645_159_321.0),
            (0, 7, 656_045_339.0 / 265_891_186.0),
            (0, 8, -3_867_574_721.0 / 1_518_517_206.0),
            (0, 9, 465_885_868.0 / 322_736_535.0),
            (0, 10, 53_011_238.0 / 667_516_719.0),
            (0, 11, 2.0 / 45.0),
            // 8th-order weights
            (1, 0, 14_005_451.0 / 335_480_064.0),
            (1, 5, -59_238_493.0 / 1_068_277_825.0),
            (1, 6, 181_606_767.0 / 758_867_731.0),
            (1, 7, 561_292_985.0 / 797_845_732.0),
            (1, 8, -1_041_891_430.0 / 1_371_343_529.0),
            (1, 9, 760_417_239.0 / 1_151_165_299.0),
            (1, 10, 118_820_643.0 / 751_138_087.0),
            (1, 11, -528_747_749.0 / 2_220_607_170.0),
            (1, 12, 1.0 / 4.0),
        ],
        &[
            0.0,
            1.0 / 18.0,
            1.0 / 12.0,
            1.0 / 8.0,
            5.0 / 16.0,
            3.0 / 8.0,
            59.0 / 400.0,
            93.0 / 200.0,
            5_490_023_248.0 / 9_719_169_821.0,
            13.0 / 20.0,
            1_201_146_811.0 / 1_299_019_798.0,
            1.0,
            1.0,
        ],
    )
}
