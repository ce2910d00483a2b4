// --- vectorized complex amplitude type ---
//
// the real and imaginary parts live in the two lanes of one 128-bit packed
// double register, so a whole complex add or multiply is a handful of vector
// instructions instead of four scalar ones. the api tracks
// num_complex::Complex64 closely enough that engine code can move amplitude
// values between the two without friction.

use num_complex::Complex64;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::__m128d;

#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
use std::arch::aarch64::float64x2_t;

/// The packed register type backing [`Complex`] on the current platform.
///
/// Lane 0 always holds the real part and lane 1 the imaginary part. Every
/// multiply and divide identity below depends on that ordering, so it is the
/// one convention callers handing raw vectors in or out must preserve.
#[cfg(target_arch = "x86_64")]
pub type F64x2 = __m128d;

#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
pub type F64x2 = float64x2_t;

#[cfg(not(any(
    target_arch = "x86_64",
    all(target_arch = "aarch64", target_feature = "neon")
)))]
pub type F64x2 = [f64; 2];

/// SIMD implementation of the double precision complex type.
///
/// A `Complex` is two adjacent `f64`s, real part first, packed into one
/// 128-bit vector register where the hardware has one. The layout is
/// bit-compatible with `num_complex::Complex64`, so packed amplitude arrays
/// can be loaded and stored with vector instructions by the surrounding
/// engine.
///
/// All operations are total over IEEE-754 doubles. Division by a zero-valued
/// complex number produces Inf/NaN lanes per normal floating point rules
/// rather than an error.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct Complex {
    #[cfg(target_arch = "x86_64")]
    pub(crate) vec: __m128d,

    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    pub(crate) vec: float64x2_t,

    #[cfg(not(any(
        target_arch = "x86_64",
        all(target_arch = "aarch64", target_feature = "neon")
    )))]
    pub(crate) vec: [f64; 2],
}

impl Complex {
    /// Packs (re, im) into lanes 0 and 1.
    #[inline]
    pub fn new(re: f64, im: f64) -> Complex {
        Complex { vec: pack(re, im) }
    }

    /// Wraps an existing packed vector as-is, without touching the lanes.
    #[inline]
    pub fn from_vector(vec: F64x2) -> Complex {
        Complex { vec }
    }

    /// Hands back the raw packed vector.
    #[inline]
    pub fn to_vector(self) -> F64x2 {
        self.vec
    }

    #[inline]
    pub fn zero() -> Complex {
        Complex::new(0.0, 0.0)
    }

    #[inline]
    pub fn one() -> Complex {
        Complex::new(1.0, 0.0)
    }

    /// The imaginary unit.
    #[inline]
    pub fn i() -> Complex {
        Complex::new(0.0, 1.0)
    }

    /// Builds e.g. a phase factor from polar form, re = r cos(theta),
    /// im = r sin(theta).
    #[inline]
    pub fn from_polar(r: f64, theta: f64) -> Complex {
        Complex::new(r * theta.cos(), r * theta.sin())
    }

    /// Real part, lane 0.
    #[inline]
    pub fn re(self) -> f64 {
        lane0(self.vec)
    }

    /// Imaginary part, lane 1.
    #[inline]
    pub fn im(self) -> f64 {
        lane1(self.vec)
    }

    /// Squared magnitude, re^2 + im^2, from a lane-wise self-multiply and a
    /// horizontal sum. Never negative for finite input.
    #[inline]
    pub fn norm_sqr(self) -> f64 {
        norm_sqr(self.vec)
    }

    /// Magnitude. Callers that only compare magnitudes should prefer
    /// [`Complex::norm_sqr`] and skip the square root.
    #[inline]
    pub fn norm(self) -> f64 {
        self.norm_sqr().sqrt()
    }

    /// Complex conjugate, imaginary lane negated.
    #[inline]
    pub fn conj(self) -> Complex {
        Complex { vec: conj(self.vec) }
    }

    /// Both lanes scaled by `t`. Same as `self * t`.
    #[inline]
    pub fn scale(self, t: f64) -> Complex {
        Complex { vec: mul_scalar(self.vec, t) }
    }
}

impl Default for Complex {
    #[inline]
    fn default() -> Complex {
        Complex::zero()
    }
}

// --- operator dispatch ---
//
// each raw lane operation picks its backend at compile time: sse2 on x86_64,
// neon on aarch64, scalar math anywhere else. the three arms compute
// identical arithmetic identities, the vector paths are purely faster.

#[inline]
fn pack(re: f64, im: f64) -> F64x2 {
    #[cfg(target_arch = "x86_64")]
    {
        unsafe { x86_64_simd::pack(re, im) }
    }
    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    {
        unsafe { aarch64_neon::pack(re, im) }
    }
    #[cfg(not(any(
        target_arch = "x86_64",
        all(target_arch = "aarch64", target_feature = "neon")
    )))]
    {
        [re, im]
    }
}

#[inline]
fn lane0(v: F64x2) -> f64 {
    #[cfg(target_arch = "x86_64")]
    {
        unsafe { x86_64_simd::lane0(v) }
    }
    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    {
        unsafe { aarch64_neon::lane0(v) }
    }
    #[cfg(not(any(
        target_arch = "x86_64",
        all(target_arch = "aarch64", target_feature = "neon")
    )))]
    {
        v[0]
    }
}

#[inline]
fn lane1(v: F64x2) -> f64 {
    #[cfg(target_arch = "x86_64")]
    {
        unsafe { x86_64_simd::lane1(v) }
    }
    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    {
        unsafe { aarch64_neon::lane1(v) }
    }
    #[cfg(not(any(
        target_arch = "x86_64",
        all(target_arch = "aarch64", target_feature = "neon")
    )))]
    {
        v[1]
    }
}

#[inline]
fn add(a: F64x2, b: F64x2) -> F64x2 {
    #[cfg(target_arch = "x86_64")]
    {
        unsafe { x86_64_simd::add(a, b) }
    }
    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    {
        unsafe { aarch64_neon::add(a, b) }
    }
    #[cfg(not(any(
        target_arch = "x86_64",
        all(target_arch = "aarch64", target_feature = "neon")
    )))]
    {
        [a[0] + b[0], a[1] + b[1]]
    }
}

#[inline]
fn sub(a: F64x2, b: F64x2) -> F64x2 {
    #[cfg(target_arch = "x86_64")]
    {
        unsafe { x86_64_simd::sub(a, b) }
    }
    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    {
        unsafe { aarch64_neon::sub(a, b) }
    }
    #[cfg(not(any(
        target_arch = "x86_64",
        all(target_arch = "aarch64", target_feature = "neon")
    )))]
    {
        [a[0] - b[0], a[1] - b[1]]
    }
}

#[inline]
fn mul_complex(a: F64x2, b: F64x2) -> F64x2 {
    #[cfg(target_arch = "x86_64")]
    {
        unsafe { x86_64_simd::mul_complex(a, b) }
    }
    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    {
        unsafe { aarch64_neon::mul_complex(a, b) }
    }
    #[cfg(not(any(
        target_arch = "x86_64",
        all(target_arch = "aarch64", target_feature = "neon")
    )))]
    {
        [a[0] * b[0] - a[1] * b[1], a[0] * b[1] + a[1] * b[0]]
    }
}

#[inline]
fn div_complex(a: F64x2, b: F64x2) -> F64x2 {
    #[cfg(target_arch = "x86_64")]
    {
        unsafe { x86_64_simd::div_complex(a, b) }
    }
    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    {
        unsafe { aarch64_neon::div_complex(a, b) }
    }
    #[cfg(not(any(
        target_arch = "x86_64",
        all(target_arch = "aarch64", target_feature = "neon")
    )))]
    {
        let denom = b[0] * b[0] + b[1] * b[1];
        [
            (a[0] * b[0] + a[1] * b[1]) / denom,
            (a[1] * b[0] - a[0] * b[1]) / denom,
        ]
    }
}

#[inline]
fn mul_scalar(a: F64x2, s: f64) -> F64x2 {
    #[cfg(target_arch = "x86_64")]
    {
        unsafe { x86_64_simd::mul_scalar(a, s) }
    }
    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    {
        unsafe { aarch64_neon::mul_scalar(a, s) }
    }
    #[cfg(not(any(
        target_arch = "x86_64",
        all(target_arch = "aarch64", target_feature = "neon")
    )))]
    {
        [a[0] * s, a[1] * s]
    }
}

#[inline]
fn div_scalar(a: F64x2, s: f64) -> F64x2 {
    #[cfg(target_arch = "x86_64")]
    {
        unsafe { x86_64_simd::div_scalar(a, s) }
    }
    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    {
        unsafe { aarch64_neon::div_scalar(a, s) }
    }
    #[cfg(not(any(
        target_arch = "x86_64",
        all(target_arch = "aarch64", target_feature = "neon")
    )))]
    {
        [a[0] / s, a[1] / s]
    }
}

// scalar / complex via the reciprocal identity s * conj(b) / |b|^2
#[inline]
fn scalar_recip(s: f64, b: F64x2) -> F64x2 {
    #[cfg(target_arch = "x86_64")]
    {
        unsafe { x86_64_simd::scalar_recip(s, b) }
    }
    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    {
        unsafe { aarch64_neon::scalar_recip(s, b) }
    }
    #[cfg(not(any(
        target_arch = "x86_64",
        all(target_arch = "aarch64", target_feature = "neon")
    )))]
    {
        let denom = b[0] * b[0] + b[1] * b[1];
        [s * b[0] / denom, -(s * b[1]) / denom]
    }
}

#[inline]
fn neg(a: F64x2) -> F64x2 {
    #[cfg(target_arch = "x86_64")]
    {
        unsafe { x86_64_simd::neg(a) }
    }
    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    {
        unsafe { aarch64_neon::neg(a) }
    }
    #[cfg(not(any(
        target_arch = "x86_64",
        all(target_arch = "aarch64", target_feature = "neon")
    )))]
    {
        [-a[0], -a[1]]
    }
}

#[inline]
fn conj(a: F64x2) -> F64x2 {
    #[cfg(target_arch = "x86_64")]
    {
        unsafe { x86_64_simd::conj(a) }
    }
    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    {
        unsafe { aarch64_neon::conj(a) }
    }
    #[cfg(not(any(
        target_arch = "x86_64",
        all(target_arch = "aarch64", target_feature = "neon")
    )))]
    {
        [a[0], -a[1]]
    }
}

#[inline]
fn norm_sqr(a: F64x2) -> f64 {
    #[cfg(target_arch = "x86_64")]
    {
        unsafe { x86_64_simd::norm_sqr(a) }
    }
    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    {
        unsafe { aarch64_neon::norm_sqr(a) }
    }
    #[cfg(not(any(
        target_arch = "x86_64",
        all(target_arch = "aarch64", target_feature = "neon")
    )))]
    {
        a[0] * a[0] + a[1] * a[1]
    }
}

// --- operators ---

impl Add for Complex {
    type Output = Complex;

    #[inline]
    fn add(self, rhs: Complex) -> Complex {
        Complex { vec: add(self.vec, rhs.vec) }
    }
}

impl AddAssign for Complex {
    #[inline]
    fn add_assign(&mut self, rhs: Complex) {
        self.vec = add(self.vec, rhs.vec);
    }
}

impl Sub for Complex {
    type Output = Complex;

    #[inline]
    fn sub(self, rhs: Complex) -> Complex {
        Complex { vec: sub(self.vec, rhs.vec) }
    }
}

impl SubAssign for Complex {
    #[inline]
    fn sub_assign(&mut self, rhs: Complex) {
        self.vec = sub(self.vec, rhs.vec);
    }
}

impl Mul for Complex {
    type Output = Complex;

    #[inline]
    fn mul(self, rhs: Complex) -> Complex {
        Complex { vec: mul_complex(self.vec, rhs.vec) }
    }
}

impl MulAssign for Complex {
    #[inline]
    fn mul_assign(&mut self, rhs: Complex) {
        self.vec = mul_complex(self.vec, rhs.vec);
    }
}

impl Mul<f64> for Complex {
    type Output = Complex;

    #[inline]
    fn mul(self, rhs: f64) -> Complex {
        Complex { vec: mul_scalar(self.vec, rhs) }
    }
}

impl MulAssign<f64> for Complex {
    #[inline]
    fn mul_assign(&mut self, rhs: f64) {
        self.vec = mul_scalar(self.vec, rhs);
    }
}

impl Mul<Complex> for f64 {
    type Output = Complex;

    #[inline]
    fn mul(self, rhs: Complex) -> Complex {
        Complex { vec: mul_scalar(rhs.vec, self) }
    }
}

impl Div for Complex {
    type Output = Complex;

    /// Conjugate-multiply-then-scale, never naive per-lane division. A zero
    /// divisor falls through to Inf/NaN lanes.
    #[inline]
    fn div(self, rhs: Complex) -> Complex {
        Complex { vec: div_complex(self.vec, rhs.vec) }
    }
}

impl DivAssign for Complex {
    #[inline]
    fn div_assign(&mut self, rhs: Complex) {
        self.vec = div_complex(self.vec, rhs.vec);
    }
}

impl Div<f64> for Complex {
    type Output = Complex;

    #[inline]
    fn div(self, rhs: f64) -> Complex {
        Complex { vec: div_scalar(self.vec, rhs) }
    }
}

impl DivAssign<f64> for Complex {
    #[inline]
    fn div_assign(&mut self, rhs: f64) {
        self.vec = div_scalar(self.vec, rhs);
    }
}

impl Div<Complex> for f64 {
    type Output = Complex;

    #[inline]
    fn div(self, rhs: Complex) -> Complex {
        Complex { vec: scalar_recip(self, rhs.vec) }
    }
}

impl Neg for Complex {
    type Output = Complex;

    #[inline]
    fn neg(self) -> Complex {
        Complex { vec: neg(self.vec) }
    }
}

// lane comparison with ieee semantics, so NaN != NaN
impl PartialEq for Complex {
    #[inline]
    fn eq(&self, other: &Complex) -> bool {
        self.re() == other.re() && self.im() == other.im()
    }
}

impl fmt::Debug for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Complex")
            .field("re", &self.re())
            .field("im", &self.im())
            .finish()
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let re = self.re();
        let im = self.im();
        if im.is_sign_negative() {
            write!(f, "{}-{}i", re, -im)
        } else {
            write!(f, "{}+{}i", re, im)
        }
    }
}

// --- conversions ---

impl From<f64> for Complex {
    #[inline]
    fn from(re: f64) -> Complex {
        Complex::new(re, 0.0)
    }
}

impl From<(f64, f64)> for Complex {
    #[inline]
    fn from((re, im): (f64, f64)) -> Complex {
        Complex::new(re, im)
    }
}

impl From<Complex64> for Complex {
    #[inline]
    fn from(c: Complex64) -> Complex {
        Complex::new(c.re, c.im)
    }
}

impl From<Complex> for Complex64 {
    #[inline]
    fn from(c: Complex) -> Complex64 {
        Complex64::new(c.re(), c.im())
    }
}

// serialized as a (re, im) tuple, the same wire shape serde gives
// num_complex::Complex64, so dumped amplitude arrays stay interchangeable
impl Serialize for Complex {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.re(), self.im()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Complex {
    fn deserialize<D>(deserializer: D) -> Result<Complex, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (re, im) = <(f64, f64)>::deserialize(deserializer)?;
        Ok(Complex::new(re, im))
    }
}

// --- sse2 backend ---

#[cfg(target_arch = "x86_64")]
pub mod x86_64_simd {
    use std::arch::x86_64::*;

    #[inline(always)]
    pub unsafe fn pack(re: f64, im: f64) -> __m128d {
        // _mm_set_pd takes the high lane first
        _mm_set_pd(im, re)
    }

    #[inline(always)]
    pub unsafe fn lane0(v: __m128d) -> f64 {
        _mm_cvtsd_f64(v)
    }

    #[inline(always)]
    pub unsafe fn lane1(v: __m128d) -> f64 {
        _mm_cvtsd_f64(_mm_unpackhi_pd(v, v))
    }

    // lane-swapped copy, [re, im] -> [im, re]
    #[inline(always)]
    unsafe fn swap(v: __m128d) -> __m128d {
        _mm_shuffle_pd::<0b01>(v, v)
    }

    #[inline(always)]
    pub unsafe fn add(a: __m128d, b: __m128d) -> __m128d {
        _mm_add_pd(a, b)
    }

    #[inline(always)]
    pub unsafe fn sub(a: __m128d, b: __m128d) -> __m128d {
        _mm_sub_pd(a, b)
    }

    // (a_re + i*a_im) * (b_re + i*b_im):
    // two lane-wise products against b, one using a lane-swapped a, then the
    // real part combines with a subtract and the imaginary with an add
    #[inline(always)]
    pub unsafe fn mul_complex(a: __m128d, b: __m128d) -> __m128d {
        let prod = _mm_mul_pd(a, b);
        let cross = _mm_mul_pd(swap(a), b);
        pack(
            lane0(prod) - lane1(prod),
            lane0(cross) + lane1(cross),
        )
    }

    // a / b as a * conj(b) / |b|^2, folded into one packed divide
    #[inline(always)]
    pub unsafe fn div_complex(a: __m128d, b: __m128d) -> __m128d {
        let den = _mm_mul_pd(b, b);
        let denom = lane0(den) + lane1(den);
        let prod = _mm_mul_pd(a, b);
        let cross = _mm_mul_pd(swap(a), b);
        _mm_div_pd(
            pack(
                lane0(prod) + lane1(prod),
                lane0(cross) - lane1(cross),
            ),
            _mm_set1_pd(denom),
        )
    }

    #[inline(always)]
    pub unsafe fn mul_scalar(a: __m128d, s: f64) -> __m128d {
        _mm_mul_pd(a, _mm_set1_pd(s))
    }

    #[inline(always)]
    pub unsafe fn div_scalar(a: __m128d, s: f64) -> __m128d {
        _mm_div_pd(a, _mm_set1_pd(s))
    }

    // s / b = s * conj(b) / |b|^2
    #[inline(always)]
    pub unsafe fn scalar_recip(s: f64, b: __m128d) -> __m128d {
        let den = _mm_mul_pd(b, b);
        let denom = lane0(den) + lane1(den);
        conj(_mm_div_pd(mul_scalar(b, s), _mm_set1_pd(denom)))
    }

    #[inline(always)]
    pub unsafe fn neg(v: __m128d) -> __m128d {
        _mm_xor_pd(v, _mm_set1_pd(-0.0))
    }

    // flip only the imaginary lane's sign bit
    #[inline(always)]
    pub unsafe fn conj(v: __m128d) -> __m128d {
        _mm_xor_pd(v, _mm_set_pd(-0.0, 0.0))
    }

    #[inline(always)]
    pub unsafe fn norm_sqr(v: __m128d) -> f64 {
        let sq = _mm_mul_pd(v, v);
        lane0(sq) + lane1(sq)
    }
}

// --- neon backend ---

#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
pub mod aarch64_neon {
    use std::arch::aarch64::*;

    #[target_feature(enable = "neon")]
    #[inline]
    pub unsafe fn pack(re: f64, im: f64) -> float64x2_t {
        vsetq_lane_f64::<1>(im, vsetq_lane_f64::<0>(re, vdupq_n_f64(0.0)))
    }

    #[target_feature(enable = "neon")]
    #[inline]
    pub unsafe fn lane0(v: float64x2_t) -> f64 {
        vgetq_lane_f64::<0>(v)
    }

    #[target_feature(enable = "neon")]
    #[inline]
    pub unsafe fn lane1(v: float64x2_t) -> f64 {
        vgetq_lane_f64::<1>(v)
    }

    // lane-swapped copy, [re, im] -> [im, re]
    #[target_feature(enable = "neon")]
    #[inline]
    unsafe fn swap(v: float64x2_t) -> float64x2_t {
        vextq_f64::<1>(v, v)
    }

    #[target_feature(enable = "neon")]
    #[inline]
    pub unsafe fn add(a: float64x2_t, b: float64x2_t) -> float64x2_t {
        vaddq_f64(a, b)
    }

    #[target_feature(enable = "neon")]
    #[inline]
    pub unsafe fn sub(a: float64x2_t, b: float64x2_t) -> float64x2_t {
        vsubq_f64(a, b)
    }

    // same shape as the sse2 path: straight product, swapped product,
    // subtract for the real lane and add for the imaginary lane
    #[target_feature(enable = "neon")]
    #[inline]
    pub unsafe fn mul_complex(a: float64x2_t, b: float64x2_t) -> float64x2_t {
        let prod = vmulq_f64(a, b);
        let cross = vmulq_f64(swap(a), b);
        pack(
            lane0(prod) - lane1(prod),
            lane0(cross) + lane1(cross),
        )
    }

    #[target_feature(enable = "neon")]
    #[inline]
    pub unsafe fn div_complex(a: float64x2_t, b: float64x2_t) -> float64x2_t {
        let denom = vaddvq_f64(vmulq_f64(b, b));
        let prod = vmulq_f64(a, b);
        let cross = vmulq_f64(swap(a), b);
        vdivq_f64(
            pack(
                lane0(prod) + lane1(prod),
                lane0(cross) - lane1(cross),
            ),
            vdupq_n_f64(denom),
        )
    }

    #[target_feature(enable = "neon")]
    #[inline]
    pub unsafe fn mul_scalar(a: float64x2_t, s: f64) -> float64x2_t {
        vmulq_n_f64(a, s)
    }

    #[target_feature(enable = "neon")]
    #[inline]
    pub unsafe fn div_scalar(a: float64x2_t, s: f64) -> float64x2_t {
        vdivq_f64(a, vdupq_n_f64(s))
    }

    // s / b = s * conj(b) / |b|^2
    #[target_feature(enable = "neon")]
    #[inline]
    pub unsafe fn scalar_recip(s: f64, b: float64x2_t) -> float64x2_t {
        let denom = vaddvq_f64(vmulq_f64(b, b));
        conj(vdivq_f64(vmulq_n_f64(b, s), vdupq_n_f64(denom)))
    }

    #[target_feature(enable = "neon")]
    #[inline]
    pub unsafe fn neg(v: float64x2_t) -> float64x2_t {
        vnegq_f64(v)
    }

    // negate only the imaginary lane
    #[target_feature(enable = "neon")]
    #[inline]
    pub unsafe fn conj(v: float64x2_t) -> float64x2_t {
        vsetq_lane_f64::<1>(-vgetq_lane_f64::<1>(v), v)
    }

    // lane-wise self-multiply plus horizontal add
    #[target_feature(enable = "neon")]
    #[inline]
    pub unsafe fn norm_sqr(v: float64x2_t) -> f64 {
        vaddvq_f64(vmulq_f64(v, v))
    }
}
